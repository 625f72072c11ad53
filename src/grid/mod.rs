// src/grid/mod.rs
//! Tile grids over the visible part of a map

mod feature;
pub mod hexgrid;
pub mod mercator;
pub mod tool;

pub use feature::{FeatureCollection, GridFeature};
pub use hexgrid::Containment;
pub use mercator::TileAddress;
pub use tool::GridTool;

use crate::error::{Result, ToolError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which kind of grid a tool draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridKind {
    Mercator,
    H3,
}

impl GridKind {
    pub fn description(&self) -> &'static str {
        match self {
            GridKind::Mercator => "Mercator",
            GridKind::H3 => "H3",
        }
    }

    pub fn default_policy(&self) -> LevelPolicy {
        match self {
            GridKind::Mercator => LevelPolicy::MERCATOR,
            GridKind::H3 => LevelPolicy::H3,
        }
    }
}

impl fmt::Display for GridKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl FromStr for GridKind {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mercator" => Ok(GridKind::Mercator),
            "h3" => Ok(GridKind::H3),
            _ => Err(ToolError::InvalidArgument(format!("unknown grid kind {:?}", s))),
        }
    }
}

/// Upper bound for a grid level relative to the map's current zoom.
///
/// Levels run from 0 to `int(map_zoom) + max_zoom_delta`, never above
/// `hard_max`. Mercator and H3 use different deltas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelPolicy {
    pub max_zoom_delta: i32,
    pub hard_max: u8,
}

impl LevelPolicy {
    pub const MERCATOR: LevelPolicy = LevelPolicy {
        max_zoom_delta: 4,
        hard_max: mercator::MAX_ZOOM,
    };

    pub const H3: LevelPolicy = LevelPolicy {
        max_zoom_delta: -1,
        hard_max: hexgrid::MAX_RESOLUTION,
    };

    pub fn with_delta(self, max_zoom_delta: i32) -> Self {
        Self { max_zoom_delta, ..self }
    }

    /// Highest allowed level, or `None` if the map is zoomed out too far
    /// for any level.
    pub fn max_level(&self, map_zoom: f64) -> Option<u8> {
        let max = (map_zoom.floor() as i32).saturating_add(self.max_zoom_delta);
        if max < 0 {
            None
        } else {
            Some(max.min(self.hard_max as i32) as u8)
        }
    }

    pub fn check(&self, level: u8, map_zoom: f64) -> Result<()> {
        let max = (map_zoom.floor() as i32)
            .saturating_add(self.max_zoom_delta)
            .min(self.hard_max as i32);
        if (level as i32) > max {
            return Err(ToolError::LevelOutOfRange {
                level: level as i32,
                max,
            });
        }
        Ok(())
    }

    pub fn clamp(&self, level: u8, map_zoom: f64) -> Option<u8> {
        self.max_level(map_zoom).map(|max| level.min(max))
    }
}
