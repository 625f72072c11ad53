// src/grid/tool.rs
//! Dynamic grid overlay adapting to the visible part of a map

use super::{hexgrid, mercator, Containment, FeatureCollection, GridKind, LevelPolicy};
use crate::error::{Result, ToolError};
use crate::host::{MapHost, Viewport};
use tracing::{debug, warn};

/// A grid overlay recomputed whenever the map is panned or zoomed, or the
/// grid level changes. The level is limited by the map's current zoom so
/// the grid never gets too dense to see anything else.
#[derive(Debug, Clone)]
pub struct GridTool {
    pub kind: GridKind,
    pub description: String,
    pub policy: LevelPolicy,
    pub containment: Containment,
    level: u8,
    map_zoom: f64,
    hovered_id: String,
    features: FeatureCollection,
}

impl GridTool {
    /// Create a tool on `host` and draw the first grid at the map's zoom.
    pub fn new(
        host: &mut dyn MapHost,
        kind: GridKind,
        policy: LevelPolicy,
        containment: Containment,
    ) -> Result<Self> {
        let viewport = host.viewport();
        let mut tool = Self {
            kind,
            description: kind.description().to_string(),
            policy,
            containment,
            level: viewport.zoom.max(0.0).floor() as u8,
            map_zoom: viewport.zoom,
            hovered_id: String::new(),
            features: FeatureCollection::default(),
        };
        host.add_control(&tool.control_id());
        host.subscribe_viewport();
        tool.viewport_changed(host, &viewport)?;
        Ok(tool)
    }

    pub fn control_id(&self) -> String {
        format!("grid:{}", self.description)
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn features(&self) -> &FeatureCollection {
        &self.features
    }

    /// Slider range upper bound for the given map zoom.
    pub fn max_level(&self, map_zoom: f64) -> Option<u8> {
        self.policy.max_level(map_zoom)
    }

    /// Status line shown next to the slider.
    pub fn status(&self) -> String {
        format!("{} Map zoom: {}", self.hovered_id, self.map_zoom.floor() as i64)
    }

    /// The map was panned or zoomed: clamp the level and regenerate.
    pub fn viewport_changed(&mut self, host: &mut dyn MapHost, viewport: &Viewport) -> Result<()> {
        self.map_zoom = viewport.zoom;
        match self.policy.clamp(self.level, viewport.zoom) {
            Some(level) => {
                if level != self.level {
                    debug!(grid = %self.kind, from = self.level, to = level, "clamped grid level");
                }
                self.level = level;
                self.regenerate(host, viewport)
            }
            None => {
                // Zoomed out below the lowest allowed level.
                warn!(grid = %self.kind, zoom = viewport.zoom, "no grid level allowed at this zoom");
                self.features = FeatureCollection::default();
                host.set_overlay(&self.description, &self.features);
                Ok(())
            }
        }
    }

    /// The level slider moved.
    pub fn set_level(&mut self, host: &mut dyn MapHost, level: u8) -> Result<()> {
        let viewport = host.viewport();
        self.policy.check(level, viewport.zoom)?;
        self.level = level;
        self.hovered_id.clear();
        self.map_zoom = viewport.zoom;
        self.regenerate(host, &viewport)
    }

    /// The pointer moved over a grid feature.
    pub fn hover(&mut self, id: &str) -> Result<()> {
        if !self.features.ids().any(|known| known == id) {
            return Err(ToolError::InvalidArgument(format!(
                "no feature {:?} in the {} grid",
                id, self.kind
            )));
        }
        self.hovered_id = id.to_string();
        Ok(())
    }

    pub fn close(self, host: &mut dyn MapHost) {
        host.unsubscribe_viewport();
        host.remove_overlay(&self.description);
        host.remove_control(&self.control_id());
    }

    fn regenerate(&mut self, host: &mut dyn MapHost, viewport: &Viewport) -> Result<()> {
        let features = match self.kind {
            GridKind::Mercator => {
                mercator::grid(&viewport.bounds, self.level, viewport.zoom, &self.policy)?
            }
            GridKind::H3 => hexgrid::grid(
                &viewport.bounds,
                self.level,
                viewport.zoom,
                &self.policy,
                self.containment,
            )?,
        };
        self.features = features;
        host.set_overlay(&self.description, &self.features);
        Ok(())
    }
}
