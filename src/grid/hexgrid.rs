// src/grid/hexgrid.rs
//! H3 hexagonal grids

use super::{FeatureCollection, GridFeature, LevelPolicy};
use crate::bounds::BoundingBox;
use crate::error::{Result, ToolError};
use geo::{LineString, Polygon};
use h3o::geom::{ContainmentMode, TilerBuilder};
use h3o::{CellIndex, Resolution};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const MAX_RESOLUTION: u8 = 15;

/// Which cells count as covering the box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Containment {
    /// Cell centroid lies inside the box.
    Centroid,
    /// Cell lies fully inside the box.
    Contains,
    /// Cell touches the box.
    #[default]
    Intersects,
    /// Like `Intersects`, and a box smaller than a cell still yields one.
    Covers,
}

impl From<Containment> for ContainmentMode {
    fn from(value: Containment) -> Self {
        match value {
            Containment::Centroid => ContainmentMode::ContainsCentroid,
            Containment::Contains => ContainmentMode::ContainsBoundary,
            Containment::Intersects => ContainmentMode::IntersectsBoundary,
            Containment::Covers => ContainmentMode::Covers,
        }
    }
}

/// Widest longitude span handed to the tiler in one polygon. Edges longer
/// than 180 degrees are read as crossing the antimeridian.
const MAX_PIECE_WIDTH: f64 = 90.0;

/// Split `bbox` into polygons the tiler reads unambiguously: clamped to the
/// globe, cut at the antimeridian when `west > east`, and cut again into
/// pieces at most [`MAX_PIECE_WIDTH`] wide.
fn bbox_polygons(bbox: &BoundingBox) -> Vec<Polygon<f64>> {
    let spans = if bbox.crosses_antimeridian() {
        vec![(bbox.west, 180.0), (-180.0, bbox.east)]
    } else {
        vec![(bbox.west, bbox.east)]
    };
    let south = bbox.south.clamp(-90.0, 90.0);
    let north = bbox.north.clamp(-90.0, 90.0);

    let mut polygons = Vec::new();
    for (west, east) in spans {
        let west = west.clamp(-180.0, 180.0);
        let east = east.clamp(-180.0, 180.0);
        let width = east - west;
        if width <= 0.0 && bbox.crosses_antimeridian() {
            continue;
        }
        let count = (width / MAX_PIECE_WIDTH).ceil().max(1.0) as usize;
        let step = width / count as f64;
        for i in 0..count {
            let piece_west = west + step * i as f64;
            let piece_east = if i + 1 == count { east } else { west + step * (i + 1) as f64 };
            let ring = vec![
                (piece_west, south),
                (piece_west, north),
                (piece_east, north),
                (piece_east, south),
                (piece_west, south),
            ];
            polygons.push(Polygon::new(LineString::from(ring), vec![]));
        }
    }
    polygons
}

/// H3 cells covering `bbox` at `resolution`, sorted by index.
pub fn cells(
    bbox: &BoundingBox,
    resolution: Resolution,
    containment: Containment,
) -> Result<Vec<CellIndex>> {
    if ![bbox.south, bbox.west, bbox.north, bbox.east].iter().all(|v| v.is_finite()) {
        return Err(ToolError::InvalidBounds(format!("non-finite box {:?}", bbox)));
    }
    let mut tiler = TilerBuilder::new(resolution)
        .containment_mode(containment.into())
        .build();
    for polygon in bbox_polygons(bbox) {
        tiler
            .add(polygon)
            .map_err(|e| ToolError::Geometry(e.to_string()))?;
    }

    let mut cells: Vec<CellIndex> = tiler.into_coverage().collect();
    cells.sort_unstable_by_key(|cell| u64::from(*cell));
    cells.dedup();
    Ok(cells)
}

pub fn cell_feature(cell: CellIndex) -> GridFeature {
    let mut ring: Vec<[f64; 2]> = cell
        .boundary()
        .iter()
        .map(|vertex| [vertex.lng(), vertex.lat()])
        .collect();
    if let Some(first) = ring.first().copied() {
        ring.push(first);
    }
    GridFeature {
        id: cell.to_string(),
        title: format!("H3 cell {} (res {})", cell, u8::from(cell.resolution())),
        ring,
    }
}

/// H3 grid over `bbox` at `level`, bounded by the map's current zoom.
pub fn grid(
    bbox: &BoundingBox,
    level: u8,
    map_zoom: f64,
    policy: &LevelPolicy,
    containment: Containment,
) -> Result<FeatureCollection> {
    policy.check(level, map_zoom)?;
    let resolution =
        Resolution::try_from(level).map_err(|e| ToolError::InvalidArgument(e.to_string()))?;
    let features: Vec<GridFeature> = cells(bbox, resolution, containment)?
        .into_iter()
        .map(cell_feature)
        .collect();
    debug!(level, cells = features.len(), "h3 grid regenerated");
    Ok(FeatureCollection::new(features))
}
