// src/grid/mercator.rs
//! Web-Mercator XYZ tile math and tile grids

use super::{FeatureCollection, GridFeature, LevelPolicy};
use crate::bounds::BoundingBox;
use crate::error::Result;
use std::f64::consts::PI;
use std::fmt;
use tracing::debug;

/// Latitude limit of the web-Mercator square, in degrees.
pub const MAX_LATITUDE: f64 = 85.051129;

/// Highest zoom whose tile count per axis still fits into a `u32`.
pub const MAX_ZOOM: u8 = 31;

const EPSILON: f64 = 1e-14;
const LL_EPSILON: f64 = 1e-11;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileAddress {
    pub x: u32,
    pub y: u32,
    pub z: u8,
}

impl TileAddress {
    pub fn new(x: u32, y: u32, z: u8) -> Self {
        Self { x, y, z }
    }

    /// Geographic footprint of the tile.
    pub fn bounds(&self) -> BoundingBox {
        let (north, west) = tile_to_lat_lon(self.x, self.y, self.z);
        let (south, east) = tile_to_lat_lon(self.x + 1, self.y + 1, self.z);
        BoundingBox { south, west, north, east }
    }
}

impl fmt::Display for TileAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Project lat/lon into the unit Mercator square, `(0, 0)` at the
/// upper-left corner.
pub fn project(lat: f64, lon: f64) -> (f64, f64) {
    let x = lon / 360.0 + 0.5;
    let sin_lat = lat.to_radians().sin();
    let y = 0.5 - 0.25 * ((1.0 + sin_lat) / (1.0 - sin_lat)).ln() / PI;
    (x, y)
}

/// Inverse of [`project`].
pub fn unproject(x: f64, y: f64) -> (f64, f64) {
    let lon = (x - 0.5) * 360.0;
    let lat = ((1.0 - 2.0 * y) * PI).sinh().atan().to_degrees();
    (lat, lon)
}

fn axis_to_tile(v: f64, n: f64) -> u32 {
    if v <= 0.0 {
        0
    } else if v >= 1.0 {
        n as u32 - 1
    } else {
        ((v + EPSILON) * n).floor() as u32
    }
}

/// Calculate tile coordinates from lat/lon and zoom level
pub fn lat_lon_to_tile(lat: f64, lon: f64, zoom: u8) -> (u32, u32) {
    let n = 2_f64.powi(zoom as i32);
    let (x, y) = project(lat, lon);
    (axis_to_tile(x, n), axis_to_tile(y, n))
}

/// Calculate lat/lon of the tile's upper-left corner
pub fn tile_to_lat_lon(x: u32, y: u32, zoom: u8) -> (f64, f64) {
    let n = 2_f64.powi(zoom as i32);
    unproject(x as f64 / n, y as f64 / n)
}

/// All tiles at `zoom` whose footprint intersects `bbox`.
///
/// Boxes with `west > east` are split at the antimeridian.
pub fn tiles(bbox: &BoundingBox, zoom: u8) -> Vec<TileAddress> {
    let parts = if bbox.crosses_antimeridian() {
        vec![
            (-180.0, bbox.south, bbox.east, bbox.north),
            (bbox.west, bbox.south, 180.0, bbox.north),
        ]
    } else {
        vec![(bbox.west, bbox.south, bbox.east, bbox.north)]
    };

    let mut out = Vec::new();
    for (west, south, east, north) in parts {
        let west = west.max(-180.0);
        let south = south.max(-MAX_LATITUDE);
        let east = east.min(180.0);
        let north = north.min(MAX_LATITUDE);

        let (ul_x, ul_y) = lat_lon_to_tile(north, west, zoom);
        let (lr_x, lr_y) = lat_lon_to_tile(south + LL_EPSILON, east - LL_EPSILON, zoom);

        for x in ul_x..=lr_x {
            for y in ul_y..=lr_y {
                out.push(TileAddress::new(x, y, zoom));
            }
        }
    }
    out
}

pub fn tile_feature(tile: TileAddress) -> GridFeature {
    let b = tile.bounds();
    GridFeature {
        id: tile.to_string(),
        title: format!("XYZ tile {}", tile),
        ring: vec![
            [b.west, b.south],
            [b.west, b.north],
            [b.east, b.north],
            [b.east, b.south],
            [b.west, b.south],
        ],
    }
}

/// Mercator grid over `bbox` at `level`, bounded by the map's current zoom.
pub fn grid(
    bbox: &BoundingBox,
    level: u8,
    map_zoom: f64,
    policy: &LevelPolicy,
) -> Result<FeatureCollection> {
    policy.check(level, map_zoom)?;
    let features: Vec<GridFeature> = tiles(bbox, level).into_iter().map(tile_feature).collect();
    debug!(level, tiles = features.len(), "mercator grid regenerated");
    Ok(FeatureCollection::new(features))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolError;

    fn intersects(a: &BoundingBox, b: &BoundingBox) -> bool {
        a.west < b.east && a.east > b.west && a.south < b.north && a.north > b.south
    }

    #[test]
    fn test_tile_coordinates() {
        // Test known coordinates
        let (x, y) = lat_lon_to_tile(42.438878, -71.119277, 12);
        assert!(x > 0 && y > 0);

        // Test conversion back
        let (lat, lon) = tile_to_lat_lon(x, y, 12);
        assert!((lat - 42.438878).abs() < 0.1);
        assert!((lon - (-71.119277)).abs() < 0.1);
    }

    #[test]
    fn test_root_tile_for_small_box() {
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0).unwrap();
        let fc = grid(&bbox, 0, 0.0, &LevelPolicy::MERCATOR).unwrap();
        assert_eq!(fc.len(), 1);
        assert_eq!(tiles(&bbox, 0), vec![TileAddress::new(0, 0, 0)]);
        assert_eq!(fc.features[0].id, "0/0/0");
    }

    #[test]
    fn test_edge_on_tile_boundary_is_exclusive() {
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0).unwrap();
        assert_eq!(tiles(&bbox, 1), vec![TileAddress::new(1, 0, 1)]);
    }

    #[test]
    fn test_coverage_matches_brute_force() {
        let bbox = BoundingBox::new(10.5, -30.3, 47.2, 12.7).unwrap();
        let zoom = 3;
        let mut produced = tiles(&bbox, zoom);
        produced.sort();

        let n = 1u32 << zoom;
        let mut expected = Vec::new();
        for x in 0..n {
            for y in 0..n {
                let tile = TileAddress::new(x, y, zoom);
                if intersects(&tile.bounds(), &bbox) {
                    expected.push(tile);
                }
            }
        }
        expected.sort();
        assert_eq!(produced, expected);
    }

    #[test]
    fn test_antimeridian_split() {
        let bbox = BoundingBox::new(-10.0, 170.0, 10.0, -170.0).unwrap();
        let mut xs: Vec<u32> = tiles(&bbox, 2).iter().map(|t| t.x).collect();
        xs.sort();
        xs.dedup();
        assert_eq!(xs, vec![0, 3]);
    }

    #[test]
    fn test_polar_edges_are_clamped() {
        let bbox = BoundingBox::new(-90.0, -180.0, 90.0, 180.0).unwrap();
        assert_eq!(tiles(&bbox, 2).len(), 16);
    }

    #[test]
    fn test_grid_is_idempotent() {
        let bbox = BoundingBox::new(48.1, 11.4, 48.3, 11.7).unwrap();
        let a = grid(&bbox, 12, 10.0, &LevelPolicy::MERCATOR).unwrap();
        let b = grid(&bbox, 12, 10.0, &LevelPolicy::MERCATOR).unwrap();
        assert_eq!(a, b);
        assert!(!a.is_empty());
    }

    #[test]
    fn test_level_above_zoom_plus_four_is_rejected() {
        let bbox = BoundingBox::new(48.1, 11.4, 48.3, 11.7).unwrap();
        let err = grid(&bbox, 15, 10.0, &LevelPolicy::MERCATOR).unwrap_err();
        assert!(matches!(err, ToolError::LevelOutOfRange { level: 15, max: 14 }));
        assert!(grid(&bbox, 14, 10.9, &LevelPolicy::MERCATOR).is_ok());
    }

    #[test]
    fn test_project_round_trip() {
        let (x, y) = project(52.52, 13.405);
        let (lat, lon) = unproject(x, y);
        assert!((lat - 52.52).abs() < 1e-9);
        assert!((lon - 13.405).abs() < 1e-9);
        assert_eq!(project(0.0, 0.0), (0.5, 0.5));
    }

    #[test]
    fn test_tile_bounds_ring() {
        let feature = tile_feature(TileAddress::new(0, 0, 1));
        assert_eq!(feature.ring[0], [-180.0, 0.0]);
        assert!((feature.ring[1][1] - MAX_LATITUDE).abs() < 1e-4);
        assert_eq!(feature.ring.first(), feature.ring.last());
    }
}
