// src/bounds.rs
//! Geographic bounding boxes and bounds computation for GeoJSON values

use crate::error::{Result, ToolError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A geographic bounding box in degrees.
///
/// Fields are named so callers never depend on argument order. `west` and
/// `east` are kept as given; a box crossing the antimeridian has
/// `west > east`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    /// Create a bounding box, rejecting non-finite edges and `south > north`.
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Result<Self> {
        if ![south, west, north, east].iter().all(|v| v.is_finite()) {
            return Err(ToolError::InvalidBounds(format!(
                "non-finite edge in ({}, {}, {}, {})",
                south, west, north, east
            )));
        }
        if south > north {
            return Err(ToolError::InvalidBounds(format!(
                "south {} is greater than north {}",
                south, north
            )));
        }
        Ok(Self { south, west, north, east })
    }

    /// Build from the host's `((south, west), (north, east))` pair.
    pub fn from_corners(south_west: (f64, f64), north_east: (f64, f64)) -> Result<Self> {
        Self::new(south_west.0, south_west.1, north_east.0, north_east.1)
    }

    /// `((south, west), (north, east))`, the shape map hosts report.
    pub fn corners(&self) -> ((f64, f64), (f64, f64)) {
        ((self.south, self.west), (self.north, self.east))
    }

    pub fn crosses_antimeridian(&self) -> bool {
        self.west > self.east
    }

    /// Closed `[lon, lat]` ring around the box, first vertex repeated last.
    pub fn ring(&self) -> Vec<[f64; 2]> {
        vec![
            [self.west, self.south],
            [self.west, self.north],
            [self.east, self.north],
            [self.east, self.south],
            [self.west, self.south],
        ]
    }

    /// Center as `(lat, lon)`.
    pub fn center(&self) -> (f64, f64) {
        ((self.south + self.north) / 2.0, (self.west + self.east) / 2.0)
    }
}

/// Calculate the bounds of any GeoJSON value.
///
/// Accepts bare coordinate arrays, geometries, geometry collections,
/// features and feature collections, at any nesting depth.
pub fn bounds(geojson: &Value) -> Result<BoundingBox> {
    let mut south = f64::INFINITY;
    let mut north = f64::NEG_INFINITY;
    let mut west = f64::INFINITY;
    let mut east = f64::NEG_INFINITY;
    let mut seen = 0usize;

    for_each_coord(geojson, &mut |lon, lat| {
        south = south.min(lat);
        north = north.max(lat);
        west = west.min(lon);
        east = east.max(lon);
        seen += 1;
    });

    if seen == 0 {
        return Err(ToolError::EmptyGeometry);
    }
    BoundingBox::new(south, west, north, east)
}

/// Collect every `(lon, lat)` pair of a GeoJSON value.
pub fn coords(geojson: &Value) -> Vec<(f64, f64)> {
    let mut out = Vec::new();
    for_each_coord(geojson, &mut |lon, lat| out.push((lon, lat)));
    out
}

fn for_each_coord(value: &Value, f: &mut impl FnMut(f64, f64)) {
    match value {
        Value::Object(obj) => match obj.get("type").and_then(Value::as_str) {
            Some("Feature") => {
                if let Some(geometry) = obj.get("geometry") {
                    for_each_coord(geometry, f);
                }
            }
            Some("FeatureCollection") => {
                if let Some(Value::Array(features)) = obj.get("features") {
                    features.iter().for_each(|feat| for_each_coord(feat, f));
                }
            }
            Some("GeometryCollection") => {
                if let Some(Value::Array(geometries)) = obj.get("geometries") {
                    geometries.iter().for_each(|geom| for_each_coord(geom, f));
                }
            }
            _ => {
                if let Some(coordinates) = obj.get("coordinates") {
                    walk_positions(coordinates, f);
                }
            }
        },
        Value::Array(_) => walk_positions(value, f),
        _ => {}
    }
}

fn walk_positions(value: &Value, f: &mut impl FnMut(f64, f64)) {
    let Value::Array(items) = value else {
        return;
    };
    // A position is an array of numbers; altitude and beyond are ignored.
    if items.len() >= 2 && items.iter().all(Value::is_number) {
        if let (Some(lon), Some(lat)) = (items[0].as_f64(), items[1].as_f64()) {
            f(lon, lat);
        }
        return;
    }
    for item in items {
        walk_positions(item, f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_point_bounds() {
        let b = bounds(&json!({"type": "Point", "coordinates": [13.4, 52.5]})).unwrap();
        assert_eq!(b, BoundingBox { south: 52.5, west: 13.4, north: 52.5, east: 13.4 });
    }

    #[test]
    fn test_feature_collection_bounds() {
        let fc = json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {},
                 "geometry": {"type": "LineString", "coordinates": [[-10.0, 5.0], [3.0, -2.0]]}},
                {"type": "Feature", "properties": {},
                 "geometry": {"type": "MultiPolygon", "coordinates": [[[[20.0, 40.0, 100.0], [21.0, 41.0, 100.0], [20.0, 40.0, 100.0]]]]}}
            ]
        });
        let b = bounds(&fc).unwrap();
        assert_eq!(b.south, -2.0);
        assert_eq!(b.north, 41.0);
        assert_eq!(b.west, -10.0);
        assert_eq!(b.east, 21.0);
    }

    #[test]
    fn test_geometry_collection_bounds() {
        let gc = json!({
            "type": "GeometryCollection",
            "geometries": [
                {"type": "Point", "coordinates": [1.0, 1.0]},
                {"type": "Polygon", "coordinates": [[[0.0, 0.0], [4.0, 0.0], [4.0, 3.0], [0.0, 0.0]]]}
            ]
        });
        let b = bounds(&gc).unwrap();
        assert!(b.south <= b.north);
        assert!(b.west <= b.east);
        assert_eq!(b.corners(), ((0.0, 0.0), (3.0, 4.0)));
    }

    #[test]
    fn test_empty_geometry_fails() {
        let empty = json!({"type": "FeatureCollection", "features": []});
        assert!(matches!(bounds(&empty), Err(ToolError::EmptyGeometry)));
        assert!(matches!(bounds(&json!({"type": "Feature", "geometry": null})), Err(ToolError::EmptyGeometry)));
    }

    #[test]
    fn test_bounding_box_rejects_inverted_latitudes() {
        assert!(BoundingBox::new(10.0, 0.0, -10.0, 1.0).is_err());
        assert!(BoundingBox::new(0.0, f64::NAN, 1.0, 1.0).is_err());
        // West/east are not normalized.
        assert!(BoundingBox::new(0.0, 170.0, 1.0, -170.0).unwrap().crosses_antimeridian());
    }

    #[test]
    fn test_ring_is_closed() {
        let ring = BoundingBox::new(0.0, 0.0, 1.0, 1.0).unwrap().ring();
        assert_eq!(ring.len(), 5);
        assert_eq!(ring.first(), ring.last());
    }
}
