// src/grid/feature.rs
//! Grid cells as GeoJSON features

use serde_json::{json, Value};

/// One grid cell ready to be pushed to the map host as overlay data.
#[derive(Debug, Clone, PartialEq)]
pub struct GridFeature {
    pub id: String,
    pub title: String,
    /// Closed `[lon, lat]` ring.
    pub ring: Vec<[f64; 2]>,
}

impl GridFeature {
    pub fn to_geojson(&self) -> Value {
        json!({
            "type": "Feature",
            "id": self.id,
            "properties": { "title": self.title },
            "geometry": {
                "type": "Polygon",
                "coordinates": [self.ring]
            }
        })
    }
}

/// A full grid. Each regeneration replaces the previous collection wholesale.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection {
    pub features: Vec<GridFeature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<GridFeature>) -> Self {
        Self { features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.features.iter().map(|f| f.id.as_str())
    }

    pub fn to_geojson(&self) -> Value {
        let features: Vec<Value> = self.features.iter().map(GridFeature::to_geojson).collect();
        json!({
            "type": "FeatureCollection",
            "features": features
        })
    }
}
