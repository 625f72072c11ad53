// src/host.rs
//! The interactive map the tools are attached to

use crate::basemaps::Basemap;
use crate::bounds::BoundingBox;
use crate::grid::mercator::{self, MAX_LATITUDE};
use crate::grid::FeatureCollection;
use crate::style::Style;
use std::collections::{BTreeMap, HashMap};

/// Tile edge length in pixels used for viewport math.
pub const TILE_SIZE: f64 = 256.0;

/// Current visible extent of a map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// `(lat, lon)`
    pub center: (f64, f64),
    pub zoom: f64,
    pub bounds: BoundingBox,
}

/// Interface of the map host rendering the map and its controls.
pub trait MapHost {
    fn viewport(&self) -> Viewport;

    fn set_center(&mut self, center: (f64, f64));

    fn set_zoom(&mut self, zoom: f64);

    /// Add or replace the overlay layer `name`.
    fn set_overlay(&mut self, name: &str, data: &FeatureCollection);

    fn remove_overlay(&mut self, name: &str);

    /// Name of the current base tile layer, if any.
    fn base_layer(&self) -> Option<String>;

    fn set_base_layer(&mut self, basemap: &Basemap);

    fn layer_style(&self, layer: &str, attr_name: &str) -> Option<Style>;

    fn set_layer_style(&mut self, layer: &str, attr_name: &str, style: Style);

    fn add_control(&mut self, id: &str);

    fn remove_control(&mut self, id: &str);

    /// Register interest in viewport-changed notifications. Notifications
    /// flow while at least one subscriber is registered.
    fn subscribe_viewport(&mut self);

    fn unsubscribe_viewport(&mut self);
}

/// In-memory map used by the CLI and in tests.
///
/// Bounds follow from center, zoom and the pixel size of the map, the same
/// way a web map derives them.
#[derive(Debug, Clone)]
pub struct HeadlessMap {
    center: (f64, f64),
    zoom: f64,
    size: (u32, u32),
    overlays: BTreeMap<String, FeatureCollection>,
    base_layer: Option<Basemap>,
    styles: HashMap<(String, String), Style>,
    controls: Vec<String>,
    subscribers: usize,
    pending: Vec<Viewport>,
}

impl Default for HeadlessMap {
    fn default() -> Self {
        Self::new((0.0, 0.0), 2.0, (1024, 768))
    }
}

impl HeadlessMap {
    pub fn new(center: (f64, f64), zoom: f64, size: (u32, u32)) -> Self {
        Self {
            center,
            zoom,
            size,
            overlays: BTreeMap::new(),
            base_layer: None,
            styles: HashMap::new(),
            controls: Vec::new(),
            subscribers: 0,
            pending: Vec::new(),
        }
    }

    pub fn bounds(&self) -> BoundingBox {
        let scale = TILE_SIZE * 2_f64.powf(self.zoom);
        let (cx, cy) = mercator::project(self.center.0, self.center.1);
        let half_w = self.size.0 as f64 / 2.0 / scale;
        let half_h = self.size.1 as f64 / 2.0 / scale;

        let (north, west) = mercator::unproject(cx - half_w, (cy - half_h).max(0.0));
        let (south, east) = mercator::unproject(cx + half_w, (cy + half_h).min(1.0));
        BoundingBox {
            south: south.max(-MAX_LATITUDE),
            west,
            north: north.min(MAX_LATITUDE),
            east,
        }
    }

    /// Viewport-changed notifications delivered since the last call.
    pub fn take_notifications(&mut self) -> Vec<Viewport> {
        std::mem::take(&mut self.pending)
    }

    pub fn is_watching(&self) -> bool {
        self.subscribers > 0
    }

    pub fn overlay(&self, name: &str) -> Option<&FeatureCollection> {
        self.overlays.get(name)
    }

    pub fn overlay_names(&self) -> impl Iterator<Item = &str> {
        self.overlays.keys().map(String::as_str)
    }

    pub fn controls(&self) -> &[String] {
        &self.controls
    }

    fn notify(&mut self) {
        if self.is_watching() {
            let viewport = self.viewport();
            self.pending.push(viewport);
        }
    }
}

impl MapHost for HeadlessMap {
    fn viewport(&self) -> Viewport {
        Viewport {
            center: self.center,
            zoom: self.zoom,
            bounds: self.bounds(),
        }
    }

    fn set_center(&mut self, center: (f64, f64)) {
        self.center = center;
        self.notify();
    }

    fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom;
        self.notify();
    }

    fn set_overlay(&mut self, name: &str, data: &FeatureCollection) {
        self.overlays.insert(name.to_string(), data.clone());
    }

    fn remove_overlay(&mut self, name: &str) {
        self.overlays.remove(name);
    }

    fn base_layer(&self) -> Option<String> {
        self.base_layer.as_ref().map(|b| b.name.clone())
    }

    fn set_base_layer(&mut self, basemap: &Basemap) {
        self.base_layer = Some(basemap.clone());
    }

    fn layer_style(&self, layer: &str, attr_name: &str) -> Option<Style> {
        self.styles
            .get(&(layer.to_string(), attr_name.to_string()))
            .cloned()
    }

    fn set_layer_style(&mut self, layer: &str, attr_name: &str, style: Style) {
        self.styles
            .insert((layer.to_string(), attr_name.to_string()), style);
    }

    fn add_control(&mut self, id: &str) {
        if !self.controls.iter().any(|c| c == id) {
            self.controls.push(id.to_string());
        }
    }

    fn remove_control(&mut self, id: &str) {
        self.controls.retain(|c| c != id);
    }

    fn subscribe_viewport(&mut self) {
        self.subscribers += 1;
    }

    fn unsubscribe_viewport(&mut self) {
        self.subscribers = self.subscribers.saturating_sub(1);
    }
}
