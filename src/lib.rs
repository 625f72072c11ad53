// src/lib.rs
//! Map Tools Library
//!
//! Headless core of a set of interactive map helpers: Mercator and H3 tile
//! grids over the visible map, basemap switching, layer style editing and a
//! recorder/player for map viewport changes. The map itself is reached
//! through the [`MapHost`] trait.

pub mod basemaps;
pub mod bounds;
pub mod config;
pub mod error;
pub mod grid;
pub mod host;
pub mod recording;
pub mod session;
pub mod style;

// Re-export main types for convenience
pub use bounds::{bounds, BoundingBox};
pub use error::{Result, ToolError};
pub use grid::{FeatureCollection, GridKind, GridTool, LevelPolicy};
pub use host::{HeadlessMap, MapHost, Viewport};
pub use recording::{Recording, RecordingEvent};
pub use session::{MapSession, ToolEvent};
