// src/error.rs
//! Error types for the map tools

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ToolError>;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("empty geometry: no coordinates to compute bounds from")]
    EmptyGeometry,
    #[error("invalid bounds: {0}")]
    InvalidBounds(String),
    #[error("level {level} out of range (max {max})")]
    LevelOutOfRange { level: i32, max: i32 },
    #[error("unknown basemap: {0}")]
    UnknownBasemap(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("geometry error: {0}")]
    Geometry(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("Error: {0}")]
    Other(String),
}
