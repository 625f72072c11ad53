// src/config.rs
//! Configuration management with file-based storage

use crate::error::{Result, ToolError};
use crate::grid::{Containment, GridKind, LevelPolicy};
use crate::style::Style;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Mercator grid levels may reach the map zoom plus this.
    pub mercator_max_zoom_delta: i32,
    /// H3 resolutions may reach the map zoom plus this (usually negative).
    pub h3_max_zoom_delta: i32,
    pub h3_containment: Containment,
    pub default_basemap: String,
    /// Style hosts should apply to grid overlays.
    pub grid_style: Style,
    pub grid_hover_style: Style,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            mercator_max_zoom_delta: LevelPolicy::MERCATOR.max_zoom_delta,
            h3_max_zoom_delta: LevelPolicy::H3.max_zoom_delta,
            h3_containment: Containment::default(),
            default_basemap: "OpenStreetMap.Mapnik".to_string(),
            grid_style: style_object(json!({"color": "#888888", "weight": 1, "fillOpacity": 0})),
            grid_hover_style: style_object(json!({"weight": 3, "fillOpacity": 0.1})),
        }
    }
}

fn style_object(value: serde_json::Value) -> Style {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Style::new(),
    }
}

impl ToolsConfig {
    /// Level policy for a grid kind, with the configured zoom delta.
    pub fn policy(&self, kind: GridKind) -> LevelPolicy {
        let delta = match kind {
            GridKind::Mercator => self.mercator_max_zoom_delta,
            GridKind::H3 => self.h3_max_zoom_delta,
        };
        kind.default_policy().with_delta(delta)
    }

    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    /// Load from a config file; a missing file gives the defaults
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            debug!(path = %config_path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(config_path)
            .map_err(|e| ToolError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ToolError::Config(format!("Failed to parse config file: {}", e)))?;

        Ok(config)
    }

    /// Save to a config file, creating its directory if needed
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ToolError::Config(format!("Failed to create config directory: {}", e)))?;
        }

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| ToolError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(config_path, contents)
            .map_err(|e| ToolError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Get config file path
    pub fn get_config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .map_err(|_| ToolError::Config("HOME environment variable not set".to_string()))?;

        Ok(PathBuf::from(home)
            .join(".config")
            .join("leafmap-tools")
            .join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ToolsConfig::default();
        assert_eq!(config.policy(GridKind::Mercator), LevelPolicy::MERCATOR);
        assert_eq!(config.policy(GridKind::H3), LevelPolicy::H3);
        assert_eq!(config.grid_style["color"], json!("#888888"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: ToolsConfig =
            serde_json::from_str("{\"h3_max_zoom_delta\": 1, \"h3_containment\": \"centroid\"}").unwrap();
        assert_eq!(config.policy(GridKind::H3).max_level(4.0), Some(5));
        assert_eq!(config.h3_containment, Containment::Centroid);
        assert_eq!(config.mercator_max_zoom_delta, 4);
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir()
            .join(format!("leafmap-tools-config-{}", std::process::id()))
            .join("config.json");
        let mut config = ToolsConfig::default();
        config.default_basemap = "CartoDB.Positron".to_string();
        config.save_to(&path).unwrap();

        let loaded = ToolsConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("leafmap-tools-no-such-config.json");
        assert_eq!(ToolsConfig::load_from(&path).unwrap(), ToolsConfig::default());
    }
}
