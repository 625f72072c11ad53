// src/style.rs
//! Layer style editing, driven either by individual controls or by JSON text

use crate::error::{Result, ToolError};
use crate::host::MapHost;
use serde_json::{Map, Value};
use std::str::FromStr;
use tracing::debug;

/// A layer style object such as `{"color": "#3885ff", "weight": 5}`.
pub type Style = Map<String, Value>;

pub const DEFAULT_COLOR: &str = "#3885ff";
pub const DEFAULT_OPACITY: f64 = 0.5;
pub const DEFAULT_WEIGHT: u32 = 5;
pub const MAX_WEIGHT: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleKind {
    Stroke,
    Fill,
}

impl StyleKind {
    pub fn color_key(&self) -> &'static str {
        match self {
            StyleKind::Stroke => "color",
            StyleKind::Fill => "fillColor",
        }
    }

    pub fn opacity_key(&self) -> &'static str {
        match self {
            StyleKind::Stroke => "opacity",
            StyleKind::Fill => "fillOpacity",
        }
    }
}

impl FromStr for StyleKind {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "stroke" => Ok(StyleKind::Stroke),
            "fill" => Ok(StyleKind::Fill),
            other => Err(ToolError::InvalidArgument(format!(
                "style kind must be \"stroke\" or \"fill\", got {:?}",
                other
            ))),
        }
    }
}

/// Layout hint for the host when it renders the editor's controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
}

impl FromStr for Orientation {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "horizontal" => Ok(Orientation::Horizontal),
            "vertical" => Ok(Orientation::Vertical),
            other => Err(ToolError::InvalidArgument(format!(
                "orientation must be \"horizontal\" or \"vertical\", got {:?}",
                other
            ))),
        }
    }
}

/// One control of a [`StyleEditor`] changed.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleChange {
    Color(String),
    Opacity(f64),
    Weight(u32),
    /// The "stroke on/off" toggle. Disabled editors ignore other changes.
    Enabled(bool),
}

/// Edits color, opacity and weight of one style attribute of a layer.
#[derive(Debug, Clone)]
pub struct StyleEditor {
    pub layer: String,
    pub attr_name: String,
    pub kind: StyleKind,
    pub orientation: Orientation,
    pub enabled: bool,
    pub color: String,
    pub opacity: f64,
    pub weight: u32,
}

impl StyleEditor {
    /// Create an editor for `layer.attr_name`, reading initial control
    /// values from that attribute, then from the layer's base `style`.
    pub fn new(
        host: &dyn MapHost,
        layer: &str,
        attr_name: &str,
        kind: &str,
        orientation: &str,
    ) -> Result<Self> {
        let kind: StyleKind = kind.parse()?;
        let orientation: Orientation = orientation.parse()?;

        let attr = host.layer_style(layer, attr_name).unwrap_or_default();
        let base = host.layer_style(layer, "style").unwrap_or_default();
        let lookup = |key: &str| attr.get(key).or_else(|| base.get(key)).cloned();

        let color = lookup(kind.color_key())
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| DEFAULT_COLOR.to_string());
        let opacity = lookup(kind.opacity_key())
            .and_then(|v| v.as_f64())
            .unwrap_or(DEFAULT_OPACITY);
        let weight = lookup("weight")
            .and_then(|v| v.as_u64())
            .map_or(DEFAULT_WEIGHT, |w| w.min(MAX_WEIGHT as u64) as u32);

        Ok(Self {
            layer: layer.to_string(),
            attr_name: attr_name.to_string(),
            kind,
            orientation,
            enabled: true,
            color,
            opacity,
            weight,
        })
    }

    /// Header text shown next to the controls, e.g. `"stroke style"`.
    pub fn description(&self) -> String {
        let kind = match self.kind {
            StyleKind::Stroke => "stroke",
            StyleKind::Fill => "fill",
        };
        format!("{} {}", kind, self.attr_name)
    }

    /// Apply one control change to the layer's style. Returns whether the
    /// layer was restyled.
    pub fn apply(&mut self, host: &mut dyn MapHost, change: StyleChange) -> bool {
        let (key, value) = match change {
            StyleChange::Enabled(enabled) => {
                self.enabled = enabled;
                return false;
            }
            _ if !self.enabled => return false,
            StyleChange::Color(color) => {
                self.color = color.clone();
                (self.kind.color_key(), Value::from(color))
            }
            StyleChange::Opacity(opacity) => {
                self.opacity = opacity.clamp(0.0, 1.0);
                (self.kind.opacity_key(), Value::from(self.opacity))
            }
            StyleChange::Weight(_) if self.kind == StyleKind::Fill => return false,
            StyleChange::Weight(weight) => {
                self.weight = weight.min(MAX_WEIGHT);
                ("weight", Value::from(self.weight))
            }
        };

        let mut style = host
            .layer_style(&self.layer, &self.attr_name)
            .unwrap_or_default();
        style.insert(key.to_string(), value);
        debug!(layer = %self.layer, attr = %self.attr_name, key, "restyled layer");
        host.set_layer_style(&self.layer, &self.attr_name, style);
        true
    }
}

/// Edits a layer's style as free JSON text.
#[derive(Debug, Clone)]
pub struct StyleTextEditor {
    pub layer: String,
    pub attr_name: String,
    pub text: String,
}

impl StyleTextEditor {
    pub fn new(host: &dyn MapHost, layer: &str, attr_name: &str) -> Result<Self> {
        let style = host.layer_style(layer, attr_name).unwrap_or_default();
        let text = serde_json::to_string_pretty(&style)?;
        Ok(Self {
            layer: layer.to_string(),
            attr_name: attr_name.to_string(),
            text,
        })
    }

    /// Called after every edit of the text. Text that is not a JSON object
    /// is kept but not applied. Returns whether the layer was restyled.
    pub fn text_changed(&mut self, host: &mut dyn MapHost, text: &str) -> bool {
        self.text = text.to_string();
        match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(style)) => {
                host.set_layer_style(&self.layer, &self.attr_name, style);
                true
            }
            _ => false,
        }
    }
}
