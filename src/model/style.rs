//! Visual style attributes for routes and the base map.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_ROUTE_COLOR, DEFAULT_ROUTE_OPACITY, DEFAULT_ROUTE_WIDTH};

/// Stroke style of a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStyle {
    /// CSS color string, usually `#rrggbb`
    pub color: String,
    /// Stroke width in pixels
    pub width: f32,
    /// Stroke opacity in `[0, 1]`
    pub opacity: f32,
}

impl Default for RouteStyle {
    fn default() -> Self {
        Self {
            color: DEFAULT_ROUTE_COLOR.to_string(),
            width: DEFAULT_ROUTE_WIDTH,
            opacity: DEFAULT_ROUTE_OPACITY,
        }
    }
}

impl RouteStyle {
    pub fn new(color: impl Into<String>, width: f32, opacity: f32) -> Self {
        Self {
            color: color.into(),
            width,
            opacity: opacity.clamp(0.0, 1.0),
        }
    }
}

/// Base tile layer shown under the features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TileLayer {
    #[default]
    Streets,
    Satellite,
    Terrain,
    Topographic,
}

impl TileLayer {
    /// Get the display name for this tile layer.
    pub fn name(&self) -> &'static str {
        match self {
            TileLayer::Streets => "Streets",
            TileLayer::Satellite => "Satellite",
            TileLayer::Terrain => "Terrain",
            TileLayer::Topographic => "Topographic",
        }
    }

    /// Get all tile layers.
    pub fn all() -> &'static [TileLayer] {
        &[
            TileLayer::Streets,
            TileLayer::Satellite,
            TileLayer::Terrain,
            TileLayer::Topographic,
        ]
    }
}
