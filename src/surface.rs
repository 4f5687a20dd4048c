//! Port to the map rendering library.
//!
//! Layers are referred to by opaque [`LayerHandle`]s. The surface knows
//! nothing about features; correlating a handle with a marker or route is
//! the job of [`crate::layers::FeatureLayers`].

use crate::model::{LatLng, RouteStyle, TileLayer};

/// Opaque handle to one visual layer on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerHandle(pub u64);

/// Position on the rendered surface in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

impl ScreenPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// What a layer draws.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerSpec {
    /// Pin for a persisted or pending marker
    Marker { at: LatLng, name: String },
    /// Polyline for a route, a freehand preview or a measurement segment
    Polyline {
        path: Vec<LatLng>,
        style: RouteStyle,
        dashed: bool,
    },
    /// Small dot marking a measurement point
    Vertex { at: LatLng },
    /// Text label (segment distances)
    Label { at: LatLng, text: String },
}

impl LayerSpec {
    pub fn is_dashed(&self) -> bool {
        matches!(self, LayerSpec::Polyline { dashed: true, .. })
    }
}

/// Primitives the map library exposes.
///
/// Pointer and click events flow the other way, as [`crate::message::MapEvent`]s
/// fed to [`crate::map::TrailMap::handle`].
pub trait MapSurface {
    /// Add a layer and return its handle. Handles are never reused.
    fn add_layer(&mut self, spec: LayerSpec) -> LayerHandle;

    /// Remove a layer. Removing an unknown handle is a no-op.
    fn remove_layer(&mut self, handle: LayerHandle);

    /// Enable or disable ambient drag and zoom.
    fn set_gestures_enabled(&mut self, enabled: bool);

    /// Convert a surface position to a geographic coordinate.
    fn to_lat_lng(&self, point: ScreenPoint) -> LatLng;

    /// Convert a geographic coordinate to a surface position.
    fn to_screen(&self, at: LatLng) -> ScreenPoint;

    /// Switch the base map.
    fn set_tile_layer(&mut self, layer: TileLayer);
}
