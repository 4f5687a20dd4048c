//! Global constants for TrailNote

/// Default simplification tolerance in coordinate degrees (~100 m at mid latitudes).
///
/// Applied uniformly to latitude and longitude; configurable through
/// [`CaptureConfig`](crate::config::CaptureConfig).
pub const DEFAULT_SIMPLIFY_TOLERANCE: f64 = 0.001;

/// Minimum wall time between two freehand preview redraws, in milliseconds.
pub const DEFAULT_PREVIEW_INTERVAL_MS: u64 = 300;

/// Minimum number of captured points for a freehand stroke to become a route.
pub const MIN_ROUTE_POINTS: usize = 2;

/// Fallback route color when the user has no preference.
pub const DEFAULT_ROUTE_COLOR: &str = "#3388ff";

/// Fallback route stroke width in pixels.
pub const DEFAULT_ROUTE_WIDTH: f32 = 3.0;

/// Fallback route opacity.
pub const DEFAULT_ROUTE_OPACITY: f32 = 0.8;

/// Color of measurement segments.
pub const MEASURE_LINE_COLOR: &str = "#e4572e";

/// Stroke width of measurement segments.
pub const MEASURE_LINE_WIDTH: f32 = 2.0;

/// Free tier limits.
pub mod free_tier {
    /// Markers allowed per project.
    pub const MAX_MARKERS: usize = 30;
    /// Routes allowed per project.
    pub const MAX_ROUTES: usize = 5;
}

/// Paid tier limits.
pub mod paid_tier {
    /// Markers allowed per project.
    pub const MAX_MARKERS: usize = 90;
    /// Routes allowed per project.
    pub const MAX_ROUTES: usize = 15;
}

/// Default number of feature mutations kept for undo.
pub const DEFAULT_MAX_HISTORY: usize = 100;
