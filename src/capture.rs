//! Freehand route capture.
//!
//! `Idle -> Armed -> Capturing -> (Armed | Idle)`. Pointer events are
//! processed synchronously and in arrival order. Completion happens inside
//! [`FreehandCapture::pointer_up`]: the stroke is simplified, measured and
//! handed back, and the tool returns to `Armed`.

use std::time::Duration;

use web_time::Instant;

use crate::config::CaptureConfig;
use crate::constants::MIN_ROUTE_POINTS;
use crate::error::TrailError;
use crate::geometry::{SimplifyOptions, path_distance, simplify_with};
use crate::gesture::{GestureGuard, GestureLock};
use crate::message::Tool;
use crate::model::{LatLng, RouteStyle};
use crate::surface::{LayerHandle, LayerSpec, MapSurface};

/// Observable phase of the freehand tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapturePhase {
    /// Tool inactive; map gestures belong to whoever else holds them
    Idle,
    /// Tool selected, waiting for a pointer press
    Armed,
    /// Pointer held down and points being collected
    Capturing,
}

/// A finished stroke, ready to become a route.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedPath {
    /// Simplified geometry
    pub path: Vec<LatLng>,
    /// Great-circle length of `path` in meters
    pub distance: f64,
    /// Number of points captured before simplification
    pub raw_points: usize,
}

/// One pointer-down to pointer-up drag.
#[derive(Debug)]
struct Stroke {
    path: Vec<LatLng>,
    preview: Option<LayerHandle>,
    last_preview: Option<Instant>,
    // Held for the whole stroke; dropping the stroke re-enables gestures.
    _guard: GestureGuard,
}

#[derive(Debug, Default)]
enum State {
    #[default]
    Idle,
    Armed,
    Capturing(Stroke),
}

/// State machine for drawing a route by dragging.
#[derive(Debug)]
pub struct FreehandCapture {
    state: State,
    options: SimplifyOptions,
    preview_interval: Duration,
    preview_style: RouteStyle,
}

impl FreehandCapture {
    pub fn new(config: &CaptureConfig) -> Self {
        Self {
            state: State::Idle,
            options: config.simplify_options(),
            preview_interval: config.preview_interval(),
            preview_style: RouteStyle::default(),
        }
    }

    pub fn phase(&self) -> CapturePhase {
        match self.state {
            State::Idle => CapturePhase::Idle,
            State::Armed => CapturePhase::Armed,
            State::Capturing(_) => CapturePhase::Capturing,
        }
    }

    /// Points accumulated by the stroke in progress.
    pub fn pending_points(&self) -> &[LatLng] {
        match &self.state {
            State::Capturing(stroke) => &stroke.path,
            _ => &[],
        }
    }

    /// Select the tool. The preview is drawn in the style new routes will get.
    pub fn arm(&mut self, style: RouteStyle) {
        if matches!(self.state, State::Idle) {
            log::debug!("✏️ Freehand armed");
            self.preview_style = style;
            self.state = State::Armed;
        }
    }

    /// Start a stroke. Ignored unless armed.
    pub fn pointer_down(&mut self, at: LatLng, gestures: &GestureLock) -> Result<(), TrailError> {
        if !matches!(self.state, State::Armed) {
            return Ok(());
        }
        let guard = gestures.try_acquire(Tool::Freehand)?;
        let mut path = Vec::new();
        push_point(&mut path, at);
        self.state = State::Capturing(Stroke {
            path,
            preview: None,
            last_preview: None,
            _guard: guard,
        });
        log::debug!("✏️ Freehand stroke started");
        Ok(())
    }

    /// Extend the stroke and refresh the dashed preview at most once per interval.
    pub fn pointer_move(&mut self, at: LatLng, now: Instant, surface: &mut dyn MapSurface) {
        let State::Capturing(stroke) = &mut self.state else {
            return;
        };
        push_point(&mut stroke.path, at);

        let due = stroke
            .last_preview
            .is_none_or(|last| now.saturating_duration_since(last) >= self.preview_interval);
        if !due || stroke.path.len() < MIN_ROUTE_POINTS {
            return;
        }
        if let Some(old) = stroke.preview.take() {
            surface.remove_layer(old);
        }
        stroke.preview = Some(surface.add_layer(LayerSpec::Polyline {
            path: stroke.path.clone(),
            style: self.preview_style.clone(),
            dashed: true,
        }));
        stroke.last_preview = Some(now);
    }

    /// Finish the stroke. Returns `None` for a tap or a stroke with too few points.
    pub fn pointer_up(&mut self, surface: &mut dyn MapSurface) -> Option<CapturedPath> {
        if !matches!(self.state, State::Capturing(_)) {
            return None;
        }
        let State::Capturing(stroke) = std::mem::replace(&mut self.state, State::Armed) else {
            return None;
        };
        let Stroke { path, preview, .. } = stroke;
        if let Some(handle) = preview {
            surface.remove_layer(handle);
        }

        if path.len() < MIN_ROUTE_POINTS {
            log::debug!("✏️ Freehand stroke discarded ({} point(s))", path.len());
            return None;
        }

        let simplified = simplify_with(&path, self.options);
        let distance = path_distance(&simplified);
        log::info!(
            "✏️ Freehand stroke finished: {} -> {} points, {:.0} m",
            path.len(),
            simplified.len(),
            distance
        );
        Some(CapturedPath {
            path: simplified,
            distance,
            raw_points: path.len(),
        })
    }

    /// Drop the tool (Escape or tool switch), discarding any stroke in progress.
    pub fn cancel(&mut self, surface: &mut dyn MapSurface) {
        if let State::Capturing(stroke) = std::mem::take(&mut self.state) {
            if let Some(handle) = stroke.preview {
                surface.remove_layer(handle);
            }
            log::debug!("✏️ Freehand stroke cancelled ({} points)", stroke.path.len());
        }
    }
}

/// Append a point, silently dropping non-finite or out-of-range input.
fn push_point(path: &mut Vec<LatLng>, at: LatLng) {
    match LatLng::checked(at.lat, at.lng) {
        Some(point) => path.push(point),
        None => log::debug!("Dropped invalid capture point {at:?}"),
    }
}
