//! Click-to-measure distance tool with undo.
//!
//! Every point after the first adds exactly three layers: the segment line,
//! an endpoint dot and a distance label. Undo removes the last batch.

use crate::constants::{MEASURE_LINE_COLOR, MEASURE_LINE_WIDTH};
use crate::geometry::segment_distance;
use crate::model::{LatLng, RouteStyle};
use crate::surface::{LayerHandle, LayerSpec, MapSurface};

/// Layers drawn for one measured segment.
#[derive(Debug, Clone, Copy)]
struct Segment {
    line: LayerHandle,
    endpoint: LayerHandle,
    label: LayerHandle,
    distance: f64,
}

impl Segment {
    fn layers(&self) -> [LayerHandle; 3] {
        [self.line, self.endpoint, self.label]
    }
}

/// Format meters for display: `"850 m"`, `"1.25 km"`.
pub fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{meters:.0} m")
    } else {
        format!("{:.2} km", meters / 1000.0)
    }
}

/// Distance measurement session.
#[derive(Debug, Default)]
pub struct MeasureTool {
    active: bool,
    points: Vec<LatLng>,
    start: Option<LayerHandle>,
    segments: Vec<Segment>,
}

impl MeasureTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn activate(&mut self) {
        if !self.active {
            log::debug!("📏 Measurement started");
            self.active = true;
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn points(&self) -> &[LatLng] {
        &self.points
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Sum of all segment distances in meters.
    pub fn total_distance(&self) -> f64 {
        self.segments.iter().map(|s| s.distance).sum()
    }

    pub fn can_undo(&self) -> bool {
        !self.points.is_empty()
    }

    /// Add a point. Returns `false` if the tool is inactive or the point was rejected.
    pub fn click(&mut self, at: LatLng, surface: &mut dyn MapSurface) -> bool {
        if !self.active {
            return false;
        }
        let Some(at) = LatLng::checked(at.lat, at.lng) else {
            log::debug!("📏 Ignoring invalid measurement point {at:?}");
            return false;
        };

        let Some(&previous) = self.points.last() else {
            self.start = Some(surface.add_layer(LayerSpec::Vertex { at }));
            self.points.push(at);
            return true;
        };

        let distance = segment_distance(previous, at);
        let line = surface.add_layer(LayerSpec::Polyline {
            path: vec![previous, at],
            style: RouteStyle::new(MEASURE_LINE_COLOR, MEASURE_LINE_WIDTH, 1.0),
            dashed: true,
        });
        let endpoint = surface.add_layer(LayerSpec::Vertex { at });
        let label = surface.add_layer(LayerSpec::Label {
            at: midpoint(previous, at),
            text: format_distance(distance),
        });
        self.segments.push(Segment {
            line,
            endpoint,
            label,
            distance,
        });
        self.points.push(at);
        log::debug!(
            "📏 Segment {}: {}, total {}",
            self.segments.len(),
            format_distance(distance),
            format_distance(self.total_distance())
        );
        true
    }

    /// Remove the last point and the layers drawn for it.
    pub fn undo(&mut self, surface: &mut dyn MapSurface) -> bool {
        if self.points.pop().is_none() {
            return false;
        }
        match self.segments.pop() {
            Some(segment) => {
                for handle in segment.layers() {
                    surface.remove_layer(handle);
                }
            }
            None => {
                if let Some(start) = self.start.take() {
                    surface.remove_layer(start);
                }
            }
        }
        true
    }

    /// Leave measurement mode. Nothing survives an exit.
    pub fn exit(&mut self, surface: &mut dyn MapSurface) {
        for segment in self.segments.drain(..) {
            for handle in segment.layers() {
                surface.remove_layer(handle);
            }
        }
        if let Some(start) = self.start.take() {
            surface.remove_layer(start);
        }
        if self.active {
            log::debug!("📏 Measurement cleared ({} points)", self.points.len());
        }
        self.points.clear();
        self.active = false;
    }
}

fn midpoint(a: LatLng, b: LatLng) -> LatLng {
    LatLng::new((a.lat + b.lat) / 2.0, (a.lng + b.lng) / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::fakes::RecordingSurface;

    #[test]
    fn test_format_distance() {
        assert_eq!(format_distance(0.0), "0 m");
        assert_eq!(format_distance(850.4), "850 m");
        assert_eq!(format_distance(1250.0), "1.25 km");
    }

    #[test]
    fn test_inactive_tool_ignores_clicks() {
        let mut surface = RecordingSurface::new();
        let mut tool = MeasureTool::new();
        assert!(!tool.click(LatLng::new(0.0, 0.0), &mut surface));
        assert!(surface.layers().is_empty());
    }

    #[test]
    fn test_each_segment_adds_three_layers() {
        let mut surface = RecordingSurface::new();
        let mut tool = MeasureTool::new();
        tool.activate();
        tool.click(LatLng::new(0.0, 0.0), &mut surface);
        assert_eq!(surface.layers().len(), 1);
        tool.click(LatLng::new(0.0, 1.0), &mut surface);
        assert_eq!(surface.layers().len(), 4);
        tool.click(LatLng::new(1.0, 1.0), &mut surface);
        assert_eq!(surface.layers().len(), 7);
        assert_eq!(tool.segment_count(), 2);
    }

    #[test]
    fn test_undo_to_empty() {
        let mut surface = RecordingSurface::new();
        let mut tool = MeasureTool::new();
        tool.activate();
        tool.click(LatLng::new(0.0, 0.0), &mut surface);
        tool.click(LatLng::new(0.0, 1.0), &mut surface);

        assert!(tool.undo(&mut surface));
        assert_eq!(tool.total_distance(), 0.0);
        assert!(tool.can_undo());
        assert!(tool.undo(&mut surface));
        assert!(!tool.can_undo());
        assert!(surface.layers().is_empty());
        assert!(!tool.undo(&mut surface));
    }

    #[test]
    fn test_non_finite_click_is_dropped() {
        let mut surface = RecordingSurface::new();
        let mut tool = MeasureTool::new();
        tool.activate();
        tool.click(LatLng::new(0.0, 0.0), &mut surface);
        assert!(!tool.click(LatLng::new(f64::NAN, 1.0), &mut surface));
        assert_eq!(tool.points().len(), 1);
        assert_eq!(surface.layers().len(), 1);
    }

    #[test]
    fn test_exit_clears_everything() {
        let mut surface = RecordingSurface::new();
        let mut tool = MeasureTool::new();
        tool.activate();
        tool.click(LatLng::new(0.0, 0.0), &mut surface);
        tool.click(LatLng::new(0.0, 1.0), &mut surface);
        tool.exit(&mut surface);

        assert!(!tool.is_active());
        assert!(tool.points().is_empty());
        assert_eq!(tool.total_distance(), 0.0);
        assert!(surface.layers().is_empty());
    }
}
