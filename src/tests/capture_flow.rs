//! Freehand drawing through the map controller.

use super::fakes::{RecordingSurface, empty_map, map_with, project, settle};
use crate::capture::CapturePhase;
use crate::config::AppConfig;
use crate::error::TrailError;
use crate::geometry::path_distance;
use crate::message::{Key, MapEvent, Tool};
use crate::model::{LatLng, ProjectId};
use crate::surface::{LayerSpec, ScreenPoint};

/// Pins the stroke on a fresh surface and returns the screen positions.
fn pinned(points: &[(f64, f64)]) -> (RecordingSurface, Vec<ScreenPoint>) {
    let mut surface = RecordingSurface::new();
    let screen = points
        .iter()
        .map(|&(lat, lng)| surface.pin(LatLng::new(lat, lng)))
        .collect();
    (surface, screen)
}

#[test]
fn test_freehand_route_is_simplified_before_persisting() {
    let raw = [(10.0, 10.0), (10.0, 10.001), (10.0, 10.002), (10.0005, 10.0015)];
    let (surface, screen) = pinned(&raw);
    let (mut map, backend) = map_with(surface, &AppConfig::default());

    map.select_tool(Tool::Freehand);
    assert_eq!(map.capture_phase(), CapturePhase::Armed);
    assert!(map.handle(MapEvent::PointerDown(screen[0])).is_none());
    assert!(!map.surface().gestures_enabled());
    for &point in &screen[1..] {
        assert!(map.handle(MapEvent::PointerMove(point)).is_none());
    }
    let op = map
        .handle(MapEvent::PointerUp(screen[3]))
        .expect("stroke becomes a route");
    assert!(map.surface().gestures_enabled());
    assert_eq!(map.capture_phase(), CapturePhase::Armed);

    settle(&mut map, op).expect("persisted");
    assert_eq!(backend.len(), 1);
    let route = &map.store().routes()[0];
    assert_eq!(
        route.path(),
        &[LatLng::new(10.0, 10.0), LatLng::new(10.0005, 10.0015)]
    );

    let raw_path: Vec<LatLng> = raw.iter().copied().map(LatLng::from).collect();
    assert!(route.distance() > 0.0);
    assert_eq!(route.distance(), path_distance(route.path()));
    assert!(route.distance() < path_distance(&raw_path));
}

#[test]
fn test_tap_creates_nothing() {
    let (mut map, backend) = empty_map();
    map.select_tool(Tool::Freehand);
    map.handle(MapEvent::PointerDown(ScreenPoint::new(1.0, 1.0)));
    assert!(map.handle(MapEvent::PointerUp(ScreenPoint::new(1.0, 1.0))).is_none());
    assert_eq!(map.capture_phase(), CapturePhase::Armed);
    assert_eq!(backend.calls(), 0);
    assert!(map.surface().gestures_enabled());
}

#[test]
fn test_escape_while_capturing_discards_stroke() {
    let (mut map, backend) = empty_map();
    map.select_tool(Tool::Freehand);
    map.handle(MapEvent::PointerDown(ScreenPoint::new(0.0, 0.0)));
    map.handle(MapEvent::PointerMove(ScreenPoint::new(1.0, 0.0)));
    map.handle(MapEvent::PointerMove(ScreenPoint::new(2.0, 0.0)));
    assert_eq!(map.surface().count_where(LayerSpec::is_dashed), 1);

    map.handle(MapEvent::KeyPressed(Key::Escape));
    assert_eq!(map.tool(), Tool::Select);
    assert_eq!(map.capture_phase(), CapturePhase::Idle);
    assert!(map.surface().gestures_enabled());
    assert!(map.surface().layers().is_empty());

    // A late pointer-up after cancelling must not create anything.
    assert!(map.handle(MapEvent::PointerUp(ScreenPoint::new(2.0, 0.0))).is_none());
    assert_eq!(backend.calls(), 0);
}

#[test]
fn test_new_session_starts_from_empty_path() {
    let (mut map, _backend) = empty_map();
    map.select_tool(Tool::Freehand);
    map.handle(MapEvent::PointerDown(ScreenPoint::new(0.0, 0.0)));
    map.handle(MapEvent::PointerMove(ScreenPoint::new(1.0, 0.0)));
    map.handle(MapEvent::KeyPressed(Key::Escape));

    map.select_tool(Tool::Freehand);
    map.handle(MapEvent::PointerDown(ScreenPoint::new(5.0, 5.0)));
    assert_eq!(map.capture().pending_points(), &[LatLng::new(5.0, 5.0)]);
}

#[test]
fn test_switching_tool_mid_stroke_releases_gestures() {
    let (mut map, _backend) = empty_map();
    map.select_tool(Tool::Freehand);
    map.handle(MapEvent::PointerDown(ScreenPoint::new(0.0, 0.0)));
    assert!(!map.gestures_enabled());

    map.select_tool(Tool::Measure);
    assert_eq!(map.capture_phase(), CapturePhase::Idle);
    assert!(map.gestures_enabled());
    assert!(map.surface().gestures_enabled());
    assert!(map.measure().is_active());
}

#[test]
fn test_every_other_tool_drops_the_stroke() {
    for &other in Tool::all().iter().filter(|&&tool| tool != Tool::Freehand) {
        let (mut map, backend) = empty_map();
        map.select_tool(Tool::Freehand);
        map.handle(MapEvent::PointerDown(ScreenPoint::new(0.0, 0.0)));
        map.handle(MapEvent::PointerMove(ScreenPoint::new(1.0, 0.0)));

        map.select_tool(other);
        assert_eq!(map.capture_phase(), CapturePhase::Idle, "{}", other.name());
        assert!(map.gestures_enabled(), "{}", other.name());
        assert!(map.handle(MapEvent::PointerUp(ScreenPoint::new(1.0, 0.0))).is_none());
        assert_eq!(map.surface().count_where(LayerSpec::is_dashed), 0);
        assert_eq!(backend.calls(), 0);
    }
}

#[test]
fn test_gesture_flag_is_written_in_pairs() {
    let (mut map, _backend) = empty_map();
    map.select_tool(Tool::Freehand);
    for _ in 0..2 {
        map.handle(MapEvent::PointerDown(ScreenPoint::new(0.0, 0.0)));
        map.handle(MapEvent::PointerMove(ScreenPoint::new(1.0, 0.0)));
        if let Some(op) = map.handle(MapEvent::PointerUp(ScreenPoint::new(1.0, 0.0))) {
            settle(&mut map, op).expect("persisted");
        }
    }
    // Initial enable, then disable/enable per stroke.
    assert_eq!(
        map.surface().gesture_calls(),
        &[true, false, true, false, true]
    );
}

#[test]
fn test_response_for_closed_project_is_discarded() {
    let (mut map, backend) = empty_map();
    map.select_tool(Tool::Freehand);
    map.handle(MapEvent::PointerDown(ScreenPoint::new(0.0, 0.0)));
    map.handle(MapEvent::PointerMove(ScreenPoint::new(1.0, 0.0)));
    let op = map
        .handle(MapEvent::PointerUp(ScreenPoint::new(1.0, 0.0)))
        .expect("route request");

    map.load_project(ProjectId::new("proj-2"), Vec::new(), Vec::new());
    assert!(map.surface().layers().is_empty());

    assert!(matches!(settle(&mut map, op), Err(TrailError::StaleSession)));
    assert_eq!(backend.len(), 1);
    assert!(map.store().routes().is_empty());
    assert!(map.surface().layers().is_empty());
    assert!(map.take_notices().is_empty());
}

#[test]
fn test_escape_after_release_keeps_pending_route() {
    let (mut map, _backend) = empty_map();
    map.select_tool(Tool::Freehand);
    let mut ops = Vec::new();
    for y in [0.0, 1.0] {
        map.handle(MapEvent::PointerDown(ScreenPoint::new(0.0, y)));
        map.handle(MapEvent::PointerMove(ScreenPoint::new(1.0, y)));
        ops.extend(map.handle(MapEvent::PointerUp(ScreenPoint::new(1.0, y))));
    }
    map.handle(MapEvent::KeyPressed(Key::Escape));

    assert_eq!(ops.len(), 2);
    for op in ops {
        settle(&mut map, op).expect("same project");
    }
    assert_eq!(map.store().routes().len(), 2);
    assert_eq!(map.layers().len(), 2);
    assert_eq!(map.store().project(), Some(&project()));
}

#[test]
fn test_route_uses_preferred_style() {
    let mut config = AppConfig::default();
    config.preferences.route_color = Some("#112233".to_string());
    let (mut map, _backend) = map_with(RecordingSurface::new(), &config);
    map.select_tool(Tool::Freehand);
    map.handle(MapEvent::PointerDown(ScreenPoint::new(0.0, 0.0)));
    map.handle(MapEvent::PointerMove(ScreenPoint::new(1.0, 0.0)));
    let op = map
        .handle(MapEvent::PointerUp(ScreenPoint::new(1.0, 0.0)))
        .expect("route request");
    settle(&mut map, op).expect("persisted");

    let route = &map.store().routes()[0];
    assert_eq!(route.style.color, "#112233");
    assert_eq!(route.style.width, 3.0);
    assert_eq!(route.name, "Route 1");
}
