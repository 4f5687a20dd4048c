//! Measurement through the map controller.

use super::fakes::{empty_map, loaded_map, marker};
use crate::config::AppConfig;
use crate::geometry::segment_distance;
use crate::message::{Key, MapEvent, Tool};
use crate::model::LatLng;
use crate::surface::{LayerSpec, ScreenPoint};

fn click(x: f32, y: f32) -> MapEvent {
    MapEvent::MapClick(ScreenPoint::new(x, y))
}

#[test]
fn test_undo_restores_previous_measurement_exactly() {
    let (mut map, _backend) = empty_map();
    map.select_tool(Tool::Measure);
    map.handle(click(0.0, 0.0));
    map.handle(click(1.0, 0.0));
    assert_eq!(map.surface().layers().len(), 4);
    let before: Vec<LayerSpec> = map.surface().layers().values().cloned().collect();
    let total = map.measure().total_distance();

    map.handle(click(1.0, 1.0));
    assert_eq!(map.surface().layers().len(), 7);
    assert!(map.measure_undo());

    let after: Vec<LayerSpec> = map.surface().layers().values().cloned().collect();
    assert_eq!(after, before);
    assert_eq!(map.measure().total_distance(), total);
    assert_eq!(map.measure().segment_count(), 1);
    assert!(map.measure().can_undo());
    assert_eq!(
        map.measure().points(),
        &[LatLng::new(0.0, 0.0), LatLng::new(0.0, 1.0)]
    );
}

#[test]
fn test_total_is_sum_of_segments() {
    let (mut map, _backend) = empty_map();
    map.select_tool(Tool::Measure);
    for (x, y) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)] {
        map.handle(click(x, y));
    }
    let expected = segment_distance(LatLng::new(0.0, 0.0), LatLng::new(0.0, 1.0))
        + segment_distance(LatLng::new(0.0, 1.0), LatLng::new(1.0, 1.0));
    assert!((map.measure().total_distance() - expected).abs() < 1e-6);
    assert_eq!(map.measure().segment_count(), 2);
}

#[test]
fn test_measurement_leaves_features_untouched() {
    let (mut map, backend) =
        loaded_map(vec![marker("a", 5.0, 5.0)], Vec::new(), &AppConfig::default());
    map.select_tool(Tool::Measure);
    map.handle(click(0.0, 0.0));
    map.handle(click(1.0, 0.0));

    map.handle(MapEvent::KeyPressed(Key::Escape));
    assert_eq!(map.tool(), Tool::Select);
    assert!(!map.measure().is_active());
    assert_eq!(map.surface().layers().len(), 1);
    assert_eq!(map.layers().len(), 1);
    assert_eq!(backend.calls(), 0);
}

#[test]
fn test_toggle_measure_clears_points() {
    let (mut map, _backend) = empty_map();
    map.toggle_tool(Tool::Measure);
    map.handle(click(0.0, 0.0));
    map.toggle_tool(Tool::Measure);
    assert_eq!(map.tool(), Tool::Select);
    assert!(map.measure().points().is_empty());
    assert!(map.surface().layers().is_empty());

    // Clicks outside the tool do nothing.
    map.handle(click(2.0, 2.0));
    assert!(map.surface().layers().is_empty());
}

#[test]
fn test_undo_down_to_nothing() {
    let (mut map, _backend) = empty_map();
    map.select_tool(Tool::Measure);
    map.handle(click(0.0, 0.0));
    map.handle(click(1.0, 0.0));
    assert!(map.measure_undo());
    assert!(map.measure_undo());
    assert!(!map.measure_undo());
    assert!(!map.measure().can_undo());
    assert!(map.surface().layers().is_empty());
    assert!(map.measure().is_active());
}
