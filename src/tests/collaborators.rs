//! Subscription and preference sources plugged into the map.

use std::cell::Cell;
use std::rc::Rc;

use super::fakes::{RecordingSurface, marker, project, settle};
use crate::backend::MemoryBackend;
use crate::config::{AppConfig, PreferenceSource};
use crate::error::TrailError;
use crate::map::TrailMap;
use crate::message::{MapEvent, NoticeLevel, Tool};
use crate::model::{FeatureDraft, LatLng, MarkerDraft, RouteStyle, TileLayer};
use crate::quota::{QuotaLimits, QuotaPolicy, QuotaSource, StaticQuota, Tier};
use crate::surface::{LayerSpec, ScreenPoint};

fn policy(free_markers: usize, paid_markers: usize) -> QuotaPolicy {
    let mut policy = QuotaPolicy::default();
    policy.free.markers_per_project = free_markers;
    policy.paid.markers_per_project = paid_markers;
    policy
}

fn camp() -> FeatureDraft {
    FeatureDraft::Marker(MarkerDraft::new(project(), "Camp", LatLng::new(1.0, 2.0)))
}

/// Tier that can change while the map is open.
struct Subscription {
    tier: Rc<Cell<Tier>>,
    policy: QuotaPolicy,
}

impl QuotaSource for Subscription {
    fn tier(&self) -> Tier {
        self.tier.get()
    }

    fn limits(&self) -> QuotaLimits {
        self.policy.limits(self.tier.get())
    }
}

struct TrailPreferences;

impl PreferenceSource for TrailPreferences {
    fn route_style(&self) -> RouteStyle {
        RouteStyle::new("#aa5500", 6.0, 0.9)
    }

    fn tile_layer(&self) -> TileLayer {
        TileLayer::Topographic
    }
}

#[test]
fn test_paid_tier_lifts_free_limit() {
    let mut config = AppConfig::default();
    config.quota = policy(1, 2);
    let backend = Rc::new(MemoryBackend::new());
    let mut map = TrailMap::new(RecordingSurface::new(), backend.clone(), &config)
        .with_quota(StaticQuota::new(Tier::Paid, config.quota));
    map.load_project(project(), vec![marker("a", 1.0, 1.0)], Vec::new());

    let op = map.begin_create(camp()).expect("within the paid limit");
    settle(&mut map, op).expect("persisted");
    assert_eq!(map.store().markers().len(), 2);

    map.select_tool(Tool::PlaceMarker);
    assert!(map.handle(MapEvent::MapClick(ScreenPoint::new(3.0, 3.0))).is_none());
    let notices = map.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Warning);
    assert_eq!(
        notices[0].message,
        "Paid plan allows at most 2 markers per project"
    );
    assert_eq!(backend.calls(), 1);
}

#[test]
fn test_upgrade_applies_to_the_open_map() {
    let mut config = AppConfig::default();
    config.quota = policy(1, 2);
    let tier = Rc::new(Cell::new(Tier::Free));
    let backend = Rc::new(MemoryBackend::new());
    let mut map = TrailMap::new(RecordingSurface::new(), backend, &config).with_quota(Subscription {
        tier: Rc::clone(&tier),
        policy: config.quota,
    });
    map.load_project(project(), vec![marker("a", 1.0, 1.0)], Vec::new());

    assert!(matches!(
        map.begin_create(camp()),
        Err(TrailError::QuotaExceeded {
            tier: Tier::Free,
            limit: 1,
            ..
        })
    ));

    tier.set(Tier::Paid);
    let op = map.begin_create(camp()).expect("upgraded");
    settle(&mut map, op).expect("persisted");
    assert_eq!(map.store().markers().len(), 2);
}

#[test]
fn test_preference_source_drives_style_and_tiles() {
    let backend = Rc::new(MemoryBackend::new());
    let mut map = TrailMap::new(RecordingSurface::new(), backend, &AppConfig::default())
        .with_preferences(TrailPreferences);
    map.load_project(project(), Vec::new(), Vec::new());
    assert_eq!(map.surface().tile_layer(), Some(TileLayer::Topographic));

    map.select_tool(Tool::Freehand);
    map.handle(MapEvent::PointerDown(ScreenPoint::new(0.0, 0.0)));
    map.handle(MapEvent::PointerMove(ScreenPoint::new(1.0, 0.0)));
    let op = map
        .handle(MapEvent::PointerUp(ScreenPoint::new(1.0, 0.0)))
        .expect("route request");
    settle(&mut map, op).expect("persisted");

    let expected = TrailPreferences.route_style();
    assert_eq!(map.store().routes()[0].style, expected);
    assert_eq!(
        map.surface()
            .count_where(|spec| matches!(spec, LayerSpec::Polyline { style, .. } if *style == expected)),
        1
    );
}
