//! Data models for TrailNote.

mod feature;
mod point;
mod style;

pub use feature::{
    Feature, FeatureDraft, FeatureId, FeatureKind, FeaturePatch, FeatureRef, FeatureStatus, Marker,
    MarkerDraft, MarkerPatch, ProjectId, Route, RouteDraft, RoutePatch,
};
pub use point::{LatLng, wrap_longitude};
pub use style::{RouteStyle, TileLayer};
