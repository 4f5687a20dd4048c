//! TrailNote - map annotation core
//!
//! Freehand route capture with path simplification, a click-to-measure tool,
//! and the synchronization contract that keeps rendered map layers, the
//! in-memory feature collection and the hosted backend in step.
//!
//! The map library, the backend, user preferences and the billing side are
//! collaborators reached through traits: [`MapSurface`], [`FeatureBackend`],
//! [`PreferenceSource`] and [`QuotaSource`].

pub mod backend;
pub mod capture;
pub mod config;
pub mod constants;
pub mod error;
pub mod geometry;
pub mod gesture;
pub mod history;
pub mod layers;
pub mod map;
pub mod measure;
pub mod message;
pub mod model;
pub mod panel;
pub mod quota;
pub mod store;
pub mod surface;
pub mod sync;

#[cfg(test)]
mod tests;

pub use backend::{BackendError, FeatureBackend, MemoryBackend};
pub use config::{AppConfig, PreferenceSource};
pub use error::TrailError;
pub use map::TrailMap;
pub use message::{MapEvent, Notice, Tool};
pub use quota::{QuotaSource, Tier};
pub use surface::MapSurface;
pub use sync::{CompletedOp, PendingOp, complete, dispatch};
