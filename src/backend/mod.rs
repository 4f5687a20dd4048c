//! Persistence collaborator.
//!
//! The hosted backend is reached only through [`FeatureBackend`]. Calls may
//! suspend and may fail; nothing in the crate assumes otherwise.

mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{Feature, FeatureDraft, FeaturePatch, FeatureRef};

pub use memory::{FailOn, MemoryBackend};

/// Errors reported by the persistence collaborator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    /// Request never got an answer
    #[error("network error: {0}")]
    Network(String),

    /// Backend refused the request (validation, permissions, ...)
    #[error("request rejected: {0}")]
    Rejected(String),

    /// Target row does not exist on the backend
    #[error("{0} does not exist")]
    NotFound(FeatureRef),
}

/// Create, update and delete persisted features.
///
/// Runs on the UI event loop, so futures are not required to be `Send`.
#[async_trait(?Send)]
pub trait FeatureBackend {
    /// Persist a new feature and return it with its assigned id.
    async fn create(&self, draft: FeatureDraft) -> Result<Feature, BackendError>;

    /// Apply a partial update and return the stored result.
    async fn update(&self, target: &FeatureRef, patch: FeaturePatch)
    -> Result<Feature, BackendError>;

    /// Delete a feature.
    async fn delete(&self, target: &FeatureRef) -> Result<(), BackendError>;
}
