//! Error types for feature mutations and capture.

use thiserror::Error;

use crate::backend::BackendError;
use crate::message::Tool;
use crate::model::{FeatureKind, FeatureRef};
use crate::quota::Tier;

/// Errors raised by TrailNote operations.
///
/// None of these are fatal: every path that produces one has already put the
/// map back into its last confirmed state.
#[derive(Error, Debug)]
pub enum TrailError {
    /// Project is at its subscription limit for this feature kind
    #[error("{tier} plan allows at most {} per project", count_of(.limit, .kind))]
    QuotaExceeded {
        /// Kind of feature that could not be created
        kind: FeatureKind,
        /// The limit that was hit
        limit: usize,
        /// Subscription tier the limit belongs to
        tier: Tier,
    },

    /// Persistence collaborator failed
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Geometry that cannot be stored (degenerate path, bad coordinate)
    #[error("Invalid geometry: {message}")]
    InvalidGeometry {
        /// Description of the problem
        message: String,
    },

    /// Referenced feature is not in the current collection
    #[error("Feature not found: {0}")]
    UnknownFeature(FeatureRef),

    /// No project is open, or the request targets a project that is no longer open
    #[error("Project is not open")]
    NoProject,

    /// The operation belonged to a session that has since been cancelled
    #[error("Response for an abandoned session was discarded")]
    StaleSession,

    /// Another operation on this feature is already in flight
    #[error("{0} is busy with another operation")]
    Busy(FeatureRef),

    /// The map's gestures are owned by another tool
    #[error("{0:?} tool is still active")]
    ToolBusy(Tool),

    /// Nothing to undo or redo
    #[error("Nothing to {0}")]
    EmptyHistory(&'static str),
}

/// "1 marker", "5 routes".
fn count_of(limit: &usize, kind: &FeatureKind) -> String {
    match limit {
        1 => format!("1 {kind}"),
        n => format!("{n} {kind}s"),
    }
}

impl TrailError {
    /// Create an invalid geometry error with a message.
    pub fn invalid_geometry(message: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_message_pluralizes_by_limit() {
        let one = TrailError::QuotaExceeded {
            kind: FeatureKind::Marker,
            limit: 1,
            tier: Tier::Free,
        };
        assert_eq!(one.to_string(), "Free plan allows at most 1 marker per project");

        let many = TrailError::QuotaExceeded {
            kind: FeatureKind::Route,
            limit: 15,
            tier: Tier::Paid,
        };
        assert_eq!(many.to_string(), "Paid plan allows at most 15 routes per project");
    }
}
