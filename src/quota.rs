//! Subscription tiers and per-project feature limits.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{free_tier, paid_tier};
use crate::error::TrailError;
use crate::model::FeatureKind;

/// Subscription tier of the signed-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Free,
    Paid,
}

impl Tier {
    pub fn name(&self) -> &'static str {
        match self {
            Tier::Free => "Free",
            Tier::Paid => "Paid",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Feature limits for one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaLimits {
    pub markers_per_project: usize,
    pub routes_per_project: usize,
}

impl QuotaLimits {
    pub fn limit_for(&self, kind: FeatureKind) -> usize {
        match kind {
            FeatureKind::Marker => self.markers_per_project,
            FeatureKind::Route => self.routes_per_project,
        }
    }
}

/// Limits for every tier. Defaults to the hosted plans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaPolicy {
    #[serde(default = "default_free_limits")]
    pub free: QuotaLimits,
    #[serde(default = "default_paid_limits")]
    pub paid: QuotaLimits,
}

fn default_free_limits() -> QuotaLimits {
    QuotaLimits {
        markers_per_project: free_tier::MAX_MARKERS,
        routes_per_project: free_tier::MAX_ROUTES,
    }
}

fn default_paid_limits() -> QuotaLimits {
    QuotaLimits {
        markers_per_project: paid_tier::MAX_MARKERS,
        routes_per_project: paid_tier::MAX_ROUTES,
    }
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self {
            free: default_free_limits(),
            paid: default_paid_limits(),
        }
    }
}

impl QuotaPolicy {
    pub fn limits(&self, tier: Tier) -> QuotaLimits {
        match tier {
            Tier::Free => self.free,
            Tier::Paid => self.paid,
        }
    }
}

/// Source of the current tier and its limits (the billing side).
pub trait QuotaSource {
    fn tier(&self) -> Tier;
    fn limits(&self) -> QuotaLimits;
}

/// Fixed tier backed by a configured policy.
#[derive(Debug, Clone, Default)]
pub struct StaticQuota {
    pub tier: Tier,
    pub policy: QuotaPolicy,
}

impl StaticQuota {
    pub fn new(tier: Tier, policy: QuotaPolicy) -> Self {
        Self { tier, policy }
    }
}

impl QuotaSource for StaticQuota {
    fn tier(&self) -> Tier {
        self.tier
    }

    fn limits(&self) -> QuotaLimits {
        self.policy.limits(self.tier)
    }
}

/// Check whether one more feature of `kind` fits next to `existing` ones.
pub fn check_quota(
    source: &dyn QuotaSource,
    kind: FeatureKind,
    existing: usize,
) -> Result<(), TrailError> {
    let tier = source.tier();
    let limit = source.limits().limit_for(kind);
    if existing >= limit {
        log::info!("Quota reached: {existing}/{limit} {kind}s on {tier} tier");
        return Err(TrailError::QuotaExceeded { kind, limit, tier });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let policy = QuotaPolicy::default();
        assert_eq!(policy.limits(Tier::Free).markers_per_project, 30);
        assert_eq!(policy.limits(Tier::Free).routes_per_project, 5);
        assert_eq!(policy.limits(Tier::Paid).markers_per_project, 90);
        assert_eq!(policy.limits(Tier::Paid).routes_per_project, 15);
    }

    #[test]
    fn test_check_at_limit() {
        let quota = StaticQuota::new(Tier::Free, QuotaPolicy::default());
        assert!(check_quota(&quota, FeatureKind::Route, 4).is_ok());
        match check_quota(&quota, FeatureKind::Route, 5) {
            Err(TrailError::QuotaExceeded { kind, limit, tier }) => {
                assert_eq!(kind, FeatureKind::Route);
                assert_eq!(limit, 5);
                assert_eq!(tier, Tier::Free);
            }
            other => panic!("expected quota error, got {other:?}"),
        }
    }

    #[test]
    fn test_paid_tier_lifts_limit() {
        let quota = StaticQuota::new(Tier::Paid, QuotaPolicy::default());
        assert!(check_quota(&quota, FeatureKind::Marker, 30).is_ok());
        assert!(check_quota(&quota, FeatureKind::Marker, 90).is_err());
    }

    #[test]
    fn test_error_message_names_limit_and_tier() {
        let err = TrailError::QuotaExceeded {
            kind: FeatureKind::Marker,
            limit: 30,
            tier: Tier::Free,
        };
        assert_eq!(err.to_string(), "Free plan allows at most 30 markers per project");
    }
}
