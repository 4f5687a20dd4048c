//! In-process backend used offline, by the CLI and in tests.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use async_trait::async_trait;

use super::{BackendError, FeatureBackend};
use crate::model::{Feature, FeatureDraft, FeatureId, FeatureKind, FeaturePatch, FeatureRef};

/// Which request an injected failure applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOn {
    Create,
    Update,
    Delete,
    Any,
}

impl FailOn {
    fn matches(self, op: FailOn) -> bool {
        self == FailOn::Any || self == op
    }
}

/// Keeps features in a map, assigning sequential ids.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    features: RefCell<BTreeMap<FeatureId, Feature>>,
    next_id: Cell<u64>,
    fail_next: Cell<Option<FailOn>>,
    calls: Cell<usize>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next matching request fail with a network error.
    pub fn fail_next(&self, on: FailOn) {
        self.fail_next.set(Some(on));
    }

    /// Number of requests received so far, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    /// Store an existing feature as is, e.g. rows loaded with a project.
    pub fn seed(&self, feature: Feature) {
        self.features
            .borrow_mut()
            .insert(feature.feature_ref().id, feature);
    }

    /// Look up a stored feature.
    pub fn get(&self, id: &FeatureId) -> Option<Feature> {
        self.features.borrow().get(id).cloned()
    }

    /// Number of stored features.
    pub fn len(&self) -> usize {
        self.features.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.borrow().is_empty()
    }

    fn begin(&self, op: FailOn) -> Result<(), BackendError> {
        self.calls.set(self.calls.get() + 1);
        match self.fail_next.get() {
            Some(on) if on.matches(op) => {
                self.fail_next.set(None);
                log::debug!("MemoryBackend: injected failure on {op:?}");
                Err(BackendError::Network("injected failure".to_string()))
            }
            _ => Ok(()),
        }
    }

    fn allocate_id(&self, kind: FeatureKind) -> FeatureId {
        let n = self.next_id.get() + 1;
        self.next_id.set(n);
        let prefix = match kind {
            FeatureKind::Marker => "m",
            FeatureKind::Route => "r",
        };
        FeatureId::new(format!("{prefix}-{n}"))
    }
}

#[async_trait(?Send)]
impl FeatureBackend for MemoryBackend {
    async fn create(&self, draft: FeatureDraft) -> Result<Feature, BackendError> {
        self.begin(FailOn::Create)?;
        let id = self.allocate_id(draft.kind());
        let feature = draft.into_feature(id.clone());
        self.features.borrow_mut().insert(id, feature.clone());
        Ok(feature)
    }

    async fn update(
        &self,
        target: &FeatureRef,
        patch: FeaturePatch,
    ) -> Result<Feature, BackendError> {
        self.begin(FailOn::Update)?;
        let mut features = self.features.borrow_mut();
        let stored = features
            .get_mut(&target.id)
            .filter(|f| f.kind() == target.kind)
            .ok_or_else(|| BackendError::NotFound(target.clone()))?;
        let next = stored
            .patched(&patch)
            .ok_or_else(|| BackendError::Rejected(format!("{} patch for {target}", patch.kind())))?;
        *stored = next.clone();
        Ok(next)
    }

    async fn delete(&self, target: &FeatureRef) -> Result<(), BackendError> {
        self.begin(FailOn::Delete)?;
        let mut features = self.features.borrow_mut();
        match features.get(&target.id) {
            Some(f) if f.kind() == target.kind => {
                features.remove(&target.id);
                Ok(())
            }
            _ => Err(BackendError::NotFound(target.clone())),
        }
    }
}
