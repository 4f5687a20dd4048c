//! Detail panel for the selected feature.

use crate::model::FeatureRef;

/// What the panel lets the user do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelMode {
    /// Read-only details
    #[default]
    View,
    /// Editable fields
    Edit,
}

/// The open detail/edit panel. Only ever refers to a feature in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailPanel {
    pub feature: FeatureRef,
    pub mode: PanelMode,
}

impl DetailPanel {
    pub fn view(feature: FeatureRef) -> Self {
        Self {
            feature,
            mode: PanelMode::View,
        }
    }

    pub fn is_for(&self, target: &FeatureRef) -> bool {
        &self.feature == target
    }
}
