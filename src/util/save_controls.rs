//! Save box view model: button state and labels derived from a saveable.

use crate::state::saveable::Saveable;

/// Label overrides and layout flags chosen by the host.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SaveLabels {
    pub minimal: bool,
    pub with_apply: bool,
    pub save_text: Option<String>,
    pub apply_text: Option<String>,
    pub revert_text: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaveControls {
    /// Shown only while there are unsaved changes.
    pub visible: bool,
    pub loading: bool,
    pub save_enabled: bool,
    /// `None` when the host did not ask for an apply button.
    pub apply_enabled: Option<bool>,
    pub revert_enabled: bool,
    pub save_label: String,
    pub apply_label: String,
    pub revert_label: String,
}

impl SaveControls {
    #[must_use]
    pub fn derive<T: Clone + PartialEq>(
        saveable: &Saveable<T>,
        current: &T,
        is_valid: bool,
        labels: &SaveLabels,
    ) -> Self {
        let changed = saveable.is_changed(current);
        let saveable_now = saveable.is_saveable(current, is_valid);

        let save_default = if labels.minimal { "Save changes" } else { "Save" };
        let revert_default = if labels.minimal { "Revert" } else { "Revert changes" };

        Self {
            visible: changed,
            loading: saveable.is_saving(),
            save_enabled: saveable_now,
            apply_enabled: labels.with_apply.then_some(saveable_now),
            revert_enabled: changed,
            save_label: labels.save_text.clone().unwrap_or_else(|| save_default.to_owned()),
            apply_label: labels.apply_text.clone().unwrap_or_else(|| "Apply".to_owned()),
            revert_label: labels.revert_text.clone().unwrap_or_else(|| revert_default.to_owned()),
        }
    }
}

#[cfg(test)]
#[path = "save_controls_test.rs"]
mod tests;
