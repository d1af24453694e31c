//! Widget placements and their live, overlay-applied state.
//!
//! # Responsibility
//! - Define the persisted placement record (`WidgetInstance`).
//! - Merge a stored overlay onto a class schema without touching the shared
//!   class declaration.
//!
//! # Invariants
//! - Overlay values shadow defaults on a per-instance copy of the schema.
//! - Under `Strict` policy nothing is applied when any key is unknown.
//! - Unknown keys kept under `Permissive` policy are inert extras.

use crate::setting::descriptor::SettingDescriptor;
use crate::widget::class::{Widget, WidgetClass};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Stored per-placement values keyed by setting key.
pub type Overlay = BTreeMap<String, String>;

/// One placement of a widget class on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetInstance {
    /// Opaque page-scoped identifier assigned by the store.
    pub id: String,
    /// Registry key of the widget class.
    pub widget_class_name: String,
    pub overlay: Overlay,
}

/// How overlay keys without a matching setting are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayPolicy {
    /// Keep unknown keys as extras.
    #[default]
    Permissive,
    /// Reject overlays carrying unknown keys.
    Strict,
}

/// Configuration of one live widget: resolved settings plus extras.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetState {
    id: String,
    class_name: String,
    settings: BTreeMap<String, SettingDescriptor>,
    extras: BTreeMap<String, String>,
}

impl WidgetState {
    /// Creates state holding every setting at its declared value.
    pub fn new(
        id: impl Into<String>,
        class_name: impl Into<String>,
        settings: BTreeMap<String, SettingDescriptor>,
    ) -> Self {
        Self {
            id: id.into(),
            class_name: class_name.into(),
            settings,
            extras: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn settings(&self) -> &BTreeMap<String, SettingDescriptor> {
        &self.settings
    }

    pub fn extras(&self) -> &BTreeMap<String, String> {
        &self.extras
    }

    /// Current value of a declared setting.
    pub fn setting(&self, key: &str) -> Option<&str> {
        self.settings.get(key).map(SettingDescriptor::value)
    }

    /// Current value of a setting, falling back to extras.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.setting(key)
            .or_else(|| self.extras.get(key).map(String::as_str))
    }

    /// Title shown above the content; empty hides the title block.
    pub fn title(&self) -> &str {
        self.attribute("title").unwrap_or_default()
    }

    /// Merges `overlay` onto the current values.
    pub fn apply_overlay(
        &mut self,
        overlay: &Overlay,
        policy: OverlayPolicy,
    ) -> Result<(), OverlayError> {
        if policy == OverlayPolicy::Strict {
            if let Some(key) = overlay.keys().find(|key| !self.settings.contains_key(*key)) {
                return Err(OverlayError::UnknownSetting {
                    widget: self.class_name.clone(),
                    key: key.clone(),
                });
            }
        }

        for (key, value) in overlay {
            match self.settings.get_mut(key) {
                Some(setting) => setting.set_value(value.clone()),
                None => {
                    self.extras.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(())
    }

    /// Minimal overlay to persist: modified settings plus extras.
    pub fn modified_overlay(&self) -> Overlay {
        let mut overlay: Overlay = self
            .settings
            .iter()
            .filter(|(_, setting)| setting.is_modified())
            .map(|(key, setting)| (key.clone(), setting.value().to_string()))
            .collect();
        for (key, value) in &self.extras {
            overlay.entry(key.clone()).or_insert_with(|| value.clone());
        }
        overlay
    }
}

/// Instantiated widget ready for rendering or interaction.
pub struct LiveWidget {
    class: Arc<WidgetClass>,
    state: WidgetState,
    behavior: Box<dyn Widget>,
}

impl LiveWidget {
    pub(crate) fn new(class: Arc<WidgetClass>, state: WidgetState) -> Self {
        let behavior = class.create();
        Self {
            class,
            state,
            behavior,
        }
    }

    pub fn id(&self) -> &str {
        self.state.id()
    }

    pub fn class(&self) -> &Arc<WidgetClass> {
        &self.class
    }

    pub fn state(&self) -> &WidgetState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut WidgetState {
        &mut self.state
    }

    pub fn behavior(&self) -> &dyn Widget {
        self.behavior.as_ref()
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.state.attribute(key)
    }

    pub fn title(&self) -> &str {
        self.state.title()
    }
}

impl std::fmt::Debug for LiveWidget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveWidget")
            .field("class", &self.class.key())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Overlay merge errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayError {
    UnknownSetting { widget: String, key: String },
}

impl Display for OverlayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownSetting { widget, key } => {
                write!(f, "widget `{widget}` has no setting `{key}`")
            }
        }
    }
}

impl Error for OverlayError {}

#[cfg(test)]
mod tests {
    use super::{Overlay, OverlayError, OverlayPolicy, WidgetState};
    use crate::widget::class::WidgetSchema;

    fn base_state() -> WidgetState {
        WidgetState::new("w1", "demo", WidgetSchema::base().resolve())
    }

    fn overlay(pairs: &[(&str, &str)]) -> Overlay {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn permissive_overlay_keeps_extras() {
        let mut state = base_state();
        state
            .apply_overlay(
                &overlay(&[("title", "News"), ("legacy", "1")]),
                OverlayPolicy::Permissive,
            )
            .expect("permissive overlay");
        assert_eq!(state.title(), "News");
        assert_eq!(state.setting("legacy"), None);
        assert_eq!(state.attribute("legacy"), Some("1"));
    }

    #[test]
    fn strict_overlay_applies_nothing_on_unknown_key() {
        let mut state = base_state();
        let err = state
            .apply_overlay(
                &overlay(&[("title", "News"), ("legacy", "1")]),
                OverlayPolicy::Strict,
            )
            .unwrap_err();
        assert_eq!(
            err,
            OverlayError::UnknownSetting {
                widget: "demo".to_string(),
                key: "legacy".to_string(),
            }
        );
        assert_eq!(state.title(), "Widget");
    }

    #[test]
    fn modified_overlay_skips_default_values() {
        let mut state = base_state();
        state
            .apply_overlay(
                &overlay(&[("title", "Widget"), ("legacy", "1")]),
                OverlayPolicy::Permissive,
            )
            .expect("overlay");
        assert_eq!(state.modified_overlay(), overlay(&[("legacy", "1")]));

        state
            .apply_overlay(&overlay(&[("title", "")]), OverlayPolicy::Permissive)
            .expect("overlay");
        assert_eq!(
            state.modified_overlay(),
            overlay(&[("legacy", "1"), ("title", "")])
        );
    }
}
