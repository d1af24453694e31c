//! Widget instantiation from a class name and stored overlay.

use crate::widget::instance::{
    LiveWidget, Overlay, OverlayError, OverlayPolicy, WidgetInstance, WidgetState,
};
use crate::widget::registry::{get_settings, UnknownWidgetError, WidgetRegistry};
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Resolves classes from a registry and builds live widgets.
#[derive(Debug, Clone, Copy)]
pub struct Instantiator<'r> {
    registry: &'r WidgetRegistry,
    policy: OverlayPolicy,
}

impl<'r> Instantiator<'r> {
    pub fn new(registry: &'r WidgetRegistry) -> Self {
        Self {
            registry,
            policy: OverlayPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: OverlayPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn registry(&self) -> &'r WidgetRegistry {
        self.registry
    }

    pub fn policy(&self) -> OverlayPolicy {
        self.policy
    }

    /// Builds a live widget of `widget_class_name` with `overlay` applied.
    ///
    /// The class schema is copied per instance, so overlay values never leak
    /// into the shared declaration.
    pub fn instantiate(
        &self,
        widget_class_name: &str,
        instance_id: &str,
        overlay: &Overlay,
    ) -> Result<LiveWidget, InstantiateError> {
        let class = self.registry.resolve(widget_class_name)?;
        let mut state = WidgetState::new(instance_id, class.key(), get_settings(&class));
        state.apply_overlay(overlay, self.policy)?;
        debug!(
            "event=widget_instantiate module=widget status=ok widget={} instance_id={} overlay_keys={}",
            class.key(),
            instance_id,
            overlay.len()
        );
        Ok(LiveWidget::new(class, state))
    }

    /// Builds a live widget from a stored placement record.
    pub fn instantiate_record(
        &self,
        record: &WidgetInstance,
    ) -> Result<LiveWidget, InstantiateError> {
        self.instantiate(&record.widget_class_name, &record.id, &record.overlay)
    }
}

/// Instantiation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstantiateError {
    UnknownWidget(UnknownWidgetError),
    Overlay(OverlayError),
}

impl Display for InstantiateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownWidget(err) => write!(f, "{err}"),
            Self::Overlay(err) => write!(f, "{err}"),
        }
    }
}

impl Error for InstantiateError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::UnknownWidget(err) => Some(err),
            Self::Overlay(err) => Some(err),
        }
    }
}

impl From<UnknownWidgetError> for InstantiateError {
    fn from(value: UnknownWidgetError) -> Self {
        Self::UnknownWidget(value)
    }
}

impl From<OverlayError> for InstantiateError {
    fn from(value: OverlayError) -> Self {
        Self::Overlay(value)
    }
}
