//! Plugin namespace of installed widget classes.
//!
//! # Responsibility
//! - Map stable widget keys to class declarations.
//! - Install class definitions, skipping and logging those that fail.
//! - Expose schema lookups for the admin form layer.
//!
//! # Invariants
//! - Keys are unique; a second registration of a key is rejected.
//! - The process-wide registry is built once and never mutated afterwards.

use crate::setting::descriptor::SettingDescriptor;
use crate::widget::class::{WidgetClass, WidgetDefinitionError, WidgetMetadata};
use crate::widget::installed;
use log::{info, warn};
use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

static INSTALLED_WIDGETS: Lazy<WidgetRegistry> = Lazy::new(WidgetRegistry::with_installed);

/// Returns the process-wide registry of built-in widgets.
pub fn installed_widgets() -> &'static WidgetRegistry {
    &INSTALLED_WIDGETS
}

/// Returns the resolved settings of a class, inherited ones included.
pub fn get_settings(class: &WidgetClass) -> BTreeMap<String, SettingDescriptor> {
    class.schema().resolve()
}

/// Named class definition used for startup installation.
#[derive(Debug, Clone, Copy)]
pub struct WidgetDefinition {
    pub key: &'static str,
    pub define: fn() -> Result<WidgetClass, WidgetDefinitionError>,
}

/// Result of installing a batch of definitions.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub installed: Vec<String>,
    pub skipped: Vec<(String, String)>,
}

/// Name-to-class registry consulted by the instantiator.
#[derive(Debug, Default)]
pub struct WidgetRegistry {
    classes: BTreeMap<String, Arc<WidgetClass>>,
}

impl WidgetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry holding every built-in widget.
    pub fn with_installed() -> Self {
        let mut registry = Self::new();
        registry.install_all(installed::DEFINITIONS);
        registry
    }

    /// Registers one built class.
    pub fn register(&mut self, class: WidgetClass) -> Result<(), RegistryError> {
        let key = class.key().to_string();
        if self.classes.contains_key(key.as_str()) {
            return Err(RegistryError::DuplicateWidget(key));
        }
        self.classes.insert(key, Arc::new(class));
        Ok(())
    }

    /// Defines and registers one class; failures are logged and skipped.
    pub fn install(&mut self, definition: &WidgetDefinition) -> Result<(), RegistryError> {
        let class = match (definition.define)() {
            Ok(class) => class,
            Err(err) => {
                warn!(
                    "event=widget_install module=widget status=skip widget={} error={}",
                    definition.key, err
                );
                return Err(RegistryError::Definition {
                    widget: definition.key.to_string(),
                    source: err,
                });
            }
        };

        if let Err(err) = self.register(class) {
            warn!(
                "event=widget_install module=widget status=skip widget={} error={}",
                definition.key, err
            );
            return Err(err);
        }

        info!(
            "event=widget_install module=widget status=ok widget={}",
            definition.key
        );
        Ok(())
    }

    /// Installs every definition, continuing past failures.
    pub fn install_all(&mut self, definitions: &[WidgetDefinition]) -> InstallReport {
        let mut report = InstallReport::default();
        for definition in definitions {
            match self.install(definition) {
                Ok(()) => report.installed.push(definition.key.to_string()),
                Err(err) => report
                    .skipped
                    .push((definition.key.to_string(), err.to_string())),
            }
        }
        report
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<Arc<WidgetClass>> {
        self.classes.get(name.trim()).cloned()
    }

    /// Resolves a widget class by name.
    pub fn resolve(&self, name: &str) -> Result<Arc<WidgetClass>, UnknownWidgetError> {
        self.get(name)
            .ok_or_else(|| UnknownWidgetError(name.trim().to_string()))
    }

    /// Returns sorted widget keys.
    pub fn names(&self) -> Vec<String> {
        self.classes.keys().cloned().collect()
    }

    /// Returns `(key, metadata)` pairs for the admin catalogue.
    pub fn metadata(&self) -> Vec<(&str, &WidgetMetadata)> {
        self.classes
            .iter()
            .map(|(key, class)| (key.as_str(), class.metadata()))
            .collect()
    }

    /// Resolved settings of a registered class.
    pub fn settings_for(
        &self,
        name: &str,
    ) -> Result<BTreeMap<String, SettingDescriptor>, UnknownWidgetError> {
        let class = self.resolve(name)?;
        Ok(get_settings(&class))
    }
}

/// A widget class name that is not present in the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownWidgetError(pub String);

impl Display for UnknownWidgetError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "widget is not installed: {}", self.0)
    }
}

impl Error for UnknownWidgetError {}

/// Registration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    DuplicateWidget(String),
    Definition {
        widget: String,
        source: WidgetDefinitionError,
    },
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateWidget(key) => write!(f, "widget already registered: {key}"),
            Self::Definition { widget, source } => {
                write!(f, "widget `{widget}` failed to load: {source}")
            }
        }
    }
}

impl Error for RegistryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::DuplicateWidget(_) => None,
            Self::Definition { source, .. } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{installed_widgets, RegistryError, WidgetDefinition, WidgetRegistry};
    use crate::setting::descriptor::{SettingDescriptor, SettingSpec};
    use crate::widget::class::{DefaultWidget, Widget, WidgetClass, WidgetDefinitionError};

    fn default_widget() -> Box<dyn Widget> {
        Box::new(DefaultWidget)
    }

    fn define_ok() -> Result<WidgetClass, WidgetDefinitionError> {
        WidgetClass::builder("ok", default_widget).build()
    }

    fn define_broken() -> Result<WidgetClass, WidgetDefinitionError> {
        WidgetClass::builder("broken", default_widget)
            .setting(SettingDescriptor::text(
                SettingSpec::new("count").with_pattern("[0-9"),
            )?)
            .build()
    }

    #[test]
    fn install_all_skips_broken_definitions() {
        let mut registry = WidgetRegistry::new();
        let report = registry.install_all(&[
            WidgetDefinition {
                key: "broken",
                define: define_broken,
            },
            WidgetDefinition {
                key: "ok",
                define: define_ok,
            },
        ]);
        assert_eq!(report.installed, vec!["ok".to_string()]);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].0, "broken");
        assert_eq!(registry.names(), vec!["ok".to_string()]);
    }

    #[test]
    fn rejects_duplicate_registration() {
        let mut registry = WidgetRegistry::new();
        registry.register(define_ok().expect("class")).expect("first");
        let err = registry.register(define_ok().expect("class")).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateWidget("ok".to_string()));
    }

    #[test]
    fn installed_widgets_include_builtins() {
        let registry = installed_widgets();
        assert!(registry.get("html").is_some());
        assert!(registry.get("subscribe").is_some());
        assert_eq!(
            registry.resolve("missing").unwrap_err().to_string(),
            "widget is not installed: missing"
        );
    }
}
