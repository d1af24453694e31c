//! Widget class contracts: metadata, schema and behavior hooks.
//!
//! # Responsibility
//! - Declare the setting schema of a widget class, with inheritance.
//! - Define the content-generation and interaction hooks every widget
//!   implements.
//!
//! # Invariants
//! - Setting keys are unique within one class declaration.
//! - A class schema is shared and never mutated after `build()`.
//! - Only declared settings are part of the schema; metadata is not.

use crate::html::escape_html;
use crate::setting::descriptor::{SettingDescriptor, SettingSpec, SettingValidationError};
use crate::widget::instance::WidgetState;
use crate::widget::interaction::{InteractionRequest, ResponseError, ResponseWriter};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Default title every widget inherits from the base schema.
pub const DEFAULT_TITLE: &str = "Widget";

static BASE_SCHEMA: Lazy<Arc<WidgetSchema>> = Lazy::new(|| {
    let title = SettingDescriptor::text(
        SettingSpec::new("title")
            .with_default(DEFAULT_TITLE)
            .with_description("Widget title (leave empty to hide title)"),
    )
    .expect("valid base title setting");
    Arc::new(WidgetSchema {
        declared: vec![title],
        parent: None,
    })
});

/// Descriptive widget metadata shown in the admin catalogue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WidgetMetadata {
    pub name: String,
    pub author: String,
    pub description: String,
    pub url: String,
}

impl WidgetMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Declared settings of one class plus a link to its ancestor schema.
#[derive(Debug, Clone, Default)]
pub struct WidgetSchema {
    declared: Vec<SettingDescriptor>,
    parent: Option<Arc<WidgetSchema>>,
}

impl WidgetSchema {
    /// Root schema declaring the shared `title` setting.
    pub fn base() -> Arc<WidgetSchema> {
        Arc::clone(&BASE_SCHEMA)
    }

    /// Settings declared directly on this schema.
    pub fn declared(&self) -> &[SettingDescriptor] {
        &self.declared
    }

    pub fn parent(&self) -> Option<&Arc<WidgetSchema>> {
        self.parent.as_ref()
    }

    /// Resolves declared and inherited settings; the nearest declaration of a
    /// key wins.
    pub fn resolve(&self) -> BTreeMap<String, SettingDescriptor> {
        let mut settings = match &self.parent {
            Some(parent) => parent.resolve(),
            None => BTreeMap::new(),
        };
        for setting in &self.declared {
            settings.insert(setting.key().to_string(), setting.clone());
        }
        settings
    }

    pub fn contains(&self, key: &str) -> bool {
        self.declared.iter().any(|setting| setting.key() == key)
            || self
                .parent
                .as_ref()
                .is_some_and(|parent| parent.contains(key))
    }
}

/// Failure reported by a widget hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetHookError {
    pub message: String,
}

impl WidgetHookError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for WidgetHookError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for WidgetHookError {}

impl From<ResponseError> for WidgetHookError {
    fn from(value: ResponseError) -> Self {
        Self::new(value.to_string())
    }
}

/// Behavior hooks of a widget class.
///
/// A fresh object is created per render or interaction, so implementations
/// read configuration from `state` rather than from their own fields.
pub trait Widget: Send {
    /// Produces the inner HTML fragment from current setting values.
    fn content(&self, state: &WidgetState) -> Result<String, WidgetHookError> {
        Ok(placeholder_content(state))
    }

    /// Answers an out-of-band browser request.
    ///
    /// The hook owns the whole response and must call
    /// [`ResponseWriter::finish`] when done.
    fn handle_interaction(
        &self,
        _state: &WidgetState,
        request: &InteractionRequest,
        response: &mut ResponseWriter<'_>,
    ) -> Result<(), WidgetHookError> {
        write_debug_response(request, response)
    }
}

/// Widget that keeps every default hook.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultWidget;

impl Widget for DefaultWidget {}

/// Debug placeholder naming the class and instance.
pub fn placeholder_content(state: &WidgetState) -> String {
    format!(
        "<p>Widget {}@{}</p>",
        escape_html(state.class_name()),
        escape_html(state.id())
    )
}

/// Echoes method, URL and parameters as a small HTML page.
pub fn write_debug_response(
    request: &InteractionRequest,
    response: &mut ResponseWriter<'_>,
) -> Result<(), WidgetHookError> {
    response.header("Content-Type", "text/html; charset=utf-8")?;
    response.write(&format!(
        "<html><head><title>Widget Debug</title></head><body><p>Request: {}</p><p>Method: {}</p><p>Parameters:</p>",
        escape_html(&request.url),
        escape_html(&request.method.to_ascii_lowercase())
    ))?;
    if request.parameters.is_empty() {
        response.write("<p>&nbsp;&nbsp;<i>None</i></p>")?;
    } else {
        for (key, value) in &request.parameters {
            response.write(&format!(
                "<p>&nbsp;&nbsp;{} = {}</p>",
                escape_html(key),
                escape_html(value)
            ))?;
        }
    }
    response.write("</body></html>")?;
    response.finish()?;
    Ok(())
}

/// Constructor for the behavior object of a class.
pub type WidgetFactory = fn() -> Box<dyn Widget>;

/// Reusable widget template registered in the plugin namespace.
#[derive(Debug)]
pub struct WidgetClass {
    key: String,
    metadata: WidgetMetadata,
    schema: Arc<WidgetSchema>,
    factory: WidgetFactory,
}

impl WidgetClass {
    /// Starts a class declaration extending the base schema.
    pub fn builder(key: impl Into<String>, factory: WidgetFactory) -> WidgetClassBuilder {
        let key = key.into();
        WidgetClassBuilder {
            metadata: WidgetMetadata::new(key.clone()),
            key,
            parent: Some(WidgetSchema::base()),
            settings: Vec::new(),
            factory,
        }
    }

    /// Stable registry key, e.g. `html`.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn metadata(&self) -> &WidgetMetadata {
        &self.metadata
    }

    pub fn schema(&self) -> &Arc<WidgetSchema> {
        &self.schema
    }

    /// Constructs a new behavior object.
    pub fn create(&self) -> Box<dyn Widget> {
        (self.factory)()
    }
}

/// Builder returned by [`WidgetClass::builder`].
pub struct WidgetClassBuilder {
    key: String,
    metadata: WidgetMetadata,
    parent: Option<Arc<WidgetSchema>>,
    settings: Vec<SettingDescriptor>,
    factory: WidgetFactory,
}

impl WidgetClassBuilder {
    pub fn metadata(mut self, metadata: WidgetMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Inherits settings from another class schema instead of the base one.
    pub fn extends(mut self, parent: Arc<WidgetSchema>) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Drops the inherited base schema.
    pub fn standalone(mut self) -> Self {
        self.parent = None;
        self
    }

    pub fn setting(mut self, setting: SettingDescriptor) -> Self {
        self.settings.push(setting);
        self
    }

    pub fn build(self) -> Result<WidgetClass, WidgetDefinitionError> {
        if !is_valid_widget_key(&self.key) {
            return Err(WidgetDefinitionError::InvalidKey(self.key));
        }

        let mut seen = BTreeSet::new();
        for setting in &self.settings {
            if !seen.insert(setting.key()) {
                return Err(WidgetDefinitionError::DuplicateSetting {
                    widget: self.key.clone(),
                    key: setting.key().to_string(),
                });
            }
        }

        Ok(WidgetClass {
            key: self.key,
            metadata: self.metadata,
            schema: Arc::new(WidgetSchema {
                declared: self.settings,
                parent: self.parent,
            }),
            factory: self.factory,
        })
    }
}

fn is_valid_widget_key(value: &str) -> bool {
    let mut chars = value.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => return false,
    };
    if !first.is_ascii_lowercase() {
        return false;
    }

    let mut prev_separator = false;
    for c in chars {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            prev_separator = false;
            continue;
        }
        if c == '.' || c == '_' || c == '-' {
            if prev_separator {
                return false;
            }
            prev_separator = true;
            continue;
        }
        return false;
    }
    !prev_separator
}

/// Widget class declaration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetDefinitionError {
    InvalidKey(String),
    DuplicateSetting { widget: String, key: String },
    Setting(SettingValidationError),
}

impl Display for WidgetDefinitionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidKey(value) => write!(f, "widget key is invalid: {value}"),
            Self::DuplicateSetting { widget, key } => {
                write!(f, "widget `{widget}` declares setting `{key}` twice")
            }
            Self::Setting(err) => write!(f, "{err}"),
        }
    }
}

impl Error for WidgetDefinitionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Setting(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SettingValidationError> for WidgetDefinitionError {
    fn from(value: SettingValidationError) -> Self {
        Self::Setting(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{DefaultWidget, Widget, WidgetClass, WidgetDefinitionError, WidgetSchema};
    use crate::setting::descriptor::{SettingDescriptor, SettingSpec};

    fn default_widget() -> Box<dyn Widget> {
        Box::new(DefaultWidget)
    }

    #[test]
    fn base_schema_declares_title() {
        let settings = WidgetSchema::base().resolve();
        assert_eq!(settings.len(), 1);
        assert_eq!(settings["title"].default_value(), "Widget");
    }

    #[test]
    fn nearest_declaration_wins() {
        let class = WidgetClass::builder("plain", default_widget)
            .setting(
                SettingDescriptor::text(SettingSpec::new("title").with_description("Own title"))
                    .expect("title"),
            )
            .build()
            .expect("class");
        let settings = class.schema().resolve();
        assert_eq!(settings["title"].description(), "Own title");
        assert_eq!(settings["title"].default_value(), "");
    }

    #[test]
    fn rejects_duplicate_setting_keys() {
        let setting = SettingDescriptor::text(SettingSpec::new("content")).expect("content");
        let err = WidgetClass::builder("twice", default_widget)
            .setting(setting.clone())
            .setting(setting)
            .build()
            .unwrap_err();
        assert!(matches!(err, WidgetDefinitionError::DuplicateSetting { .. }));
    }

    #[test]
    fn rejects_invalid_class_keys() {
        for key in ["", "Html", "html..snippet", "html-"] {
            let err = WidgetClass::builder(key, default_widget)
                .build()
                .unwrap_err();
            assert!(matches!(err, WidgetDefinitionError::InvalidKey(_)));
        }
    }

    #[test]
    fn standalone_class_has_no_inherited_title() {
        let class = WidgetClass::builder("bare", default_widget)
            .standalone()
            .build()
            .expect("class");
        assert!(!class.schema().contains("title"));
        assert!(class.schema().parent().is_none());
    }
}
