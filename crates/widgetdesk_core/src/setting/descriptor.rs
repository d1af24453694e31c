//! Typed setting descriptors declared by widget classes.
//!
//! # Responsibility
//! - Describe one configurable widget field: default, required flag,
//!   validation pattern, description and current value.
//! - Provide the constrained variants (select, checked, password).
//!
//! # Invariants
//! - `key` is non-empty and matches `^[a-z][a-z0-9_]*$`.
//! - `pattern` always compiles; the compiled form is kept alongside the source.
//! - Only `value` changes after construction.

use regex::Regex;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Pattern used when a declaration does not supply one.
pub const DEFAULT_PATTERN: &str = "^.*$";
/// Pattern fixed on checked settings.
pub const CHECKED_PATTERN: &str = "^(True|False)$";
/// Text form of a checked setting in the on state.
pub const CHECKED_TRUE: &str = "True";
/// Text form of a checked setting in the off state.
pub const CHECKED_FALSE: &str = "False";

/// Returns the text form stored for a boolean toggle.
pub fn checked_text(value: bool) -> &'static str {
    if value {
        CHECKED_TRUE
    } else {
        CHECKED_FALSE
    }
}

/// One choice of a select setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub key: String,
    pub label: String,
    /// Optional `<optgroup>` label.
    pub group: Option<String>,
}

impl Selection {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            group: None,
        }
    }

    pub fn grouped(
        key: impl Into<String>,
        label: impl Into<String>,
        group: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            group: Some(group.into()),
        }
    }
}

/// Input domain of a setting, used as a rendering hint by the form layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingKind {
    Text,
    /// Value is expected to be one of the selection keys; membership is not
    /// enforced here.
    Select { selections: Vec<Selection> },
    Checked { label: String },
    /// Same contract as `Text`, displayed masked.
    Password,
}

impl SettingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Select { .. } => "select",
            Self::Checked { .. } => "checked",
            Self::Password => "password",
        }
    }
}

/// Construction arguments for a setting descriptor.
///
/// Defaults to an empty default and description, not required, no explicit
/// value and the match-anything pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingSpec {
    pub key: String,
    pub default: String,
    pub required: bool,
    pub description: String,
    pub value: Option<String>,
    pub pattern: Option<String>,
}

impl SettingSpec {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = default.into();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }
}

/// A typed, named, validated configuration field of a widget class.
#[derive(Debug, Clone)]
pub struct SettingDescriptor {
    key: String,
    default: String,
    required: bool,
    description: String,
    pattern: String,
    compiled: Regex,
    value: String,
    kind: SettingKind,
}

impl SettingDescriptor {
    /// Creates a plain text setting.
    pub fn text(spec: SettingSpec) -> Result<Self, SettingValidationError> {
        Self::with_kind(spec, SettingKind::Text)
    }

    /// Creates a masked password setting.
    pub fn password(spec: SettingSpec) -> Result<Self, SettingValidationError> {
        Self::with_kind(spec, SettingKind::Password)
    }

    /// Creates a single-choice setting.
    pub fn select(
        spec: SettingSpec,
        selections: Vec<Selection>,
    ) -> Result<Self, SettingValidationError> {
        Self::with_kind(spec, SettingKind::Select { selections })
    }

    /// Creates a boolean toggle stored as `"True"`/`"False"`.
    ///
    /// `spec.default` and `spec.pattern` are replaced by the boolean text form
    /// and the fixed toggle pattern; `key`, `required`, `description` and
    /// `value` are taken as given.
    pub fn checked(
        spec: SettingSpec,
        default: bool,
        label: impl Into<String>,
    ) -> Result<Self, SettingValidationError> {
        let spec = SettingSpec {
            default: checked_text(default).to_string(),
            pattern: Some(CHECKED_PATTERN.to_string()),
            ..spec
        };
        Self::with_kind(
            spec,
            SettingKind::Checked {
                label: label.into(),
            },
        )
    }

    fn with_kind(spec: SettingSpec, kind: SettingKind) -> Result<Self, SettingValidationError> {
        let key = spec.key;
        if key.trim().is_empty() {
            return Err(SettingValidationError::EmptyKey);
        }
        if !is_valid_setting_key(&key) {
            return Err(SettingValidationError::InvalidKey(key));
        }

        let pattern = spec
            .pattern
            .unwrap_or_else(|| DEFAULT_PATTERN.to_string());
        let compiled =
            Regex::new(&pattern).map_err(|err| SettingValidationError::InvalidPattern {
                key: key.clone(),
                pattern: pattern.clone(),
                reason: err.to_string(),
            })?;

        let value = match spec.value {
            Some(value) if !value.is_empty() => value,
            _ => spec.default.clone(),
        };

        Ok(Self {
            key,
            default: spec.default,
            required: spec.required,
            description: spec.description,
            pattern,
            compiled,
            value,
            kind,
        })
    }

    /// Builds a descriptor from a JSON declaration object.
    ///
    /// Every member is type-checked before construction, so `"required": "yes"`
    /// or `"default": 3` fail with `InvalidFieldType`.
    pub fn from_json(declaration: &Value) -> Result<Self, SettingValidationError> {
        let object = declaration
            .as_object()
            .ok_or(SettingValidationError::NotAnObject)?;

        for name in object.keys() {
            if !DECLARATION_FIELDS.contains(&name.as_str()) {
                return Err(SettingValidationError::UnknownField(name.clone()));
            }
        }

        let kind = optional_str(declaration, "kind")?.unwrap_or("text");
        let key = optional_str(declaration, "key")?.unwrap_or_default();
        let description = optional_str(declaration, "description")?.unwrap_or_default();
        let required = match declaration.get("required") {
            None | Some(Value::Null) => false,
            Some(Value::Bool(flag)) => *flag,
            Some(_) => {
                return Err(SettingValidationError::InvalidFieldType {
                    field: "required",
                    expected: "boolean",
                })
            }
        };

        for (field, owner) in KIND_FIELDS {
            if object.contains_key(*field) && kind != *owner {
                return Err(SettingValidationError::UnknownField(field.to_string()));
            }
        }

        if kind == "checked" {
            let default = match declaration.get("default") {
                None | Some(Value::Null) => false,
                Some(Value::Bool(flag)) => *flag,
                Some(Value::String(text)) if text == CHECKED_TRUE => true,
                Some(Value::String(text)) if text == CHECKED_FALSE => false,
                Some(_) => {
                    return Err(SettingValidationError::InvalidFieldType {
                        field: "default",
                        expected: "boolean or \"True\"/\"False\"",
                    })
                }
            };
            if object.contains_key("pattern") {
                return Err(SettingValidationError::UnknownField("pattern".to_string()));
            }
            let label = optional_str(declaration, "label")?.unwrap_or_default();
            let spec = SettingSpec {
                key: key.to_string(),
                required,
                description: description.to_string(),
                value: optional_str(declaration, "value")?.map(str::to_string),
                ..SettingSpec::default()
            };
            return Self::checked(spec, default, label);
        }

        let spec = SettingSpec {
            key: key.to_string(),
            default: optional_str(declaration, "default")?
                .unwrap_or_default()
                .to_string(),
            required,
            description: description.to_string(),
            value: optional_str(declaration, "value")?.map(str::to_string),
            pattern: optional_str(declaration, "pattern")?.map(str::to_string),
        };

        match kind {
            "text" => Self::text(spec),
            "password" => Self::password(spec),
            "select" => Self::select(spec, parse_selections(declaration)?),
            other => Err(SettingValidationError::UnsupportedKind(other.to_string())),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn default_value(&self) -> &str {
        &self.default
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn kind(&self) -> &SettingKind {
        &self.kind
    }

    /// Returns whether the current value differs from the declared default.
    pub fn is_modified(&self) -> bool {
        self.value != self.default
    }

    /// Tests candidate text against the compiled pattern.
    pub fn matches(&self, text: &str) -> bool {
        self.compiled.is_match(text)
    }

    /// Replaces the current value. No validation is applied here.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    /// Restores the declared default.
    pub fn reset(&mut self) {
        self.value = self.default.clone();
    }
}

impl PartialEq for SettingDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
            && self.default == other.default
            && self.required == other.required
            && self.description == other.description
            && self.pattern == other.pattern
            && self.value == other.value
            && self.kind == other.kind
    }
}

impl Eq for SettingDescriptor {}

impl Display for SettingDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SettingDescriptor(key='{}', kind={}, default='{}', required={}, pattern='{}')",
            self.key,
            self.kind.as_str(),
            self.default,
            self.required,
            self.pattern
        )
    }
}

/// Members only valid for one kind, paired with that kind.
const KIND_FIELDS: &[(&str, &str)] = &[("selections", "select"), ("label", "checked")];

const DECLARATION_FIELDS: &[&str] = &[
    "key",
    "kind",
    "default",
    "required",
    "description",
    "value",
    "pattern",
    "selections",
    "label",
];

fn optional_str<'v>(
    declaration: &'v Value,
    field: &'static str,
) -> Result<Option<&'v str>, SettingValidationError> {
    match declaration.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text.as_str())),
        Some(_) => Err(SettingValidationError::InvalidFieldType {
            field,
            expected: "string",
        }),
    }
}

fn parse_selections(declaration: &Value) -> Result<Vec<Selection>, SettingValidationError> {
    let invalid = SettingValidationError::InvalidFieldType {
        field: "selections",
        expected: "array of [key, label] or [key, label, group]",
    };
    let items = match declaration.get("selections") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(invalid),
    };

    let mut selections = Vec::with_capacity(items.len());
    for item in items {
        let parts = item.as_array().ok_or_else(|| invalid.clone())?;
        let text = |index: usize| parts.get(index).and_then(Value::as_str);
        match (parts.len(), text(0), text(1)) {
            (2, Some(key), Some(label)) => selections.push(Selection::new(key, label)),
            (3, Some(key), Some(label)) => match parts.get(2) {
                Some(Value::String(group)) => {
                    selections.push(Selection::grouped(key, label, group.as_str()))
                }
                Some(Value::Null) => selections.push(Selection::new(key, label)),
                _ => return Err(invalid),
            },
            _ => return Err(invalid),
        }
    }
    Ok(selections)
}

fn is_valid_setting_key(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// Setting declaration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValidationError {
    EmptyKey,
    InvalidKey(String),
    InvalidPattern {
        key: String,
        pattern: String,
        reason: String,
    },
    NotAnObject,
    UnknownField(String),
    InvalidFieldType {
        field: &'static str,
        expected: &'static str,
    },
    UnsupportedKind(String),
}

impl Display for SettingValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyKey => write!(f, "setting key must not be empty"),
            Self::InvalidKey(value) => write!(
                f,
                "setting key is invalid: {value} (expected lowercase identifier)"
            ),
            Self::InvalidPattern {
                key,
                pattern,
                reason,
            } => write!(f, "setting `{key}` has invalid pattern `{pattern}`: {reason}"),
            Self::NotAnObject => write!(f, "setting declaration must be a JSON object"),
            Self::UnknownField(name) => write!(f, "setting declaration has unknown field: {name}"),
            Self::InvalidFieldType { field, expected } => {
                write!(f, "setting field `{field}` must be {expected}")
            }
            Self::UnsupportedKind(kind) => write!(f, "setting kind is unsupported: {kind}"),
        }
    }
}

impl Error for SettingValidationError {}

#[cfg(test)]
mod tests {
    use super::{
        SettingDescriptor, SettingKind, SettingSpec, SettingValidationError, CHECKED_PATTERN,
        DEFAULT_PATTERN,
    };
    use serde_json::json;

    #[test]
    fn applies_keyword_defaults() {
        let setting = SettingDescriptor::text(SettingSpec::new("title")).expect("valid setting");
        assert_eq!(setting.default_value(), "");
        assert!(!setting.is_required());
        assert_eq!(setting.description(), "");
        assert_eq!(setting.pattern(), DEFAULT_PATTERN);
        assert_eq!(setting.value(), "");
        assert_eq!(setting.kind(), &SettingKind::Text);
    }

    #[test]
    fn empty_explicit_value_falls_back_to_default() {
        let setting =
            SettingDescriptor::text(SettingSpec::new("title").with_default("Widget").with_value(""))
                .expect("valid setting");
        assert_eq!(setting.value(), "Widget");
        assert!(!setting.is_modified());
    }

    #[test]
    fn rejects_bad_key_shapes() {
        let err = SettingDescriptor::text(SettingSpec::new("  ")).unwrap_err();
        assert_eq!(err, SettingValidationError::EmptyKey);

        let err = SettingDescriptor::text(SettingSpec::new("Feed URL")).unwrap_err();
        assert!(matches!(err, SettingValidationError::InvalidKey(_)));
    }

    #[test]
    fn checked_fixes_pattern_and_boolean_text() {
        let setting =
            SettingDescriptor::checked(SettingSpec::new("show_icon"), true, "Show icon")
                .expect("valid setting");
        assert_eq!(setting.pattern(), CHECKED_PATTERN);
        assert_eq!(setting.default_value(), "True");
        assert!(setting.matches("False"));
        assert!(!setting.matches("yes"));
    }

    #[test]
    fn from_json_rejects_unknown_members() {
        let err = SettingDescriptor::from_json(&json!({"key": "title", "colour": "red"}))
            .unwrap_err();
        assert_eq!(err, SettingValidationError::UnknownField("colour".to_string()));
    }

    #[test]
    fn from_json_rejects_members_of_other_kinds() {
        let cases = [
            (json!({"key": "title", "label": "Title"}), "label"),
            (json!({"key": "order", "kind": "password", "selections": []}), "selections"),
            (json!({"key": "show", "kind": "checked", "selections": []}), "selections"),
            (json!({"key": "show", "kind": "checked", "pattern": "^x$"}), "pattern"),
            (json!({"key": "order", "kind": "select", "label": "Order"}), "label"),
        ];
        for (declaration, field) in cases {
            let err = SettingDescriptor::from_json(&declaration).unwrap_err();
            assert_eq!(err, SettingValidationError::UnknownField(field.to_string()));
        }
    }

    #[test]
    fn display_omits_current_value() {
        let setting = SettingDescriptor::password(
            SettingSpec::new("api_key").with_value("s3cret"),
        )
        .expect("valid setting");
        assert!(!setting.to_string().contains("s3cret"));
    }
}
