//! Admin configuration form helpers.
//!
//! # Responsibility
//! - Render one input per setting, chosen by setting kind.
//! - Validate submitted text against `required` and `pattern`.
//!
//! # Invariants
//! - Select membership is not enforced; only the pattern is checked.
//! - A checked setting absent from a submission is `"False"` (unchecked
//!   checkboxes are not posted by browsers).

use crate::html::escape_html;
use crate::setting::descriptor::{SettingDescriptor, SettingKind, CHECKED_FALSE, CHECKED_TRUE};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Why one submitted field was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldErrorKind {
    Required,
    PatternMismatch,
}

/// One rejected field of a settings submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub key: String,
    pub kind: FieldErrorKind,
}

impl Display for FieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            FieldErrorKind::Required => write!(f, "setting `{}` is required", self.key),
            FieldErrorKind::PatternMismatch => {
                write!(f, "setting `{}` does not match its pattern", self.key)
            }
        }
    }
}

impl Error for FieldError {}

/// Validates a submission and returns the resolved value of every setting.
///
/// Fields missing from `submitted` keep their current value, except checked
/// settings which resolve to `"False"`. Submitted keys with no setting are
/// ignored.
pub fn validate_submission(
    settings: &BTreeMap<String, SettingDescriptor>,
    submitted: &BTreeMap<String, String>,
) -> Result<BTreeMap<String, String>, Vec<FieldError>> {
    let mut resolved = BTreeMap::new();
    let mut errors = Vec::new();

    for (key, setting) in settings {
        let candidate = match (submitted.get(key), setting.kind()) {
            (Some(value), _) => value.clone(),
            (None, SettingKind::Checked { .. }) => CHECKED_FALSE.to_string(),
            (None, _) => setting.value().to_string(),
        };

        if setting.is_required() && candidate.trim().is_empty() {
            errors.push(FieldError {
                key: key.clone(),
                kind: FieldErrorKind::Required,
            });
            continue;
        }
        if !setting.matches(&candidate) {
            errors.push(FieldError {
                key: key.clone(),
                kind: FieldErrorKind::PatternMismatch,
            });
            continue;
        }
        resolved.insert(key.clone(), candidate);
    }

    if errors.is_empty() {
        Ok(resolved)
    } else {
        Err(errors)
    }
}

/// Renders labelled inputs for every setting, in key order.
pub fn render_form_fields(settings: &BTreeMap<String, SettingDescriptor>) -> String {
    let mut out = String::new();
    for (key, setting) in settings {
        let name = escape_html(key);
        out.push_str("<p class=\"widget-setting\">");
        out.push_str(&format!(
            "<label for=\"setting-{name}\">{}</label>",
            escape_html(setting.description())
        ));
        out.push_str(&render_input(&name, setting));
        out.push_str("</p>");
    }
    out
}

fn render_input(name: &str, setting: &SettingDescriptor) -> String {
    let value = escape_html(setting.value());
    let required = if setting.is_required() { " required" } else { "" };
    match setting.kind() {
        SettingKind::Text => format!(
            "<input type=\"text\" id=\"setting-{name}\" name=\"{name}\" value=\"{value}\"{required} />"
        ),
        SettingKind::Password => format!(
            "<input type=\"password\" id=\"setting-{name}\" name=\"{name}\" value=\"{value}\"{required} />"
        ),
        SettingKind::Checked { label } => {
            let checked = if setting.value() == CHECKED_TRUE {
                " checked"
            } else {
                ""
            };
            format!(
                "<input type=\"checkbox\" id=\"setting-{name}\" name=\"{name}\" value=\"{CHECKED_TRUE}\"{checked} /> {}",
                escape_html(label)
            )
        }
        SettingKind::Select { selections } => {
            let mut out = format!("<select id=\"setting-{name}\" name=\"{name}\"{required}>");
            let mut open_group: Option<&str> = None;
            for selection in selections {
                let group = selection.group.as_deref();
                if group != open_group {
                    if open_group.is_some() {
                        out.push_str("</optgroup>");
                    }
                    if let Some(label) = group {
                        out.push_str(&format!("<optgroup label=\"{}\">", escape_html(label)));
                    }
                    open_group = group;
                }
                let selected = if selection.key == setting.value() {
                    " selected"
                } else {
                    ""
                };
                out.push_str(&format!(
                    "<option value=\"{}\"{selected}>{}</option>",
                    escape_html(&selection.key),
                    escape_html(&selection.label)
                ));
            }
            if open_group.is_some() {
                out.push_str("</optgroup>");
            }
            out.push_str("</select>");
            out
        }
    }
}
