//! HTML snippet widget.

use crate::setting::descriptor::{SettingDescriptor, SettingSpec};
use crate::widget::class::{
    Widget, WidgetClass, WidgetDefinitionError, WidgetHookError, WidgetMetadata,
};
use crate::widget::instance::WidgetState;

pub const HTML_WIDGET_KEY: &str = "html";
pub const DEFAULT_SNIPPET: &str = "<p>Your html snippet goes here...</p>";

/// Emits the configured snippet verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlWidget;

impl Widget for HtmlWidget {
    fn content(&self, state: &WidgetState) -> Result<String, WidgetHookError> {
        Ok(state.setting("content").unwrap_or_default().to_string())
    }
}

fn create() -> Box<dyn Widget> {
    Box::new(HtmlWidget)
}

pub fn define() -> Result<WidgetClass, WidgetDefinitionError> {
    WidgetClass::builder(HTML_WIDGET_KEY, create)
        .metadata(WidgetMetadata {
            name: "HTML Snippet".to_string(),
            author: "Michael Liao".to_string(),
            description: "Display any HTML snippet".to_string(),
            url: "http://michael.liaoxuefeng.com/".to_string(),
        })
        .setting(SettingDescriptor::text(
            SettingSpec::new("title").with_description("Widget title"),
        )?)
        // Snippets span lines, so the pattern must let `.` cross newlines.
        .setting(SettingDescriptor::text(
            SettingSpec::new("content")
                .with_default(DEFAULT_SNIPPET)
                .with_description("Any HTML snippet")
                .with_pattern("(?s)^.*$"),
        )?)
        .build()
}
