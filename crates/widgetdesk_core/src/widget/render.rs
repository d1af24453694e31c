//! HTML fragment rendering for widget placements.
//!
//! # Responsibility
//! - Wrap generated content in the standard widget container.
//! - Isolate failures so one widget never aborts page composition.
//!
//! # Invariants
//! - Content generation completes before any container markup is emitted.
//! - The instance id appears exactly once, escaped, in the opening tag.
//! - Titles are escaped; generated content is emitted as is.

use crate::html::escape_html;
use crate::widget::instance::{LiveWidget, WidgetInstance};
use crate::widget::instantiate::{InstantiateError, Instantiator};
use log::{error, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Failure inside a widget's content hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentGenerationError {
    pub instance_id: String,
    pub widget: String,
    pub message: String,
}

impl Display for ContentGenerationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "widget `{}@{}` failed to render: {}",
            self.widget, self.instance_id, self.message
        )
    }
}

impl Error for ContentGenerationError {}

/// Renders a live widget into its container fragment.
pub fn render(widget: &LiveWidget) -> Result<String, ContentGenerationError> {
    let content = widget
        .behavior()
        .content(widget.state())
        .map_err(|err| ContentGenerationError {
            instance_id: widget.id().to_string(),
            widget: widget.class().key().to_string(),
            message: err.message,
        })?;

    let mut buffer = String::with_capacity(content.len() + 128);
    buffer.push_str("<div class=\"widget\" id=\"");
    buffer.push_str(&escape_html(widget.id()));
    buffer.push_str("\">");
    let title = widget.title();
    if !title.is_empty() {
        buffer.push_str("<h3 class=\"widget-title\">");
        buffer.push_str(&escape_html(title));
        buffer.push_str("</h3>");
    }
    buffer.push_str("<div class=\"widget-content\">");
    buffer.push_str(&content);
    buffer.push_str("</div></div>");
    Ok(buffer)
}

/// Renders a live widget, turning hook errors and panics into an error
/// fragment.
pub fn render_isolated(widget: &LiveWidget) -> String {
    match catch_unwind(AssertUnwindSafe(|| render(widget))) {
        Ok(Ok(fragment)) => fragment,
        Ok(Err(err)) => {
            error!(
                "event=widget_render module=widget status=error widget={} instance_id={} error={}",
                err.widget, err.instance_id, err.message
            );
            error_fragment(widget.id(), "This widget failed to render.")
        }
        Err(_) => {
            error!(
                "event=widget_render module=widget status=error widget={} instance_id={} error=panic",
                widget.class().key(),
                widget.id()
            );
            error_fragment(widget.id(), "This widget failed to render.")
        }
    }
}

/// Visible placeholder used in place of a failed widget.
pub fn error_fragment(instance_id: &str, message: &str) -> String {
    format!(
        "<div class=\"widget widget-error\" id=\"{}\"><div class=\"widget-content\"><p>{}</p></div></div>",
        escape_html(instance_id),
        escape_html(message)
    )
}

/// Renders stored placements for page composition.
#[derive(Debug, Clone, Copy)]
pub struct Renderer<'r> {
    instantiator: Instantiator<'r>,
}

impl<'r> Renderer<'r> {
    pub fn new(instantiator: Instantiator<'r>) -> Self {
        Self { instantiator }
    }

    /// Renders one placement; never fails.
    pub fn render_placement(&self, record: &WidgetInstance) -> String {
        match self.instantiator.instantiate_record(record) {
            Ok(widget) => render_isolated(&widget),
            Err(err) => {
                warn!(
                    "event=widget_render module=widget status=error widget={} instance_id={} error={}",
                    record.widget_class_name, record.id, err
                );
                let message = match err {
                    InstantiateError::UnknownWidget(_) => format!(
                        "Widget `{}` is not installed.",
                        record.widget_class_name
                    ),
                    InstantiateError::Overlay(_) => {
                        "This widget has invalid settings.".to_string()
                    }
                };
                error_fragment(&record.id, &message)
            }
        }
    }

    /// Renders placements in order.
    pub fn render_all(&self, records: &[WidgetInstance]) -> Vec<String> {
        records
            .iter()
            .map(|record| self.render_placement(record))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{error_fragment, render};
    use crate::widget::instance::Overlay;
    use crate::widget::instantiate::Instantiator;
    use crate::widget::registry::WidgetRegistry;

    #[test]
    fn escapes_instance_id_and_title() {
        let registry = WidgetRegistry::with_installed();
        let mut overlay = Overlay::new();
        overlay.insert("title".to_string(), "<News>".to_string());
        let widget = Instantiator::new(&registry)
            .instantiate("html", "a\"b", &overlay)
            .expect("instantiate");

        let html = render(&widget).expect("render");
        assert!(html.starts_with("<div class=\"widget\" id=\"a&quot;b\">"));
        assert!(html.contains("<h3 class=\"widget-title\">&lt;News&gt;</h3>"));
    }

    #[test]
    fn error_fragment_is_balanced() {
        let html = error_fragment("x", "broken");
        assert_eq!(html.matches("<div").count(), html.matches("</div>").count());
    }
}
