//! Built-in widgets installed at startup.

pub mod html;
pub mod subscribe;

use crate::widget::registry::WidgetDefinition;

/// Definitions installed into the process-wide registry.
pub const DEFINITIONS: &[WidgetDefinition] = &[
    WidgetDefinition {
        key: html::HTML_WIDGET_KEY,
        define: html::define,
    },
    WidgetDefinition {
        key: subscribe::SUBSCRIBE_WIDGET_KEY,
        define: subscribe::define,
    },
];
