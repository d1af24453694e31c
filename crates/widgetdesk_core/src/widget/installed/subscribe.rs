//! Feed subscription widget.

use crate::html::escape_html;
use crate::setting::descriptor::{SettingDescriptor, SettingSpec};
use crate::widget::class::{
    Widget, WidgetClass, WidgetDefinitionError, WidgetHookError, WidgetMetadata,
};
use crate::widget::instance::WidgetState;

pub const SUBSCRIBE_WIDGET_KEY: &str = "subscribe";
pub const DEFAULT_FEED_URL: &str = "/blog/feed";
const FEED_ICON: &str = "/widget/installed/subscribe/static/feed.gif";

/// Links the site feed for readers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubscribeWidget;

impl Widget for SubscribeWidget {
    fn content(&self, state: &WidgetState) -> Result<String, WidgetHookError> {
        let url = match state.setting("feed_url") {
            Some(url) if !url.trim().is_empty() => escape_html(url.trim()),
            _ => return Err(WidgetHookError::new("feed url is empty")),
        };
        Ok(format!(
            "<div><a href=\"{url}\"><img src=\"{FEED_ICON}\" width=\"16\" height=\"16\" style=\"vertical-align:middle\" /></a> <a href=\"{url}\" target=\"_blank\">Subscribe to Feed</a></div>"
        ))
    }
}

fn create() -> Box<dyn Widget> {
    Box::new(SubscribeWidget)
}

pub fn define() -> Result<WidgetClass, WidgetDefinitionError> {
    WidgetClass::builder(SUBSCRIBE_WIDGET_KEY, create)
        .metadata(WidgetMetadata {
            name: "Subscribe To".to_string(),
            author: "Michael Liao".to_string(),
            description: "Subscribe the feed to readers".to_string(),
            url: "http://www.expressme.org/".to_string(),
        })
        .setting(SettingDescriptor::text(
            SettingSpec::new("feed_url")
                .with_default(DEFAULT_FEED_URL)
                .with_description("Feed URL")
                .with_pattern(r"^\S+$")
                .required(),
        )?)
        .build()
}
