use widgetdesk_core::{
    render, render_isolated, DefaultWidget, InstantiateError, Instantiator, Overlay, Renderer,
    UnknownWidgetError, Widget, WidgetClass, WidgetHookError, WidgetInstance, WidgetRegistry,
    WidgetState,
};

struct OkWidget;

impl Widget for OkWidget {
    fn content(&self, _state: &WidgetState) -> Result<String, WidgetHookError> {
        Ok("<p>ok</p>".to_string())
    }
}

struct FailingWidget;

impl Widget for FailingWidget {
    fn content(&self, _state: &WidgetState) -> Result<String, WidgetHookError> {
        Err(WidgetHookError::new("backend unavailable"))
    }
}

struct PanickingWidget;

impl Widget for PanickingWidget {
    fn content(&self, _state: &WidgetState) -> Result<String, WidgetHookError> {
        panic!("content hook exploded");
    }
}

fn create_ok() -> Box<dyn Widget> {
    Box::new(OkWidget)
}

fn create_failing() -> Box<dyn Widget> {
    Box::new(FailingWidget)
}

fn create_panicking() -> Box<dyn Widget> {
    Box::new(PanickingWidget)
}

fn create_debug() -> Box<dyn Widget> {
    Box::new(DefaultWidget)
}

fn registry() -> WidgetRegistry {
    let mut registry = WidgetRegistry::with_installed();
    registry
        .register(WidgetClass::builder("ok", create_ok).build().unwrap())
        .unwrap();
    registry
        .register(
            WidgetClass::builder("failing", create_failing)
                .build()
                .unwrap(),
        )
        .unwrap();
    registry
        .register(
            WidgetClass::builder("panicking", create_panicking)
                .build()
                .unwrap(),
        )
        .unwrap();
    registry
        .register(
            WidgetClass::builder("debug", create_debug)
                .build()
                .unwrap(),
        )
        .unwrap();
    registry
}

fn overlay(pairs: &[(&str, &str)]) -> Overlay {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

#[test]
fn instantiate_applies_overlay_and_identity() {
    let registry = registry();
    let widget = Instantiator::new(&registry)
        .instantiate("html", "id123", &overlay(&[("content", "<b>hi</b>")]))
        .unwrap();
    assert_eq!(widget.id(), "id123");
    assert_eq!(widget.attribute("content"), Some("<b>hi</b>"));
    assert_eq!(widget.class().key(), "html");
}

#[test]
fn instantiate_unknown_class_fails() {
    let registry = registry();
    let err = Instantiator::new(&registry)
        .instantiate("gallery", "id123", &Overlay::new())
        .unwrap_err();
    assert_eq!(
        err,
        InstantiateError::UnknownWidget(UnknownWidgetError("gallery".to_string()))
    );
}

#[test]
fn renders_default_title_and_content() {
    let registry = registry();
    let widget = Instantiator::new(&registry)
        .instantiate("ok", "w1", &Overlay::new())
        .unwrap();
    assert_eq!(
        render(&widget).unwrap(),
        "<div class=\"widget\" id=\"w1\"><h3 class=\"widget-title\">Widget</h3><div class=\"widget-content\"><p>ok</p></div></div>"
    );
}

#[test]
fn empty_title_omits_title_block() {
    let registry = registry();
    let widget = Instantiator::new(&registry)
        .instantiate("ok", "w1", &overlay(&[("title", "")]))
        .unwrap();
    let html = render(&widget).unwrap();
    assert!(!html.contains("<h3"));
    assert_eq!(
        html,
        "<div class=\"widget\" id=\"w1\"><div class=\"widget-content\"><p>ok</p></div></div>"
    );
}

#[test]
fn identity_appears_once_in_opening_tag() {
    let registry = registry();
    for (class, id) in [("ok", "alpha"), ("html", "beta-2"), ("subscribe", "gamma_3")] {
        let widget = Instantiator::new(&registry)
            .instantiate(class, id, &Overlay::new())
            .unwrap();
        let html = render(&widget).unwrap();
        assert_eq!(html.matches(id).count(), 1, "fragment: {html}");
        assert!(html.starts_with(&format!("<div class=\"widget\" id=\"{id}\">")));
    }
}

#[test]
fn rendering_is_idempotent() {
    let registry = registry();
    let widget = Instantiator::new(&registry)
        .instantiate("subscribe", "feed", &overlay(&[("feed_url", "/rss?a=1&b=2")]))
        .unwrap();
    let first = render(&widget).unwrap();
    let second = render(&widget).unwrap();
    assert_eq!(first, second);
    assert!(first.contains("href=\"/rss?a=1&amp;b=2\""));
}

#[test]
fn default_content_hook_names_class_and_instance() {
    let registry = registry();
    let widget = Instantiator::new(&registry)
        .instantiate("debug", "d1", &Overlay::new())
        .unwrap();
    assert!(render(&widget)
        .unwrap()
        .contains("<div class=\"widget-content\"><p>Widget debug@d1</p></div>"));
}

#[test]
fn content_errors_are_reported_and_isolated() {
    let registry = registry();
    let widget = Instantiator::new(&registry)
        .instantiate("failing", "f1", &Overlay::new())
        .unwrap();

    let err = render(&widget).unwrap_err();
    assert_eq!(err.instance_id, "f1");
    assert_eq!(err.widget, "failing");
    assert_eq!(err.message, "backend unavailable");

    let html = render_isolated(&widget);
    assert!(html.starts_with("<div class=\"widget widget-error\" id=\"f1\">"));
    assert!(!html.contains("backend unavailable"));
}

#[test]
fn panicking_widget_does_not_abort_page() {
    let registry = registry();
    let renderer = Renderer::new(Instantiator::new(&registry));
    let records = vec![
        WidgetInstance {
            id: "p1".to_string(),
            widget_class_name: "panicking".to_string(),
            overlay: Overlay::new(),
        },
        WidgetInstance {
            id: "gone".to_string(),
            widget_class_name: "uninstalled".to_string(),
            overlay: Overlay::new(),
        },
        WidgetInstance {
            id: "o1".to_string(),
            widget_class_name: "ok".to_string(),
            overlay: Overlay::new(),
        },
    ];

    let fragments = renderer.render_all(&records);
    assert_eq!(fragments.len(), 3);
    assert!(fragments[0].contains("widget-error"));
    assert!(fragments[1].contains("Widget `uninstalled` is not installed."));
    assert!(fragments[2].contains("<p>ok</p>"));
}
