//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `widgetdesk_core` linkage and print a demo page.
//! - Optionally read a JSON console config given as the first argument.

use log::info;
use std::collections::BTreeMap;
use std::error::Error;
use std::process::exit;
use widgetdesk_core::db::{open_db, open_db_in_memory};
use widgetdesk_core::{
    init_logging, installed_widgets, ConsoleConfig, SqliteWidgetInstanceRepository,
    WidgetInstanceRepository, WidgetService, WidgetServiceError,
};

const DEMO_PAGE: &str = "home";

fn main() {
    println!("widgetdesk_core ping={}", widgetdesk_core::ping());
    println!("widgetdesk_core version={}", widgetdesk_core::core_version());

    if let Err(err) = run() {
        eprintln!("widgetdesk: {err}");
        exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => ConsoleConfig::load(path)?,
        None => ConsoleConfig::default(),
    };
    if let Some(dir) = &config.log_dir {
        init_logging(&config.log_level, &dir.to_string_lossy())?;
    }

    let conn = match &config.database_path {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };
    let service = WidgetService::new(
        SqliteWidgetInstanceRepository::new(&conn),
        installed_widgets(),
    )
    .with_policy(config.overlay_policy);

    for (key, metadata) in installed_widgets().metadata() {
        println!("installed widget={key} name={}", metadata.name);
    }

    if seed_demo_page(&service)? {
        info!("event=cli_seed module=cli status=ok page={DEMO_PAGE}");
    }

    for fragment in service.render_page(DEMO_PAGE)? {
        println!("{fragment}");
    }
    info!("event=cli_demo module=cli status=ok page={DEMO_PAGE}");
    Ok(())
}

/// Places the demo widgets unless the page already has placements.
fn seed_demo_page<R: WidgetInstanceRepository>(
    service: &WidgetService<'_, R>,
) -> Result<bool, WidgetServiceError> {
    if !service.repo().list_page(DEMO_PAGE)?.is_empty() {
        return Ok(false);
    }

    let snippet = service.add_widget(DEMO_PAGE, "html")?;
    let mut submitted = BTreeMap::new();
    submitted.insert("title".to_string(), "Welcome".to_string());
    submitted.insert(
        "content".to_string(),
        "<p>Served by widgetdesk.</p>".to_string(),
    );
    service.configure(&snippet, &submitted)?;
    service.add_widget(DEMO_PAGE, "subscribe")?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::{seed_demo_page, DEMO_PAGE};
    use widgetdesk_core::db::open_db;
    use widgetdesk_core::{installed_widgets, SqliteWidgetInstanceRepository, WidgetService};

    #[test]
    fn demo_page_is_seeded_once_per_database() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("demo.db");

        for expected_seeded in [true, false] {
            let conn = open_db(&path).expect("open db");
            let service = WidgetService::new(
                SqliteWidgetInstanceRepository::new(&conn),
                installed_widgets(),
            );
            assert_eq!(seed_demo_page(&service).expect("seed"), expected_seeded);

            let page = service.render_page(DEMO_PAGE).expect("render");
            assert_eq!(page.len(), 2);
            assert!(page[0].contains("<h3 class=\"widget-title\">Welcome</h3>"));
        }
    }
}
