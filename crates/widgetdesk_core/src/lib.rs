//! Core of the widget-based site administration console.
//! Widget classes, their settings, placement storage and fragment rendering
//! live here; HTTP routing and sessions belong to the embedding application.

pub mod config;
pub mod db;
pub mod html;
pub mod logging;
pub mod repo;
pub mod service;
pub mod setting;
pub mod widget;

pub use config::{ConfigError, ConsoleConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use repo::instance_repo::{
    RepoError, RepoResult, SqliteWidgetInstanceRepository, WidgetInstanceRepository,
};
pub use service::widget_service::{WidgetService, WidgetServiceError, WidgetServiceResult};
pub use setting::descriptor::{
    Selection, SettingDescriptor, SettingKind, SettingSpec, SettingValidationError,
};
pub use setting::form::{render_form_fields, validate_submission, FieldError, FieldErrorKind};
pub use widget::class::{
    DefaultWidget, Widget, WidgetClass, WidgetDefinitionError, WidgetHookError, WidgetMetadata,
    WidgetSchema,
};
pub use widget::instance::{
    LiveWidget, Overlay, OverlayError, OverlayPolicy, WidgetInstance, WidgetState,
};
pub use widget::instantiate::{InstantiateError, Instantiator};
pub use widget::interaction::{
    handle_interaction, BufferedResponse, InteractionDispatcher, InteractionError,
    InteractionOutcome, InteractionRequest, ResponseError, ResponseSink, ResponseState,
    ResponseWriter,
};
pub use widget::registry::{
    get_settings, installed_widgets, InstallReport, RegistryError, UnknownWidgetError,
    WidgetDefinition, WidgetRegistry,
};
pub use widget::render::{render, render_isolated, ContentGenerationError, Renderer};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
