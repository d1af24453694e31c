//! Out-of-band widget interaction dispatch.
//!
//! # Responsibility
//! - Route a browser-initiated request to the targeted widget instance.
//! - Hand the widget a response writer that it must finish itself.
//! - Substitute a minimal error response when the widget fails before writing.
//!
//! # Invariants
//! - The dispatcher never reshapes output the widget already wrote.
//! - Status and headers cannot change once body output started.
//! - Nothing can be written after `finish`.
//! - A substituted error response carries only its own status and headers.

use crate::html::escape_html;
use crate::repo::instance_repo::{RepoError, WidgetInstanceRepository};
use crate::widget::instance::LiveWidget;
use crate::widget::instantiate::{InstantiateError, Instantiator};
use log::{error, info, warn};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Parsed interaction request handed to a widget.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InteractionRequest {
    pub method: String,
    pub url: String,
    pub parameters: BTreeMap<String, String>,
}

impl InteractionRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }
}

/// Transport-side response target owned by the HTTP layer.
pub trait ResponseSink {
    fn set_status(&mut self, status: u16);
    fn set_header(&mut self, name: &str, value: &str);
    /// Drops every header set so far.
    fn clear_headers(&mut self);
    fn write(&mut self, chunk: &str);
    fn finish(&mut self) {}
}

/// In-memory response sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
    pub finished: bool,
}

impl Default for BufferedResponse {
    fn default() -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: String::new(),
            finished: false,
        }
    }
}

impl BufferedResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

impl ResponseSink for BufferedResponse {
    fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    fn set_header(&mut self, name: &str, value: &str) {
        self.headers
            .retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.to_string()));
    }

    fn clear_headers(&mut self) {
        self.headers.clear();
    }

    fn write(&mut self, chunk: &str) {
        self.body.push_str(chunk);
    }

    fn finish(&mut self) {
        self.finished = true;
    }
}

/// Progress of a response through the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseState {
    Untouched,
    Writing,
    Finished,
}

/// Response handle passed to interaction hooks.
pub struct ResponseWriter<'s> {
    sink: &'s mut dyn ResponseSink,
    state: ResponseState,
}

impl<'s> ResponseWriter<'s> {
    pub fn new(sink: &'s mut dyn ResponseSink) -> Self {
        Self {
            sink,
            state: ResponseState::Untouched,
        }
    }

    pub fn state(&self) -> ResponseState {
        self.state
    }

    pub fn status(&mut self, status: u16) -> Result<(), ResponseError> {
        if self.state != ResponseState::Untouched {
            return Err(ResponseError::HeadersSent);
        }
        self.sink.set_status(status);
        Ok(())
    }

    pub fn header(&mut self, name: &str, value: &str) -> Result<(), ResponseError> {
        if self.state != ResponseState::Untouched {
            return Err(ResponseError::HeadersSent);
        }
        self.sink.set_header(name, value);
        Ok(())
    }

    /// Drops headers set so far; only allowed before body output.
    pub fn clear_headers(&mut self) -> Result<(), ResponseError> {
        if self.state != ResponseState::Untouched {
            return Err(ResponseError::HeadersSent);
        }
        self.sink.clear_headers();
        Ok(())
    }

    pub fn write(&mut self, chunk: &str) -> Result<(), ResponseError> {
        if self.state == ResponseState::Finished {
            return Err(ResponseError::AlreadyFinished);
        }
        self.state = ResponseState::Writing;
        self.sink.write(chunk);
        Ok(())
    }

    /// Marks the response complete.
    pub fn finish(&mut self) -> Result<(), ResponseError> {
        if self.state == ResponseState::Finished {
            return Err(ResponseError::AlreadyFinished);
        }
        self.state = ResponseState::Finished;
        self.sink.finish();
        Ok(())
    }
}

/// Misuse of a response writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseError {
    HeadersSent,
    AlreadyFinished,
}

impl Display for ResponseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HeadersSent => write!(f, "response headers already sent"),
            Self::AlreadyFinished => write!(f, "response already finished"),
        }
    }
}

impl Error for ResponseError {}

/// Interaction failures.
#[derive(Debug)]
pub enum InteractionError {
    InstanceNotFound(String),
    Store(RepoError),
    Instantiate(InstantiateError),
    Hook {
        instance_id: String,
        widget: String,
        message: String,
    },
    Panicked {
        instance_id: String,
        widget: String,
    },
    NoResponse {
        instance_id: String,
        widget: String,
    },
}

impl Display for InteractionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InstanceNotFound(id) => write!(f, "widget instance not found: {id}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Instantiate(err) => write!(f, "{err}"),
            Self::Hook {
                instance_id,
                widget,
                message,
            } => write!(f, "widget `{widget}@{instance_id}` failed: {message}"),
            Self::Panicked {
                instance_id,
                widget,
            } => write!(f, "widget `{widget}@{instance_id}` panicked"),
            Self::NoResponse {
                instance_id,
                widget,
            } => write!(f, "widget `{widget}@{instance_id}` wrote no response"),
        }
    }
}

impl Error for InteractionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Instantiate(err) => Some(err),
            _ => None,
        }
    }
}

/// What happened to one dispatched interaction.
#[derive(Debug)]
pub enum InteractionOutcome {
    /// The widget wrote and finished its response.
    Completed,
    /// The widget wrote output but did not finish; the dispatcher finished it.
    Finalized,
    /// The dispatcher wrote a minimal error response.
    ErrorResponse { status: u16, error: InteractionError },
    /// The widget failed after writing; output was left as is.
    Truncated { error: InteractionError },
}

impl InteractionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed | Self::Finalized)
    }
}

/// Invokes the interaction hook of a live widget.
pub fn handle_interaction(
    widget: &LiveWidget,
    request: &InteractionRequest,
    sink: &mut dyn ResponseSink,
) -> InteractionOutcome {
    let instance_id = widget.id().to_string();
    let widget_name = widget.class().key().to_string();
    let mut writer = ResponseWriter::new(sink);

    let result = catch_unwind(AssertUnwindSafe(|| {
        widget
            .behavior()
            .handle_interaction(widget.state(), request, &mut writer)
    }));

    let error = match result {
        Ok(Ok(())) => match writer.state() {
            ResponseState::Finished => {
                info!(
                    "event=widget_interaction module=widget status=ok widget={} instance_id={}",
                    widget_name, instance_id
                );
                return InteractionOutcome::Completed;
            }
            ResponseState::Writing => {
                warn!(
                    "event=widget_interaction module=widget status=unfinished widget={} instance_id={}",
                    widget_name, instance_id
                );
                let _ = writer.finish();
                return InteractionOutcome::Finalized;
            }
            ResponseState::Untouched => InteractionError::NoResponse {
                instance_id,
                widget: widget_name,
            },
        },
        Ok(Err(err)) => InteractionError::Hook {
            instance_id,
            widget: widget_name,
            message: err.message,
        },
        Err(_) => InteractionError::Panicked {
            instance_id,
            widget: widget_name,
        },
    };

    if writer.state() == ResponseState::Untouched {
        return write_error_response(&mut writer, 500, error);
    }

    error!(
        "event=widget_interaction module=widget status=error outcome=truncated error={}",
        error
    );
    InteractionOutcome::Truncated { error }
}

fn write_error_response(
    writer: &mut ResponseWriter<'_>,
    status: u16,
    error: InteractionError,
) -> InteractionOutcome {
    error!(
        "event=widget_interaction module=widget status=error outcome=error_response http_status={} error={}",
        status, error
    );
    // Drop headers a failed hook set before erroring.
    let _ = writer.clear_headers();
    let _ = writer.status(status);
    let _ = writer.header("Content-Type", "text/html; charset=utf-8");
    let _ = writer.write(&format!(
        "<html><head><title>Widget Error</title></head><body><p>{}</p></body></html>",
        escape_html(&error.to_string())
    ));
    let _ = writer.finish();
    InteractionOutcome::ErrorResponse { status, error }
}

/// Resolves the targeted instance, instantiates it and runs its hook.
pub struct InteractionDispatcher<'a, R: WidgetInstanceRepository> {
    repo: &'a R,
    instantiator: Instantiator<'a>,
}

impl<'a, R: WidgetInstanceRepository> InteractionDispatcher<'a, R> {
    pub fn new(repo: &'a R, instantiator: Instantiator<'a>) -> Self {
        Self { repo, instantiator }
    }

    pub fn dispatch(
        &self,
        instance_id: &str,
        request: &InteractionRequest,
        sink: &mut dyn ResponseSink,
    ) -> InteractionOutcome {
        let mut writer = ResponseWriter::new(sink);
        let record = match self.repo.load(instance_id) {
            Ok(Some(record)) => record,
            Ok(None) => {
                return write_error_response(
                    &mut writer,
                    404,
                    InteractionError::InstanceNotFound(instance_id.to_string()),
                )
            }
            Err(err) => {
                return write_error_response(&mut writer, 500, InteractionError::Store(err))
            }
        };

        let widget = match self.instantiator.instantiate_record(&record) {
            Ok(widget) => widget,
            Err(err) => {
                return write_error_response(&mut writer, 500, InteractionError::Instantiate(err))
            }
        };

        drop(writer);
        handle_interaction(&widget, request, sink)
    }
}
