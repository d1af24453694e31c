//! Widget placement use-case service.
//!
//! # Responsibility
//! - Provide add/configure/remove/render/interact entry points for the admin
//!   console and page composition.
//! - Delegate persistence to repository implementations.
//!
//! # Invariants
//! - Only installed widget classes can be placed.
//! - `configure` persists only values that differ from their defaults.
//! - Rendering and interaction never fail the caller because of one widget.

use crate::repo::instance_repo::{RepoError, WidgetInstanceRepository};
use crate::setting::descriptor::SettingDescriptor;
use crate::setting::form::{validate_submission, FieldError};
use crate::widget::instance::{Overlay, OverlayPolicy};
use crate::widget::instantiate::{InstantiateError, Instantiator};
use crate::widget::interaction::{
    InteractionDispatcher, InteractionOutcome, InteractionRequest, ResponseSink,
};
use crate::widget::registry::{UnknownWidgetError, WidgetRegistry};
use crate::widget::render::Renderer;
use log::info;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for widget placement use-cases.
#[derive(Debug)]
pub enum WidgetServiceError {
    UnknownWidget(UnknownWidgetError),
    InstanceNotFound(String),
    Instantiate(InstantiateError),
    InvalidSubmission(Vec<FieldError>),
    Repo(RepoError),
}

impl Display for WidgetServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownWidget(err) => write!(f, "{err}"),
            Self::InstanceNotFound(id) => write!(f, "widget instance not found: {id}"),
            Self::Instantiate(err) => write!(f, "{err}"),
            Self::InvalidSubmission(errors) => {
                let details = errors
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ");
                write!(f, "invalid settings: {details}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for WidgetServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::UnknownWidget(err) => Some(err),
            Self::Instantiate(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::InstanceNotFound(_) | Self::InvalidSubmission(_) => None,
        }
    }
}

impl From<UnknownWidgetError> for WidgetServiceError {
    fn from(value: UnknownWidgetError) -> Self {
        Self::UnknownWidget(value)
    }
}

impl From<InstantiateError> for WidgetServiceError {
    fn from(value: InstantiateError) -> Self {
        Self::Instantiate(value)
    }
}

impl From<RepoError> for WidgetServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::InstanceNotFound(id),
            other => Self::Repo(other),
        }
    }
}

pub type WidgetServiceResult<T> = Result<T, WidgetServiceError>;

/// Use-case service over a placement repository and a widget registry.
pub struct WidgetService<'r, R: WidgetInstanceRepository> {
    repo: R,
    registry: &'r WidgetRegistry,
    policy: OverlayPolicy,
}

impl<'r, R: WidgetInstanceRepository> WidgetService<'r, R> {
    pub fn new(repo: R, registry: &'r WidgetRegistry) -> Self {
        Self {
            repo,
            registry,
            policy: OverlayPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: OverlayPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    fn instantiator(&self) -> Instantiator<'r> {
        Instantiator::new(self.registry).with_policy(self.policy)
    }

    /// Places an installed widget on `page`.
    pub fn add_widget(&self, page: &str, widget_class_name: &str) -> WidgetServiceResult<String> {
        let class = self.registry.resolve(widget_class_name)?;
        let id = self.repo.create_instance(page, class.key())?;
        Ok(id)
    }

    pub fn remove_widget(&self, instance_id: &str) -> WidgetServiceResult<()> {
        self.repo.delete_instance(instance_id)?;
        Ok(())
    }

    /// Settings of a placement with stored values applied, for form display.
    pub fn settings_for_instance(
        &self,
        instance_id: &str,
    ) -> WidgetServiceResult<BTreeMap<String, SettingDescriptor>> {
        let record = self
            .repo
            .load(instance_id)?
            .ok_or_else(|| WidgetServiceError::InstanceNotFound(instance_id.to_string()))?;
        let widget = self.instantiator().instantiate_record(&record)?;
        Ok(widget.state().settings().clone())
    }

    /// Validates a form submission and saves the resulting minimal overlay.
    ///
    /// Extras already stored on the placement are preserved.
    pub fn configure(
        &self,
        instance_id: &str,
        submitted: &BTreeMap<String, String>,
    ) -> WidgetServiceResult<Overlay> {
        let record = self
            .repo
            .load(instance_id)?
            .ok_or_else(|| WidgetServiceError::InstanceNotFound(instance_id.to_string()))?;
        let mut widget = self.instantiator().instantiate_record(&record)?;

        let resolved = validate_submission(widget.state().settings(), submitted)
            .map_err(WidgetServiceError::InvalidSubmission)?;
        widget
            .state_mut()
            .apply_overlay(&resolved, OverlayPolicy::Strict)
            .map_err(InstantiateError::from)?;

        let overlay = widget.state().modified_overlay();
        self.repo.save(instance_id, &overlay)?;
        info!(
            "event=widget_configure module=service status=ok widget={} instance_id={} overlay_keys={}",
            record.widget_class_name,
            instance_id,
            overlay.len()
        );
        Ok(overlay)
    }

    /// Renders one placement; unknown or failing widgets become error
    /// fragments.
    pub fn render_instance(&self, instance_id: &str) -> WidgetServiceResult<String> {
        let record = self
            .repo
            .load(instance_id)?
            .ok_or_else(|| WidgetServiceError::InstanceNotFound(instance_id.to_string()))?;
        Ok(Renderer::new(self.instantiator()).render_placement(&record))
    }

    /// Renders every placement of a page in position order.
    pub fn render_page(&self, page: &str) -> WidgetServiceResult<Vec<String>> {
        let records = self.repo.list_page(page)?;
        Ok(Renderer::new(self.instantiator()).render_all(&records))
    }

    /// Dispatches an interaction request to a placement.
    pub fn interact(
        &self,
        instance_id: &str,
        request: &InteractionRequest,
        sink: &mut dyn ResponseSink,
    ) -> InteractionOutcome {
        InteractionDispatcher::new(&self.repo, self.instantiator()).dispatch(
            instance_id,
            request,
            sink,
        )
    }
}
