//! Opening a project: create a new one or load a stored one.

use doodle_core::{ClassLabels, ProjectInfo, ProjectLoad, ProjectSetup};

use crate::error::{ActionError, ActionResult, GatewayError};
use crate::gateway::BackendGateway;
use crate::wire::{Endpoint, InitProjectRequest, LoadModelRequest};

/// Shown when the name check finds an existing project.
pub const NAME_TAKEN_MESSAGE: &str =
    "Project with this name already exists. Please choose a different name.";

/// Create a project from the setup form.
///
/// Every field is validated locally first, then the name is checked for
/// collisions before the skeleton is created. The labels of the returned
/// project are the ones the backend stored.
///
/// # Errors
///
/// Returns [`ActionError::Validation`] for an incomplete form or a taken name,
/// and the gateway error if either call fails.
pub async fn create_project<G>(gateway: &G, setup: &ProjectSetup) -> ActionResult<ProjectInfo>
where
    G: BackendGateway + ?Sized,
{
    let labels = setup.validate()?;
    let name = setup.name.trim();

    if gateway.check_project_name(name).await? {
        tracing::info!(project = %name, "Project name already taken");
        return Err(ActionError::Validation(NAME_TAKEN_MESSAGE.to_string()));
    }

    let response = gateway
        .init_project(&InitProjectRequest::new(name, &labels, setup.persistent))
        .await?;
    let classes = stored_labels(Endpoint::InitProject, response.class_names)?;

    tracing::info!(project = %name, persistent = setup.persistent, "Project created");
    Ok(ProjectInfo::new(name, classes, setup.persistent))
}

/// Load a stored project from the load form.
///
/// Class names are forwarded for validation only when all three are filled in.
///
/// # Errors
///
/// Returns [`ActionError::Validation`] for a missing name, and
/// [`ActionError::Application`] when the backend rejects the project or the
/// supplied class names.
pub async fn load_project<G>(gateway: &G, load: &ProjectLoad) -> ActionResult<ProjectInfo>
where
    G: BackendGateway + ?Sized,
{
    let labels = load.validate()?;
    let request = LoadModelRequest::new(load.name.trim(), labels.as_ref());

    let project = gateway.load_model(&request).await?;
    let classes = stored_labels(Endpoint::LoadModel, project.classes)?;

    tracing::info!(project = %project.name, persistent = project.persistent, "Project loaded");
    Ok(ProjectInfo::new(project.name, classes, project.persistent))
}

fn stored_labels(endpoint: Endpoint, names: Vec<String>) -> ActionResult<ClassLabels> {
    ClassLabels::try_from(names).map_err(|e| {
        ActionError::Transport(GatewayError::UnexpectedResponse {
            endpoint,
            detail: e.to_string(),
        })
    })
}
