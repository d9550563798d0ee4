//! The backend seam.
//!
//! Sessions and project flows only ever talk to a [`BackendGateway`]; the
//! HTTP implementation lives in [`crate::http`], tests substitute fakes.

use async_trait::async_trait;

use crate::error::GatewayResult;
use crate::wire::{
    Ack, InitProjectRequest, InitProjectResponse, LoadModelRequest, LoadedProject,
    PredictRequest, SampleRequest,
};

/// Stateless request/response access to the classifier service.
///
/// Every method is a single exchange. Implementations must turn a payload
/// carrying a truthy `error` field into [`GatewayError::Application`].
///
/// [`GatewayError::Application`]: crate::GatewayError::Application
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait BackendGateway {
    /// Create a project skeleton. Returns the stored class names.
    async fn init_project(&self, request: &InitProjectRequest)
        -> GatewayResult<InitProjectResponse>;

    /// Whether a project with this name already exists.
    async fn check_project_name(&self, project_name: &str) -> GatewayResult<bool>;

    /// Load an existing project, optionally validating class names.
    async fn load_model(&self, request: &LoadModelRequest) -> GatewayResult<LoadedProject>;

    /// Submit one labeled sample.
    async fn save_sample(&self, request: &SampleRequest) -> GatewayResult<Ack>;

    /// Classify one drawing. Returns the predicted label.
    async fn predict(&self, request: &PredictRequest) -> GatewayResult<String>;

    /// Retrain the active model on the accumulated samples.
    async fn train(&self, project_name: &str) -> GatewayResult<Ack>;

    /// Switch to the next model variant. Returns the new active label.
    async fn rotate(&self, project_name: &str) -> GatewayResult<String>;

    /// Persist the project durably.
    async fn save_all(&self, project_name: &str) -> GatewayResult<Ack>;

    /// Drop a non-persisted project's accumulated state.
    async fn discard_project(&self, project_name: &str) -> GatewayResult<Ack>;
}
