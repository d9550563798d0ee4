//! HTTP implementation of [`BackendGateway`] on top of `reqwest`.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::gateway::BackendGateway;
use crate::wire::{
    application_error, Ack, CheckNameQuery, CheckNameResponse, Endpoint, InitProjectRequest,
    InitProjectResponse, LoadModelRequest, LoadModelResponse, LoadedProject, PredictRequest,
    PredictResponse, ProjectRequest, RotateResponse, SampleRequest,
};

/// Classifier backend reached over HTTP.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct HttpGateway {
    inner: Arc<InnerGateway>,
}

struct InnerGateway {
    http: Client,
    base_url: Url,
}

impl HttpGateway {
    /// Build a gateway for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Http`] if the HTTP client fails to build.
    pub fn new(config: &GatewayConfig) -> GatewayResult<Self> {
        #[cfg(not(target_arch = "wasm32"))]
        let http = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            // Disable proxy detection to avoid macOS system-configuration panic
            .no_proxy()
            .build()?;

        #[cfg(target_arch = "wasm32")]
        let http = Client::builder().build()?;

        tracing::debug!(base_url = %config.base_url, "Backend gateway ready");

        Ok(Self {
            inner: Arc::new(InnerGateway {
                http,
                base_url: config.base_url.clone(),
            }),
        })
    }

    /// The base URL every endpoint is resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    fn url(&self, endpoint: Endpoint) -> GatewayResult<Url> {
        self.inner
            .base_url
            .join(endpoint.path())
            .map_err(|e| GatewayError::InvalidUrl(e.to_string()))
    }

    async fn post_form<B, T>(&self, endpoint: Endpoint, body: &B) -> GatewayResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        tracing::debug!(%endpoint, "POST");
        let response = self
            .inner
            .http
            .post(self.url(endpoint)?)
            .form(body)
            .send()
            .await?;
        Self::read(endpoint, response).await
    }

    async fn get_query<Q, T>(&self, endpoint: Endpoint, query: &Q) -> GatewayResult<T>
    where
        Q: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        tracing::debug!(%endpoint, "GET");
        let response = self
            .inner
            .http
            .get(self.url(endpoint)?)
            .query(query)
            .send()
            .await?;
        Self::read(endpoint, response).await
    }

    /// Check status, then the `error` field, then the expected shape.
    async fn read<T: DeserializeOwned>(endpoint: Endpoint, response: Response) -> GatewayResult<T> {
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%endpoint, status = status.as_u16(), "Backend returned failure status");
            return Err(GatewayError::Status {
                endpoint,
                status: status.as_u16(),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| GatewayError::UnexpectedResponse {
                endpoint,
                detail: e.to_string(),
            })?;

        if let Some(message) = application_error(&body) {
            tracing::warn!(%endpoint, %message, "Backend reported an error");
            return Err(GatewayError::Application { endpoint, message });
        }

        serde_json::from_value(body).map_err(|e| GatewayError::UnexpectedResponse {
            endpoint,
            detail: e.to_string(),
        })
    }
}

impl std::fmt::Debug for HttpGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGateway")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl BackendGateway for HttpGateway {
    async fn init_project(
        &self,
        request: &InitProjectRequest,
    ) -> GatewayResult<InitProjectResponse> {
        self.post_form(Endpoint::InitProject, request).await
    }

    async fn check_project_name(&self, project_name: &str) -> GatewayResult<bool> {
        let response: CheckNameResponse = self
            .get_query(Endpoint::CheckProjectName, &CheckNameQuery { project_name })
            .await?;
        Ok(response.exists)
    }

    async fn load_model(&self, request: &LoadModelRequest) -> GatewayResult<LoadedProject> {
        let response: LoadModelResponse = self.post_form(Endpoint::LoadModel, request).await?;
        Ok(response.project)
    }

    async fn save_sample(&self, request: &SampleRequest) -> GatewayResult<Ack> {
        self.post_form(Endpoint::Save, request).await
    }

    async fn predict(&self, request: &PredictRequest) -> GatewayResult<String> {
        let response: PredictResponse = self.post_form(Endpoint::Predict, request).await?;
        Ok(response.prediction)
    }

    async fn train(&self, project_name: &str) -> GatewayResult<Ack> {
        self.post_form(Endpoint::Train, &ProjectRequest::new(project_name))
            .await
    }

    async fn rotate(&self, project_name: &str) -> GatewayResult<String> {
        let response: RotateResponse = self
            .post_form(Endpoint::Rotate, &ProjectRequest::new(project_name))
            .await?;
        Ok(response.model)
    }

    async fn save_all(&self, project_name: &str) -> GatewayResult<Ack> {
        self.post_form(Endpoint::SaveAll, &ProjectRequest::new(project_name))
            .await
    }

    async fn discard_project(&self, project_name: &str) -> GatewayResult<Ack> {
        self.post_form(Endpoint::DiscardProject, &ProjectRequest::new(project_name))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doodle_core::ClassLabels;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gateway_for(server: &MockServer) -> HttpGateway {
        let config = GatewayConfig::new(&server.uri()).expect("config");
        HttpGateway::new(&config).expect("gateway")
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn init_project_sends_form_fields() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/init-project/"))
            .and(body_string_contains("project_name=shapes"))
            .and(body_string_contains("class2=square"))
            .and(body_string_contains("persistent=false"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": "Project initialized successfully",
                "classNames": ["circle", "square", "triangle"]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let labels = ClassLabels::new("circle", "square", "triangle");
        let response = gateway_for(&server)
            .init_project(&InitProjectRequest::new("shapes", &labels, false))
            .await
            .expect("init");
        assert_eq!(response.class_names, vec!["circle", "square", "triangle"]);
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn check_name_uses_query_string() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/check-project-name/"))
            .and(query_param("project_name", "shapes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "exists": true })))
            .expect(1)
            .mount(&server)
            .await;

        let exists = gateway_for(&server)
            .check_project_name("shapes")
            .await
            .expect("check");
        assert!(exists);
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn sample_is_sent_as_data_url() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/save/"))
            .and(body_string_contains("image_base64=data%3Aimage%2Fpng%3Bbase64%2C"))
            .and(body_string_contains("class_num=2"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "message": "Image saved" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let ack = gateway_for(&server)
            .save_sample(&SampleRequest {
                image_base64: "data:image/png;base64,iVBORw0KGgo=".into(),
                class_num: 2,
                project_name: "shapes".into(),
            })
            .await
            .expect("save");
        assert_eq!(ack.message.as_deref(), Some("Image saved"));
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn error_field_is_an_application_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/predict/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "error": "Train the model first." })),
            )
            .mount(&server)
            .await;

        let err = gateway_for(&server)
            .predict(&PredictRequest {
                image_base64: "data:image/png;base64,AA==".into(),
                project_name: "shapes".into(),
            })
            .await
            .unwrap_err();

        match err {
            GatewayError::Application { endpoint, message } => {
                assert_eq!(endpoint, Endpoint::Predict);
                assert_eq!(message, "Train the model first.");
            }
            other => panic!("expected application error, got {other:?}"),
        }
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn failure_status_is_a_transport_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/rotate/"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = gateway_for(&server).rotate("shapes").await.unwrap_err();
        assert!(err.is_transport());
        assert!(matches!(err, GatewayError::Status { status: 500, .. }));
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn load_model_reads_nested_project() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/load-model/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": "Project loaded successfully",
                "project": { "name": "shapes", "classes": ["a", "b", "c"] }
            })))
            .mount(&server)
            .await;

        let project = gateway_for(&server)
            .load_model(&LoadModelRequest::new("shapes", None))
            .await
            .expect("load");
        assert_eq!(project.name, "shapes");
        assert!(project.persistent);
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn missing_field_is_unexpected_response() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/rotate/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "ok" })))
            .mount(&server)
            .await;

        let err = gateway_for(&server).rotate("shapes").await.unwrap_err();
        assert!(matches!(
            err,
            GatewayError::UnexpectedResponse {
                endpoint: Endpoint::Rotate,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_error() {
        // Port 9 (discard) is closed on test machines.
        let config = GatewayConfig::new("http://127.0.0.1:9").expect("config");
        let gateway = HttpGateway::new(&config).expect("gateway");
        let err = gateway.train("shapes").await.unwrap_err();
        assert!(matches!(err, GatewayError::Http(_)));
        assert!(err.is_transport());
    }
}
