//! Request and response shapes of the classifier backend.
//!
//! Requests are sent as `application/x-www-form-urlencoded` bodies (or a query
//! string for the name check); responses are JSON objects.

use std::fmt;

use doodle_core::ClassLabels;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Backend endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `POST /init-project/`
    InitProject,
    /// `GET /check-project-name/`
    CheckProjectName,
    /// `POST /load-model/`
    LoadModel,
    /// `POST /save/`
    Save,
    /// `POST /predict/`
    Predict,
    /// `POST /train/`
    Train,
    /// `POST /rotate/`
    Rotate,
    /// `POST /save-all/`
    SaveAll,
    /// `POST /discard-project/`
    DiscardProject,
}

impl Endpoint {
    /// Path relative to the backend base URL.
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::InitProject => "init-project/",
            Self::CheckProjectName => "check-project-name/",
            Self::LoadModel => "load-model/",
            Self::Save => "save/",
            Self::Predict => "predict/",
            Self::Train => "train/",
            Self::Rotate => "rotate/",
            Self::SaveAll => "save-all/",
            Self::DiscardProject => "discard-project/",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.path())
    }
}

/// Body of `POST /init-project/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InitProjectRequest {
    /// Requested project name.
    pub project_name: String,
    /// First class label.
    pub class1: String,
    /// Second class label.
    pub class2: String,
    /// Third class label.
    pub class3: String,
    /// Create the project as durable.
    pub persistent: bool,
}

impl InitProjectRequest {
    /// Build the request from validated labels.
    #[must_use]
    pub fn new(project_name: &str, labels: &ClassLabels, persistent: bool) -> Self {
        let [class1, class2, class3] = split_labels(labels);
        Self {
            project_name: project_name.to_string(),
            class1,
            class2,
            class3,
            persistent,
        }
    }
}

/// Response of `POST /init-project/`.
#[derive(Debug, Clone, Deserialize)]
pub struct InitProjectResponse {
    /// Labels as stored by the backend, in order.
    #[serde(rename = "classNames")]
    pub class_names: Vec<String>,
    /// Optional human-readable status.
    #[serde(default)]
    pub message: Option<String>,
}

/// Query of `GET /check-project-name/`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct CheckNameQuery<'a> {
    pub(crate) project_name: &'a str,
}

/// Response of `GET /check-project-name/`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CheckNameResponse {
    pub(crate) exists: bool,
}

/// Body of `POST /load-model/`.
///
/// Class names are only sent when all three are supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadModelRequest {
    /// Stored project name.
    pub project_name: String,
    /// First class label to check.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class1: Option<String>,
    /// Second class label to check.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class2: Option<String>,
    /// Third class label to check.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class3: Option<String>,
}

impl LoadModelRequest {
    /// Build the request, optionally carrying labels to validate.
    #[must_use]
    pub fn new(project_name: &str, labels: Option<&ClassLabels>) -> Self {
        let [class1, class2, class3] = match labels {
            Some(labels) => split_labels(labels).map(Some),
            None => [None, None, None],
        };
        Self {
            project_name: project_name.to_string(),
            class1,
            class2,
            class3,
        }
    }
}

/// Project description returned by `POST /load-model/`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoadedProject {
    /// Stored project name.
    pub name: String,
    /// Stored labels, in order.
    pub classes: Vec<String>,
    /// Whether the project is durable; loaded projects are unless told otherwise.
    #[serde(default = "durable_by_default")]
    pub persistent: bool,
}

fn durable_by_default() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LoadModelResponse {
    pub(crate) project: LoadedProject,
}

/// Body of `POST /save/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampleRequest {
    /// Flattened drawing as a PNG data URL.
    pub image_base64: String,
    /// 1-based class index.
    pub class_num: usize,
    /// Project the sample belongs to.
    pub project_name: String,
}

/// Body of `POST /predict/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PredictRequest {
    /// Flattened drawing as a PNG data URL.
    pub image_base64: String,
    /// Project whose active model classifies the drawing.
    pub project_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PredictResponse {
    pub(crate) prediction: String,
}

/// Body of project-scoped calls: train, rotate, save-all, discard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectRequest {
    /// Target project.
    pub project_name: String,
}

impl ProjectRequest {
    /// Build a project-scoped request.
    #[must_use]
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RotateResponse {
    pub(crate) model: String,
}

/// Acknowledgement carrying an optional status message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Ack {
    /// Human-readable status, if the backend sent one.
    #[serde(default)]
    pub message: Option<String>,
}

/// Extract an application-level error from a response payload.
///
/// Present-and-truthy counts: `null`, `false` and `""` are not errors.
#[must_use]
pub fn application_error(body: &Value) -> Option<String> {
    match body.get("error")? {
        Value::Null | Value::Bool(false) => None,
        Value::String(message) if message.is_empty() => None,
        Value::String(message) => Some(message.clone()),
        other => Some(other.to_string()),
    }
}

fn split_labels(labels: &ClassLabels) -> [String; 3] {
    let mut labels = labels.iter().map(str::to_string);
    [(); 3].map(|()| labels.next().unwrap_or_default())
}
