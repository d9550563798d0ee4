//! Error types for gateway calls and user actions.

use std::fmt;

use doodle_core::SessionError;
use doodle_renderer::RenderError;
use thiserror::Error;

use crate::wire::Endpoint;

/// Result type for gateway calls.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Result type for user actions on a session.
pub type ActionResult<T> = Result<T, ActionError>;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The configured base URL is invalid.
    #[error("invalid backend URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed (connection, timeout, etc.).
    #[error("backend request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The backend answered with a non-success status.
    #[error("{endpoint} returned HTTP {status}")]
    Status {
        /// Endpoint that was called.
        endpoint: Endpoint,
        /// HTTP status code.
        status: u16,
    },
    /// The payload carried an `error` field.
    #[error("{endpoint} reported: {message}")]
    Application {
        /// Endpoint that was called.
        endpoint: Endpoint,
        /// Server-provided message, shown verbatim.
        message: String,
    },
    /// The payload did not match the expected shape.
    #[error("unexpected response from {endpoint}: {detail}")]
    UnexpectedResponse {
        /// Endpoint that was called.
        endpoint: Endpoint,
        /// What was wrong with it.
        detail: String,
    },
}

impl GatewayError {
    /// Returns true for failures of the exchange itself rather than the request.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Status { .. })
    }
}

/// The action that needs ink on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InkAction {
    /// Saving a labeled sample.
    Save,
    /// Asking for a prediction.
    Predict,
}

impl fmt::Display for InkAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Save => "saving",
            Self::Predict => "predicting",
        })
    }
}

/// Message shown for transport failures.
pub const TRANSPORT_FAILURE_MESSAGE: &str = "Could not reach the classifier service. Please try again.";

/// Errors surfaced to the user at the point of a session action.
#[derive(Debug, Error)]
pub enum ActionError {
    /// The surface holds no ink; rejected before any network call.
    #[error("Please draw something before {0}.")]
    Blank(InkAction),

    /// A form or precondition failed local validation.
    #[error("{0}")]
    Validation(String),

    /// A dialog decision is already being carried out.
    #[error("{0} is already in progress")]
    Busy(&'static str),

    /// The request never completed successfully.
    #[error(transparent)]
    Transport(GatewayError),

    /// The backend rejected the request with a message.
    #[error("{0}")]
    Application(String),

    /// The session is not in a phase that accepts the action.
    #[error(transparent)]
    Session(SessionError),

    /// The surface could not be exported.
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl ActionError {
    /// Text to show the user.
    ///
    /// Application errors are shown verbatim; transport failures get a
    /// generic message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport(_) => TRANSPORT_FAILURE_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }

    /// Whether the action was rejected locally, before any network call.
    #[must_use]
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::Blank(_) | Self::Validation(_) | Self::Busy(_) | Self::Session(_)
        )
    }
}

impl From<GatewayError> for ActionError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Application { message, .. } => Self::Application(message),
            other => Self::Transport(other),
        }
    }
}

impl From<SessionError> for ActionError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Validation(message) => Self::Validation(message),
            other => Self::Session(other),
        }
    }
}
