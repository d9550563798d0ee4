//! # Doodle Client
//!
//! Talks to the classifier backend and drives a drawing session.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                doodle-client                 │
//! ├──────────────────────────────────────────────┤
//! │  DrawingSession                              │
//! │  - prepare_*  (phase, blank gate, export)    │
//! │  - finish_*   (apply backend outcome)        │
//! ├──────────────────────────────────────────────┤
//! │  BackendGateway (trait)  │  Project flows    │
//! │  └─ HttpGateway (reqwest)│  - create / load  │
//! └──────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod project;
pub mod session;
pub mod wire;

pub use config::{GatewayConfig, DEFAULT_BACKEND_URL, DEFAULT_TIMEOUT};
pub use error::{
    ActionError, ActionResult, GatewayError, GatewayResult, InkAction, TRANSPORT_FAILURE_MESSAGE,
};
pub use gateway::BackendGateway;
pub use http::HttpGateway;
pub use project::{create_project, load_project, NAME_TAKEN_MESSAGE};
pub use session::{DrawingSession, SessionOptions};
pub use wire::{Ack, Endpoint, LoadedProject};
