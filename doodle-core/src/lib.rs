//! # Doodle Core
//!
//! Session logic for freehand drawing capture against a remote classifier.
//! Pure state, no I/O: hosts feed it pointer input and backend outcomes and
//! carry out the effects it reports.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 doodle-core                 │
//! ├─────────────────────────────────────────────┤
//! │  Session State   │  Pointer Input           │
//! │  - Phases        │  - Viewport → surface    │
//! │  - Effects       │  - Stroke termination    │
//! ├─────────────────────────────────────────────┤
//! │  Exit Guard      │  Project Forms           │
//! │  - Scoped listen │  - Setup / load checks   │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod event;
pub mod form;
pub mod guard;
pub mod project;
pub mod state;

pub use error::{SessionError, SessionResult};
pub use event::{PointerEvent, PointerPhase, SurfaceBounds, SurfacePoint};
pub use form::{ProjectLoad, ProjectSetup};
pub use guard::{ExitGuard, NoopExitGuard, ScopedExitGuard};
pub use project::{ClassLabels, ProjectInfo, CLASS_COUNT};
pub use state::{
    Effect, SessionConfig, SessionEvent, SessionPhase, SessionState, Transition,
    DEFAULT_MODEL_LABEL,
};

/// Doodle core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
