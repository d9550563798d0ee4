//! # Doodle CLI
//!
//! Native host for Doodle: create or load a project on a classifier backend
//! and drive a drawing session from a JSON script.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p doodle-cli -- check-name shapes
//! cargo run -p doodle-cli -- new shapes circle square triangle --script session.json
//! cargo run -p doodle-cli -- --backend-url http://localhost:8000 load shapes --script predict.json
//! ```
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `CliConfig` - Gateway and session settings derived from the arguments
//! - `script` - Step definitions and the runner that drives a `DrawingSession`

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

pub mod script;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use doodle_client::{GatewayConfig, GatewayResult, SessionOptions, DEFAULT_BACKEND_URL};
use doodle_core::{ProjectLoad, ProjectSetup, SessionConfig};
use doodle_renderer::SurfaceConfig;

pub use script::{load_script, parse_script, run_script, ScriptError, Step, StepReport};

/// Command-line arguments for doodle-cli.
#[derive(Debug, Clone, Parser)]
#[command(name = "doodle-cli")]
#[command(about = "Drive drawing classifier sessions from the command line")]
#[command(version)]
pub struct CliArgs {
    /// Classifier backend base URL
    #[arg(long, env = "DOODLE_BACKEND_URL", default_value = DEFAULT_BACKEND_URL)]
    pub backend_url: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "DOODLE_TIMEOUT_SECS", default_value = "30")]
    pub timeout_secs: u64,

    /// Surface width in pixels
    #[arg(long, default_value = "300")]
    pub width: u32,

    /// Surface height in pixels
    #[arg(long, default_value = "300")]
    pub height: u32,

    /// Stroke width in pixels
    #[arg(long, default_value = "10")]
    pub stroke_width: f32,

    /// Print step reports as JSON lines
    #[arg(long)]
    pub json: bool,

    /// What to do
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Check whether a project name is taken
    CheckName {
        /// Project name
        name: String,
    },
    /// Create a project and optionally run a script against it
    New {
        /// Project name
        name: String,
        /// First class label
        class1: String,
        /// Second class label
        class2: String,
        /// Third class label
        class3: String,
        /// Create the project as durable right away
        #[arg(long)]
        persistent: bool,
        /// JSON script of session steps
        #[arg(long)]
        script: Option<PathBuf>,
    },
    /// Load a stored project and optionally run a script against it
    Load {
        /// Project name
        name: String,
        /// Class labels to check against the stored ones
        #[arg(long, num_args = 3, value_names = ["CLASS1", "CLASS2", "CLASS3"])]
        classes: Option<Vec<String>>,
        /// JSON script of session steps
        #[arg(long)]
        script: Option<PathBuf>,
    },
}

impl Command {
    /// Script to run once the project is open.
    #[must_use]
    pub fn script(&self) -> Option<&PathBuf> {
        match self {
            Self::CheckName { .. } => None,
            Self::New { script, .. } | Self::Load { script, .. } => script.as_ref(),
        }
    }

    /// The setup form for `new`.
    #[must_use]
    pub fn project_setup(&self) -> Option<ProjectSetup> {
        match self {
            Self::New {
                name,
                class1,
                class2,
                class3,
                persistent,
                ..
            } => Some(ProjectSetup {
                name: name.clone(),
                classes: [class1.clone(), class2.clone(), class3.clone()],
                persistent: *persistent,
            }),
            _ => None,
        }
    }

    /// The load form for `load`.
    #[must_use]
    pub fn project_load(&self) -> Option<ProjectLoad> {
        match self {
            Self::Load { name, classes, .. } => {
                let mut fields: [String; 3] = Default::default();
                for (field, class) in fields.iter_mut().zip(classes.iter().flatten()) {
                    field.clone_from(class);
                }
                Some(ProjectLoad {
                    name: name.clone(),
                    classes: fields,
                })
            }
            _ => None,
        }
    }
}

/// Settings derived from the command line.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Backend connection.
    pub gateway: GatewayConfig,
    /// Surface and session defaults.
    pub session: SessionOptions,
    /// Print reports as JSON.
    pub json: bool,
}

impl CliConfig {
    /// Build the configuration from parsed arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend URL is invalid.
    pub fn from_args(args: &CliArgs) -> GatewayResult<Self> {
        let gateway = GatewayConfig::new(&args.backend_url)?
            .with_timeout(Duration::from_secs(args.timeout_secs));

        let session = SessionOptions {
            surface: SurfaceConfig {
                width: args.width,
                height: args.height,
                stroke_width: args.stroke_width,
                ..SurfaceConfig::default()
            },
            session: SessionConfig::default(),
        };

        Ok(Self {
            gateway,
            session,
            json: args.json,
        })
    }
}
