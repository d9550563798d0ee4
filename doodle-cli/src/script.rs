//! Scripted drawing sessions.
//!
//! A script is a JSON array of steps run in order against one open session.
//! A failing step is reported and the script carries on, the way a user
//! would dismiss an error and keep working.
//!
//! ```json
//! [
//!   { "action": "stroke", "points": [[40, 40], [260, 260]] },
//!   { "action": "save", "class_num": 2 },
//!   { "action": "back" },
//!   { "action": "discard_and_back" }
//! ]
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use doodle_client::{ActionError, BackendGateway, DrawingSession};
use doodle_core::{PointerEvent, PointerPhase, SessionPhase, SurfaceBounds};
use doodle_renderer::flatten;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors loading a script.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The script file could not be read.
    #[error("failed to read script {path}: {source}")]
    Io {
        /// Script path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The script is not a valid list of steps.
    #[error("invalid script: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Why a step failed.
#[derive(Debug, Error)]
enum StepError {
    /// The session rejected the action or the backend failed it.
    #[error(transparent)]
    Action(#[from] ActionError),
    /// The exported image could not be written.
    #[error("Could not write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl StepError {
    fn user_message(&self) -> String {
        match self {
            Self::Action(err) => err.user_message(),
            Self::Write { .. } => self.to_string(),
        }
    }
}

/// One scripted user action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Press at the first point, drag through the rest, release.
    Stroke {
        /// Surface-local points.
        points: Vec<[f32; 2]>,
    },
    /// Wipe the drawing.
    Clear,
    /// Save the drawing as a sample of a class (1-based).
    Save {
        /// Class index.
        class_num: usize,
    },
    /// Classify the drawing.
    Predict,
    /// Retrain the active model.
    Train,
    /// Switch model variant.
    Rotate,
    /// Persist the project.
    SaveAll,
    /// Ask to leave.
    Back,
    /// Exit dialog: save, then leave.
    SaveAndBack,
    /// Exit dialog: leave without saving.
    DiscardAndBack,
    /// Exit dialog: keep drawing.
    CancelExit,
    /// Write the flattened drawing to a PNG file.
    Export {
        /// Output path.
        path: PathBuf,
    },
}

impl Step {
    /// Short name for reports.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Stroke { .. } => "stroke",
            Self::Clear => "clear",
            Self::Save { .. } => "save",
            Self::Predict => "predict",
            Self::Train => "train",
            Self::Rotate => "rotate",
            Self::SaveAll => "save_all",
            Self::Back => "back",
            Self::SaveAndBack => "save_and_back",
            Self::DiscardAndBack => "discard_and_back",
            Self::CancelExit => "cancel_exit",
            Self::Export { .. } => "export",
        }
    }
}

/// Parse a script from JSON text.
///
/// # Errors
///
/// Returns [`ScriptError::Parse`] if the text is not a list of steps.
pub fn parse_script(json: &str) -> Result<Vec<Step>, ScriptError> {
    Ok(serde_json::from_str(json)?)
}

/// Read and parse a script file.
///
/// # Errors
///
/// Returns [`ScriptError::Io`] if the file cannot be read, or
/// [`ScriptError::Parse`] if it is not a list of steps.
pub fn load_script(path: &Path) -> Result<Vec<Step>, ScriptError> {
    let json = std::fs::read_to_string(path).map_err(|source| ScriptError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_script(&json)
}

/// Outcome of one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    /// Position in the script, from 1.
    pub index: usize,
    /// Step name.
    pub step: &'static str,
    /// Whether the step succeeded.
    pub ok: bool,
    /// What the user would have been shown.
    pub message: String,
    /// Session phase after the step.
    pub phase: SessionPhase,
}

impl fmt::Display for StepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.ok { "ok" } else { "error" };
        write!(
            f,
            "{:>3}. {:<16} {:<5} [{}] {}",
            self.index, self.step, mark, self.phase, self.message
        )
    }
}

/// Run every step against the session and report each outcome.
pub async fn run_script<G: BackendGateway>(
    session: &mut DrawingSession<G>,
    steps: &[Step],
) -> Vec<StepReport> {
    let mut reports = Vec::with_capacity(steps.len());
    for (i, step) in steps.iter().enumerate() {
        let result = run_step(session, step).await;
        let (ok, message) = match result {
            Ok(message) => (true, message),
            Err(err) => {
                match &err {
                    StepError::Action(action) if action.is_local() => {
                        tracing::debug!(step = step.name(), error = %err, "Step rejected");
                    }
                    _ => tracing::warn!(step = step.name(), error = %err, "Step failed"),
                }
                (false, err.user_message())
            }
        };
        reports.push(StepReport {
            index: i + 1,
            step: step.name(),
            ok,
            message,
            phase: session.state().phase(),
        });
    }
    reports
}

async fn run_step<G: BackendGateway>(
    session: &mut DrawingSession<G>,
    step: &Step,
) -> Result<String, StepError> {
    let message = match step {
        Step::Stroke { points } => stroke(session, points),
        Step::Clear => {
            session.clear();
            "Drawing cleared".to_string()
        }
        Step::Save { class_num } => {
            let label = session
                .state()
                .class_labels()
                .label(*class_num)
                .map_err(ActionError::from)?
                .to_string();
            let ack = session.save_sample(*class_num).await?;
            ack.message
                .unwrap_or_else(|| format!("Saved sample for {label}"))
        }
        Step::Predict => format!("Prediction: {}", session.predict().await?),
        Step::Train => session
            .train()
            .await?
            .message
            .unwrap_or_else(|| "Model trained".to_string()),
        Step::Rotate => format!("Current model: {}", session.rotate().await?),
        Step::SaveAll => session
            .save_all()
            .await?
            .message
            .unwrap_or_else(|| "Project saved".to_string()),
        Step::Back => match session.request_back()?.to {
            SessionPhase::Leaving => "Left project".to_string(),
            _ => "Unsaved changes: save, cancel or don't save?".to_string(),
        },
        Step::SaveAndBack => {
            session.save_and_back().await?;
            "Project saved, left project".to_string()
        }
        Step::DiscardAndBack => {
            session.discard_and_back().await?;
            "Left project without saving".to_string()
        }
        Step::CancelExit => {
            session.cancel_exit()?;
            "Back to drawing".to_string()
        }
        Step::Export { path } => export(session, path)?,
    };
    Ok(message)
}

fn stroke<G: BackendGateway>(session: &mut DrawingSession<G>, points: &[[f32; 2]]) -> String {
    let bounds = SurfaceBounds::new(0.0, 0.0);
    let Some((first, rest)) = points.split_first() else {
        return "Empty stroke ignored".to_string();
    };

    session.pointer(&PointerEvent::new(PointerPhase::Down, first[0], first[1]), &bounds);
    let mut segments = 0;
    for point in rest {
        if session.pointer(&PointerEvent::new(PointerPhase::Move, point[0], point[1]), &bounds) {
            segments += 1;
        }
    }
    let last = rest.last().unwrap_or(first);
    session.pointer(&PointerEvent::new(PointerPhase::Up, last[0], last[1]), &bounds);

    format!("Drew {segments} segment(s)")
}

fn export<G: BackendGateway>(
    session: &DrawingSession<G>,
    path: &Path,
) -> Result<String, StepError> {
    let image = flatten(session.surface()).map_err(ActionError::from)?;
    std::fs::write(path, image.png()).map_err(|source| StepError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), "Exported drawing");
    Ok(format!(
        "Wrote {}x{} PNG to {}",
        image.width,
        image.height,
        path.display()
    ))
}
