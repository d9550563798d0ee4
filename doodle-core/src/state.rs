//! Drawing session state management.
//!
//! [`SessionState`] is the single source of truth for one project's session.
//! Every action that can lose work goes through [`SessionState::apply`], which
//! returns the [`Effect`]s the host has to carry out (clear the surface, show
//! or hide the exit confirmation, leave).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{SessionError, SessionResult};
use crate::project::{ClassLabels, ProjectInfo};

/// Model variant the backend activates for a fresh project.
pub const DEFAULT_MODEL_LABEL: &str = "LinearSVC";

/// Session-level configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Label shown as the active model until the first rotation.
    pub initial_model: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            initial_model: DEFAULT_MODEL_LABEL.to_string(),
        }
    }
}

/// Lifecycle phase of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Strokes may be captured and actions issued.
    #[default]
    Drawing,
    /// The user asked to leave and a save/discard/cancel choice is outstanding.
    ConfirmingExit,
    /// Terminal; control returns to the caller.
    Leaving,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Drawing => "drawing",
            Self::ConfirmingExit => "confirming exit",
            Self::Leaving => "leaving",
        })
    }
}

/// Events the session reacts to.
///
/// User decisions (`RequestBack`, `CancelExit`) and backend completions
/// (`SampleSaved`, `ModelRotated`, ...) share one vocabulary so every state
/// change is visible in one place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The user wants to navigate away.
    RequestBack,
    /// The save-all issued from the exit confirmation completed.
    ConfirmSaveAndBack {
        /// Whether the backend persisted the project.
        saved: bool,
    },
    /// The user chose not to save; the discard call has been issued.
    ConfirmDiscardAndBack,
    /// The user dismissed the exit confirmation.
    CancelExit,
    /// A sample save succeeded.
    SampleSaved,
    /// The backend switched to a new model variant.
    ModelRotated(String),
    /// The backend classified the current drawing.
    PredictionReceived(String),
    /// An explicit save-all succeeded.
    SavedPermanently,
}

impl SessionEvent {
    /// Short name used in logs and errors.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::RequestBack => "request_back",
            Self::ConfirmSaveAndBack { .. } => "confirm_save_and_back",
            Self::ConfirmDiscardAndBack => "confirm_discard_and_back",
            Self::CancelExit => "cancel_exit",
            Self::SampleSaved => "sample_saved",
            Self::ModelRotated(_) => "model_rotated",
            Self::PredictionReceived(_) => "prediction_received",
            Self::SavedPermanently => "saved_permanently",
        }
    }
}

/// Side effects the host must perform after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Reset the raster surface to fully transparent.
    ClearSurface,
    /// Present the save / cancel / don't-save dialog.
    ShowExitConfirmation,
    /// Dismiss the dialog.
    HideExitConfirmation,
    /// Hand control back to the caller and release the exit guard.
    Leave,
}

/// Outcome of applying one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Phase before the event.
    pub from: SessionPhase,
    /// Phase after the event.
    pub to: SessionPhase,
    /// Effects to perform, in order.
    pub effects: Vec<Effect>,
}

impl Transition {
    fn new(from: SessionPhase, to: SessionPhase, effects: Vec<Effect>) -> Self {
        Self { from, to, effects }
    }

    /// A transition that keeps `phase` and has no effects.
    #[must_use]
    pub fn stay(phase: SessionPhase) -> Self {
        Self::new(phase, phase, Vec::new())
    }

    /// Whether `effect` is part of this transition.
    #[must_use]
    pub fn has(&self, effect: Effect) -> bool {
        self.effects.contains(&effect)
    }

    /// Whether the phase changed.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

/// Aggregate state of one drawing session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    project_name: String,
    class_labels: ClassLabels,
    current_model: String,
    last_prediction: Option<String>,
    has_persisted: bool,
    phase: SessionPhase,
}

impl SessionState {
    /// Start a session for an opened project.
    ///
    /// `has_persisted` starts `true` only for projects that are already durable.
    #[must_use]
    pub fn new(project: ProjectInfo, config: &SessionConfig) -> Self {
        Self {
            project_name: project.name,
            class_labels: project.classes,
            current_model: config.initial_model.clone(),
            last_prediction: None,
            has_persisted: project.persisted,
            phase: SessionPhase::Drawing,
        }
    }

    /// The project identifier.
    #[must_use]
    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    /// The project's class labels.
    #[must_use]
    pub fn class_labels(&self) -> &ClassLabels {
        &self.class_labels
    }

    /// Name of the model variant currently used for prediction.
    #[must_use]
    pub fn current_model(&self) -> &str {
        &self.current_model
    }

    /// Label returned by the last successful prediction, if any.
    #[must_use]
    pub fn last_prediction(&self) -> Option<&str> {
        self.last_prediction.as_deref()
    }

    /// Whether the project has been durably saved.
    #[must_use]
    pub fn has_persisted(&self) -> bool {
        self.has_persisted
    }

    /// Whether the exit confirmation dialog is outstanding.
    #[must_use]
    pub fn exit_confirmation_pending(&self) -> bool {
        self.phase == SessionPhase::ConfirmingExit
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Whether the session reached `Leaving`.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.phase == SessionPhase::Leaving
    }

    /// Check that the session is in `expected` before starting `action`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] after leaving, or
    /// [`SessionError::InvalidTransition`] for any other phase mismatch.
    pub fn ensure_phase(&self, expected: SessionPhase, action: &'static str) -> SessionResult<()> {
        if self.phase == expected {
            return Ok(());
        }
        if self.is_closed() {
            return Err(SessionError::Closed(self.project_name.clone()));
        }
        Err(SessionError::InvalidTransition {
            event: action,
            phase: self.phase,
        })
    }

    /// Apply an event and report the resulting transition.
    ///
    /// Backend completions that land while the exit confirmation is pending
    /// update data fields but keep the phase. After `Leaving` every event is
    /// rejected with [`SessionError::Closed`].
    ///
    /// # Errors
    ///
    /// Returns an error if the event is not valid in the current phase.
    pub fn apply(&mut self, event: SessionEvent) -> SessionResult<Transition> {
        let from = self.phase;
        if from == SessionPhase::Leaving {
            tracing::debug!(event = event.name(), "Discarding event for ended session");
            return Err(SessionError::Closed(self.project_name.clone()));
        }

        let transition = match event {
            SessionEvent::RequestBack => match from {
                SessionPhase::Drawing if self.has_persisted => {
                    self.enter(SessionPhase::Leaving, vec![Effect::Leave])
                }
                SessionPhase::Drawing => self.enter(
                    SessionPhase::ConfirmingExit,
                    vec![Effect::ShowExitConfirmation],
                ),
                // Only one confirmation may be pending at a time.
                _ => Transition::stay(from),
            },

            SessionEvent::ConfirmSaveAndBack { saved } => {
                if saved {
                    self.has_persisted = true;
                }
                match (from, saved) {
                    (SessionPhase::ConfirmingExit, true) => self.enter(
                        SessionPhase::Leaving,
                        vec![Effect::HideExitConfirmation, Effect::Leave],
                    ),
                    // A failed save keeps the dialog open; a save that lands
                    // after the user cancelled only records persistence.
                    _ => Transition::stay(from),
                }
            }

            SessionEvent::ConfirmDiscardAndBack => {
                self.ensure_phase(SessionPhase::ConfirmingExit, "confirm_discard_and_back")?;
                self.enter(
                    SessionPhase::Leaving,
                    vec![Effect::HideExitConfirmation, Effect::Leave],
                )
            }

            SessionEvent::CancelExit => {
                self.ensure_phase(SessionPhase::ConfirmingExit, "cancel_exit")?;
                self.enter(SessionPhase::Drawing, vec![Effect::HideExitConfirmation])
            }

            SessionEvent::SampleSaved => Transition::new(from, from, vec![Effect::ClearSurface]),

            SessionEvent::ModelRotated(label) => {
                tracing::info!(model = %label, project = %self.project_name, "Model rotated");
                self.current_model = label;
                self.last_prediction = None;
                Transition::stay(from)
            }

            SessionEvent::PredictionReceived(label) => {
                self.last_prediction = Some(label);
                Transition::stay(from)
            }

            SessionEvent::SavedPermanently => {
                self.has_persisted = true;
                if from == SessionPhase::ConfirmingExit {
                    // The pending back request now has nothing to confirm.
                    self.enter(
                        SessionPhase::Leaving,
                        vec![Effect::HideExitConfirmation, Effect::Leave],
                    )
                } else {
                    Transition::stay(from)
                }
            }
        };

        debug_assert!(
            !(self.exit_confirmation_pending() && self.has_persisted),
            "exit confirmation pending on a persisted session"
        );

        if transition.changed() {
            tracing::debug!(from = %transition.from, to = %transition.to, "Session phase changed");
        }
        Ok(transition)
    }

    fn enter(&mut self, to: SessionPhase, effects: Vec<Effect>) -> Transition {
        let from = self.phase;
        self.phase = to;
        Transition::new(from, to, effects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(persisted: bool) -> SessionState {
        SessionState::new(
            ProjectInfo::new("shapes", ClassLabels::new("circle", "square", "triangle"), persisted),
            &SessionConfig::default(),
        )
    }

    #[test]
    fn test_new_session_defaults() {
        let state = session(false);
        assert_eq!(state.phase(), SessionPhase::Drawing);
        assert_eq!(state.current_model(), DEFAULT_MODEL_LABEL);
        assert_eq!(state.last_prediction(), None);
        assert!(!state.has_persisted());
        assert!(!state.exit_confirmation_pending());
        assert_eq!(state.project_name(), "shapes");
    }

    #[test]
    fn test_request_back_when_persisted_leaves_directly() {
        let mut state = session(true);
        let t = state.apply(SessionEvent::RequestBack).expect("transition");
        assert_eq!(t.to, SessionPhase::Leaving);
        assert!(t.has(Effect::Leave));
        assert!(!t.has(Effect::ShowExitConfirmation));
        assert!(!state.exit_confirmation_pending());
    }

    #[test]
    fn test_request_back_when_unpersisted_asks_for_confirmation() {
        let mut state = session(false);
        let t = state.apply(SessionEvent::RequestBack).expect("transition");
        assert_eq!(t.to, SessionPhase::ConfirmingExit);
        assert!(t.has(Effect::ShowExitConfirmation));
        assert!(state.exit_confirmation_pending());
        assert!(!state.has_persisted());
    }

    #[test]
    fn test_second_request_back_is_noop() {
        let mut state = session(false);
        state.apply(SessionEvent::RequestBack).expect("first");
        let t = state.apply(SessionEvent::RequestBack).expect("second");
        assert!(!t.changed());
        assert!(t.effects.is_empty());
        assert!(state.exit_confirmation_pending());
    }

    #[test]
    fn test_failed_save_and_back_stays_confirming() {
        let mut state = session(false);
        state.apply(SessionEvent::RequestBack).expect("back");
        let t = state
            .apply(SessionEvent::ConfirmSaveAndBack { saved: false })
            .expect("failed save");
        assert_eq!(t.to, SessionPhase::ConfirmingExit);
        assert!(!state.has_persisted());
        assert!(state.exit_confirmation_pending());
    }

    #[test]
    fn test_successful_save_and_back_leaves() {
        let mut state = session(false);
        state.apply(SessionEvent::RequestBack).expect("back");
        let t = state
            .apply(SessionEvent::ConfirmSaveAndBack { saved: true })
            .expect("save");
        assert_eq!(t.to, SessionPhase::Leaving);
        assert_eq!(
            t.effects,
            vec![Effect::HideExitConfirmation, Effect::Leave]
        );
        assert!(state.has_persisted());
        assert!(!state.exit_confirmation_pending());
    }

    #[test]
    fn test_discard_and_back_leaves() {
        let mut state = session(false);
        state.apply(SessionEvent::RequestBack).expect("back");
        let t = state
            .apply(SessionEvent::ConfirmDiscardAndBack)
            .expect("discard");
        assert_eq!(t.to, SessionPhase::Leaving);
        assert!(!state.has_persisted());
    }

    #[test]
    fn test_cancel_exit_returns_to_drawing() {
        let mut state = session(false);
        state.apply(SessionEvent::RequestBack).expect("back");
        let t = state.apply(SessionEvent::CancelExit).expect("cancel");
        assert_eq!(t.to, SessionPhase::Drawing);
        assert!(t.has(Effect::HideExitConfirmation));
        assert!(!state.exit_confirmation_pending());
    }

    #[test]
    fn test_dialog_choices_require_pending_confirmation() {
        let mut state = session(false);
        let err = state.apply(SessionEvent::CancelExit).unwrap_err();
        assert_eq!(
            err,
            SessionError::InvalidTransition {
                event: "cancel_exit",
                phase: SessionPhase::Drawing,
            }
        );
        assert!(state.apply(SessionEvent::ConfirmDiscardAndBack).is_err());
        assert_eq!(state.phase(), SessionPhase::Drawing);
    }

    #[test]
    fn test_sample_saved_clears_surface() {
        let mut state = session(false);
        let t = state.apply(SessionEvent::SampleSaved).expect("saved");
        assert_eq!(t.effects, vec![Effect::ClearSurface]);
        assert_eq!(t.to, SessionPhase::Drawing);
    }

    #[test]
    fn test_rotation_clears_prediction_every_time() {
        let mut state = session(false);
        state
            .apply(SessionEvent::PredictionReceived("circle".into()))
            .expect("predict");
        assert_eq!(state.last_prediction(), Some("circle"));

        state
            .apply(SessionEvent::ModelRotated("KNeighborsClassifier".into()))
            .expect("rotate");
        assert_eq!(state.current_model(), "KNeighborsClassifier");
        assert_eq!(state.last_prediction(), None);

        state
            .apply(SessionEvent::PredictionReceived("square".into()))
            .expect("predict");
        state
            .apply(SessionEvent::ModelRotated("LogisticRegression".into()))
            .expect("rotate");
        assert_eq!(state.current_model(), "LogisticRegression");
        assert_eq!(state.last_prediction(), None);
    }

    #[test]
    fn test_saved_permanently_sticks() {
        let mut state = session(false);
        state.apply(SessionEvent::SavedPermanently).expect("save all");
        assert!(state.has_persisted());

        let t = state.apply(SessionEvent::RequestBack).expect("back");
        assert_eq!(t.to, SessionPhase::Leaving);
        assert!(state.has_persisted());
    }

    #[test]
    fn test_saved_permanently_while_confirming_completes_exit() {
        let mut state = session(false);
        state.apply(SessionEvent::RequestBack).expect("back");
        let t = state.apply(SessionEvent::SavedPermanently).expect("late save");
        assert_eq!(t.to, SessionPhase::Leaving);
        assert!(t.has(Effect::HideExitConfirmation));
        assert!(t.has(Effect::Leave));
        assert!(state.has_persisted());
        assert!(!state.exit_confirmation_pending());
    }

    #[test]
    fn test_late_save_after_cancel_records_persistence() {
        let mut state = session(false);
        state.apply(SessionEvent::RequestBack).expect("back");
        state.apply(SessionEvent::CancelExit).expect("cancel");
        let t = state
            .apply(SessionEvent::ConfirmSaveAndBack { saved: true })
            .expect("late completion");
        assert_eq!(t.to, SessionPhase::Drawing);
        assert!(state.has_persisted());
    }

    #[test]
    fn test_completions_while_confirming_keep_phase() {
        let mut state = session(false);
        state.apply(SessionEvent::RequestBack).expect("back");
        let t = state.apply(SessionEvent::SampleSaved).expect("sample");
        assert_eq!(t.to, SessionPhase::ConfirmingExit);
        assert!(t.has(Effect::ClearSurface));
    }

    #[test]
    fn test_events_after_leaving_are_rejected() {
        let mut state = session(true);
        state.apply(SessionEvent::RequestBack).expect("leave");
        let err = state
            .apply(SessionEvent::PredictionReceived("late".into()))
            .unwrap_err();
        assert_eq!(err, SessionError::Closed("shapes".into()));
        assert_eq!(state.last_prediction(), None);
    }
}
