//! The drawing session controller.
//!
//! [`DrawingSession`] owns everything one open project needs: the session
//! state, the capture surface, the exit guard and a gateway. Gateway-backed
//! actions come in three forms:
//!
//! - `prepare_*`: phase check, blank gate and export; no network.
//! - `finish_*`: apply the gateway outcome to the session.
//! - an `async fn` that awaits the gateway between the two.
//!
//! Hosts that cannot hold a mutable borrow across an await (the browser
//! host keeps the session in a `RefCell`) call the halves themselves.

use doodle_core::{
    Effect, ExitGuard, PointerEvent, PointerPhase, ProjectInfo, ScopedExitGuard, SessionConfig,
    SessionEvent, SessionPhase, SessionState, SurfaceBounds, Transition,
};
use doodle_renderer::{flatten, StrokeSurface, SurfaceConfig};

use crate::error::{ActionError, ActionResult, GatewayResult, InkAction};
use crate::gateway::BackendGateway;
use crate::wire::{Ack, PredictRequest, SampleRequest};

/// Settings applied when a session opens.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionOptions {
    /// Capture surface size and ink.
    pub surface: SurfaceConfig,
    /// Session defaults.
    pub session: SessionConfig,
}

/// One open project: state, surface, exit guard and backend.
pub struct DrawingSession<G> {
    gateway: G,
    state: SessionState,
    surface: StrokeSurface,
    guard: ScopedExitGuard<Box<dyn ExitGuard>>,
    exit_save_in_flight: bool,
}

impl<G: BackendGateway> DrawingSession<G> {
    /// Open a session for `project` and arm the exit guard.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Render`] if the surface cannot be allocated.
    pub fn open(
        gateway: G,
        project: ProjectInfo,
        guard: Box<dyn ExitGuard>,
        options: &SessionOptions,
    ) -> ActionResult<Self> {
        let surface = StrokeSurface::new(&options.surface)?;
        let persisted = project.persisted;
        let state = SessionState::new(project, &options.session);

        let mut guard = ScopedExitGuard::new(guard);
        guard.set_persisted(persisted);

        tracing::info!(
            project = %state.project_name(),
            classes = %state.class_labels(),
            persisted,
            "Session opened"
        );

        Ok(Self {
            gateway,
            state,
            surface,
            guard,
            exit_save_in_flight: false,
        })
    }

    /// Session state.
    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The capture surface.
    #[must_use]
    pub fn surface(&self) -> &StrokeSurface {
        &self.surface
    }

    /// The backend this session talks to.
    #[must_use]
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Whether the unsaved-work listener is still registered.
    #[must_use]
    pub fn exit_guard_active(&self) -> bool {
        self.guard.is_active()
    }

    /// Whether a save-and-back decision is waiting for the backend.
    #[must_use]
    pub fn exit_save_in_flight(&self) -> bool {
        self.exit_save_in_flight
    }

    /// Feed one pointer event to the surface.
    ///
    /// Strokes only start and grow while drawing; terminating events are
    /// always honored so the surface never stays capturing. Returns `true`
    /// if ink was rendered.
    pub fn pointer(&mut self, event: &PointerEvent, bounds: &SurfaceBounds) -> bool {
        let drawing = self.state.phase() == SessionPhase::Drawing;
        match event.phase {
            PointerPhase::Down | PointerPhase::Move if !drawing => false,
            _ => self.surface.handle_pointer(event, bounds),
        }
    }

    /// Wipe the surface on user request.
    pub fn clear(&mut self) {
        self.surface.clear();
    }

    // Sample save

    /// Validate and export a sample for class `class_num` (1-based).
    ///
    /// # Errors
    ///
    /// Rejects locally when not drawing, for an unknown class or a blank
    /// surface.
    pub fn prepare_save_sample(&self, class_num: usize) -> ActionResult<SampleRequest> {
        self.state.ensure_phase(SessionPhase::Drawing, "save_sample")?;
        self.state.class_labels().label(class_num)?;
        Ok(SampleRequest {
            image_base64: self.export(InkAction::Save)?,
            class_num,
            project_name: self.state.project_name().to_string(),
        })
    }

    /// Apply a sample save outcome. Success clears the surface.
    ///
    /// # Errors
    ///
    /// Returns the mapped gateway error, or [`ActionError::Session`] if the
    /// session already ended.
    pub fn finish_save_sample(&mut self, outcome: GatewayResult<Ack>) -> ActionResult<Ack> {
        let ack = outcome?;
        self.apply(SessionEvent::SampleSaved)?;
        Ok(ack)
    }

    /// Save the current drawing as a sample of class `class_num` (1-based).
    ///
    /// # Errors
    ///
    /// See [`prepare_save_sample`](Self::prepare_save_sample) and
    /// [`finish_save_sample`](Self::finish_save_sample).
    pub async fn save_sample(&mut self, class_num: usize) -> ActionResult<Ack> {
        let request = self.prepare_save_sample(class_num)?;
        let outcome = self.gateway.save_sample(&request).await;
        self.finish_save_sample(outcome)
    }

    // Prediction

    /// Validate and export the drawing for classification.
    ///
    /// # Errors
    ///
    /// Rejects locally when not drawing or the surface is blank.
    pub fn prepare_predict(&self) -> ActionResult<PredictRequest> {
        self.state.ensure_phase(SessionPhase::Drawing, "predict")?;
        Ok(PredictRequest {
            image_base64: self.export(InkAction::Predict)?,
            project_name: self.state.project_name().to_string(),
        })
    }

    /// Record a prediction outcome.
    ///
    /// # Errors
    ///
    /// Returns the mapped gateway error, or [`ActionError::Session`] if the
    /// session already ended.
    pub fn finish_predict(&mut self, outcome: GatewayResult<String>) -> ActionResult<String> {
        let label = outcome?;
        self.apply(SessionEvent::PredictionReceived(label.clone()))?;
        Ok(label)
    }

    /// Classify the current drawing.
    ///
    /// # Errors
    ///
    /// See [`prepare_predict`](Self::prepare_predict) and
    /// [`finish_predict`](Self::finish_predict).
    pub async fn predict(&mut self) -> ActionResult<String> {
        let request = self.prepare_predict()?;
        let outcome = self.gateway.predict(&request).await;
        self.finish_predict(outcome)
    }

    // Project-scoped actions

    /// Check that a project-scoped action may start; returns the project name.
    ///
    /// # Errors
    ///
    /// Rejects locally when not drawing.
    pub fn prepare_project_action(&self, action: &'static str) -> ActionResult<String> {
        self.state.ensure_phase(SessionPhase::Drawing, action)?;
        Ok(self.state.project_name().to_string())
    }

    /// Pass a training outcome through. Training changes no session state.
    ///
    /// # Errors
    ///
    /// Returns the mapped gateway error.
    pub fn finish_train(&self, outcome: GatewayResult<Ack>) -> ActionResult<Ack> {
        let ack = outcome?;
        tracing::info!(project = %self.state.project_name(), "Model trained");
        Ok(ack)
    }

    /// Retrain the active model.
    ///
    /// # Errors
    ///
    /// Returns an error if not drawing or the backend refuses.
    pub async fn train(&mut self) -> ActionResult<Ack> {
        let project = self.prepare_project_action("train")?;
        let outcome = self.gateway.train(&project).await;
        self.finish_train(outcome)
    }

    /// Record the model the backend switched to.
    ///
    /// # Errors
    ///
    /// Returns the mapped gateway error, or [`ActionError::Session`] if the
    /// session already ended.
    pub fn finish_rotate(&mut self, outcome: GatewayResult<String>) -> ActionResult<String> {
        let model = outcome?;
        self.apply(SessionEvent::ModelRotated(model.clone()))?;
        Ok(model)
    }

    /// Switch to the next model variant.
    ///
    /// # Errors
    ///
    /// Returns an error if not drawing or the backend refuses.
    pub async fn rotate(&mut self) -> ActionResult<String> {
        let project = self.prepare_project_action("rotate")?;
        let outcome = self.gateway.rotate(&project).await;
        self.finish_rotate(outcome)
    }

    /// Record an explicit save-all outcome.
    ///
    /// # Errors
    ///
    /// Returns the mapped gateway error, or [`ActionError::Session`] if the
    /// session already ended.
    pub fn finish_save_all(&mut self, outcome: GatewayResult<Ack>) -> ActionResult<Ack> {
        let ack = outcome?;
        self.apply(SessionEvent::SavedPermanently)?;
        Ok(ack)
    }

    /// Persist the project durably without leaving.
    ///
    /// # Errors
    ///
    /// Returns an error if not drawing or the backend refuses.
    pub async fn save_all(&mut self) -> ActionResult<Ack> {
        let project = self.prepare_project_action("save_all")?;
        let outcome = self.gateway.save_all(&project).await;
        self.finish_save_all(outcome)
    }

    // Exit

    /// Ask to leave. Persisted sessions leave at once; otherwise the exit
    /// confirmation opens.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Session`] if the session already ended.
    pub fn request_back(&mut self) -> ActionResult<Transition> {
        self.apply(SessionEvent::RequestBack)
    }

    /// Start the "Save" choice of the exit confirmation; returns the project name.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Busy`] while a previous save is pending, or
    /// [`ActionError::Session`] when no confirmation is open.
    pub fn prepare_save_and_back(&mut self) -> ActionResult<String> {
        self.ensure_no_exit_save("save and back")?;
        self.state
            .ensure_phase(SessionPhase::ConfirmingExit, "confirm_save_and_back")?;
        self.exit_save_in_flight = true;
        Ok(self.state.project_name().to_string())
    }

    /// Apply the save-all outcome of the "Save" choice.
    ///
    /// Success leaves; failure keeps the confirmation open and reports the
    /// error.
    ///
    /// # Errors
    ///
    /// Returns the mapped gateway error after the failed save was recorded.
    pub fn finish_save_and_back(&mut self, outcome: GatewayResult<Ack>) -> ActionResult<Transition> {
        self.exit_save_in_flight = false;
        if self.state.is_closed() && self.state.has_persisted() {
            // A save-all issued before the dialog opened already took the
            // session out; this outcome changes nothing.
            tracing::debug!(ok = outcome.is_ok(), "Save before leaving landed after exit");
            return Ok(Transition::stay(SessionPhase::Leaving));
        }
        let transition = self.apply(SessionEvent::ConfirmSaveAndBack {
            saved: outcome.is_ok(),
        })?;
        if let Err(err) = outcome {
            tracing::warn!(error = %err, "Save before leaving failed");
            return Err(err.into());
        }
        Ok(transition)
    }

    /// Save everything, then leave.
    ///
    /// Dropping the future before it completes (a timeout, a lost `select!`)
    /// leaves the confirmation open with no save pending, as if the save
    /// had failed.
    ///
    /// # Errors
    ///
    /// See [`prepare_save_and_back`](Self::prepare_save_and_back) and
    /// [`finish_save_and_back`](Self::finish_save_and_back).
    pub async fn save_and_back(&mut self) -> ActionResult<Transition> {
        let project = self.prepare_save_and_back()?;
        let outcome = {
            let _pending = ExitSavePending(&mut self.exit_save_in_flight);
            self.gateway.save_all(&project).await
        };
        self.finish_save_and_back(outcome)
    }

    /// Take the "Don't Save" choice: leave now, returning the project to discard.
    ///
    /// The session reaches `Leaving` before the discard call is issued, so
    /// the call's outcome cannot hold it back.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Busy`] while a save is pending, or
    /// [`ActionError::Session`] when no confirmation is open.
    pub fn prepare_discard_and_back(&mut self) -> ActionResult<(String, Transition)> {
        self.ensure_no_exit_save("discard and back")?;
        let transition = self.apply(SessionEvent::ConfirmDiscardAndBack)?;
        Ok((self.state.project_name().to_string(), transition))
    }

    /// Log the best-effort discard outcome.
    pub fn finish_discard(&self, outcome: &GatewayResult<Ack>) {
        match outcome {
            Ok(_) => tracing::info!(project = %self.state.project_name(), "Project discarded"),
            Err(err) => tracing::warn!(
                project = %self.state.project_name(),
                error = %err,
                "Discarding project failed"
            ),
        }
    }

    /// Leave without saving and ask the backend to drop the project.
    ///
    /// # Errors
    ///
    /// See [`prepare_discard_and_back`](Self::prepare_discard_and_back). The
    /// discard call itself never fails the action.
    pub async fn discard_and_back(&mut self) -> ActionResult<Transition> {
        let (project, transition) = self.prepare_discard_and_back()?;
        let outcome = self.gateway.discard_project(&project).await;
        self.finish_discard(&outcome);
        Ok(transition)
    }

    /// Dismiss the exit confirmation and keep drawing.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Busy`] while a save is pending, or
    /// [`ActionError::Session`] when no confirmation is open.
    pub fn cancel_exit(&mut self) -> ActionResult<Transition> {
        self.ensure_no_exit_save("cancel")?;
        self.apply(SessionEvent::CancelExit)
    }

    fn ensure_no_exit_save(&self, action: &'static str) -> ActionResult<()> {
        if self.exit_save_in_flight {
            return Err(ActionError::Busy(action));
        }
        Ok(())
    }

    fn export(&self, action: InkAction) -> ActionResult<String> {
        if self.surface.is_blank() {
            tracing::debug!(%action, "Rejected blank surface");
            return Err(ActionError::Blank(action));
        }
        Ok(flatten(&self.surface)?.to_data_uri())
    }

    /// Apply an event and carry out the effects that touch owned resources.
    ///
    /// Dialog visibility is read back from the state by the host.
    fn apply(&mut self, event: SessionEvent) -> ActionResult<Transition> {
        let transition = self.state.apply(event)?;
        for effect in &transition.effects {
            match effect {
                Effect::ClearSurface => self.surface.clear(),
                Effect::Leave => {
                    self.guard.release();
                    tracing::info!(project = %self.state.project_name(), "Session ended");
                }
                Effect::ShowExitConfirmation | Effect::HideExitConfirmation => {}
            }
        }
        self.guard.set_persisted(self.state.has_persisted());
        Ok(transition)
    }
}

/// Clears the in-flight flag when an exit save stops waiting, completed or not.
struct ExitSavePending<'a>(&'a mut bool);

impl Drop for ExitSavePending<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

impl<G> std::fmt::Debug for DrawingSession<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawingSession")
            .field("state", &self.state)
            .field("surface", &self.surface)
            .field("guard_active", &self.guard.is_active())
            .field("exit_save_in_flight", &self.exit_save_in_flight)
            .finish_non_exhaustive()
    }
}
