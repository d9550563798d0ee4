//! # Doodle WASM Application
//!
//! Browser host for a drawing session: binds mouse input on a `<canvas>`,
//! paints the capture surface, runs backend actions without blocking input
//! and keeps the `beforeunload` warning scoped to the session.
//!
//! ## Usage
//!
//! Build for WASM:
//! ```bash
//! wasm-pack build --target web doodle-app
//! ```
//!
//! Then import in JavaScript:
//! ```javascript
//! import init, { createProject } from './pkg/doodle_app.js';
//!
//! await init();
//! const app = await createProject('draw', 'http://127.0.0.1:8000', JSON.stringify({
//!     name: 'shapes', classes: ['circle', 'square', 'triangle'], persistent: false,
//! }));
//!
//! await app.saveSample(2);
//! ```
//!
//! ## Exit confirmation
//!
//! The page owns the dialog markup; the session decides when it shows and
//! which choice ends it. Re-read `exitConfirmationPending` and `isClosed`
//! after every call, since a save-all finishing in the background can close
//! the dialog too.
//!
//! ```html
//! <dialog id="exit">
//!   <p>Save your project before leaving?</p>
//!   <button id="save">Save</button>
//!   <button id="cancel">Cancel</button>
//!   <button id="discard">Don't Save</button>
//! </dialog>
//! ```
//!
//! ```javascript
//! const dialog = document.getElementById('exit');
//! const sync = () => {
//!     if (app.isClosed) {
//!         dialog.close();
//!         location.assign('/');
//!     } else if (app.exitConfirmationPending) {
//!         if (!dialog.open) dialog.showModal();
//!     } else {
//!         dialog.close();
//!     }
//! };
//!
//! document.getElementById('back').onclick = () => { app.requestBack(); sync(); };
//! document.getElementById('save').onclick = async () => {
//!     try {
//!         await app.saveAndBack();
//!     } catch (message) {
//!         alert(message); // the dialog stays open
//!     }
//!     sync();
//! };
//! document.getElementById('cancel').onclick = () => { app.cancelExit(); sync(); };
//! document.getElementById('discard').onclick = () => { app.discardAndBack(); sync(); };
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod unload;

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::{Rc, Weak};

use doodle_client::{
    ActionError, BackendGateway, DrawingSession, GatewayConfig, HttpGateway, SessionOptions,
};
use doodle_core::{PointerEvent, PointerPhase, ProjectInfo, ProjectLoad, ProjectSetup, SurfaceBounds};
use js_sys::Promise;
use wasm_bindgen::prelude::*;
use wasm_bindgen::Clamped;
use wasm_bindgen_futures::future_to_promise;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, ImageData, MouseEvent};

pub use unload::BeforeUnloadGuard;

/// Initialize the WASM module.
#[wasm_bindgen(start)]
pub fn init_wasm() {
    console_error_panic_hook::set_once();
    tracing::info!("Doodle WASM initialized");
}

/// Create a project from a JSON setup form and open it on `canvas_id`.
///
/// `setup_json` is `{"name": "...", "classes": ["a", "b", "c"], "persistent": false}`.
///
/// # Errors
///
/// Rejects with a user-facing message if validation, the name check or
/// project creation fails, or if the canvas cannot be bound.
#[wasm_bindgen(js_name = createProject)]
pub async fn create_project(
    canvas_id: String,
    backend_url: String,
    setup_json: String,
) -> Result<DoodleApp, JsValue> {
    let setup: ProjectSetup = serde_json::from_str(&setup_json).map_err(to_js)?;
    let gateway = gateway(&backend_url)?;
    let project = doodle_client::create_project(&gateway, &setup)
        .await
        .map_err(action_error)?;
    DoodleApp::attach(&canvas_id, gateway, project)
}

/// Load a stored project from a JSON load form and open it on `canvas_id`.
///
/// `load_json` is `{"name": "...", "classes": ["a", "b", "c"]}`; class names
/// are optional and only checked when all three are given.
///
/// # Errors
///
/// Rejects with a user-facing message if the project cannot be loaded or
/// the canvas cannot be bound.
#[wasm_bindgen(js_name = loadProject)]
pub async fn load_project(
    canvas_id: String,
    backend_url: String,
    load_json: String,
) -> Result<DoodleApp, JsValue> {
    let load: ProjectLoad = serde_json::from_str(&load_json).map_err(to_js)?;
    let gateway = gateway(&backend_url)?;
    let project = doodle_client::load_project(&gateway, &load)
        .await
        .map_err(action_error)?;
    DoodleApp::attach(&canvas_id, gateway, project)
}

/// A drawing session bound to a `<canvas>` element.
#[wasm_bindgen]
pub struct DoodleApp {
    inner: Rc<AppInner>,
}

type MouseListener = Closure<dyn FnMut(MouseEvent)>;

struct AppInner {
    session: RefCell<DrawingSession<HttpGateway>>,
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    painted_revision: Cell<Option<u64>>,
    listeners: RefCell<Vec<(&'static str, MouseListener)>>,
}

impl DoodleApp {
    fn attach(
        canvas_id: &str,
        gateway: HttpGateway,
        project: ProjectInfo,
    ) -> Result<DoodleApp, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window object"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("No document object"))?;

        let canvas = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| JsValue::from_str(&format!("Canvas element '{canvas_id}' not found")))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| JsValue::from_str("Element is not a canvas"))?;

        let ctx = canvas
            .get_context("2d")
            .map_err(|_| JsValue::from_str("Failed to get 2D context"))?
            .ok_or_else(|| JsValue::from_str("2D context not available"))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| JsValue::from_str("Failed to cast to 2D context"))?;

        let options = SessionOptions::default();
        let guard = Box::new(BeforeUnloadGuard::new(window));
        let session =
            DrawingSession::open(gateway, project, guard, &options).map_err(action_error)?;

        canvas.set_width(session.surface().width());
        canvas.set_height(session.surface().height());

        let inner = Rc::new(AppInner {
            session: RefCell::new(session),
            canvas,
            ctx,
            painted_revision: Cell::new(None),
            listeners: RefCell::new(Vec::new()),
        });
        inner.bind_pointer(Rc::downgrade(&inner))?;
        inner.repaint();

        Ok(DoodleApp { inner })
    }

    fn spawn<F, Fut>(&self, action: F) -> Promise
    where
        F: FnOnce(Rc<AppInner>) -> Fut,
        Fut: Future<Output = Result<JsValue, JsValue>> + 'static,
    {
        future_to_promise(action(Rc::clone(&self.inner)))
    }
}

#[wasm_bindgen]
impl DoodleApp {
    /// Name of the open project.
    #[wasm_bindgen(getter, js_name = projectName)]
    #[must_use]
    pub fn project_name(&self) -> String {
        self.inner.session.borrow().state().project_name().to_string()
    }

    /// The three class labels, in order.
    #[wasm_bindgen(getter, js_name = classLabels)]
    #[must_use]
    pub fn class_labels(&self) -> Vec<String> {
        let session = self.inner.session.borrow();
        session.state().class_labels().iter().map(str::to_string).collect()
    }

    /// Active model variant.
    #[wasm_bindgen(getter, js_name = currentModel)]
    #[must_use]
    pub fn current_model(&self) -> String {
        self.inner.session.borrow().state().current_model().to_string()
    }

    /// Last prediction, if one is showing.
    #[wasm_bindgen(getter, js_name = lastPrediction)]
    #[must_use]
    pub fn last_prediction(&self) -> Option<String> {
        let session = self.inner.session.borrow();
        session.state().last_prediction().map(str::to_string)
    }

    /// Whether the project is durably saved.
    #[wasm_bindgen(getter, js_name = hasPersisted)]
    #[must_use]
    pub fn has_persisted(&self) -> bool {
        self.inner.session.borrow().state().has_persisted()
    }

    /// Whether the save / cancel / don't-save dialog should be visible.
    #[wasm_bindgen(getter, js_name = exitConfirmationPending)]
    #[must_use]
    pub fn exit_confirmation_pending(&self) -> bool {
        self.inner.session.borrow().state().exit_confirmation_pending()
    }

    /// Whether the session has ended and the page should navigate away.
    #[wasm_bindgen(getter, js_name = isClosed)]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.session.borrow().state().is_closed()
    }

    /// Current phase: `drawing`, `confirming_exit` or `leaving`.
    #[wasm_bindgen(getter)]
    #[must_use]
    pub fn phase(&self) -> String {
        let phase = self.inner.session.borrow().state().phase();
        serde_json::to_value(phase)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default()
    }

    /// Wipe the drawing.
    pub fn clear(&self) {
        self.inner.session.borrow_mut().clear();
        self.inner.repaint();
    }

    /// Save the drawing as a sample of class `class_num` (1-based).
    ///
    /// Resolves with the backend's message; rejects with a user-facing message.
    #[wasm_bindgen(js_name = saveSample)]
    pub fn save_sample(&self, class_num: usize) -> Promise {
        self.spawn(move |app| async move {
            let (request, gateway) = {
                let session = app.session.borrow();
                let request = session.prepare_save_sample(class_num).map_err(action_error)?;
                (request, session.gateway().clone())
            };
            let outcome = gateway.save_sample(&request).await;
            let ack = app
                .session
                .borrow_mut()
                .finish_save_sample(outcome)
                .map_err(action_error)?;
            app.repaint();
            Ok(JsValue::from_str(ack.message.as_deref().unwrap_or("Sample saved")))
        })
    }

    /// Classify the drawing. Resolves with the predicted label.
    pub fn predict(&self) -> Promise {
        self.spawn(|app| async move {
            let (request, gateway) = {
                let session = app.session.borrow();
                let request = session.prepare_predict().map_err(action_error)?;
                (request, session.gateway().clone())
            };
            let outcome = gateway.predict(&request).await;
            let label = app
                .session
                .borrow_mut()
                .finish_predict(outcome)
                .map_err(action_error)?;
            Ok(JsValue::from_str(&label))
        })
    }

    /// Retrain the active model. Resolves with the backend's message.
    pub fn train(&self) -> Promise {
        self.spawn(|app| async move {
            let (project, gateway) = app.project_action("train")?;
            let outcome = gateway.train(&project).await;
            let ack = app
                .session
                .borrow()
                .finish_train(outcome)
                .map_err(action_error)?;
            Ok(JsValue::from_str(ack.message.as_deref().unwrap_or("Model trained")))
        })
    }

    /// Switch model variant. Resolves with the new model label.
    pub fn rotate(&self) -> Promise {
        self.spawn(|app| async move {
            let (project, gateway) = app.project_action("rotate")?;
            let outcome = gateway.rotate(&project).await;
            let model = app
                .session
                .borrow_mut()
                .finish_rotate(outcome)
                .map_err(action_error)?;
            Ok(JsValue::from_str(&model))
        })
    }

    /// Persist the project without leaving.
    #[wasm_bindgen(js_name = saveAll)]
    pub fn save_all(&self) -> Promise {
        self.spawn(|app| async move {
            let (project, gateway) = app.project_action("save_all")?;
            let outcome = gateway.save_all(&project).await;
            let ack = app
                .session
                .borrow_mut()
                .finish_save_all(outcome)
                .map_err(action_error)?;
            Ok(JsValue::from_str(ack.message.as_deref().unwrap_or("Project saved")))
        })
    }

    /// Ask to go back. Returns `true` if the session ended right away; otherwise
    /// the exit dialog is now pending.
    ///
    /// # Errors
    ///
    /// Returns an error if the session already ended.
    #[wasm_bindgen(js_name = requestBack)]
    pub fn request_back(&self) -> Result<bool, JsValue> {
        let transition = self
            .inner
            .session
            .borrow_mut()
            .request_back()
            .map_err(action_error)?;
        Ok(transition.to == doodle_core::SessionPhase::Leaving)
    }

    /// Dialog "Save": persist, then leave. Resolves `true` once left; rejects
    /// and keeps the dialog open if saving fails.
    #[wasm_bindgen(js_name = saveAndBack)]
    pub fn save_and_back(&self) -> Promise {
        self.spawn(|app| async move {
            let (project, gateway) = {
                let mut session = app.session.borrow_mut();
                let project = session.prepare_save_and_back().map_err(action_error)?;
                (project, session.gateway().clone())
            };
            let outcome = gateway.save_all(&project).await;
            let transition = app
                .session
                .borrow_mut()
                .finish_save_and_back(outcome)
                .map_err(action_error)?;
            Ok(JsValue::from_bool(
                transition.to == doodle_core::SessionPhase::Leaving,
            ))
        })
    }

    /// Dialog "Don't Save": leave now and discard the project in the background.
    ///
    /// # Errors
    ///
    /// Returns an error if no dialog is open or a save is pending.
    #[wasm_bindgen(js_name = discardAndBack)]
    pub fn discard_and_back(&self) -> Result<(), JsValue> {
        let (project, gateway) = {
            let mut session = self.inner.session.borrow_mut();
            let (project, _) = session.prepare_discard_and_back().map_err(action_error)?;
            (project, session.gateway().clone())
        };

        let app = Rc::clone(&self.inner);
        wasm_bindgen_futures::spawn_local(async move {
            let outcome = gateway.discard_project(&project).await;
            app.session.borrow().finish_discard(&outcome);
        });
        Ok(())
    }

    /// Dialog "Cancel": keep drawing.
    ///
    /// # Errors
    ///
    /// Returns an error if no dialog is open or a save is pending.
    #[wasm_bindgen(js_name = cancelExit)]
    pub fn cancel_exit(&self) -> Result<(), JsValue> {
        self.inner
            .session
            .borrow_mut()
            .cancel_exit()
            .map(|_| ())
            .map_err(action_error)
    }
}

impl AppInner {
    fn bind_pointer(&self, app: Weak<AppInner>) -> Result<(), JsValue> {
        let bindings = [
            ("mousedown", PointerPhase::Down),
            ("mousemove", PointerPhase::Move),
            ("mouseup", PointerPhase::Up),
            ("mouseleave", PointerPhase::Leave),
        ];

        let mut listeners = self.listeners.borrow_mut();
        for (name, phase) in bindings {
            let app = app.clone();
            let listener = MouseListener::new(move |event: MouseEvent| {
                if let Some(app) = app.upgrade() {
                    app.on_pointer(phase, &event);
                }
            });
            self.canvas
                .add_event_listener_with_callback(name, listener.as_ref().unchecked_ref())?;
            listeners.push((name, listener));
        }
        Ok(())
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn on_pointer(&self, phase: PointerPhase, event: &MouseEvent) {
        // Bounds are read per event; the canvas may have moved since the last one.
        let rect = self.canvas.get_bounding_client_rect();
        let bounds = SurfaceBounds::new(rect.left() as f32, rect.top() as f32);
        let pointer = PointerEvent::new(phase, event.client_x() as f32, event.client_y() as f32);

        let Ok(mut session) = self.session.try_borrow_mut() else {
            tracing::debug!("Pointer event dropped while session is busy");
            return;
        };
        let drew = session.pointer(&pointer, &bounds);
        drop(session);

        if drew {
            self.repaint();
        }
    }

    /// Copy the surface onto the canvas if its pixels changed.
    fn repaint(&self) {
        let session = self.session.borrow();
        let surface = session.surface();
        let revision = surface.revision();
        if self.painted_revision.get() == Some(revision) {
            return;
        }

        let rgba = surface.to_rgba();
        match ImageData::new_with_u8_clamped_array_and_sh(
            Clamped(&rgba[..]),
            surface.width(),
            surface.height(),
        ) {
            Ok(image) => {
                if let Err(e) = self.ctx.put_image_data(&image, 0.0, 0.0) {
                    tracing::warn!("Failed to paint surface: {:?}", e);
                    return;
                }
                self.painted_revision.set(Some(revision));
            }
            Err(e) => tracing::warn!("Failed to create surface ImageData: {:?}", e),
        }
    }

    fn project_action(&self, action: &'static str) -> Result<(String, HttpGateway), JsValue> {
        let session = self.session.borrow();
        let project = session.prepare_project_action(action).map_err(action_error)?;
        Ok((project, session.gateway().clone()))
    }
}

impl Drop for AppInner {
    fn drop(&mut self) {
        for (name, listener) in self.listeners.get_mut().drain(..) {
            let _ = self
                .canvas
                .remove_event_listener_with_callback(name, listener.as_ref().unchecked_ref());
        }
    }
}

fn gateway(backend_url: &str) -> Result<HttpGateway, JsValue> {
    let config = GatewayConfig::new(backend_url).map_err(to_js)?;
    HttpGateway::new(&config).map_err(to_js)
}

fn action_error(err: ActionError) -> JsValue {
    if err.is_local() {
        tracing::debug!(error = %err, "Action rejected");
    } else {
        tracing::warn!(error = %err, "Action failed");
    }
    JsValue::from_str(&err.user_message())
}

#[allow(clippy::needless_pass_by_value)]
fn to_js<E: std::fmt::Display>(err: E) -> JsValue {
    JsValue::from_str(&err.to_string())
}
