//! `beforeunload` warning for unpersisted projects.

use std::cell::Cell;
use std::rc::Rc;

use doodle_core::ExitGuard;
use wasm_bindgen::prelude::*;
use web_sys::{BeforeUnloadEvent, Window};

type UnloadListener = Closure<dyn FnMut(BeforeUnloadEvent)>;

/// Asks the browser to confirm closing the tab while work is unsaved.
///
/// The listener is only registered between `subscribe` and `unsubscribe`;
/// while registered it stays silent once the project is persisted.
pub struct BeforeUnloadGuard {
    window: Window,
    unsaved: Rc<Cell<bool>>,
    listener: Option<UnloadListener>,
}

impl BeforeUnloadGuard {
    /// Guard for `window`. Nothing is registered until the session opens.
    #[must_use]
    pub fn new(window: Window) -> Self {
        Self {
            window,
            unsaved: Rc::new(Cell::new(true)),
            listener: None,
        }
    }
}

impl ExitGuard for BeforeUnloadGuard {
    fn subscribe(&mut self) {
        if self.listener.is_some() {
            return;
        }
        let unsaved = Rc::clone(&self.unsaved);
        let listener = UnloadListener::new(move |event: BeforeUnloadEvent| {
            if unsaved.get() {
                event.prevent_default();
                // Legacy browsers only prompt when a return value is set.
                event.set_return_value("");
            }
        });

        if let Err(err) = self
            .window
            .add_event_listener_with_callback("beforeunload", listener.as_ref().unchecked_ref())
        {
            tracing::warn!("Failed to register beforeunload listener: {:?}", err);
            return;
        }
        self.listener = Some(listener);
    }

    fn unsubscribe(&mut self) {
        if let Some(listener) = self.listener.take() {
            if let Err(err) = self.window.remove_event_listener_with_callback(
                "beforeunload",
                listener.as_ref().unchecked_ref(),
            ) {
                tracing::warn!("Failed to remove beforeunload listener: {:?}", err);
            }
        }
    }

    fn persistence_changed(&mut self, persisted: bool) {
        self.unsaved.set(!persisted);
    }
}
