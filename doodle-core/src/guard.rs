//! Scoped registration of the unsaved-work warning.
//!
//! Hosts warn the user when the process or page is about to go away while the
//! project is not persisted. The listener is registered when a session opens
//! and must be removed as soon as the session leaves; [`ScopedExitGuard`]
//! ties the registration to that lifetime instead of a global listener.

/// A host-specific listener that warns about unsaved work on exit.
pub trait ExitGuard {
    /// Register the listener.
    fn subscribe(&mut self);

    /// Remove the listener.
    fn unsubscribe(&mut self);

    /// The project's persisted flag changed; only unpersisted work warrants a warning.
    fn persistence_changed(&mut self, _persisted: bool) {}
}

impl<G: ExitGuard + ?Sized> ExitGuard for Box<G> {
    fn subscribe(&mut self) {
        (**self).subscribe();
    }

    fn unsubscribe(&mut self) {
        (**self).unsubscribe();
    }

    fn persistence_changed(&mut self, persisted: bool) {
        (**self).persistence_changed(persisted);
    }
}

/// Guard for hosts without an unload event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopExitGuard;

impl ExitGuard for NoopExitGuard {
    fn subscribe(&mut self) {}

    fn unsubscribe(&mut self) {}
}

/// Holds an [`ExitGuard`] subscribed for as long as the session is active.
///
/// Subscribes on construction, unsubscribes exactly once on [`release`] or drop.
///
/// [`release`]: ScopedExitGuard::release
#[derive(Debug)]
pub struct ScopedExitGuard<G: ExitGuard> {
    inner: G,
    active: bool,
}

impl<G: ExitGuard> ScopedExitGuard<G> {
    /// Subscribe `inner` and take ownership of the registration.
    pub fn new(mut inner: G) -> Self {
        inner.subscribe();
        tracing::debug!("Exit guard subscribed");
        Self {
            inner,
            active: true,
        }
    }

    /// Unsubscribe if still active. Idempotent.
    pub fn release(&mut self) {
        if self.active {
            self.inner.unsubscribe();
            self.active = false;
            tracing::debug!("Exit guard released");
        }
    }

    /// Forward the persisted flag while the listener is registered.
    pub fn set_persisted(&mut self, persisted: bool) {
        if self.active {
            self.inner.persistence_changed(persisted);
        }
    }

    /// Whether the listener is currently registered.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl<G: ExitGuard> Drop for ScopedExitGuard<G> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct CountingGuard {
        subscribed: Rc<Cell<u32>>,
        unsubscribed: Rc<Cell<u32>>,
        persisted: Rc<Cell<Option<bool>>>,
    }

    impl ExitGuard for CountingGuard {
        fn subscribe(&mut self) {
            self.subscribed.set(self.subscribed.get() + 1);
        }

        fn unsubscribe(&mut self) {
            self.unsubscribed.set(self.unsubscribed.get() + 1);
        }

        fn persistence_changed(&mut self, persisted: bool) {
            self.persisted.set(Some(persisted));
        }
    }

    #[test]
    fn test_subscribes_on_creation() {
        let counter = CountingGuard::default();
        let guard = ScopedExitGuard::new(counter.clone());
        assert!(guard.is_active());
        assert_eq!(counter.subscribed.get(), 1);
        assert_eq!(counter.unsubscribed.get(), 0);
    }

    #[test]
    fn test_release_is_idempotent_and_drop_does_not_repeat() {
        let counter = CountingGuard::default();
        {
            let mut guard = ScopedExitGuard::new(counter.clone());
            guard.release();
            guard.release();
            assert!(!guard.is_active());
        }
        assert_eq!(counter.unsubscribed.get(), 1);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let counter = CountingGuard::default();
        drop(ScopedExitGuard::new(counter.clone()));
        assert_eq!(counter.unsubscribed.get(), 1);
    }

    #[test]
    fn test_boxed_guard_forwards() {
        let counter = CountingGuard::default();
        let boxed: Box<dyn ExitGuard> = Box::new(counter.clone());
        let mut guard = ScopedExitGuard::new(boxed);
        guard.release();
        assert_eq!(counter.subscribed.get(), 1);
        assert_eq!(counter.unsubscribed.get(), 1);
    }

    #[test]
    fn test_persistence_is_forwarded_only_while_active() {
        let counter = CountingGuard::default();
        let boxed: Box<dyn ExitGuard> = Box::new(counter.clone());
        let mut guard = ScopedExitGuard::new(boxed);

        guard.set_persisted(true);
        assert_eq!(counter.persisted.get(), Some(true));

        guard.release();
        guard.set_persisted(false);
        assert_eq!(counter.persisted.get(), Some(true));
    }
}
