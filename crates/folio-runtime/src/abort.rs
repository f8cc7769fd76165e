#![forbid(unsafe_code)]

//! Single-threaded cancellation signal.
//!
//! An [`AbortSignal`] is shared between the party that owns a pending
//! operation and the transport performing it. Aborting is idempotent and
//! runs registered listeners exactly once, synchronously.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

#[derive(Default)]
struct AbortInner {
    aborted: Cell<bool>,
    listeners: RefCell<Vec<Box<dyn FnOnce()>>>,
}

/// Shared, clonable cancellation flag with abort listeners.
#[derive(Clone, Default)]
pub struct AbortSignal {
    inner: Rc<AbortInner>,
}

impl fmt::Debug for AbortSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbortSignal")
            .field("aborted", &self.is_aborted())
            .finish()
    }
}

impl AbortSignal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.inner.aborted.get()
    }

    /// Abort and run every listener. Later calls do nothing.
    pub fn abort(&self) {
        if self.inner.aborted.replace(true) {
            return;
        }
        let listeners = std::mem::take(&mut *self.inner.listeners.borrow_mut());
        for listener in listeners {
            listener();
        }
    }

    /// Run `listener` on abort; runs immediately if already aborted.
    pub fn on_abort(&self, listener: impl FnOnce() + 'static) {
        if self.is_aborted() {
            listener();
        } else {
            self.inner.listeners.borrow_mut().push(Box::new(listener));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abort_runs_listeners_once() {
        let signal = AbortSignal::new();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        signal.on_abort(move || h.set(h.get() + 1));
        signal.abort();
        signal.abort();
        assert!(signal.is_aborted());
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn late_listener_runs_immediately() {
        let signal = AbortSignal::new();
        signal.abort();
        let ran = Rc::new(Cell::new(false));
        let r = Rc::clone(&ran);
        signal.clone().on_abort(move || r.set(true));
        assert!(ran.get());
    }
}
