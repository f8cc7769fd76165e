#![forbid(unsafe_code)]

//! `requestAnimationFrame` as a [`FrameScheduler`].

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use folio_runtime::frames::{FrameCallback, FrameScheduler, FrameTask};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_time::Instant;

struct RafLoop {
    window: web_sys::Window,
    callback: RefCell<Option<FrameCallback>>,
    closure: RefCell<Option<Closure<dyn FnMut(f64)>>>,
    pending: Cell<Option<i32>>,
    cancelled: Cell<bool>,
}

impl RafLoop {
    fn request_next(&self) {
        let closure = self.closure.borrow();
        let Some(closure) = closure.as_ref() else {
            return;
        };
        let id = self
            .window
            .request_animation_frame(closure.as_ref().unchecked_ref())
            .ok();
        self.pending.set(id);
    }

    fn on_frame(&self) {
        self.pending.set(None);
        if self.cancelled.get() {
            return;
        }
        // Taken out so the callback may cancel this loop.
        let taken = self.callback.borrow_mut().take();
        if let Some(mut callback) = taken {
            callback(Instant::now());
            if !self.cancelled.get() {
                *self.callback.borrow_mut() = Some(callback);
            }
        }
        if !self.cancelled.get() {
            self.request_next();
        }
    }

    fn cancel(&self) {
        if self.cancelled.replace(true) {
            return;
        }
        if let Some(id) = self.pending.take() {
            let _ = self.window.cancel_animation_frame(id);
        }
        self.callback.borrow_mut().take();
        let closure = self.closure.borrow_mut().take();
        drop(closure);
    }
}

/// Frame source backed by the window's animation frames.
#[derive(Debug, Default, Clone, Copy)]
pub struct RafScheduler;

impl FrameScheduler for RafScheduler {
    fn schedule_repeating(&self, callback: FrameCallback) -> Option<FrameTask> {
        let window = web_sys::window()?;
        let state = Rc::new(RafLoop {
            window,
            callback: RefCell::new(Some(callback)),
            closure: RefCell::new(None),
            pending: Cell::new(None),
            cancelled: Cell::new(false),
        });
        let weak: Weak<RafLoop> = Rc::downgrade(&state);
        let closure = Closure::<dyn FnMut(f64)>::new(move |_timestamp: f64| {
            if let Some(state) = weak.upgrade() {
                state.on_frame();
            }
        });
        *state.closure.borrow_mut() = Some(closure);
        state.request_next();
        state.pending.get()?;
        Some(FrameTask::new(move || state.cancel()))
    }
}
