#![forbid(unsafe_code)]

//! Reactive state for the page runtime.
//!
//! This module provides the change-tracking primitives every Folio state
//! machine publishes through:
//!
//! - [`Observable`]: A shared, version-tracked value wrapper with change
//!   notification via subscriber callbacks.
//! - [`Subscription`]: RAII guard that automatically unsubscribes on drop.
//! - [`Binding`]: A lazily evaluated view derived from an `Observable`.
//!
//! # Architecture
//!
//! `Observable<T>` uses `Rc<RefCell<..>>` for single-threaded shared ownership.
//! Subscribers are stored as `Weak` function pointers and cleaned up lazily
//! during notification. Callbacks run after the internal borrow is released,
//! so a subscriber may read or even set the observable it listens to.
//!
//! # Invariants
//!
//! 1. Version increments exactly once per mutation that changes the value.
//! 2. Subscribers are notified in registration order.
//! 3. Setting a value equal to the current value is a no-op (no version bump,
//!    no notifications).
//! 4. Dropping a [`Subscription`] removes the callback before the next
//!    notification cycle.

pub mod binding;
pub mod observable;

pub use binding::{Binding, bind_mapped, bind_observable};
pub use observable::{Observable, Subscription};
