#![forbid(unsafe_code)]

//! Cached, network-backed view counter.
//!
//! A [`ViewCounter`] shows an approximate view count for one [`CounterKey`]
//! and registers one hit per activation, while never showing an error.
//!
//! # Lifecycle
//!
//! 1. [`ViewCounter::activate`] reads the local cache and, on a hit, publishes
//!    the cached count immediately. It returns a [`HitRequest`] describing the
//!    single network call the host must perform.
//! 2. The host performs `GET <host>/hit/<ns>/<id>` and reports back through
//!    [`ViewCounter::resolve`] with the request's ticket. Deadlines are
//!    enforced either by the host's timer ([`ViewCounter::expire`]) or by
//!    polling ([`ViewCounter::poll_deadline`]).
//! 3. [`ViewCounter::deactivate`] aborts the pending request; results that
//!    arrive afterwards carry a stale ticket and are ignored.
//!
//! [`MountedCounter`] wires the three steps to a [`HitTransport`] and ties
//! deactivation to `Drop`.
//!
//! # Invariants
//!
//! 1. A cache emission always precedes any network emission.
//! 2. A successful network result always replaces the displayed value and is
//!    written back to the cache.
//! 3. A failure never replaces a displayed value; it only turns `Pending`
//!    into `Count(0)`.
//! 4. Nothing is published for a request after it was aborted, expired or
//!    superseded.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Display |
//! |---------|-------|---------|
//! | Transport error | Offline, blocked, DNS | cache or `0` |
//! | HTTP error | Non-2xx status | cache or `0` |
//! | Malformed body | Bad JSON, no numeric `value` | cache or `0` |
//! | Timeout | Deadline passed | cache or `0` |
//! | Store unavailable | Private mode | behaves as empty cache |

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use folio_core::counter_key::CounterKey;
use tracing::{debug, trace};
use web_time::Instant;

use crate::abort::AbortSignal;
use crate::config::CounterConfig;
use crate::locale::LocaleContext;
use crate::reactive::{Binding, Observable, Subscription};
use crate::storage::{CountCache, KeyValueStore};

/// Placeholder rendered before any count is known.
pub const PENDING_LABEL: &str = "\u{2026}";

/// What the counter currently shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CountDisplay {
    /// Nothing known yet.
    #[default]
    Pending,
    Count(u64),
}

impl CountDisplay {
    #[must_use]
    pub fn value(self) -> Option<u64> {
        match self {
            Self::Pending => None,
            Self::Count(n) => Some(n),
        }
    }

    /// `"…"` or `"<grouped count> views"`.
    #[must_use]
    pub fn label(self, locale: &str) -> String {
        match self {
            Self::Pending => PENDING_LABEL.to_string(),
            Self::Count(n) => format!("{} views", crate::locale::format_grouped(n, locale)),
        }
    }
}

/// Why a hit did not produce a count. Never shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountError {
    /// The request never produced a response.
    Transport(String),
    /// The service answered with a non-2xx status.
    Status(u16),
    /// The body was not JSON with a non-negative numeric `value`.
    Malformed(String),
    /// The deadline passed first.
    TimedOut,
    /// The request was cancelled by its owner.
    Aborted,
}

impl fmt::Display for CountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(msg) => write!(f, "transport error: {msg}"),
            Self::Status(status) => write!(f, "counting service answered HTTP {status}"),
            Self::Malformed(msg) => write!(f, "malformed hit response: {msg}"),
            Self::TimedOut => write!(f, "hit request timed out"),
            Self::Aborted => write!(f, "hit request aborted"),
        }
    }
}

impl std::error::Error for CountError {}

/// Interpret a counting-service response.
///
/// Success requires a 2xx status and a JSON object whose `value` is a
/// non-negative number; fractional values are truncated.
pub fn parse_hit_response(status: u16, body: &str) -> Result<u64, CountError> {
    if !(200..300).contains(&status) {
        return Err(CountError::Status(status));
    }
    let json: serde_json::Value =
        serde_json::from_str(body).map_err(|e| CountError::Malformed(e.to_string()))?;
    let value = json
        .get("value")
        .ok_or_else(|| CountError::Malformed("missing `value`".to_string()))?;
    if let Some(n) = value.as_u64() {
        return Ok(n);
    }
    match value.as_f64() {
        Some(f) if f.is_finite() && f >= 0.0 && f <= u64::MAX as f64 => Ok(f as u64),
        _ => Err(CountError::Malformed(format!("`value` is not a count: {value}"))),
    }
}

/// Identifies one activation's request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HitTicket(u64);

/// The single network call an activation asks the host to perform.
#[derive(Debug, Clone)]
pub struct HitRequest {
    pub ticket: HitTicket,
    pub url: String,
    /// Fires when the owner no longer wants the result.
    pub abort: AbortSignal,
    pub deadline: Instant,
    pub timeout: Duration,
}

#[derive(Debug)]
struct InFlight {
    ticket: HitTicket,
    abort: AbortSignal,
    deadline: Instant,
}

/// View-counter state machine for one key.
#[derive(Debug)]
pub struct ViewCounter {
    key: CounterKey,
    host: String,
    timeout: Duration,
    cache: CountCache,
    display: Observable<CountDisplay>,
    next_ticket: u64,
    in_flight: Option<InFlight>,
}

impl ViewCounter {
    /// Counter for `key` against the service and timeout in `config`.
    #[must_use]
    pub fn new(key: CounterKey, store: Rc<dyn KeyValueStore>, config: &CounterConfig) -> Self {
        Self {
            key,
            host: config.host.clone(),
            timeout: config.timeout(),
            cache: CountCache::new(store),
            display: Observable::new(CountDisplay::Pending),
            next_ticket: 0,
            in_flight: None,
        }
    }

    #[must_use]
    pub fn key(&self) -> &CounterKey {
        &self.key
    }

    #[must_use]
    pub fn current(&self) -> CountDisplay {
        self.display.get()
    }

    /// Shared handle to the displayed value.
    #[must_use]
    pub fn display(&self) -> Observable<CountDisplay> {
        self.display.clone()
    }

    /// Observe every displayed value from now on.
    pub fn subscribe(&self, callback: impl Fn(&CountDisplay) + 'static) -> Subscription {
        self.display.subscribe(callback)
    }

    /// Display label bound to the counter and the locale context.
    #[must_use]
    pub fn label(&self, locale: &LocaleContext) -> Binding<String> {
        let display = self.display.clone();
        let locale = locale.clone();
        Binding::new(move || display.get().label(&locale.current_locale()))
    }

    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Publish the cached count, if any, and start one hit.
    ///
    /// A request still pending from an earlier activation is aborted first.
    pub fn activate(&mut self, now: Instant) -> HitRequest {
        if let Some(abort) = self.take_in_flight() {
            abort.abort();
        }
        let (request, cached) = self.begin(now);
        if let Some(cached) = cached {
            self.display.set(cached);
        }
        request
    }

    /// Apply the outcome of the request identified by `ticket`.
    ///
    /// Returns `false` if the ticket is not the pending one (the result is
    /// ignored).
    pub fn resolve(&mut self, ticket: HitTicket, result: Result<u64, CountError>) -> bool {
        let resolution = self.settle(ticket, result);
        resolution.publish_to(&self.display);
        resolution.is_accepted()
    }

    /// The host timer for `ticket` fired: abort and fall back.
    pub fn expire(&mut self, ticket: HitTicket) -> bool {
        if !self
            .in_flight
            .as_ref()
            .is_some_and(|in_flight| in_flight.ticket == ticket)
        {
            return false;
        }
        self.expire_pending();
        true
    }

    /// Expire the pending request if its deadline is at or before `now`.
    pub fn poll_deadline(&mut self, now: Instant) -> bool {
        if !self.deadline_passed(now) {
            return false;
        }
        self.expire_pending();
        true
    }

    /// Abort the pending request; nothing it produces will be published.
    pub fn deactivate(&mut self) {
        if let Some(abort) = self.take_in_flight() {
            abort.abort();
        }
    }

    fn expire_pending(&mut self) {
        let Some(abort) = self.take_in_flight() else {
            return;
        };
        abort.abort();
        debug!(target: "folio.counter", key = %self.key, error = %CountError::TimedOut, "hit failed, keeping fallback");
        if let Some(fallback) = self.fallback() {
            self.display.set(fallback);
        }
    }

    // State transitions below never publish; callers publish once no borrow
    // of the counter is held.

    /// Register a new in-flight hit. Returns the cached count to publish.
    fn begin(&mut self, now: Instant) -> (HitRequest, Option<CountDisplay>) {
        let cached = self.cache.read(&self.key).map(|cached| {
            trace!(target: "folio.counter", key = %self.key, cached, "optimistic cached count");
            CountDisplay::Count(cached)
        });

        self.next_ticket += 1;
        let ticket = HitTicket(self.next_ticket);
        let abort = AbortSignal::new();
        let deadline = now + self.timeout;
        self.in_flight = Some(InFlight {
            ticket,
            abort: abort.clone(),
            deadline,
        });
        let url = self.key.hit_url(&self.host);
        debug!(target: "folio.counter", key = %self.key, %url, "hit requested");
        let request = HitRequest {
            ticket,
            url,
            abort,
            deadline,
            timeout: self.timeout,
        };
        (request, cached)
    }

    /// Record the outcome of `ticket` and write the cache on success.
    fn settle(&mut self, ticket: HitTicket, result: Result<u64, CountError>) -> Resolution {
        if !self.take_pending(ticket) {
            trace!(target: "folio.counter", key = %self.key, ?ticket, "stale hit result ignored");
            return Resolution::Stale;
        }
        match result {
            Ok(count) => {
                debug!(target: "folio.counter", key = %self.key, count, "hit succeeded");
                self.cache.write(&self.key, count);
                Resolution::Publish(CountDisplay::Count(count))
            }
            Err(err) => {
                debug!(target: "folio.counter", key = %self.key, error = %err, "hit failed, keeping fallback");
                self.fallback()
                    .map_or(Resolution::Kept, Resolution::Publish)
            }
        }
    }

    /// Detach the pending request; its signal is returned unfired.
    fn take_in_flight(&mut self) -> Option<AbortSignal> {
        let in_flight = self.in_flight.take()?;
        debug!(target: "folio.counter", key = %self.key, ticket = ?in_flight.ticket, "hit request cancelled");
        Some(in_flight.abort)
    }

    fn deadline_passed(&self, now: Instant) -> bool {
        self.in_flight
            .as_ref()
            .is_some_and(|in_flight| now >= in_flight.deadline)
    }

    fn take_pending(&mut self, ticket: HitTicket) -> bool {
        match &self.in_flight {
            Some(in_flight) if in_flight.ticket == ticket => {
                self.in_flight = None;
                true
            }
            _ => false,
        }
    }

    /// `Count(0)` while nothing has been shown yet.
    fn fallback(&self) -> Option<CountDisplay> {
        (self.display.get() == CountDisplay::Pending).then_some(CountDisplay::Count(0))
    }
}

/// What settling a hit result did to the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolution {
    /// Not the pending request; ignored.
    Stale,
    /// Accepted, the displayed value stays.
    Kept,
    /// Accepted, the displayed value becomes this.
    Publish(CountDisplay),
}

impl Resolution {
    fn is_accepted(self) -> bool {
        self != Self::Stale
    }

    fn publish_to(self, display: &Observable<CountDisplay>) {
        if let Self::Publish(value) = self {
            display.set(value);
        }
    }
}

/// Completion callback handed to a [`HitTransport`].
pub type HitCallback = Box<dyn FnOnce(Result<u64, CountError>)>;

/// Performs hit requests on behalf of mounted counters.
///
/// Implementations must call `complete` at most once, should stop work when
/// `request.abort` fires, and should complete with [`CountError::TimedOut`]
/// once `request.timeout` elapses. `complete` may be called from inside
/// `send` or from an abort listener.
pub trait HitTransport {
    fn send(&self, request: &HitRequest, complete: HitCallback);
}

/// A counter activated against a transport and deactivated on drop.
///
/// Subscribers of [`MountedCounter::display`] run with no borrow of the
/// counter held, so they may call back into the mounted counter.
pub struct MountedCounter {
    counter: Rc<RefCell<ViewCounter>>,
    display: Observable<CountDisplay>,
}

impl fmt::Debug for MountedCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountedCounter")
            .field("display", &self.display.get())
            .field("in_flight", &self.is_in_flight())
            .finish()
    }
}

impl MountedCounter {
    /// Activate `counter` and hand its hit to `transport`.
    pub fn mount(counter: ViewCounter, transport: &dyn HitTransport, now: Instant) -> Self {
        let display = counter.display();
        let counter = Rc::new(RefCell::new(counter));
        let (stale, (request, cached)) = {
            let mut guard = counter.borrow_mut();
            (guard.take_in_flight(), guard.begin(now))
        };
        if let Some(abort) = stale {
            abort.abort();
        }
        if let Some(cached) = cached {
            display.set(cached);
        }

        let weak = Rc::downgrade(&counter);
        let ticket = request.ticket;
        let output = display.clone();
        transport.send(
            &request,
            Box::new(move |result| {
                let Some(counter) = weak.upgrade() else {
                    return;
                };
                let resolution = counter.borrow_mut().settle(ticket, result);
                resolution.publish_to(&output);
            }),
        );
        Self { counter, display }
    }

    #[must_use]
    pub fn current(&self) -> CountDisplay {
        self.display.get()
    }

    #[must_use]
    pub fn display(&self) -> Observable<CountDisplay> {
        self.display.clone()
    }

    /// Host-side deadline check for transports without timers.
    pub fn poll_deadline(&self, now: Instant) -> bool {
        let expired = {
            let mut counter = self.counter.borrow_mut();
            if counter.deadline_passed(now) {
                counter.take_in_flight().map(|abort| (abort, counter.fallback()))
            } else {
                None
            }
        };
        let Some((abort, fallback)) = expired else {
            return false;
        };
        abort.abort();
        if let Some(fallback) = fallback {
            self.display.set(fallback);
        }
        true
    }

    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        self.counter.borrow().is_in_flight()
    }
}

impl Drop for MountedCounter {
    fn drop(&mut self) {
        let pending = self
            .counter
            .try_borrow_mut()
            .ok()
            .and_then(|mut counter| counter.take_in_flight());
        if let Some(abort) = pending {
            abort.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn counter_with(store: Rc<MemoryStore>) -> ViewCounter {
        let config = CounterConfig {
            host: "https://counter.test".into(),
            namespace: "ns".into(),
            timeout_ms: 2_000,
        };
        ViewCounter::new(CounterKey::site("ns"), store, &config)
    }

    #[test]
    fn parse_hit_response_variants() {
        assert_eq!(parse_hit_response(200, r#"{"value": 17}"#), Ok(17));
        assert_eq!(parse_hit_response(200, r#"{"value": 17.9}"#), Ok(17));
        assert_eq!(
            parse_hit_response(503, r#"{"value": 17}"#),
            Err(CountError::Status(503))
        );
        assert!(matches!(
            parse_hit_response(200, "<html>"),
            Err(CountError::Malformed(_))
        ));
        assert!(matches!(
            parse_hit_response(200, r#"{"value": "17"}"#),
            Err(CountError::Malformed(_))
        ));
        assert!(matches!(
            parse_hit_response(200, r#"{"value": -1}"#),
            Err(CountError::Malformed(_))
        ));
        assert!(matches!(
            parse_hit_response(200, r#"{"count": 1}"#),
            Err(CountError::Malformed(_))
        ));
    }

    #[test]
    fn labels() {
        assert_eq!(CountDisplay::Pending.label("en"), "\u{2026}");
        assert_eq!(CountDisplay::Count(1_234).label("en"), "1,234 views");
        assert_eq!(CountDisplay::Count(1).label("en"), "1 views");
    }

    #[test]
    fn request_targets_hit_url_with_deadline() {
        let mut counter = counter_with(Rc::new(MemoryStore::new()));
        let now = Instant::now();
        let request = counter.activate(now);
        assert_eq!(request.url, "https://counter.test/hit/ns/site");
        assert_eq!(request.deadline, now + Duration::from_secs(2));
        assert!(counter.is_in_flight());
    }

    #[test]
    fn reactivation_aborts_previous_request() {
        let mut counter = counter_with(Rc::new(MemoryStore::new()));
        let now = Instant::now();
        let first = counter.activate(now);
        let second = counter.activate(now);
        assert!(first.abort.is_aborted());
        assert!(!counter.resolve(first.ticket, Ok(5)));
        assert_eq!(counter.current(), CountDisplay::Pending);
        assert!(counter.resolve(second.ticket, Ok(6)));
        assert_eq!(counter.current(), CountDisplay::Count(6));
    }

    #[test]
    fn poll_deadline_expires_only_after_deadline() {
        let mut counter = counter_with(Rc::new(MemoryStore::new()));
        let now = Instant::now();
        let request = counter.activate(now);
        assert!(!counter.poll_deadline(now + Duration::from_millis(1_999)));
        assert!(counter.poll_deadline(now + Duration::from_millis(2_000)));
        assert!(request.abort.is_aborted());
        assert_eq!(counter.current(), CountDisplay::Count(0));
        assert!(!counter.resolve(request.ticket, Ok(9)));
    }

    #[test]
    fn label_binding_follows_locale() {
        let store = Rc::new(MemoryStore::with_entries([("vcache:ns:site", "12345")]));
        let mut counter = counter_with(store);
        let locale = LocaleContext::new("en");
        let label = counter.label(&locale);
        assert_eq!(label.get(), "\u{2026}");
        let _request = counter.activate(Instant::now());
        assert_eq!(label.get(), "12,345 views");
        locale.set_locale("de");
        assert_eq!(label.get(), "12.345 views");
    }
}
