//! Event managers: per-request listener dispatch and the process-wide
//! shared registry.
//!
//! The trigger protocol is an explicit ordered loop over
//! `(priority, listener)` pairs with a stop flag checked after every
//! invocation. Higher priority runs first; listeners attached at the same
//! priority run in attachment order. A listener can end the loop early by
//! stopping propagation, and [`EventManager::trigger_until`] ends it when a
//! returned value satisfies a predicate.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::error::BoxError;
use crate::event::AppEvent;
use crate::response::Response;

/// What a listener hands back to the trigger loop.
///
/// `Ok(Some(response))` proposes a result for the cycle, `Ok(None)` is a
/// pure observation, and `Err` aborts the loop and routes the failure into
/// the controller's error branch.
pub type ListenerResult = Result<Option<Response>, BoxError>;

type Listener = Arc<dyn Fn(&mut AppEvent) -> ListenerResult + Send + Sync>;

// Attachment order must be total across the per-request manager and the
// shared registry, so the tiebreaker serial is global.
static ATTACH_SEQ: AtomicU64 = AtomicU64::new(0);

#[derive(Clone)]
struct Registered {
    priority: i32,
    seq: u64,
    listener: Listener,
}

impl Registered {
    fn new(
        listener: impl Fn(&mut AppEvent) -> ListenerResult + Send + Sync + 'static,
        priority: i32,
    ) -> Self {
        Self {
            priority,
            seq: ATTACH_SEQ.fetch_add(1, Ordering::Relaxed),
            listener: Arc::new(listener),
        }
    }
}

// ── Triggered ─────────────────────────────────────────────────────────────────

/// Outcome of one trigger loop: the values listeners returned, in execution
/// order, and whether the loop ended early.
#[derive(Default, Debug)]
pub struct Triggered {
    values: Vec<Response>,
    stopped: bool,
}

impl Triggered {
    /// The last value any listener returned. On a short-circuit this is the
    /// stopping listener's value.
    pub fn last(&self) -> Option<&Response> {
        self.values.last()
    }

    /// True when propagation was stopped or a `trigger_until` predicate
    /// matched before the listener list was exhausted.
    pub fn stopped(&self) -> bool {
        self.stopped
    }
}

// ── EventManager ──────────────────────────────────────────────────────────────

/// Per-request event bus.
///
/// Holds its own listeners plus a list of identifiers; when constructed
/// [`with_shared`](EventManager::with_shared), listeners attached to the
/// [`SharedEventManager`] under any of those identifiers run in the same
/// merged priority order.
#[derive(Default)]
pub struct EventManager {
    identifiers: Vec<String>,
    listeners: HashMap<String, Vec<Registered>>,
    shared: Option<Arc<SharedEventManager>>,
}

impl EventManager {
    /// Priority at which a listener runs when it has no ordering opinion.
    ///
    /// The pipeline invocation inside [`MiddlewareController`] is attached
    /// at exactly this priority; attach above it to run before the pipe,
    /// below it to run after. This is a contract, not an implementation
    /// detail.
    ///
    /// [`MiddlewareController`]: crate::MiddlewareController
    pub const DEFAULT_PRIORITY: i32 = 1;

    pub fn new() -> Self {
        Self::default()
    }

    /// A manager that also consults `shared` for listeners keyed on its
    /// identifiers.
    pub fn with_shared(shared: Arc<SharedEventManager>) -> Self {
        Self { shared: Some(shared), ..Self::default() }
    }

    /// Registers identifiers this manager answers to. Duplicates are
    /// ignored.
    pub fn add_identifiers<I>(&mut self, identifiers: I)
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        for identifier in identifiers {
            let identifier = identifier.into();
            if !self.identifiers.contains(&identifier) {
                self.identifiers.push(identifier);
            }
        }
    }

    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }

    /// Attaches a listener to `event` at `priority`.
    pub fn attach(
        &mut self,
        event: &str,
        listener: impl Fn(&mut AppEvent) -> ListenerResult + Send + Sync + 'static,
        priority: i32,
    ) {
        self.listeners
            .entry(event.to_owned())
            .or_default()
            .push(Registered::new(listener, priority));
    }

    /// Runs every listener for the event's current name unless one stops
    /// propagation. A listener error aborts the loop and is returned as-is.
    pub fn trigger(&self, event: &mut AppEvent) -> Result<Triggered, BoxError> {
        self.trigger_until(event, |_| false)
    }

    /// Like [`trigger`](EventManager::trigger), but also ends the loop as
    /// soon as a listener returns a value satisfying `until`.
    pub fn trigger_until(
        &self,
        event: &mut AppEvent,
        until: impl Fn(&Response) -> bool,
    ) -> Result<Triggered, BoxError> {
        let mut ordered: Vec<Registered> = self
            .listeners
            .get(event.name())
            .map(|own| own.to_vec())
            .unwrap_or_default();
        if let Some(shared) = &self.shared {
            for identifier in &self.identifiers {
                ordered.extend(shared.listeners_for(identifier, event.name()));
            }
        }
        // Stable on the global serial, so equal priorities keep attachment
        // order even across the shared registry.
        ordered.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.seq.cmp(&b.seq)));

        event.stop_propagation(false);
        let mut triggered = Triggered::default();
        for entry in ordered {
            let value = (entry.listener)(event)?;
            let matched = value.as_ref().is_some_and(|v| until(v));
            if let Some(value) = value {
                triggered.values.push(value);
            }
            if matched || event.propagation_stopped() {
                triggered.stopped = true;
                break;
            }
        }
        Ok(triggered)
    }
}

// ── SharedEventManager ────────────────────────────────────────────────────────

/// Process-wide listener registry, keyed by `(identifier, event name)`.
///
/// Listeners land on whichever per-request [`EventManager`] registers a
/// matching identifier — including identifiers kept only for backward
/// compatibility, so code written against an old identifier keeps firing.
#[derive(Default)]
pub struct SharedEventManager {
    listeners: RwLock<HashMap<(String, String), Vec<Registered>>>,
}

impl SharedEventManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a listener for `event` on any manager identified by
    /// `identifier`.
    pub fn attach(
        &self,
        identifier: &str,
        event: &str,
        listener: impl Fn(&mut AppEvent) -> ListenerResult + Send + Sync + 'static,
        priority: i32,
    ) {
        let mut listeners = self.listeners.write().unwrap_or_else(|e| e.into_inner());
        listeners
            .entry((identifier.to_owned(), event.to_owned()))
            .or_default()
            .push(Registered::new(listener, priority));
    }

    fn listeners_for(&self, identifier: &str, event: &str) -> Vec<Registered> {
        let listeners = self.listeners.read().unwrap_or_else(|e| e.into_inner());
        listeners
            .get(&(identifier.to_owned(), event.to_owned()))
            .map(|entries| entries.to_vec())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    fn observing(
        log: Arc<Mutex<Vec<&'static str>>>,
        tag: &'static str,
    ) -> impl Fn(&mut AppEvent) -> ListenerResult + Send + Sync + 'static {
        move |_: &mut AppEvent| {
            log.lock().unwrap().push(tag);
            Ok(None)
        }
    }

    fn dispatch_event() -> AppEvent {
        let mut event = AppEvent::new();
        event.set_name(AppEvent::DISPATCH);
        event
    }

    #[test]
    fn listeners_run_highest_priority_first() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut events = EventManager::new();
        events.attach(AppEvent::DISPATCH, observing(log.clone(), "late"), -10);
        events.attach(AppEvent::DISPATCH, observing(log.clone(), "early"), 100);
        events.attach(AppEvent::DISPATCH, observing(log.clone(), "default"), EventManager::DEFAULT_PRIORITY);

        events.trigger(&mut dispatch_event()).unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["early", "default", "late"]);
    }

    #[test]
    fn same_priority_keeps_attachment_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut events = EventManager::new();
        events.attach(AppEvent::DISPATCH, observing(log.clone(), "first"), 5);
        events.attach(AppEvent::DISPATCH, observing(log.clone(), "second"), 5);
        events.attach(AppEvent::DISPATCH, observing(log.clone(), "third"), 5);

        events.trigger(&mut dispatch_event()).unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn stop_propagation_skips_remaining_listeners() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut events = EventManager::new();
        events.attach(
            AppEvent::DISPATCH,
            |event| {
                event.stop_propagation(true);
                Ok(Some(Response::text("stopped here")))
            },
            10,
        );
        events.attach(AppEvent::DISPATCH, observing(log.clone(), "unreachable"), 1);

        let triggered = events.trigger(&mut dispatch_event()).unwrap();

        assert!(triggered.stopped());
        assert_eq!(triggered.last().unwrap().body(), b"stopped here");
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn trigger_until_stops_on_matching_value() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut events = EventManager::new();
        events.attach(AppEvent::DISPATCH, |_| Ok(Some(Response::text("hit"))), 10);
        events.attach(AppEvent::DISPATCH, observing(log.clone(), "unreachable"), 1);

        let triggered = events
            .trigger_until(&mut dispatch_event(), |_| true)
            .unwrap();

        assert!(triggered.stopped());
        assert_eq!(triggered.last().unwrap().body(), b"hit");
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn listener_error_aborts_the_loop() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut events = EventManager::new();
        events.attach(AppEvent::DISPATCH, |_| Err("boom".into()), 10);
        events.attach(AppEvent::DISPATCH, observing(log.clone(), "unreachable"), 1);

        let error = events.trigger(&mut dispatch_event()).unwrap_err();

        assert_eq!(error.to_string(), "boom");
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn shared_listeners_fire_for_registered_identifiers_only() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let shared = Arc::new(SharedEventManager::new());
        shared.attach("alpha", AppEvent::DISPATCH, observing(log.clone(), "alpha"), 1);
        shared.attach("beta", AppEvent::DISPATCH, observing(log.clone(), "beta"), 1);

        let mut events = EventManager::with_shared(Arc::clone(&shared));
        events.add_identifiers(["alpha"]);
        events.trigger(&mut dispatch_event()).unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["alpha"]);
    }

    #[test]
    fn shared_and_own_listeners_share_one_priority_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let shared = Arc::new(SharedEventManager::new());
        let mut events = EventManager::with_shared(Arc::clone(&shared));
        events.add_identifiers(["alpha"]);

        events.attach(AppEvent::DISPATCH, observing(log.clone(), "own-low"), -5);
        shared.attach("alpha", AppEvent::DISPATCH, observing(log.clone(), "shared-high"), 50);
        events.attach(AppEvent::DISPATCH, observing(log.clone(), "own-high"), 100);

        events.trigger(&mut dispatch_event()).unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["own-high", "shared-high", "own-low"]);
    }
}
