//! Observability hooks shared by every policy.
//!
//! Each policy crate defines its own event enum and implements
//! [`PolicyEvent`] for it. Callers register listeners through the `on_*`
//! methods of the policy builders, which push [`FnListener`]s into an
//! [`EventListeners`] collection.

use std::fmt;
use std::marker::PhantomData;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

/// An event emitted by a compiled policy.
pub trait PolicyEvent: Send + Sync + fmt::Debug {
    /// Short, stable identifier of the event kind (e.g. `"Retry"`).
    fn event_type(&self) -> &'static str;

    /// When the event was raised.
    fn timestamp(&self) -> Instant;

    /// Name of the policy instance that raised the event.
    fn policy_name(&self) -> &str;
}

/// Receives policy events.
pub trait EventListener<E: PolicyEvent>: Send + Sync {
    /// Called once per emitted event.
    fn on_event(&self, event: &E);
}

/// Shared handle to a listener.
pub type BoxedEventListener<E> = Arc<dyn EventListener<E>>;

/// Ordered set of listeners for one event type.
#[derive(Clone)]
pub struct EventListeners<E: PolicyEvent> {
    listeners: Vec<BoxedEventListener<E>>,
}

impl<E: PolicyEvent> EventListeners<E> {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    /// Appends a listener.
    pub fn add<L>(&mut self, listener: L)
    where
        L: EventListener<E> + 'static,
    {
        self.listeners.push(Arc::new(listener));
    }

    /// Delivers `event` to every listener in registration order.
    ///
    /// A panicking listener does not stop delivery to the listeners after it.
    pub fn emit(&self, event: &E) {
        for listener in &self.listeners {
            let _ = catch_unwind(AssertUnwindSafe(|| listener.on_event(event)));
        }
    }

    /// Returns true if no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }
}

impl<E: PolicyEvent> Default for EventListeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: PolicyEvent> fmt::Debug for EventListeners<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventListeners")
            .field("len", &self.listeners.len())
            .finish()
    }
}

/// Listener backed by a closure.
pub struct FnListener<E, F>
where
    F: Fn(&E) + Send + Sync,
{
    f: F,
    _event: PhantomData<fn(&E)>,
}

impl<E, F> FnListener<E, F>
where
    F: Fn(&E) + Send + Sync,
{
    /// Wraps `f` as a listener.
    pub fn new(f: F) -> Self {
        Self {
            f,
            _event: PhantomData,
        }
    }
}

impl<E, F> EventListener<E> for FnListener<E, F>
where
    E: PolicyEvent,
    F: Fn(&E) + Send + Sync,
{
    fn on_event(&self, event: &E) {
        (self.f)(event)
    }
}
