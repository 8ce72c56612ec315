//! Observer lists with per-subscriber failure isolation.
//!
//! An [`Event`] keeps its handlers in registration order. Raising an event
//! iterates over a snapshot of the list, and every handler runs inside its
//! own failure boundary: an `Err` return or a panic is logged and the
//! remaining handlers still run. Nothing a subscriber does can reach the
//! code that raised the event.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Return type of event handlers.
pub type HandlerResult = anyhow::Result<()>;

/// A shareable event handler.
pub type EventHandler<A> = Arc<dyn Fn(&A) -> HandlerResult + Send + Sync>;

/// Identifies a subscription so it can be removed later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// An ordered list of handlers for one kind of notification.
pub struct Event<A> {
    name: &'static str,
    next_id: u64,
    handlers: Vec<(SubscriptionId, EventHandler<A>)>,
}

impl<A> Event<A> {
    /// Creates an event with no subscribers.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            next_id: 0,
            handlers: Vec::new(),
        }
    }

    /// Returns the event name used in diagnostics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Appends a handler.
    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: Fn(&A) -> HandlerResult + Send + Sync + 'static,
    {
        self.subscribe_shared(Arc::new(handler))
    }

    /// Appends an already shared handler.
    pub fn subscribe_shared(&mut self, handler: EventHandler<A>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.handlers.push((id, handler));
        id
    }

    /// Removes a handler. Returns false if it was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(existing, _)| *existing != id);
        self.handlers.len() != before
    }

    /// Number of subscribed handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true if nobody is subscribed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Invokes every handler in registration order.
    ///
    /// Returns the number of handlers that failed.
    pub fn raise(&self, args: &A) -> usize {
        let snapshot: Vec<EventHandler<A>> = self
            .handlers
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();

        let mut failures = 0;
        for (position, handler) in snapshot.iter().enumerate() {
            match panic::catch_unwind(AssertUnwindSafe(|| handler(args))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    failures += 1;
                    tracing::warn!(event = self.name, position, error = %e, "Event subscriber failed");
                }
                Err(_) => {
                    failures += 1;
                    tracing::warn!(event = self.name, position, "Event subscriber panicked");
                }
            }
        }
        failures
    }
}

impl<A> fmt::Debug for Event<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("name", &self.name)
            .field("subscribers", &self.handlers.len())
            .finish()
    }
}
