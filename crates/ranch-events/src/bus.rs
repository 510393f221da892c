//! Synchronous in-process publish/subscribe.
//!
//! [`EventBus`] is an explicit value owned by one simulation session. There
//! is no process-wide instance, so tests can run any number of independent
//! farms side by side.
//!
//! # Dispatch rules
//!
//! - Delivery is synchronous, on the calling thread, in subscription order.
//! - [`EventBus::publish`] returns only after every matching subscriber has
//!   run, including subscribers of follow-up events.
//! - A handler that returns `Err` is recorded in the [`DispatchReport`] and
//!   logged; the remaining subscribers still run.
//! - Handlers publish follow-ups through the [`Outbox`] they are handed.
//!   Follow-ups are queued and dispatched after the current event, never
//!   nested inside it, so a handler can never observe a half-delivered
//!   event. A cascade longer than the configured limit is cut short.

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::event::{EventKind, SimEvent};

/// Default cap on follow-up events triggered by a single publish.
pub const DEFAULT_MAX_CASCADE: usize = 64;

/// A subscriber reported failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct HandlerError {
    /// What went wrong.
    pub message: String,
}

impl HandlerError {
    /// Wrap a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

/// Follow-up events queued by a handler during dispatch.
#[derive(Debug, Default)]
pub struct Outbox {
    queued: Vec<SimEvent>,
}

impl Outbox {
    /// Queue `event` for delivery once the current event has finished.
    pub fn publish(&mut self, event: SimEvent) {
        self.queued.push(event);
    }
}

/// A subscriber callback.
pub type Handler = Box<dyn FnMut(&SimEvent, &mut Outbox) -> Result<(), HandlerError>>;

struct Subscription {
    id: SubscriptionId,
    /// `None` matches every kind.
    kind: Option<EventKind>,
    handler: Handler,
}

/// One failed delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchFailure {
    /// Which subscriber failed.
    pub subscription: SubscriptionId,
    /// Kind of the event it was handling.
    pub kind: EventKind,
    /// The error it returned.
    pub error: HandlerError,
}

/// Outcome of one [`EventBus::publish`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Events dispatched, the published one included.
    pub events: usize,
    /// Successful handler invocations.
    pub delivered: usize,
    /// Handler invocations that returned `Err`.
    pub failures: Vec<DispatchFailure>,
    /// Follow-ups discarded because the cascade limit was hit.
    pub dropped: usize,
}

impl DispatchReport {
    /// Whether every handler succeeded and nothing was dropped.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.dropped == 0
    }
}

/// The event bus.
pub struct EventBus {
    subscriptions: Vec<Subscription>,
    next_id: u64,
    max_cascade: usize,
    history: VecDeque<SimEvent>,
    history_limit: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriptions", &self.subscriptions.len())
            .field("max_cascade", &self.max_cascade)
            .field("history", &self.history.len())
            .finish_non_exhaustive()
    }
}

impl EventBus {
    /// A bus with no subscribers and no history.
    pub const fn new() -> Self {
        Self {
            subscriptions: Vec::new(),
            next_id: 0,
            max_cascade: DEFAULT_MAX_CASCADE,
            history: VecDeque::new(),
            history_limit: 0,
        }
    }

    /// Keep the last `limit` published events for inspection.
    #[must_use]
    pub fn with_history(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self.history = VecDeque::with_capacity(limit);
        self
    }

    /// Cap the number of follow-up events a single publish may trigger.
    #[must_use]
    pub const fn with_max_cascade(mut self, max_cascade: usize) -> Self {
        self.max_cascade = max_cascade;
        self
    }

    /// Register `handler` for events of `kind`.
    pub fn subscribe<F>(&mut self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: FnMut(&SimEvent, &mut Outbox) -> Result<(), HandlerError> + 'static,
    {
        self.insert(Some(kind), Box::new(handler))
    }

    /// Register `handler` for every event.
    pub fn subscribe_all<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&SimEvent, &mut Outbox) -> Result<(), HandlerError> + 'static,
    {
        self.insert(None, Box::new(handler))
    }

    fn insert(&mut self, kind: Option<EventKind>, handler: Handler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.subscriptions.push(Subscription { id, kind, handler });
        id
    }

    /// Remove a subscription. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|sub| sub.id != id);
        self.subscriptions.len() != before
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Recently published events, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &SimEvent> {
        self.history.iter()
    }

    /// Forget recorded history.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Deliver `event` and any follow-ups it causes.
    pub fn publish(&mut self, event: SimEvent) -> DispatchReport {
        let mut report = DispatchReport::default();
        let mut queue = VecDeque::from([event]);
        let mut follow_ups: usize = 0;

        while let Some(current) = queue.pop_front() {
            let mut outbox = Outbox::default();
            self.dispatch_one(&current, &mut outbox, &mut report);
            self.remember(current);

            for next in outbox.queued {
                if follow_ups >= self.max_cascade {
                    report.dropped = report.dropped.saturating_add(1);
                    continue;
                }
                follow_ups = follow_ups.saturating_add(1);
                queue.push_back(next);
            }
        }

        if report.dropped > 0 {
            warn!(
                dropped = report.dropped,
                max_cascade = self.max_cascade,
                "Event cascade limit reached, follow-up events dropped"
            );
        }
        report
    }

    /// Publish each event in order and merge the reports.
    pub fn publish_all(&mut self, events: impl IntoIterator<Item = SimEvent>) -> DispatchReport {
        let mut merged = DispatchReport::default();
        for event in events {
            let report = self.publish(event);
            merged.events = merged.events.saturating_add(report.events);
            merged.delivered = merged.delivered.saturating_add(report.delivered);
            merged.dropped = merged.dropped.saturating_add(report.dropped);
            merged.failures.extend(report.failures);
        }
        merged
    }

    fn dispatch_one(&mut self, event: &SimEvent, outbox: &mut Outbox, report: &mut DispatchReport) {
        let kind = event.kind();
        report.events = report.events.saturating_add(1);
        debug!(kind = ?kind, "Dispatching event");

        for sub in &mut self.subscriptions {
            if sub.kind.is_some_and(|wanted| wanted != kind) {
                continue;
            }
            match (sub.handler)(event, outbox) {
                Ok(()) => report.delivered = report.delivered.saturating_add(1),
                Err(error) => {
                    warn!(
                        kind = ?kind,
                        subscription = ?sub.id,
                        error = %error,
                        "Event handler failed, continuing dispatch"
                    );
                    report.failures.push(DispatchFailure {
                        subscription: sub.id,
                        kind,
                        error,
                    });
                }
            }
        }
    }

    fn remember(&mut self, event: SimEvent) {
        if self.history_limit == 0 {
            return;
        }
        if self.history.len() >= self.history_limit {
            self.history.pop_front();
        }
        self.history.push_back(event);
    }
}
