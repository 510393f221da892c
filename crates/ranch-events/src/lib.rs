//! In-process event transport for the ranch simulation.
//!
//! Every state change the simulation makes is published as a
//! [`SimEvent`] on an [`EventBus`] owned by the running session. Consumers
//! (logging, autosave triggers, UIs) subscribe by [`EventKind`].
//!
//! # Modules
//!
//! - [`event`] -- The event catalog
//! - [`bus`] -- Synchronous publish/subscribe with error containment

pub mod bus;
pub mod event;

pub use bus::{
    DEFAULT_MAX_CASCADE, DispatchFailure, DispatchReport, EventBus, Handler, HandlerError, Outbox,
    SubscriptionId,
};
pub use event::{EventKind, SimEvent};
