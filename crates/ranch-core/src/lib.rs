//! Calendar, growth, pricing, and trading for the ranch simulation.
//!
//! This crate turns external activity into farm time and farm time into a
//! living herd. Everything here is deterministic: the same counter and the
//! same farm always yield the same result.
//!
//! # Modules
//!
//! - [`clock`] -- Activity counter to calendar time, with boundary
//!   detection.
//! - [`config`] -- Configuration loading from `ranch-config.yaml` into
//!   strongly-typed structs.
//! - [`economy`] -- Validation-first shop and market operations.
//! - [`growth`] -- Aging, feeding, and production per animal.
//! - [`modifiers`] -- Seasonal production and price multipliers.
//! - [`pricing`] -- Pure price functions in exact decimal arithmetic.
//! - [`session`] -- [`Session`], the driver that ties the rest together.
//!
//! [`Session`]: session::Session

pub mod clock;
pub mod config;
pub mod economy;
pub mod growth;
pub mod modifiers;
pub mod pricing;
pub mod session;

pub use clock::{Advance, Boundary, BoundaryKind, ClockError, TimeSystem};
pub use config::{ConfigError, SimulationConfig};
pub use economy::{Economy, EconomyError, Receipt};
pub use growth::{Elapsed, GrowthSystem};
pub use modifiers::SeasonalModifier;
pub use session::{Session, SessionError, TickSummary};
