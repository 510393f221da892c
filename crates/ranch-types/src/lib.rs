//! Shared type definitions for the ranch simulation.
//!
//! This crate is the single source of truth for the plain data that flows
//! between the simulation engine, the event bus, and the save store. It
//! holds no simulation behavior beyond the invariants of the data itself.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for animals, buildings, decorations
//! - [`enums`] -- Species, life stages, seasons, goods, quality tiers
//! - [`inventory`] -- Inventory map and its canonical composite key
//! - [`structs`] -- The [`Farm`] aggregate and the entities it owns
//! - [`time`] -- Derived calendar value [`FarmTime`]

pub mod enums;
pub mod ids;
pub mod inventory;
pub mod structs;
pub mod time;

// Re-export all public types at crate root for convenience.
pub use enums::{
    BuildingKind, DecorationKind, Direction, FeedType, GoodsType, LifeStage, ParseEnumError,
    Quality, Season, Species, TimeOfDay,
};
pub use ids::{AnimalId, BuildingId, DecorationId};
pub use inventory::{Inventory, InventoryKey, InventoryKeyError};
pub use structs::{Animal, Building, Decoration, Farm, GridPosition, Statistics};
pub use time::FarmTime;
