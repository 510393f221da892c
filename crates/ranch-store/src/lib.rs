//! Persistence for the ranch simulation.
//!
//! A farm is saved as one JSON document. Time is not stored separately:
//! the farm's activity counter is written and the calendar is derived from
//! it again on load.
//!
//! # Architecture
//!
//! ```text
//! SaveManager::save
//!     |
//!     +-- temp file, fsync --------------> rename over ranch_save.json
//!     |       (old primary copied to ranch_save_backup.json first)
//!     |
//!     +-- CloudSync::push (fire-and-forget)
//!
//! SaveManager::load
//!     primary -> backup -> fresh farm
//!         |
//!         +-- migrate::migrate (v1 -> ... -> current)
//! ```
//!
//! # Modules
//!
//! - [`save`] -- [`SaveManager`], file rotation, and load fallback
//! - [`migrate`] -- Schema versions and the ordered migration chain
//! - [`sync`] -- The cloud sync collaborator trait
//! - [`error`] -- Shared error types

pub mod error;
pub mod migrate;
pub mod save;
pub mod sync;

pub use error::{MigrationError, StoreError, SyncError};
pub use migrate::CURRENT_SCHEMA_VERSION;
pub use save::{LoadOutcome, SaveInfo, SaveManager, SaveReceipt, SaveSource};
pub use sync::{CloudSync, NoopSync};
