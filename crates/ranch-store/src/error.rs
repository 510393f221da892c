//! Error types for the persistence layer.
//!
//! A damaged save file is not an error at this level: [`SaveManager::load`]
//! falls back to the backup and then to a fresh farm. What surfaces as
//! [`StoreError`] is the stuff a caller must act on: failed writes and saves
//! that cannot be migrated.
//!
//! [`SaveManager::load`]: crate::save::SaveManager::load

use std::path::{Path, PathBuf};

/// Errors that can occur while saving or loading a farm.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A filesystem operation failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// The file or directory involved.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },

    /// A serialization or deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The file parsed as JSON but is not a save document.
    #[error("Corrupt save {path}: {reason}")]
    Corrupt {
        /// The offending file.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },

    /// The save could not be brought up to the current schema.
    #[error("Migration error: {0}")]
    Migration(#[from] MigrationError),
}

impl StoreError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Errors raised by the schema migration chain. Always fatal for a load.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MigrationError {
    /// The file was written by a newer build.
    #[error("save schema version {found} is newer than supported version {supported}")]
    FutureVersion {
        /// Version found in the file.
        found: u64,
        /// Highest version this build understands.
        supported: u64,
    },

    /// A migration step could not interpret its input.
    #[error("cannot migrate version {version} save: {reason}")]
    Malformed {
        /// Version the failing step was reading.
        version: u64,
        /// What the step tripped over.
        reason: String,
    },
}

/// Errors reported by a [`CloudSync`] collaborator.
///
/// [`CloudSync`]: crate::sync::CloudSync
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    /// The collaborator cannot send right now (no runtime, disabled, ...).
    #[error("sync unavailable: {reason}")]
    Unavailable {
        /// Why.
        reason: String,
    },

    /// The request never got a response.
    #[error("sync transport failed: {reason}")]
    Transport {
        /// Transport-level detail.
        reason: String,
    },

    /// The remote answered with a non-success status.
    #[error("sync rejected with status {status}")]
    Rejected {
        /// HTTP status code.
        status: u16,
    },
}
