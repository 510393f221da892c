//! Cloud sync collaborator.
//!
//! After a save has committed to disk the [`SaveManager`] hands the saved
//! document to a [`CloudSync`]. Pushing is fire-and-forget: an error is
//! logged and never undoes or fails the local save.
//!
//! [`SaveManager`]: crate::save::SaveManager

use serde_json::Value;

use crate::error::SyncError;

/// Receives every committed save document.
pub trait CloudSync: Send + Sync {
    /// Start pushing `document` somewhere off-box.
    ///
    /// Implementations must not block on the network; an `Ok` only means
    /// the push was handed off.
    fn push(&self, document: &Value) -> Result<(), SyncError>;
}

/// A sync that does nothing. The default when sync is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSync;

impl CloudSync for NoopSync {
    fn push(&self, _document: &Value) -> Result<(), SyncError> {
        tracing::debug!("Cloud sync disabled, skipping push");
        Ok(())
    }
}
