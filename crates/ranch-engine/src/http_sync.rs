//! HTTP cloud sync.
//!
//! [`HttpSync`] implements [`CloudSync`] by `POST`ing each committed save
//! document to a configured endpoint. The request runs on the Tokio
//! runtime as a background task; the simulation never waits for it, and a
//! failed push is logged and forgotten. At shutdown the binary gives the
//! outstanding tasks a bounded grace period through [`InFlight::settle`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use ranch_core::config::SyncConfig;
use ranch_store::{CloudSync, SyncError};
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::EngineError;

/// Push tasks that have been spawned but not yet awaited.
#[derive(Debug, Clone, Default)]
pub struct InFlight(Arc<Mutex<Vec<JoinHandle<()>>>>);

impl InFlight {
    fn lock(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn track(&self, task: JoinHandle<()>) {
        let mut tasks = self.lock();
        tasks.retain(|task| !task.is_finished());
        tasks.push(task);
    }

    /// Wait up to `limit` for every outstanding push. Returns how many were
    /// still running when the limit ran out; those are abandoned.
    pub async fn settle(&self, limit: Duration) -> usize {
        let tasks = std::mem::take(&mut *self.lock());
        let mut waiting = tasks.len();
        let drained = tokio::time::timeout(limit, async {
            for task in tasks {
                if let Err(e) = task.await {
                    warn!(error = %e, "Cloud sync task did not complete");
                }
                waiting = waiting.saturating_sub(1);
            }
        })
        .await;
        if drained.is_err() {
            warn!(abandoned = waiting, "Cloud sync still pending at shutdown, giving up");
        }
        waiting
    }
}

/// Pushes saves to an HTTP endpoint without blocking the caller.
#[derive(Debug, Clone)]
pub struct HttpSync {
    client: reqwest::Client,
    endpoint: String,
    in_flight: InFlight,
}

impl HttpSync {
    /// Build a client with the configured request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Sync`] if the HTTP client cannot be built.
    pub fn new(config: &SyncConfig) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| EngineError::Sync {
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            in_flight: InFlight::default(),
        })
    }

    /// A handle on this sync's outstanding pushes, kept by the binary after
    /// the sync itself is handed to the save manager.
    pub fn in_flight(&self) -> InFlight {
        self.in_flight.clone()
    }
}

impl CloudSync for HttpSync {
    fn push(&self, document: &Value) -> Result<(), SyncError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| SyncError::Unavailable {
            reason: format!("no async runtime: {e}"),
        })?;
        // The body is encoded here, so the task owns everything it needs.
        let request = self.client.post(&self.endpoint).json(document);
        let endpoint = self.endpoint.clone();

        let task = runtime.spawn(async move {
            match send(request).await {
                Ok(()) => debug!(endpoint = %endpoint, "Cloud sync push delivered"),
                Err(e) => warn!(endpoint = %endpoint, error = %e, "Cloud sync push failed"),
            }
        });
        self.in_flight.track(task);
        Ok(())
    }
}

async fn send(request: reqwest::RequestBuilder) -> Result<(), SyncError> {
    let response = request.send().await.map_err(|e| SyncError::Transport {
        reason: e.to_string(),
    })?;
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(SyncError::Rejected {
            status: status.as_u16(),
        })
    }
}
