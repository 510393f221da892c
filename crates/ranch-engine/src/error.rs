//! Error types for the engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps every failure
//! mode during startup, the activity loop, and shutdown.

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ranch_core::ConfigError,
    },

    /// The simulation refused an operation.
    #[error("session error: {source}")]
    Session {
        /// The underlying session error.
        #[from]
        source: ranch_core::SessionError,
    },

    /// Saving or loading the farm failed.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: ranch_store::StoreError,
    },

    /// Reading commands or writing output failed.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The cloud sync client could not be built.
    #[error("sync error: {message}")]
    Sync {
        /// Description of the failure.
        message: String,
    },
}
