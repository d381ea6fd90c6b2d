//! Error types for the fleetledger library.

/// All errors that can occur while reconciling, storing, or allocating
/// ledger records.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// HTTP transport error (connection, TLS, body read).
    #[cfg(feature = "remote")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote service answered with a non-success status.
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body or a short description.
        message: String,
    },

    /// The remote request did not complete before its deadline.
    #[error("remote request for {entity} exceeded its deadline")]
    Timeout {
        /// Entity collection that was being fetched.
        entity: String,
    },

    /// The configured base URL could not be combined with an endpoint path.
    #[cfg(feature = "remote")]
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Storage backend failed.
    #[error("storage error: {0}")]
    Storage(Box<dyn core::error::Error + Send + Sync>),

    /// A record failed validation; nothing was changed.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A referenced record does not exist.
    #[error("{kind} not found: {key}")]
    NotFound {
        /// Record kind (e.g. "invoice").
        kind: &'static str,
        /// Natural key that was looked up.
        key: String,
    },
}

impl LedgerError {
    /// Returns `true` for failures that block the triggering action
    /// (validation), as opposed to recoverable transport/parse failures.
    #[inline]
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, LedgerError>;
