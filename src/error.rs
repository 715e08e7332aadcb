//! Unified error type for the completion client.
//!
//! Cache failures never show up here: a missing or corrupt token cache is a
//! miss, not an error. Everything else follows one rule — transient
//! transport problems are retryable, credential problems are fatal, and
//! exhausted generation attempts carry enough detail to tell a dead backend
//! apart from a model that keeps producing garbage.

use thiserror::Error;

/// Result type alias for the library.
pub type Result<T> = std::result::Result<T, Error>;

/// Why the final safe-generate attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptFailure {
    /// The backend call itself failed after exhausting its retries.
    Backend,
    /// The response carried no parseable `{"output": ...}` envelope.
    Parse,
    /// The envelope parsed but the caller's validator rejected the output.
    Rejected,
}

#[derive(Debug, Error)]
pub enum Error {
    /// No long-lived credential was supplied or configured for the token
    /// exchange.
    #[error("no credential available for token exchange")]
    MissingCredential,

    /// The token-exchange endpoint answered with a non-success status.
    #[error("token exchange failed: HTTP {status}")]
    ExchangeFailed { status: u16 },

    /// A response violated the shape the caller depends on.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The selected backend cannot be reached at all (no endpoint, no
    /// resolvable token). Fatal: there is nothing to retry.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Non-success HTTP status from a completion endpoint.
    #[error("remote error: HTTP {status}: {body}")]
    Remote { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Every safe-generate attempt was spent without a validated output.
    #[error("generation failed after {attempts} attempts ({last_failure:?})")]
    ValidationExhausted {
        attempts: u32,
        last_failure: AttemptFailure,
    },
}

impl Error {
    /// Whether the failure is transient enough to be worth retrying.
    ///
    /// The retry wrapper itself re-runs on any failure; this classification
    /// exists for callers and log lines that need to tell a flaky network
    /// from a broken configuration.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transport(_) => true,
            Error::Remote { status, .. } | Error::ExchangeFailed { status } => {
                *status == 429 || *status >= 500
            }
            _ => false,
        }
    }
}
