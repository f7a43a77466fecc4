use thiserror::Error;

/// Errors from takvim operations.
///
/// The authoritative-table lookup has no variant here: a missing day row is
/// recovered internally by falling through to the remote service and is
/// never surfaced to callers.
#[derive(Debug, Error)]
pub enum TakvimError {
    /// Transport-level failure (DNS, refusal, timeout).
    #[error("Network request failed: {0}")]
    Network(#[source] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("Service returned status {status}")]
    Response { status: u16 },

    /// The response decoded, but a required field was missing or malformed.
    #[error("Could not parse response: {reason}")]
    Parse { reason: String },

    /// No cached schedule exists for the requested key.
    #[error("No cached schedule for key {key}")]
    CacheMiss { key: String },
}

impl TakvimError {
    /// Creates a `Parse` error.
    pub fn parse(reason: impl Into<String>) -> Self {
        Self::Parse { reason: reason.into() }
    }

    /// Creates a `CacheMiss` error for a cache key.
    pub fn cache_miss(key: impl Into<String>) -> Self {
        Self::CacheMiss { key: key.into() }
    }

    /// True for failures where a stale cached schedule is an acceptable
    /// substitute (every remote failure mode qualifies).
    pub fn is_remote_failure(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Response { .. } | Self::Parse { .. }
        )
    }
}
