//! Remote store error types.

use vitrine_core::TransportError;

use crate::config::ConfigError;

/// Errors from remote store calls.
///
/// There is no not-found variant. Reads report absence as `Ok(None)`: a
/// missing manifest means "first publish", not failure.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Missing, invalid, or under-privileged credential.
    #[error("authentication failed for {endpoint}: {message}")]
    Auth { endpoint: String, message: String },
    /// The supplied integrity token no longer matches the file (or the file
    /// appeared since it was read as absent). Nothing was written.
    #[error("{path} changed since it was read; write refused")]
    Conflict { path: String },
    /// Transport failure (DNS, connection reset, TLS).
    #[error("network error calling {endpoint}: {message}")]
    Network { endpoint: String, message: String },
    /// The request exceeded the configured timeout.
    #[error("request to {endpoint} timed out")]
    Timeout { endpoint: String },
    /// The store returned a non-2xx status with no more specific meaning.
    #[error("store {endpoint} returned {status}: {body}")]
    Api {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// Response body did not have the expected shape.
    #[error("failed to deserialize response from {endpoint}: {message}")]
    Deserialization { endpoint: String, message: String },
    /// Content returned by the store was not valid base64.
    #[error("store returned undecodable content: {0}")]
    Encoding(#[from] TransportError),
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl StoreError {
    pub(crate) fn transport(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        let endpoint = endpoint.into();
        if source.is_timeout() {
            Self::Timeout { endpoint }
        } else {
            Self::Network {
                endpoint,
                message: source.to_string(),
            }
        }
    }

    /// Whether this is an optimistic-concurrency rejection.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Whether the same call could succeed if the user simply tries again.
    /// Nothing in Vitrine retries automatically; this drives the wording of
    /// user-facing status lines.
    pub fn is_retryable_by_user(&self) -> bool {
        matches!(
            self,
            Self::Conflict { .. } | Self::Network { .. } | Self::Timeout { .. }
        )
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }
}
