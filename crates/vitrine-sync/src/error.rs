//! # Error Types
//!
//! [`PublishError`] is the only error a curator ever sees from a publish
//! attempt. Every variant maps to a one-line status via
//! [`PublishError::status`]; there are no silent failures.

use std::path::PathBuf;

use thiserror::Error;
use vitrine_core::{CodecError, ValidationError};
use vitrine_store::{ConfigError, StoreError};

/// The stage of a publish attempt, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PublishStage {
    UploadBinary,
    FetchManifest,
    Merge,
    CommitManifest,
}

impl std::fmt::Display for PublishStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::UploadBinary => "image upload",
            Self::FetchManifest => "manifest fetch",
            Self::Merge => "manifest merge",
            Self::CommitManifest => "manifest commit",
        })
    }
}

/// Failure of one publish attempt. Remaining stages were not run; an
/// already-uploaded binary is left in place.
#[derive(Error, Debug)]
pub enum PublishError {
    /// The artifact can never be published (empty content, unusable name).
    #[error("invalid artifact: {0}")]
    InvalidArtifact(#[from] ValidationError),

    /// A store call failed.
    #[error("{stage} failed: {source}")]
    Store {
        stage: PublishStage,
        source: StoreError,
    },

    /// The manifest exists but cannot be decoded, and the publisher is
    /// configured to stop rather than replace it.
    #[error("manifest {path} is unreadable: {source}")]
    CorruptManifest { path: String, source: CodecError },

    /// The merged manifest could not be serialized.
    #[error("failed to encode manifest: {0}")]
    Encode(#[source] CodecError),

    /// The commit task panicked or the runtime shut down under it. The
    /// commit may or may not have reached the store.
    #[error("manifest commit did not complete: {0}")]
    CommitTask(#[from] tokio::task::JoinError),
}

impl PublishError {
    pub(crate) fn store(stage: PublishStage, source: StoreError) -> Self {
        Self::Store { stage, source }
    }

    /// The stage the attempt stopped in, if it got past validation.
    pub fn stage(&self) -> Option<PublishStage> {
        match self {
            Self::InvalidArtifact(_) => None,
            Self::Store { stage, .. } => Some(*stage),
            Self::CorruptManifest { .. } => Some(PublishStage::FetchManifest),
            Self::Encode(_) => Some(PublishStage::Merge),
            Self::CommitTask(_) => Some(PublishStage::CommitManifest),
        }
    }

    /// Whether the store refused a stale manifest write.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Store { source, .. } if source.is_conflict())
    }

    /// A short status line for the curator.
    pub fn status(&self) -> String {
        match self {
            Self::InvalidArtifact(e) => format!("Publish failed: {e}."),
            Self::Store { stage, source } => store_status(*stage, source),
            Self::CorruptManifest { path, .. } => format!(
                "Publish stopped: {path} is unreadable. Repair it in the repository or allow replacing it."
            ),
            Self::Encode(e) => format!("Publish failed: {e}."),
            Self::CommitTask(_) => {
                "Publish result unknown: the manifest commit was interrupted. Reload the gallery to check."
                    .to_string()
            }
        }
    }
}

fn store_status(stage: PublishStage, source: &StoreError) -> String {
    let orphan_note = if stage > PublishStage::UploadBinary {
        " The image was uploaded but is not listed."
    } else {
        ""
    };
    match source {
        StoreError::Auth { message, .. } => {
            format!("Publish failed: the store rejected the credential ({message}).")
        }
        StoreError::Conflict { .. } => {
            "Publish failed: the gallery changed since it was read. Reload and try again."
                .to_string()
        }
        StoreError::Timeout { .. } | StoreError::Network { .. } => {
            format!("Publish failed during {stage}: the store could not be reached.{orphan_note} Try again.")
        }
        StoreError::Api { status, .. } => {
            format!("Publish failed during {stage}: the store returned {status}.{orphan_note}")
        }
        other => format!("Publish failed during {stage}: {other}.{orphan_note}"),
    }
}

/// Failure of the metadata describer. Never fatal: the curator's manual
/// entries are used instead.
#[derive(Error, Debug)]
pub enum DescribeError {
    #[error("HTTP error calling describer: {0}")]
    Http(String),
    #[error("describer request timed out")]
    Timeout,
    #[error("describer returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("failed to deserialize describer response: {0}")]
    Deserialization(String),
    #[error("describer configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for DescribeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::Deserialization(e.to_string())
        } else {
            Self::Http(e.to_string())
        }
    }
}

/// Failure to load or save the local connection record.
#[derive(Error, Debug)]
pub enum ConfigStoreError {
    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{path} is not a valid connection record: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("stored connection is invalid: {0}")]
    Invalid(#[from] ConfigError),
    #[error("no config location: set VITRINE_CONFIG or HOME")]
    NoLocation,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn network() -> StoreError {
        StoreError::Network {
            endpoint: "PUT /contents/gallery.json".into(),
            message: "connection reset".into(),
        }
    }

    #[test]
    fn conflict_status_asks_user_to_retry() {
        let err = PublishError::store(
            PublishStage::CommitManifest,
            StoreError::Conflict {
                path: "gallery.json".into(),
            },
        );
        assert!(err.is_conflict());
        assert_eq!(err.stage(), Some(PublishStage::CommitManifest));
        assert!(err.status().contains("changed since it was read"));
    }

    #[test]
    fn auth_message_is_surfaced_verbatim() {
        let err = PublishError::store(
            PublishStage::UploadBinary,
            StoreError::Auth {
                endpoint: "PUT".into(),
                message: "401: Bad credentials".into(),
            },
        );
        assert!(err.status().contains("401: Bad credentials"));
    }

    #[test]
    fn network_failure_after_upload_mentions_orphan() {
        let upload = PublishError::store(PublishStage::UploadBinary, network());
        let commit = PublishError::store(PublishStage::CommitManifest, network());
        assert!(!upload.status().contains("not listed"));
        assert!(commit.status().contains("not listed"));
        assert!(commit.status().contains("manifest commit"));
    }

    #[test]
    fn stages_are_ordered() {
        assert!(PublishStage::UploadBinary < PublishStage::FetchManifest);
        assert!(PublishStage::Merge < PublishStage::CommitManifest);
    }
}
