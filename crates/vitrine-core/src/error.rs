//! # Error Types
//!
//! Structured errors for the pure (no I/O) parts of Vitrine. All errors use
//! `thiserror`; none of them are fatal to the process on their own. The
//! publish pipeline in `vitrine-sync` decides which are recoverable.

use thiserror::Error;

/// Failure to decode a transport-encoded (base64) blob.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The blob contained characters outside the base64 alphabet or had
    /// invalid padding once whitespace was stripped.
    #[error("invalid transport encoding: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
}

/// Failure to convert between manifest bytes and artifact records.
///
/// A `CodecError` always means "the manifest exists but is unreadable".
/// Absence of a manifest is reported by the store, not by the codec.
#[derive(Error, Debug)]
pub enum CodecError {
    /// The transport layer could not be decoded.
    #[error("manifest transport decoding failed: {0}")]
    Transport(#[from] TransportError),

    /// The decoded bytes are not a JSON array of artifact records.
    #[error("manifest JSON is malformed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure to derive a store path for an upload.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PathError {
    /// Sanitization removed every character of the file name.
    #[error("file name \"{0}\" contains no characters from [A-Za-z0-9.-]")]
    EmptyFileName(String),

    /// The sanitized name is a relative path component (`.` or `..`).
    #[error("file name \"{0}\" sanitizes to a reserved path component")]
    Reserved(String),
}

/// Validation failures for inputs to a publish attempt.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// Artifact identifiers must be non-empty.
    #[error("artifact id must be non-empty")]
    EmptyArtifactId,

    /// The binary payload of a new artifact is empty.
    #[error("artifact \"{0}\" has no content")]
    EmptyContent(String),

    /// The upload path could not be derived.
    #[error(transparent)]
    Path(#[from] PathError),
}
