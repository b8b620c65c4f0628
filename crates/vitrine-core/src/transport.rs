//! # Transport Encoding
//!
//! The store's write API accepts file content only as base64 text, and its
//! read API returns base64 wrapped at 60 columns. [`EncodedContent`] is the
//! one type that crosses that boundary.
//!
//! Encoding always operates on bytes. Text is converted to UTF-8 first and
//! the bytes are encoded, so multi-byte scripts and emoji are preserved
//! exactly. Encoding characters one at a time would corrupt anything
//! outside Latin-1.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::error::TransportError;

/// Base64 text as sent to or received from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedContent(String);

impl EncodedContent {
    /// Encode raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(STANDARD.encode(bytes))
    }

    /// Wrap base64 text received from the store without validating it.
    /// Validation happens in [`EncodedContent::decode`].
    pub fn from_wire(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Decode to raw bytes, ignoring any ASCII whitespace the store
    /// inserted (line wrapping, trailing newline).
    pub fn decode(&self) -> Result<Vec<u8>, TransportError> {
        let compact: String = self
            .0
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        Ok(STANDARD.decode(compact)?)
    }

    /// The base64 text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length of the base64 text in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the encoded text is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The store's content hash for a file at one point in time.
///
/// Supplied as the precondition of a conditional write: if the file has
/// changed since this token was read, the write is refused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntegrityToken(String);

impl IntegrityToken {
    /// Wrap a token returned by the store.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Access the token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for IntegrityToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
