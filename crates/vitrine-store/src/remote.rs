//! The compare-and-swap contract the publish pipeline relies on.
//!
//! The backing store offers whole-file reads and writes only: no locks,
//! no transactions. The one concurrency primitive is the conditional
//! write, which succeeds only if the file's current integrity token still
//! equals the one the writer read. [`RemoteStore`] models exactly that,
//! so the pipeline can be exercised against [`crate::MemoryStore`] without
//! a network.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use vitrine_core::{EncodedContent, IntegrityToken};

use crate::error::StoreError;

/// Content and integrity token returned by a versioned read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFileHandle {
    pub content: EncodedContent,
    pub integrity_token: IntegrityToken,
}

/// Result of an authenticated access probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessGrant {
    /// Whether the credential may write to the collection.
    pub can_write: bool,
}

/// Repository visibility as reported by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
    Unknown,
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Public => "public",
            Self::Private => "private",
            Self::Unknown => "unknown",
        })
    }
}

/// Operations on a remote store. Each call is one network round trip with
/// no retry; callers decide what to do on failure.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// The public, unauthenticated locator for `path`.
    fn public_url(&self, path: &str) -> String;

    /// Unauthenticated, cache-busted read of the latest committed bytes.
    /// `Ok(None)` when the file does not exist.
    async fn read_public(&self, path: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Authenticated read returning content and its integrity token.
    /// `Ok(None)` when the file does not exist.
    async fn read_versioned(&self, path: &str) -> Result<Option<RemoteFileHandle>, StoreError>;

    /// Create (`expected = None`) or update (`expected = Some`) a file.
    ///
    /// Fails with [`StoreError::Conflict`] without writing anything when the
    /// file's token differs from `expected`, or when creating a file that
    /// already exists. Returns the new integrity token on success.
    async fn conditional_write(
        &self,
        path: &str,
        content: &EncodedContent,
        message: &str,
        expected: Option<&IntegrityToken>,
    ) -> Result<IntegrityToken, StoreError>;

    /// Lightweight authenticated probe of collection metadata.
    async fn check_access(&self) -> Result<AccessGrant, StoreError>;

    /// Collection visibility.
    async fn visibility(&self) -> Result<Visibility, StoreError>;

    /// Access grant and visibility together. Fails only when the grant
    /// cannot be read; a visibility failure is returned alongside the
    /// grant. Stores that learn both from one response override this.
    async fn inspect_access(
        &self,
    ) -> Result<(AccessGrant, Result<Visibility, StoreError>), StoreError> {
        let grant = self.check_access().await?;
        Ok((grant, self.visibility().await))
    }
}

/// Which [`RemoteStore`] operation a call is. Used for failure injection
/// and in log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    ReadPublic,
    ReadVersioned,
    Write,
    CheckAccess,
    Visibility,
}
