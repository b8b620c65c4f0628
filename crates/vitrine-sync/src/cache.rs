//! Process-local catalog cache for display.
//!
//! Refreshed from the public, unauthenticated read path. A failed refresh
//! keeps the previous contents: stale entries are better than an empty
//! gallery. The cache is never consulted when writing; the publisher
//! always re-reads the manifest with its integrity token.

use parking_lot::RwLock;
use vitrine_core::{manifest, ArtifactRecord, Timestamp};
use vitrine_store::RemoteStore;

#[derive(Debug, Default)]
struct CacheState {
    records: Vec<ArtifactRecord>,
    refreshed_at: Option<Timestamp>,
    /// Bumped on every replacement. A refresh only applies what it read if
    /// nothing replaced the contents while its read was in flight.
    generation: u64,
}

#[derive(Debug)]
pub struct CatalogCache {
    manifest_path: String,
    state: RwLock<CacheState>,
}

impl CatalogCache {
    pub fn new(manifest_path: impl Into<String>) -> Self {
        Self {
            manifest_path: manifest_path.into(),
            state: RwLock::new(CacheState::default()),
        }
    }

    /// Re-read the manifest and return the resulting contents.
    ///
    /// A missing manifest, a network failure, or malformed JSON leaves the
    /// cache unchanged and returns the previous contents. So does a read
    /// that completes after a [`replace`](Self::replace) made during it:
    /// the public path may still serve the older manifest.
    pub async fn refresh<S: RemoteStore + ?Sized>(&self, store: &S) -> Vec<ArtifactRecord> {
        let started_at = self.state.read().generation;
        match store.read_public(&self.manifest_path).await {
            Ok(Some(bytes)) => match manifest::decode_json(&bytes) {
                Ok(records) => {
                    let mut state = self.state.write();
                    if state.generation != started_at {
                        tracing::debug!(path = %self.manifest_path, "catalog replaced during refresh; discarding read");
                        return state.records.clone();
                    }
                    tracing::debug!(records = records.len(), "catalog cache refreshed");
                    Self::install(&mut state, records.clone());
                    records
                }
                Err(e) => {
                    tracing::warn!(path = %self.manifest_path, error = %e, "manifest unreadable; keeping cached catalog");
                    self.snapshot()
                }
            },
            Ok(None) => {
                tracing::warn!(path = %self.manifest_path, "manifest not found; keeping cached catalog");
                self.snapshot()
            }
            Err(e) => {
                tracing::warn!(path = %self.manifest_path, error = %e, "catalog refresh failed; keeping cached catalog");
                self.snapshot()
            }
        }
    }

    /// Overwrite the contents with a known-committed manifest.
    pub fn replace(&self, records: Vec<ArtifactRecord>) {
        Self::install(&mut self.state.write(), records);
    }

    fn install(state: &mut CacheState, records: Vec<ArtifactRecord>) {
        state.records = records;
        state.refreshed_at = Some(Timestamp::now());
        state.generation += 1;
    }

    pub fn snapshot(&self) -> Vec<ArtifactRecord> {
        self.state.read().records.clone()
    }

    /// When the contents were last replaced, if ever.
    pub fn refreshed_at(&self) -> Option<Timestamp> {
        self.state.read().refreshed_at
    }

    pub fn len(&self) -> usize {
        self.state.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().records.is_empty()
    }
}
