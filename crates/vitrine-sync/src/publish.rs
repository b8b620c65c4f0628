//! # Publish Orchestrator
//!
//! One publish attempt is four causally ordered stages:
//!
//! 1. **UploadBinary**: write the image to a fresh, timestamped path.
//! 2. **FetchManifest**: authenticated read of the manifest and its
//!    integrity token (absent manifest = empty list, no token).
//! 3. **Merge**: prepend the new record. This is the whole merge policy.
//! 4. **CommitManifest**: conditional write of the merged manifest against
//!    the token from stage 2.
//!
//! The attempt is durable exactly when stage 4 returns a new token. A
//! stale token surfaces as a conflict and the attempt ends; nothing is
//! re-fetched or retried. The conditional write is the only thing that
//! keeps a concurrent writer's entry from being overwritten.
//!
//! Failures abort the remaining stages. A binary uploaded in stage 1 is
//! not removed when a later stage fails; nothing references it.

use std::sync::Arc;

use tokio::sync::Mutex;
use vitrine_core::{
    manifest, ArtifactId, ArtifactRecord, CatalogLayout, EncodedContent, IntegrityToken,
    NewArtifact, Timestamp,
};
use vitrine_store::RemoteStore;

use crate::cache::CatalogCache;
use crate::error::{PublishError, PublishStage};

/// What to do when the manifest exists but cannot be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ManifestRecovery {
    /// Continue with an empty list. The next successful commit replaces
    /// the unreadable manifest, dropping whatever it held.
    #[default]
    TreatAsEmpty,
    /// Stop the attempt with [`PublishError::CorruptManifest`].
    Abort,
}

/// State carried from FetchManifest to CommitManifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedManifest {
    pub records: Vec<ArtifactRecord>,
    /// `None` when the manifest does not exist yet.
    pub token: Option<IntegrityToken>,
    /// The manifest existed but was unreadable and was replaced by an
    /// empty list.
    pub recovered_from_corruption: bool,
}

impl FetchedManifest {
    fn absent() -> Self {
        Self {
            records: Vec::new(),
            token: None,
            recovered_from_corruption: false,
        }
    }
}

/// Result of a successful publish.
#[derive(Debug, Clone)]
pub struct PublishReceipt {
    pub record: ArtifactRecord,
    pub binary_path: String,
    pub manifest_token: IntegrityToken,
    pub manifest_len: usize,
    pub recovered_from_corruption: bool,
}

/// Runs publish attempts against one store.
///
/// Attempts on the same `Publisher` are serialized: a second call waits
/// for the first to finish, so two local attempts never race each other
/// on the manifest token.
pub struct Publisher<S> {
    store: Arc<S>,
    layout: CatalogLayout,
    recovery: ManifestRecovery,
    cache: Option<Arc<CatalogCache>>,
    in_flight: Mutex<()>,
}

impl<S> std::fmt::Debug for Publisher<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher")
            .field("layout", &self.layout)
            .field("recovery", &self.recovery)
            .field("cache", &self.cache.is_some())
            .finish()
    }
}

impl<S: RemoteStore + 'static> Publisher<S> {
    pub fn new(store: Arc<S>, layout: CatalogLayout) -> Self {
        Self {
            store,
            layout,
            recovery: ManifestRecovery::default(),
            cache: None,
            in_flight: Mutex::new(()),
        }
    }

    pub fn with_recovery(mut self, recovery: ManifestRecovery) -> Self {
        self.recovery = recovery;
        self
    }

    /// Replace `cache` with the committed manifest after every success.
    pub fn with_cache(mut self, cache: Arc<CatalogCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn layout(&self) -> &CatalogLayout {
        &self.layout
    }

    /// Whether an attempt is currently running on this publisher.
    pub fn is_publishing(&self) -> bool {
        self.in_flight.try_lock().is_err()
    }

    /// Run one complete publish attempt.
    #[tracing::instrument(skip_all, fields(file = %artifact.file_name))]
    pub async fn publish(&self, artifact: NewArtifact) -> Result<PublishReceipt, PublishError> {
        artifact.validate()?;
        let _guard = self.in_flight.lock().await;
        let started = Timestamp::now();
        tracing::info!(bytes = artifact.bytes.len(), "publish started");

        let binary_path = self.upload_binary(&artifact, started).await?;
        let fetched = self.fetch_manifest().await?;
        let record = ArtifactRecord::new(
            ArtifactId::generate(),
            self.store.public_url(&binary_path),
            artifact.metadata.clone(),
            started,
        );
        let merged = merge(&fetched, record.clone());
        let message = commit_message(&record);
        let manifest_token = self
            .commit_manifest(&merged, fetched.token.clone(), message)
            .await?;

        if let Some(cache) = &self.cache {
            cache.replace(merged.clone());
        }
        tracing::info!(
            id = %record.id,
            path = %binary_path,
            manifest_len = merged.len(),
            "publish committed"
        );

        Ok(PublishReceipt {
            record,
            binary_path,
            manifest_token,
            manifest_len: merged.len(),
            recovered_from_corruption: fetched.recovered_from_corruption,
        })
    }

    /// Stage 1: write the binary to `{binary_dir}/{millis}-{name}`.
    /// Returns the path written.
    #[tracing::instrument(skip_all, name = "upload_binary")]
    pub async fn upload_binary(
        &self,
        artifact: &NewArtifact,
        at: Timestamp,
    ) -> Result<String, PublishError> {
        let path = self
            .layout
            .binary_path(at, &artifact.file_name)
            .map_err(vitrine_core::ValidationError::from)?;
        let content = EncodedContent::from_bytes(&artifact.bytes);
        let message = format!("Add image {}", artifact.file_name);

        self.store
            .conditional_write(&path, &content, &message, None)
            .await
            .map_err(|e| {
                tracing::warn!(path = %path, error = %e, "binary upload failed");
                PublishError::store(PublishStage::UploadBinary, e)
            })?;
        tracing::info!(path = %path, "binary uploaded");
        Ok(path)
    }

    /// Stage 2: read the manifest and its token.
    #[tracing::instrument(skip_all, name = "fetch_manifest")]
    pub async fn fetch_manifest(&self) -> Result<FetchedManifest, PublishError> {
        let path = &self.layout.manifest_path;
        let handle = self
            .store
            .read_versioned(path)
            .await
            .map_err(|e| {
                tracing::warn!(path = %path, error = %e, "manifest fetch failed");
                PublishError::store(PublishStage::FetchManifest, e)
            })?;

        let Some(handle) = handle else {
            tracing::info!(path = %path, "no manifest yet; this publish creates it");
            return Ok(FetchedManifest::absent());
        };

        match manifest::decode(&handle.content) {
            Ok(records) => {
                tracing::info!(path = %path, records = records.len(), token = %handle.integrity_token, "manifest fetched");
                Ok(FetchedManifest {
                    records,
                    token: Some(handle.integrity_token),
                    recovered_from_corruption: false,
                })
            }
            Err(source) => match self.recovery {
                ManifestRecovery::TreatAsEmpty => {
                    tracing::error!(
                        path = %path,
                        error = %source,
                        "MANIFEST UNREADABLE: continuing with an empty catalog; \
                         the next commit will replace every existing entry"
                    );
                    Ok(FetchedManifest {
                        records: Vec::new(),
                        token: Some(handle.integrity_token),
                        recovered_from_corruption: true,
                    })
                }
                ManifestRecovery::Abort => {
                    tracing::error!(path = %path, error = %source, "manifest unreadable; publish stopped");
                    Err(PublishError::CorruptManifest {
                        path: path.clone(),
                        source,
                    })
                }
            },
        }
    }

    /// Stage 4: conditionally write `records` against `token`.
    ///
    /// The write runs on its own task: once dispatched it is not cancelled
    /// by dropping the caller's future. It always ends in success, failure,
    /// or timeout.
    #[tracing::instrument(skip_all, fields(records = records.len()))]
    pub async fn commit_manifest(
        &self,
        records: &[ArtifactRecord],
        token: Option<IntegrityToken>,
        message: String,
    ) -> Result<IntegrityToken, PublishError> {
        let content = manifest::encode(records).map_err(PublishError::Encode)?;
        let store = Arc::clone(&self.store);
        let path = self.layout.manifest_path.clone();

        let commit = tokio::spawn(async move {
            let result = store
                .conditional_write(&path, &content, &message, token.as_ref())
                .await;
            (path, result)
        });
        let (path, result) = commit.await?;

        match result {
            Ok(new_token) => Ok(new_token),
            Err(e) => {
                if e.is_conflict() {
                    tracing::warn!(path = %path, "manifest changed since fetch; commit refused");
                } else {
                    tracing::warn!(path = %path, error = %e, "manifest commit failed");
                }
                Err(PublishError::store(PublishStage::CommitManifest, e))
            }
        }
    }
}

/// Stage 3: prepend `record`. The fetched list is not reordered,
/// deduplicated, or otherwise merged.
pub fn merge(fetched: &FetchedManifest, record: ArtifactRecord) -> Vec<ArtifactRecord> {
    let mut merged = Vec::with_capacity(fetched.records.len() + 1);
    merged.push(record);
    merged.extend(fetched.records.iter().cloned());
    merged
}

fn commit_message(record: &ArtifactRecord) -> String {
    if record.title.trim().is_empty() {
        format!("Update gallery manifest: add {}", record.id)
    } else {
        format!("Update gallery manifest: add \"{}\"", record.title.trim())
    }
}
