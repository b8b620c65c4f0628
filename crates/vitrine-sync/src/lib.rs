//! # vitrine-sync -- Manifest Synchronization
//!
//! Keeps the remote manifest, the curator's intent, and the locally
//! displayed catalog consistent over a store that offers nothing stronger
//! than compare-and-swap on whole files.
//!
//! - [`Publisher`]: the four-stage publish attempt (upload, fetch, merge,
//!   conditional commit). A stale token ends the attempt with a conflict.
//! - [`AccessVerifier`]: write-permission and visibility probes, run
//!   before a connection is saved.
//! - [`CatalogCache`]: the read-only, fail-soft local copy used for
//!   display.
//! - [`ConfigStore`]: the saved [`StoreConnection`](vitrine_store::StoreConnection).
//! - [`Describer`]: optional metadata suggestions for the publish form.

pub mod cache;
pub mod describe;
pub mod error;
pub mod publish;
pub mod settings;
pub mod verify;

pub use cache::CatalogCache;
pub use describe::{fill_metadata, guess_mime, Describer, HttpDescriber};
pub use error::{ConfigStoreError, DescribeError, PublishError, PublishStage};
pub use publish::{merge, FetchedManifest, ManifestRecovery, PublishReceipt, Publisher};
pub use settings::ConfigStore;
pub use verify::{AccessReport, AccessVerifier};
