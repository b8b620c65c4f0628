//! # vitrine-store -- Remote store client for Vitrine
//!
//! The catalog lives in a hosted, version-controlled repository that offers
//! whole-file GET/PUT and nothing else: no locks, no transactions. This
//! crate wraps that contract:
//!
//! - [`RemoteStore`]: the compare-and-swap abstraction (versioned read,
//!   conditional write, public read, access and visibility probes).
//! - [`GitHubStore`]: the HTTPS implementation over the contents API and
//!   the raw-content host.
//! - [`MemoryStore`]: an in-process implementation with failure injection,
//!   for tests and offline runs.
//!
//! No call is retried. The publish pipeline in `vitrine-sync` owns that
//! decision, and its decision is "surface the failure to the curator".

pub mod config;
pub mod error;
pub mod github;
pub mod memory;
pub mod remote;

pub use config::{
    ConfigError, Credential, StoreConnection, StoreEndpoints, DEFAULT_BRANCH, DEFAULT_TIMEOUT_SECS,
};
pub use error::StoreError;
pub use github::GitHubStore;
pub use memory::MemoryStore;
pub use remote::{AccessGrant, RemoteFileHandle, RemoteStore, StoreOp, Visibility};
