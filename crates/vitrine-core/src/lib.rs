//! # vitrine-core -- Foundational Types for Vitrine
//!
//! Every other crate in the workspace depends on `vitrine-core`; it depends
//! on nothing internal and performs no I/O.
//!
//! ## Key Design Principles
//!
//! 1. **One durable index.** The [`manifest`] module is the only way records
//!    become bytes and bytes become records. Nothing else serializes a
//!    manifest.
//!
//! 2. **Byte-first transport encoding.** [`EncodedContent`] always encodes
//!    the raw UTF-8 bytes of a document, never its characters, so any
//!    Unicode title, description, or tag survives the store round trip.
//!
//! 3. **Store-safe paths by construction.** [`path::binary_path()`] is the
//!    only way to derive an upload path, and its output contains nothing
//!    outside `[a-z0-9.-/]`.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `vitrine-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod identity;
pub mod manifest;
pub mod path;
pub mod record;
pub mod temporal;
pub mod transport;

// Re-export primary types for ergonomic imports.
pub use error::{CodecError, PathError, TransportError, ValidationError};
pub use identity::ArtifactId;
pub use path::{binary_path, sanitize_file_name, CatalogLayout};
pub use record::{ArtifactMetadata, ArtifactRecord, NewArtifact};
pub use temporal::Timestamp;
pub use transport::{EncodedContent, IntegrityToken};
