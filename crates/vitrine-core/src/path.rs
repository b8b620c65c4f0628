//! # Store Paths
//!
//! Upload paths are derived, never taken verbatim from the curator. The
//! derived path is `{binary_dir}/{unix_millis}-{sanitized_name}`, where
//! sanitization keeps only `[A-Za-z0-9.-]` and lowercases the result.
//! Adversarial names (`../../etc/passwd`, names with `?`, `#`, `%`, or
//! non-ASCII characters) therefore cannot escape the binary directory or
//! break URL construction.

use serde::{Deserialize, Serialize};

use crate::error::PathError;
use crate::temporal::Timestamp;

/// Default manifest location within the collection.
pub const DEFAULT_MANIFEST_PATH: &str = "gallery.json";

/// Default directory for uploaded binaries.
pub const DEFAULT_BINARY_DIR: &str = "images";

/// Where the manifest and binaries live inside a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogLayout {
    pub manifest_path: String,
    pub binary_dir: String,
}

impl Default for CatalogLayout {
    fn default() -> Self {
        Self {
            manifest_path: DEFAULT_MANIFEST_PATH.to_string(),
            binary_dir: DEFAULT_BINARY_DIR.to_string(),
        }
    }
}

impl CatalogLayout {
    /// Derive the upload path for `file_name` at time `at`.
    pub fn binary_path(&self, at: Timestamp, file_name: &str) -> Result<String, PathError> {
        binary_path(&self.binary_dir, at, file_name)
    }
}

/// Strip every character outside `[A-Za-z0-9.-]` and lowercase the rest.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.' || *c == '-')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Derive `{dir}/{unix_millis}-{sanitized}`.
///
/// The timestamp prefix makes paths unique per attempt; uploads are
/// written without an integrity-token precondition on that basis.
pub fn binary_path(dir: &str, at: Timestamp, file_name: &str) -> Result<String, PathError> {
    let sanitized = sanitize_file_name(file_name);
    check_sanitized(file_name, &sanitized)?;
    let dir = dir.trim_matches('/');
    let leaf = format!("{}-{}", at.unix_millis(), sanitized);
    if dir.is_empty() {
        Ok(leaf)
    } else {
        Ok(format!("{dir}/{leaf}"))
    }
}

pub(crate) fn check_sanitized(original: &str, sanitized: &str) -> Result<(), PathError> {
    if sanitized.is_empty() {
        return Err(PathError::EmptyFileName(original.to_string()));
    }
    if sanitized.chars().all(|c| c == '.') {
        return Err(PathError::Reserved(original.to_string()));
    }
    Ok(())
}
