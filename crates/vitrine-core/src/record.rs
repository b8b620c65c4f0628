//! # Artifact Records
//!
//! [`ArtifactRecord`] is one entry of the manifest. Its field names are the
//! wire names (`createdAt` in camelCase) because the manifest is read
//! directly by the public gallery.
//!
//! Records are immutable once committed. Correcting a locator or any
//! metadata means publishing a new record.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::identity::ArtifactId;
use crate::path::sanitize_file_name;
use crate::temporal::Timestamp;

/// One published artifact as it appears in the manifest.
///
/// Text fields default to empty when absent so that manifests written by
/// older tooling still decode. Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactRecord {
    pub id: ArtifactId,
    /// Public URL of the uploaded binary.
    #[serde(alias = "url")]
    pub locator: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub medium: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, alias = "created_at")]
    pub created_at: Timestamp,
}

impl ArtifactRecord {
    /// Build a record for freshly uploaded content.
    pub fn new(
        id: ArtifactId,
        locator: impl Into<String>,
        metadata: ArtifactMetadata,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            locator: locator.into(),
            title: metadata.title,
            description: metadata.description,
            medium: metadata.medium,
            tags: metadata.tags,
            created_at,
        }
    }

    /// The metadata portion of the record.
    pub fn metadata(&self) -> ArtifactMetadata {
        ArtifactMetadata {
            title: self.title.clone(),
            description: self.description.clone(),
            medium: self.medium.clone(),
            tags: self.tags.clone(),
        }
    }
}

/// Curator- or describer-supplied metadata for an artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub medium: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ArtifactMetadata {
    /// Fill every empty field from `suggestion`. Fields that already have
    /// content are kept; tags are taken from the suggestion only when none
    /// were entered.
    pub fn merge_suggestion(mut self, suggestion: ArtifactMetadata) -> Self {
        if self.title.trim().is_empty() {
            self.title = suggestion.title;
        }
        if self.description.trim().is_empty() {
            self.description = suggestion.description;
        }
        if self.medium.trim().is_empty() {
            self.medium = suggestion.medium;
        }
        if self.tags.is_empty() {
            self.tags = suggestion.tags;
        }
        self
    }

    /// Trim each tag and drop the empty ones. Order and duplicates are kept.
    pub fn normalize_tags(mut self) -> Self {
        self.tags = self
            .tags
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        self
    }
}

/// Input to one publish attempt.
#[derive(Debug, Clone)]
pub struct NewArtifact {
    /// Original file name as supplied by the curator.
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub metadata: ArtifactMetadata,
}

impl NewArtifact {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>, metadata: ArtifactMetadata) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
            metadata,
        }
    }

    /// Reject artifacts that could never be published: empty content or a
    /// file name with nothing left after sanitization.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.bytes.is_empty() {
            return Err(ValidationError::EmptyContent(self.file_name.clone()));
        }
        crate::path::check_sanitized(&self.file_name, &sanitize_file_name(&self.file_name))?;
        Ok(())
    }
}
