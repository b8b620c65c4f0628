//! Store connection and endpoint configuration.
//!
//! [`StoreConnection`] is what the curator supplies: which collection to
//! publish to and the credential to do it with. [`StoreEndpoints`] is
//! deployment configuration: API and raw-content hosts, timeout, and the
//! catalog layout. Defaults point at github.com. Override via environment
//! variables or explicit construction for testing.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use url::Url;
use vitrine_core::CatalogLayout;
use zeroize::Zeroizing;

/// Default branch when none is configured.
pub const DEFAULT_BRANCH: &str = "main";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// A bearer credential. Zeroized on drop and redacted from `Debug`.
#[derive(Clone)]
pub struct Credential(Zeroizing<String>);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Zeroizing::new(token.into()))
    }

    /// The raw token. Only the HTTP layer should call this.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl PartialEq for Credential {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl Eq for Credential {}

impl Serialize for Credential {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.expose())
    }
}

impl<'de> Deserialize<'de> for Credential {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

/// Which collection to publish to, and as whom.
///
/// Custom `Debug` implementation redacts the credential to prevent
/// leakage in log output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConnection {
    /// Account or organization that owns the collection.
    pub owner: String,
    /// Repository name.
    pub collection: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<Credential>,
}

fn default_branch() -> String {
    DEFAULT_BRANCH.to_string()
}

impl std::fmt::Debug for StoreConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConnection")
            .field("owner", &self.owner)
            .field("collection", &self.collection)
            .field("branch", &self.branch)
            .field(
                "credential",
                &self.credential.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl StoreConnection {
    pub fn new(
        owner: impl Into<String>,
        collection: impl Into<String>,
        branch: impl Into<String>,
        credential: Option<Credential>,
    ) -> Self {
        Self {
            owner: owner.into(),
            collection: collection.into(),
            branch: branch.into(),
            credential,
        }
    }

    /// Reject connections that cannot address a collection.
    ///
    /// Owner and collection become single URL path segments, so they must
    /// be non-empty and free of `/`. The branch may contain `/`
    /// (`release/2026`) but not be empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [("owner", &self.owner), ("collection", &self.collection)] {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingField(field));
            }
            if value.contains('/') {
                return Err(ConfigError::InvalidSegment {
                    field,
                    value: value.clone(),
                });
            }
        }
        if self.branch.trim().is_empty() {
            return Err(ConfigError::MissingField("branch"));
        }
        Ok(())
    }

    /// `owner/collection`, for log lines and status output.
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.collection)
    }
}

/// Hosts, timeout, and catalog layout for a store deployment.
#[derive(Debug, Clone)]
pub struct StoreEndpoints {
    /// Base URL of the contents API.
    /// Default: <https://api.github.com>
    pub api_url: Url,
    /// Base URL of the raw-content host used for public reads.
    /// Default: <https://raw.githubusercontent.com>
    pub raw_url: Url,
    /// Request timeout in seconds, applied to every call.
    pub timeout_secs: u64,
    pub layout: CatalogLayout,
}

impl StoreEndpoints {
    /// Load endpoint configuration from environment variables.
    ///
    /// Variables:
    /// - `VITRINE_API_URL` (default: `https://api.github.com`)
    /// - `VITRINE_RAW_URL` (default: `https://raw.githubusercontent.com`)
    /// - `VITRINE_TIMEOUT_SECS` (default: 30)
    /// - `VITRINE_MANIFEST_PATH` (default: `gallery.json`)
    /// - `VITRINE_BINARY_DIR` (default: `images`)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = CatalogLayout::default();
        Ok(Self {
            api_url: env_url("VITRINE_API_URL", "https://api.github.com")?,
            raw_url: env_url("VITRINE_RAW_URL", "https://raw.githubusercontent.com")?,
            timeout_secs: std::env::var("VITRINE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
            layout: CatalogLayout {
                manifest_path: std::env::var("VITRINE_MANIFEST_PATH")
                    .unwrap_or(defaults.manifest_path),
                binary_dir: std::env::var("VITRINE_BINARY_DIR").unwrap_or(defaults.binary_dir),
            },
        })
    }

    /// Point both the API and raw hosts at one local mock server.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` if `base` cannot be parsed.
    pub fn local_mock(base: &str) -> Result<Self, ConfigError> {
        let url = Url::parse(base)
            .map_err(|e| ConfigError::InvalidUrl(base.to_string(), e.to_string()))?;
        Ok(Self {
            api_url: url.clone(),
            raw_url: url,
            timeout_secs: 5,
            layout: CatalogLayout::default(),
        })
    }
}

fn env_url(var: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("store connection is missing {0}")]
    MissingField(&'static str),
    #[error("{field} \"{value}\" must not contain '/'")]
    InvalidSegment { field: &'static str, value: String },
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection() -> StoreConnection {
        StoreConnection::new("curator", "gallery", "main", Some(Credential::new("ghp_secret")))
    }

    #[test]
    fn debug_redacts_credential() {
        let rendered = format!("{:?}", connection());
        assert!(!rendered.contains("ghp_secret"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn branch_defaults_to_main() {
        let conn: StoreConnection =
            serde_json::from_str(r#"{"owner":"o","collection":"c"}"#).unwrap();
        assert_eq!(conn.branch, "main");
        assert!(conn.credential.is_none());
    }

    #[test]
    fn credential_round_trips_through_json() {
        let json = serde_json::to_string(&connection()).unwrap();
        let back: StoreConnection = serde_json::from_str(&json).unwrap();
        assert_eq!(back, connection());
    }

    #[test]
    fn validate_rejects_empty_and_slashed_segments() {
        let mut conn = connection();
        conn.owner = " ".into();
        assert!(matches!(conn.validate(), Err(ConfigError::MissingField("owner"))));

        let mut conn = connection();
        conn.collection = "a/b".into();
        assert!(matches!(
            conn.validate(),
            Err(ConfigError::InvalidSegment { field: "collection", .. })
        ));

        let mut conn = connection();
        conn.branch = "release/2026".into();
        assert!(conn.validate().is_ok());
    }

    #[test]
    fn local_mock_points_both_hosts_at_base() {
        let endpoints = StoreEndpoints::local_mock("http://127.0.0.1:9000").unwrap();
        assert_eq!(endpoints.api_url.as_str(), "http://127.0.0.1:9000/");
        assert_eq!(endpoints.raw_url, endpoints.api_url);
        assert_eq!(endpoints.timeout_secs, 5);
    }

    #[test]
    fn env_url_uses_default_when_var_absent() {
        let url = env_url("VITRINE_NONEXISTENT_VAR_12345", "https://example.com").unwrap();
        assert_eq!(url.as_str(), "https://example.com/");
    }

    #[test]
    fn env_url_rejects_invalid_url() {
        std::env::set_var("VITRINE_TEST_BAD_URL", "not a url");
        let result = env_url("VITRINE_TEST_BAD_URL", "https://example.com");
        std::env::remove_var("VITRINE_TEST_BAD_URL");
        assert!(result.is_err());
    }
}
