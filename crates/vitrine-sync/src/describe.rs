//! Metadata suggestions from an external describer.
//!
//! The describer is a collaborator, not part of the publish pipeline: it
//! only pre-fills the curator's form. Its failures are logged and the
//! manual entries are used unchanged.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use url::Url;
use vitrine_core::ArtifactMetadata;
use vitrine_store::Credential;

use crate::error::DescribeError;

/// Produces suggested metadata for an image.
#[async_trait]
pub trait Describer: Send + Sync {
    async fn describe(&self, bytes: &[u8], mime: &str) -> Result<ArtifactMetadata, DescribeError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DescribeRequest<'a> {
    mime_type: &'a str,
    data: String,
}

/// Describer response. Every field is optional; missing ones stay empty.
#[derive(Debug, Deserialize)]
struct DescribeResponse {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    medium: String,
    #[serde(default)]
    tags: Vec<String>,
}

/// HTTP describer: POSTs `{mimeType, data}` as JSON, `data` in standard
/// base64.
#[derive(Debug, Clone)]
pub struct HttpDescriber {
    http: reqwest::Client,
    endpoint: Url,
    api_key: Option<Credential>,
}

impl HttpDescriber {
    pub fn new(
        endpoint: Url,
        api_key: Option<Credential>,
        timeout_secs: u64,
    ) -> Result<Self, DescribeError> {
        if endpoint.cannot_be_a_base() {
            return Err(DescribeError::Config(format!(
                "describer endpoint {endpoint} is not a base URL"
            )));
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("vitrine/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DescribeError::Config(e.to_string()))?;
        Ok(Self {
            http,
            endpoint,
            api_key,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Describer for HttpDescriber {
    async fn describe(&self, bytes: &[u8], mime: &str) -> Result<ArtifactMetadata, DescribeError> {
        let body = DescribeRequest {
            mime_type: mime,
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
        };
        let mut request = self.http.post(self.endpoint.clone()).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key.expose());
        }

        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(DescribeError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: DescribeResponse = resp
            .json()
            .await
            .map_err(|e| DescribeError::Deserialization(e.to_string()))?;
        Ok(ArtifactMetadata {
            title: parsed.title,
            description: parsed.description,
            medium: parsed.medium,
            tags: parsed.tags,
        }
        .normalize_tags())
    }
}

/// Fill the empty fields of `manual` from the describer's suggestion.
///
/// Entries the curator typed are never replaced. On any describer failure
/// the manual form is returned as-is.
pub async fn fill_metadata<D: Describer + ?Sized>(
    describer: &D,
    bytes: &[u8],
    mime: &str,
    manual: ArtifactMetadata,
) -> ArtifactMetadata {
    match describer.describe(bytes, mime).await {
        Ok(suggestion) => manual.merge_suggestion(suggestion),
        Err(e) => {
            tracing::warn!(error = %e, "describer unavailable; keeping manual metadata");
            manual
        }
    }
}

/// Image MIME type from a file extension. Unknown extensions get
/// `application/octet-stream`.
pub fn guess_mime(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "heic" => "image/heic",
        _ => "application/octet-stream",
    }
}
