//! Typed client for a GitHub-style repository contents API.
//!
//! ## Paths used
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | GET    | `/repos/{owner}/{collection}` | access probe, visibility |
//! | GET    | `/repos/{owner}/{collection}/contents/{path}?ref={branch}` | versioned read |
//! | PUT    | `/repos/{owner}/{collection}/contents/{path}` | create / conditional update |
//! | GET    | `{raw}/{owner}/{collection}/{branch}/{path}?t={millis}` | public read |
//!
//! The `sha` returned by the contents API is the integrity token. A PUT
//! carrying a stale `sha` is answered with 409; a PUT without `sha` for a
//! file that already exists is answered with 422. Both map to
//! [`StoreError::Conflict`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;
use vitrine_core::{EncodedContent, IntegrityToken};

use crate::config::{ConfigError, Credential, StoreConnection, StoreEndpoints};
use crate::error::StoreError;
use crate::remote::{AccessGrant, RemoteFileHandle, RemoteStore, Visibility};

const API_ACCEPT: &str = "application/vnd.github+json";
const RAW_ACCEPT: &str = "application/vnd.github.raw";
const API_VERSION_HEADER: &str = "x-github-api-version";
const API_VERSION: &str = "2022-11-28";

// -- Wire types ---------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    sha: String,
    #[serde(default)]
    content: Option<String>,
    /// `"base64"` normally; `"none"` for files above the inline size limit,
    /// whose content must be fetched with the raw media type.
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Debug, Serialize)]
struct WriteRequest<'a> {
    message: &'a str,
    content: &'a str,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct WriteResponse {
    content: WrittenFile,
}

#[derive(Debug, Deserialize)]
struct WrittenFile {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct RepoResponse {
    #[serde(default)]
    private: Option<bool>,
    #[serde(default)]
    visibility: Option<String>,
    #[serde(default)]
    permissions: Option<RepoPermissions>,
}

#[derive(Debug, Deserialize)]
struct RepoPermissions {
    #[serde(default)]
    push: bool,
}

impl RepoResponse {
    fn grant(&self) -> AccessGrant {
        AccessGrant {
            can_write: self.permissions.as_ref().map(|p| p.push).unwrap_or(false),
        }
    }

    fn visibility(&self) -> Visibility {
        match self.visibility.as_deref() {
            Some("public") => Visibility::Public,
            // Internal repositories are not readable anonymously.
            Some("private") | Some("internal") => Visibility::Private,
            _ => match self.private {
                Some(true) => Visibility::Private,
                Some(false) => Visibility::Public,
                None => Visibility::Unknown,
            },
        }
    }
}

// -- Client -------------------------------------------------------------------

/// [`RemoteStore`] over HTTPS.
#[derive(Debug, Clone)]
pub struct GitHubStore {
    http: reqwest::Client,
    api_url: Url,
    raw_url: Url,
    connection: StoreConnection,
}

impl GitHubStore {
    /// Create a client for `connection`.
    ///
    /// The credential is attached per request to API calls only; public
    /// reads are sent without it.
    pub fn new(connection: StoreConnection, endpoints: &StoreEndpoints) -> Result<Self, StoreError> {
        connection.validate()?;
        for url in [&endpoints.api_url, &endpoints.raw_url] {
            if url.cannot_be_a_base() {
                return Err(ConfigError::InvalidUrl(
                    url.to_string(),
                    "URL cannot be used as a base".into(),
                )
                .into());
            }
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(endpoints.timeout_secs))
            .user_agent(concat!("vitrine/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StoreError::transport("client_init", e))?;

        Ok(Self {
            http,
            api_url: endpoints.api_url.clone(),
            raw_url: endpoints.raw_url.clone(),
            connection,
        })
    }

    pub fn connection(&self) -> &StoreConnection {
        &self.connection
    }

    fn repo_url(&self) -> Url {
        join_segments(
            &self.api_url,
            [
                "repos",
                self.connection.owner.as_str(),
                self.connection.collection.as_str(),
            ],
        )
    }

    fn contents_url(&self, path: &str) -> Url {
        let mut url = join_segments(
            &self.api_url,
            [
                "repos",
                self.connection.owner.as_str(),
                self.connection.collection.as_str(),
                "contents",
            ]
            .into_iter()
            .chain(path_segments(path)),
        );
        url.query_pairs_mut()
            .append_pair("ref", &self.connection.branch);
        url
    }

    fn raw_file_url(&self, path: &str) -> Url {
        join_segments(
            &self.raw_url,
            [
                self.connection.owner.as_str(),
                self.connection.collection.as_str(),
            ]
            .into_iter()
            .chain(path_segments(&self.connection.branch))
            .chain(path_segments(path)),
        )
    }

    fn credential(&self, endpoint: &str) -> Result<&Credential, StoreError> {
        self.connection
            .credential
            .as_ref()
            .ok_or_else(|| StoreError::Auth {
                endpoint: endpoint.to_string(),
                message: "no credential configured".into(),
            })
    }

    /// An API request carrying the version header, `accept`, and the bearer credential.
    fn api_request(
        &self,
        method: Method,
        url: Url,
        credential: &Credential,
        accept: &'static str,
    ) -> RequestBuilder {
        self.http
            .request(method, url)
            .bearer_auth(credential.expose())
            .header(header::ACCEPT, accept)
            .header(API_VERSION_HEADER, API_VERSION)
    }

    async fn fetch_repo(&self, endpoint: &str) -> Result<RepoResponse, StoreError> {
        let credential = self.credential(endpoint)?;
        let resp = self
            .api_request(Method::GET, self.repo_url(), credential, API_ACCEPT)
            .send()
            .await
            .map_err(|e| StoreError::transport(endpoint, e))?;

        match resp.status() {
            // A repository the credential cannot see is reported as 404.
            StatusCode::NOT_FOUND => Err(StoreError::Auth {
                endpoint: endpoint.to_string(),
                message: format!(
                    "collection {} does not exist or is not visible to this credential",
                    self.connection.slug()
                ),
            }),
            s if s.is_success() => parse_json(endpoint, resp).await,
            _ => Err(error_for_status(endpoint, None, resp).await),
        }
    }

    /// Fetch a file too large for inline content using the raw media type.
    async fn fetch_raw_contents(&self, path: &str, endpoint: &str) -> Result<Vec<u8>, StoreError> {
        let credential = self.credential(endpoint)?;
        let resp = self
            .api_request(Method::GET, self.contents_url(path), credential, RAW_ACCEPT)
            .send()
            .await
            .map_err(|e| StoreError::transport(endpoint, e))?;
        if !resp.status().is_success() {
            return Err(error_for_status(endpoint, Some(path), resp).await);
        }
        resp.bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| StoreError::transport(endpoint, e))
    }
}

#[async_trait]
impl RemoteStore for GitHubStore {
    fn public_url(&self, path: &str) -> String {
        self.raw_file_url(path).to_string()
    }

    async fn read_public(&self, path: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let endpoint = format!("GET raw/{path}");
        let mut url = self.raw_file_url(path);
        url.query_pairs_mut()
            .append_pair("t", &chrono::Utc::now().timestamp_millis().to_string());
        tracing::debug!(%url, "public read");

        let resp = self
            .http
            .get(url)
            .header(header::CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|e| StoreError::transport(&endpoint, e))?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(error_for_status(&endpoint, Some(path), resp).await);
        }
        resp.bytes()
            .await
            .map(|b| Some(b.to_vec()))
            .map_err(|e| StoreError::transport(&endpoint, e))
    }

    async fn read_versioned(&self, path: &str) -> Result<Option<RemoteFileHandle>, StoreError> {
        let endpoint = format!("GET /contents/{path}");
        let credential = self.credential(&endpoint)?;
        tracing::debug!(path, branch = %self.connection.branch, "versioned read");

        let resp = self
            .api_request(Method::GET, self.contents_url(path), credential, API_ACCEPT)
            .send()
            .await
            .map_err(|e| StoreError::transport(&endpoint, e))?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(error_for_status(&endpoint, Some(path), resp).await);
        }

        let body: ContentsResponse = parse_json(&endpoint, resp).await?;
        let content = match (body.encoding.as_deref(), body.content) {
            (Some("none"), _) | (_, None) => {
                let bytes = self.fetch_raw_contents(path, &endpoint).await?;
                EncodedContent::from_bytes(&bytes)
            }
            (_, Some(text)) => EncodedContent::from_wire(text),
        };

        Ok(Some(RemoteFileHandle {
            content,
            integrity_token: IntegrityToken::new(body.sha),
        }))
    }

    async fn conditional_write(
        &self,
        path: &str,
        content: &EncodedContent,
        message: &str,
        expected: Option<&IntegrityToken>,
    ) -> Result<IntegrityToken, StoreError> {
        let endpoint = format!("PUT /contents/{path}");
        let credential = self.credential(&endpoint)?;
        let body = WriteRequest {
            message,
            content: content.as_str(),
            branch: &self.connection.branch,
            sha: expected.map(IntegrityToken::as_str),
        };
        tracing::debug!(
            path,
            bytes = content.len(),
            conditional = expected.is_some(),
            "conditional write"
        );

        let mut url = self.contents_url(path);
        url.set_query(None);
        let resp = self
            .api_request(Method::PUT, url, credential, API_ACCEPT)
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::transport(&endpoint, e))?;

        if !resp.status().is_success() {
            return Err(error_for_status(&endpoint, Some(path), resp).await);
        }
        let written: WriteResponse = parse_json(&endpoint, resp).await?;
        Ok(IntegrityToken::new(written.content.sha))
    }

    async fn check_access(&self) -> Result<AccessGrant, StoreError> {
        Ok(self.fetch_repo("GET /repos").await?.grant())
    }

    async fn visibility(&self) -> Result<Visibility, StoreError> {
        Ok(self.fetch_repo("GET /repos").await?.visibility())
    }

    /// One `GET /repos/{o}/{c}` answers both.
    async fn inspect_access(
        &self,
    ) -> Result<(AccessGrant, Result<Visibility, StoreError>), StoreError> {
        let repo = self.fetch_repo("GET /repos").await?;
        Ok((repo.grant(), Ok(repo.visibility())))
    }
}

// -- Helpers ------------------------------------------------------------------

fn path_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Append percent-encoded segments to `base`. Bases are checked with
/// `cannot_be_a_base()` at construction, so the segment API is available.
fn join_segments<'a>(base: &Url, segments: impl IntoIterator<Item = &'a str>) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

async fn parse_json<T: serde::de::DeserializeOwned>(
    endpoint: &str,
    resp: Response,
) -> Result<T, StoreError> {
    resp.json().await.map_err(|e| StoreError::Deserialization {
        endpoint: endpoint.to_string(),
        message: e.to_string(),
    })
}

/// Map a non-2xx response to the error taxonomy.
async fn error_for_status(endpoint: &str, path: Option<&str>, resp: Response) -> StoreError {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::Auth {
            endpoint: endpoint.to_string(),
            message: format!("{}: {}", status.as_u16(), body),
        },
        StatusCode::CONFLICT => StoreError::Conflict {
            path: path.unwrap_or(endpoint).to_string(),
        },
        StatusCode::UNPROCESSABLE_ENTITY if body.contains("sha") => StoreError::Conflict {
            path: path.unwrap_or(endpoint).to_string(),
        },
        _ => StoreError::Api {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            body,
        },
    }
}
