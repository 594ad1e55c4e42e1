//! HTTP adapter for the Figma REST API.
//!
//! # Endpoints
//!
//! | Request              | Endpoint                                  |
//! |----------------------|-------------------------------------------|
//! | Whole file           | `GET /v1/files/{key}?depth=N`             |
//! | Single node subtree  | `GET /v1/files/{key}/nodes?ids=ID&depth=N` |
//!
//! # Status Mapping
//!
//! | HTTP status | Error                      |
//! |-------------|----------------------------|
//! | 401, 403    | [`FigmaError::Auth`]        |
//! | 404         | [`FigmaError::NotFound`]    |
//! | 429         | [`FigmaError::RateLimited`] |
//! | other       | [`FigmaError::Api`]         |
//!
//! Throttled requests are not retried here; that is left to the caller.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, RETRY_AFTER};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::figma::error::{FigmaError, FigmaResult};
use crate::figma::model::{ErrorBody, FetchRequest, FetchResult, FileResponse, NodesResponse};

/// Default base URL of the Figma REST API.
pub const DEFAULT_BASE_URL: &str = "https://api.figma.com/v1";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// How requests to Figma are authenticated.
///
/// Exactly one mode is chosen when the client is constructed.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthMode {
    /// Personal access token, sent as `X-Figma-Token`.
    ApiKey(String),
    /// OAuth access token, sent as `Authorization: Bearer`.
    OAuth(String),
}

impl AuthMode {
    /// Short label for logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::ApiKey(_) => "api-key",
            Self::OAuth(_) => "oauth",
        }
    }
}

impl fmt::Debug for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuthMode::{}(<redacted>)", self.label())
    }
}

/// Source of Figma file data.
///
/// Implemented by [`FigmaClient`] for the real API and by test doubles.
#[async_trait]
pub trait FigmaApi: Send + Sync {
    /// Fetches a file, or a node subtree when `request.node_id` is set.
    async fn fetch(&self, request: &FetchRequest) -> FigmaResult<FetchResult>;
}

/// Figma REST API client.
pub struct FigmaClient {
    http: reqwest::Client,
    base_url: Url,
    auth: AuthMode,
}

impl FigmaClient {
    /// Creates a client for the public Figma API with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns [`FigmaError::Setup`] if the HTTP client cannot be built.
    pub fn new(auth: AuthMode) -> FigmaResult<Self> {
        Self::with_options(auth, DEFAULT_BASE_URL, DEFAULT_TIMEOUT)
    }

    /// Creates a client with an explicit base URL and request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`FigmaError::Setup`] if the base URL is invalid or the HTTP
    /// client cannot be built.
    pub fn with_options(auth: AuthMode, base_url: &str, timeout: Duration) -> FigmaResult<Self> {
        let base_url = Url::parse(base_url).map_err(|e| FigmaError::Setup {
            message: format!("invalid base URL '{base_url}': {e}"),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(FigmaError::Setup {
                message: format!("base URL '{base_url}' cannot have path segments"),
            });
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("figma-mcp/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FigmaError::Setup {
                message: e.to_string(),
            })?;

        Ok(Self {
            http,
            base_url,
            auth,
        })
    }

    /// Builds `{base}/{segments...}` with each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
        missing: impl FnOnce() -> String,
    ) -> FigmaResult<T> {
        let mut request = self.http.get(url);
        if !query.is_empty() {
            request = request.query(query);
        }
        let request = match &self.auth {
            AuthMode::ApiKey(key) => request.header("X-Figma-Token", key),
            AuthMode::OAuth(token) => request.bearer_auth(token),
        };

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let retry_after = response.headers().get(RETRY_AFTER).and_then(parse_retry_after);
            let body = response.bytes().await.unwrap_or_default();
            return Err(status_error(status, retry_after, &body, missing));
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| FigmaError::decode(e.to_string()))
    }

    async fn fetch_file(&self, request: &FetchRequest) -> FigmaResult<FetchResult> {
        let url = self.endpoint(&["files", &request.file_key]);
        let query: Vec<_> = request
            .depth
            .map(|d| ("depth", d.to_string()))
            .into_iter()
            .collect();

        let response: FileResponse = self
            .get_json(url, &query, || format!("file '{}'", request.file_key))
            .await?;

        Ok(response.into())
    }

    async fn fetch_node(&self, request: &FetchRequest, node_id: &str) -> FigmaResult<FetchResult> {
        let url = self.endpoint(&["files", &request.file_key, "nodes"]);
        let mut query = vec![("ids", node_id.to_string())];
        if let Some(depth) = request.depth {
            query.push(("depth", depth.to_string()));
        }

        let mut response: NodesResponse = self
            .get_json(url, &query, || format!("file '{}'", request.file_key))
            .await?;

        let entry = response
            .nodes
            .remove(node_id)
            .flatten()
            .ok_or_else(|| {
                FigmaError::not_found(format!(
                    "node '{node_id}' in file '{}'",
                    request.file_key
                ))
            })?;

        Ok(FetchResult {
            name: response.name,
            last_modified: response.last_modified,
            thumbnail_url: response.thumbnail_url,
            nodes: vec![entry.document],
        })
    }
}

#[async_trait]
impl FigmaApi for FigmaClient {
    async fn fetch(&self, request: &FetchRequest) -> FigmaResult<FetchResult> {
        tracing::debug!(
            file_key = %request.file_key,
            node_id = ?request.node_id,
            depth = ?request.depth,
            auth = self.auth.label(),
            "Fetching Figma data"
        );

        match &request.node_id {
            Some(node_id) => self.fetch_node(request, node_id).await,
            None => self.fetch_file(request).await,
        }
    }
}

fn parse_retry_after(value: &HeaderValue) -> Option<u64> {
    value.to_str().ok()?.trim().parse().ok()
}

fn status_error(
    status: StatusCode,
    retry_after: Option<u64>,
    body: &[u8],
    missing: impl FnOnce() -> String,
) -> FigmaError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => FigmaError::Auth {
            status: status.as_u16(),
        },
        StatusCode::NOT_FOUND => FigmaError::not_found(missing()),
        StatusCode::TOO_MANY_REQUESTS => FigmaError::RateLimited { retry_after },
        _ => {
            let message = serde_json::from_slice::<ErrorBody>(body)
                .ok()
                .and_then(ErrorBody::into_message)
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("unexpected status")
                        .to_string()
                });
            FigmaError::Api {
                status: status.as_u16(),
                message,
            }
        }
    }
}
