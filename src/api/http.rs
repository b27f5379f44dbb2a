//! Authenticated HTTP transport shared by every domain client.
//!
//! [`AdoHttpClient`] owns the `reqwest::Client`, builds `_apis` URLs for the
//! three Azure DevOps service hosts, applies the retry policy and the
//! concurrency limit, and maps non-success statuses onto [`ApiError`].

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use secrecy::SecretString;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use url::Url;

use super::credential::PatCredential;
use super::pagination::{CONTINUATION_TOKEN_HEADER, ListResponse, Page};
use super::retry::{RetryPolicy, is_retryable_status, parse_retry_after};
use crate::error::{ApiError, ApiResult, ValidationError};
use crate::utils::Throttler;

/// Default REST API version sent with every request.
pub const DEFAULT_API_VERSION: &str = "7.1";

const MAX_ERROR_BODY_CHARS: usize = 500;

/// Azure DevOps splits its REST surface across several hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceHost {
    /// `dev.azure.com`: core, git, wit, build, pipelines, wiki, test plans.
    Core,
    /// `feeds.dev.azure.com`: Azure Artifacts feeds and packages.
    Feeds,
    /// `almsearch.dev.azure.com`: code, work item and wiki search.
    Search,
}

impl ServiceHost {
    fn default_root(self) -> &'static str {
        match self {
            Self::Core => "https://dev.azure.com",
            Self::Feeds => "https://feeds.dev.azure.com",
            Self::Search => "https://almsearch.dev.azure.com",
        }
    }
}

/// Everything needed to open an authenticated connection.
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    pub organization: String,
    pub pat: SecretString,
    /// Replaces every service host root (Azure DevOps Server, proxies, tests).
    pub base_url: Option<String>,
    pub api_version: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
    /// Zero disables the limit.
    pub max_concurrent_requests: usize,
}

impl ConnectionSettings {
    pub fn new(organization: impl Into<String>, pat: SecretString) -> Self {
        Self {
            organization: organization.into(),
            pat,
            base_url: None,
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            max_concurrent_requests: 10,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

struct Inner {
    http: reqwest::Client,
    organization: String,
    base_url: Option<Url>,
    api_version: String,
    retry: RetryPolicy,
    throttler: Throttler,
}

/// Cheaply cloneable authenticated connection to one organization.
#[derive(Clone)]
pub struct AdoHttpClient {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for AdoHttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdoHttpClient")
            .field("organization", &self.inner.organization)
            .field("base_url", &self.inner.base_url.as_ref().map(Url::as_str))
            .field("api_version", &self.inner.api_version)
            .finish_non_exhaustive()
    }
}

impl AdoHttpClient {
    pub fn new(settings: ConnectionSettings) -> ApiResult<Self> {
        let organization = settings.organization.trim().to_string();
        if organization.is_empty() {
            return Err(ValidationError::Empty {
                field: "organization".to_string(),
            }
            .into());
        }

        let credential = PatCredential::new(settings.pat);
        let mut auth = HeaderValue::from_str(&credential.authorization_header()).map_err(|_| {
            ValidationError::InvalidCharacters {
                field: "pat".to_string(),
                characters: "non-visible ASCII".to_string(),
            }
        })?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(settings.timeout)
            .user_agent(concat!("ado-mcp/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let base_url = settings
            .base_url
            .as_deref()
            .map(|raw| {
                Url::parse(raw.trim()).map_err(|e| ApiError::InvalidUrl {
                    message: format!("base url '{}': {}", raw, e),
                })
            })
            .transpose()?;

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                organization,
                base_url,
                api_version: settings.api_version,
                retry: settings.retry,
                throttler: Throttler::new(settings.max_concurrent_requests),
            }),
        })
    }

    pub fn organization(&self) -> &str {
        &self.inner.organization
    }

    pub fn api_version(&self) -> &str {
        &self.inner.api_version
    }

    /// Build `{root}/{organization}/{scope..}/_apis/{path..}`.
    ///
    /// Every segment is percent-encoded individually, so names containing
    /// spaces or reserved characters are safe to pass through.
    pub fn build_url(&self, host: ServiceHost, scope: &[&str], path: &[&str]) -> ApiResult<Url> {
        let mut url = match &self.inner.base_url {
            Some(base) => base.clone(),
            None => Url::parse(host.default_root()).map_err(|e| ApiError::InvalidUrl {
                message: e.to_string(),
            })?,
        };

        {
            let mut segments = url.path_segments_mut().map_err(|_| ApiError::InvalidUrl {
                message: "base url cannot carry a path".to_string(),
            })?;
            segments.pop_if_empty().push(&self.inner.organization);
            for part in scope {
                segments.push(part);
            }
            segments.push("_apis");
            for part in path {
                segments.push(part);
            }
        }

        Ok(url)
    }

    /// Organization-level URL.
    pub fn org_url(&self, host: ServiceHost, path: &[&str]) -> ApiResult<Url> {
        self.build_url(host, &[], path)
    }

    /// Project-level URL.
    pub fn project_url(&self, host: ServiceHost, project: &str, path: &[&str]) -> ApiResult<Url> {
        self.build_url(host, &[project], path)
    }

    /// Team-level URL (`{project}/{team}/_apis/...`).
    pub fn team_url(
        &self,
        host: ServiceHost,
        project: &str,
        team: &str,
        path: &[&str],
    ) -> ApiResult<Url> {
        self.build_url(host, &[project, team], path)
    }

    pub fn get(&self, url: Url) -> RequestSpec<'_> {
        RequestSpec::new(self, Method::GET, url)
    }

    pub fn post(&self, url: Url) -> RequestSpec<'_> {
        RequestSpec::new(self, Method::POST, url)
    }

    pub fn put(&self, url: Url) -> RequestSpec<'_> {
        RequestSpec::new(self, Method::PUT, url)
    }

    pub fn patch(&self, url: Url) -> RequestSpec<'_> {
        RequestSpec::new(self, Method::PATCH, url)
    }

    pub fn delete(&self, url: Url) -> RequestSpec<'_> {
        RequestSpec::new(self, Method::DELETE, url)
    }
}

#[derive(Debug, Clone)]
enum RequestBody {
    Json(Value),
    JsonPatch(Value),
}

/// Raw successful response.
#[derive(Debug)]
pub struct RawResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
}

impl RawResponse {
    fn header(&self, name: &str) -> Option<String> {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }
}

/// A single request being assembled. Cheap to rebuild for each retry.
#[must_use = "requests do nothing until sent"]
pub struct RequestSpec<'a> {
    client: &'a AdoHttpClient,
    method: Method,
    url: Url,
    query: Vec<(String, String)>,
    api_version: Option<String>,
    body: Option<RequestBody>,
    body_error: Option<String>,
    if_match: Option<String>,
    accept_text: bool,
}

impl<'a> RequestSpec<'a> {
    fn new(client: &'a AdoHttpClient, method: Method, url: Url) -> Self {
        Self {
            client,
            method,
            url,
            query: Vec::new(),
            api_version: None,
            body: None,
            body_error: None,
            if_match: None,
            accept_text: false,
        }
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn query_opt<V: ToString>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.query(key, v),
            None => self,
        }
    }

    /// Override the API version for endpoints that are still in preview.
    pub fn api_version(mut self, version: &str) -> Self {
        self.api_version = Some(version.to_string());
        self
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Self {
        match serde_json::to_value(body) {
            Ok(value) => self.body = Some(RequestBody::Json(value)),
            Err(e) => self.body_error = Some(e.to_string()),
        }
        self
    }

    /// Send a JSON Patch document (`application/json-patch+json`).
    pub fn json_patch<B: Serialize + ?Sized>(mut self, operations: &B) -> Self {
        match serde_json::to_value(operations) {
            Ok(value) => self.body = Some(RequestBody::JsonPatch(value)),
            Err(e) => self.body_error = Some(e.to_string()),
        }
        self
    }

    pub fn if_match(mut self, etag: Option<&str>) -> Self {
        self.if_match = etag.map(str::to_string);
        self
    }

    pub fn accept_text(mut self) -> Self {
        self.accept_text = true;
        self
    }

    fn final_url(&self) -> Url {
        let mut url = self.url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.query {
                pairs.append_pair(key, value);
            }
            pairs.append_pair(
                "api-version",
                self.api_version
                    .as_deref()
                    .unwrap_or(&self.client.inner.api_version),
            );
        }
        url
    }

    /// Send the request, retrying transient failures, and return the raw 2xx response.
    pub async fn send(self) -> ApiResult<RawResponse> {
        if let Some(message) = &self.body_error {
            return Err(ApiError::ParseError {
                message: format!("failed to serialize request body: {}", message),
            });
        }

        let inner = &self.client.inner;
        let url = self.final_url();
        let policy = inner.retry;
        let mut attempt = 0u32;

        loop {
            let permit = inner.throttler.acquire().await;
            let started = Instant::now();

            let mut request = inner.http.request(self.method.clone(), url.clone()).header(
                header::ACCEPT,
                if self.accept_text {
                    "text/plain"
                } else {
                    "application/json"
                },
            );
            match &self.body {
                Some(RequestBody::Json(value)) => {
                    request = request
                        .header(header::CONTENT_TYPE, "application/json")
                        .body(value.to_string());
                }
                Some(RequestBody::JsonPatch(value)) => {
                    request = request
                        .header(header::CONTENT_TYPE, "application/json-patch+json")
                        .body(value.to_string());
                }
                None => {}
            }
            if let Some(etag) = &self.if_match {
                request = request.header(header::IF_MATCH, etag.as_str());
            }

            let outcome = request.send().await;
            match outcome {
                Ok(response) => {
                    let status = response.status();
                    let headers = response.headers().clone();
                    let body = response.text().await?;
                    drop(permit);

                    debug!(
                        method = %self.method,
                        host = url.host_str().unwrap_or_default(),
                        path = url.path(),
                        status = status.as_u16(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        attempt,
                        "Azure DevOps request completed"
                    );

                    if status.is_success() {
                        return Ok(RawResponse {
                            status: status.as_u16(),
                            headers,
                            body,
                        });
                    }

                    let retry_after = parse_retry_after(
                        headers
                            .get(header::RETRY_AFTER)
                            .and_then(|v| v.to_str().ok()),
                    );

                    if is_retryable_status(status.as_u16()) && policy.should_retry(attempt) {
                        let delay = policy.delay_for(attempt, retry_after);
                        warn!(
                            method = %self.method,
                            path = url.path(),
                            status = status.as_u16(),
                            attempt = attempt + 1,
                            delay_ms = delay.as_millis() as u64,
                            "Retrying Azure DevOps request"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }

                    return Err(map_status_error(status, &body, url.path(), retry_after));
                }
                Err(e) => {
                    drop(permit);
                    if (e.is_timeout() || e.is_connect()) && policy.should_retry(attempt) {
                        let delay = policy.delay_for(attempt, None);
                        warn!(
                            method = %self.method,
                            path = url.path(),
                            error = %e,
                            attempt = attempt + 1,
                            delay_ms = delay.as_millis() as u64,
                            "Retrying Azure DevOps request after transport error"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(ApiError::Network(e));
                }
            }
        }
    }

    /// Send and deserialize a JSON body. An empty body deserializes as `null`.
    pub async fn send_json<T: DeserializeOwned>(self) -> ApiResult<T> {
        let response = self.send().await?;
        parse_json_body(&response.body)
    }

    /// Send and read a `{count, value}` list plus the continuation token header.
    pub async fn send_page<T: DeserializeOwned>(self) -> ApiResult<Page<T>> {
        let response = self.send().await?;
        let continuation_token = response
            .header(CONTINUATION_TOKEN_HEADER)
            .filter(|t| !t.is_empty());
        let list: ListResponse<T> = parse_json_body(&response.body)?;
        Ok(Page {
            items: list.value,
            continuation_token,
        })
    }

    /// Send and deserialize, also returning the `ETag` response header.
    pub async fn send_with_etag<T: DeserializeOwned>(self) -> ApiResult<(T, Option<String>)> {
        let response = self.send().await?;
        let etag = response.header(header::ETAG.as_str());
        Ok((parse_json_body(&response.body)?, etag))
    }

    pub async fn send_text(self) -> ApiResult<String> {
        Ok(self.accept_text().send().await?.body)
    }

    pub async fn send_empty(self) -> ApiResult<()> {
        self.send().await.map(|_| ())
    }
}

fn parse_json_body<T: DeserializeOwned>(body: &str) -> ApiResult<T> {
    let text = if body.trim().is_empty() { "null" } else { body };
    serde_json::from_str(text).map_err(|e| ApiError::ParseError {
        message: format!("{} (body: {})", e, truncate_chars(body, MAX_ERROR_BODY_CHARS)),
    })
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Pull the human-readable message out of an Azure DevOps error body.
pub(crate) fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| truncate_chars(body.trim(), MAX_ERROR_BODY_CHARS))
}

pub(crate) fn map_status_error(
    status: StatusCode,
    body: &str,
    resource: &str,
    retry_after: Option<Duration>,
) -> ApiError {
    let message = extract_error_message(body);
    match status.as_u16() {
        401 => ApiError::Unauthorized,
        403 => ApiError::Forbidden { message },
        404 => ApiError::NotFound {
            resource: if message.is_empty() {
                resource.to_string()
            } else {
                format!("{} ({})", resource, message)
            },
        },
        409 | 412 => ApiError::Conflict { message },
        429 => ApiError::RateLimited {
            retry_after_seconds: retry_after.map(|d| d.as_secs()).unwrap_or_default(),
        },
        code => ApiError::RequestFailed {
            status: code,
            message,
        },
    }
}
