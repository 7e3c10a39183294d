//! HTTP client for the `custom/v1/strings` REST routes.
//!
//! Every operation checks the credential preconditions before touching the
//! network and funnels HTTP and transport failures through one mapping, so
//! callers only ever branch on [`SnippetError`] or a [`SaveResult`] status.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::credentials::Credentials;
use crate::error::SnippetError;
use crate::models::{
    DEFAULT_PAGE_SIZE, ListResponse, ListResult, SaveResponse, SaveResult, SingleResponse,
    Snippet, extract_error_message,
};
use crate::preview;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Remote snippet store operations.
///
/// Implemented by [`SnippetClient`]; the coordinator depends on this trait so
/// the remote can be replaced in tests.
#[async_trait]
pub trait SnippetApi: Send + Sync {
    /// Create a new snippet. Never fails: every failure is folded into the result.
    async fn save(&self, text: &str, category: &str, creds: &Credentials) -> SaveResult;

    /// Fetch one page of snippets, newest first, optionally filtered by `search`.
    async fn list(
        &self,
        page: u64,
        search: &str,
        creds: &Credentials,
    ) -> Result<ListResult, SnippetError>;

    /// Fetch a single snippet for preview, copy or insert.
    async fn get_one(&self, id: i64, creds: &Credentials) -> Result<Snippet, SnippetError>;
}

/// Client tuning knobs.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Per-request timeout. This is the only deadline applied to a save.
    pub timeout: Duration,
    /// `per_page` sent on list requests.
    pub page_size: u32,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            page_size: DEFAULT_PAGE_SIZE,
            user_agent: format!("wp-snippets/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// reqwest-backed implementation of [`SnippetApi`].
#[derive(Debug, Clone)]
pub struct SnippetClient {
    http: Client,
    config: ClientConfig,
}

impl SnippetClient {
    pub fn new(config: ClientConfig) -> Self {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .unwrap_or_else(|e| {
                warn!(
                    error = %e,
                    user_agent = %config.user_agent,
                    "Failed to build HTTP client, falling back to defaults"
                );
                Client::new()
            });

        Self { http, config }
    }

    /// Use an existing reqwest client (shared connection pool, proxies).
    pub fn with_client(http: Client, config: ClientConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn authorized(&self, request: RequestBuilder, creds: &Credentials) -> RequestBuilder {
        request.header(AUTHORIZATION, creds.basic_auth_header())
    }

    async fn try_save(
        &self,
        text: &str,
        category: &str,
        creds: &Credentials,
    ) -> Result<Option<i64>, SnippetError> {
        let endpoint = creds.strings_endpoint()?;
        debug!(
            url = %endpoint,
            username = %creds.username,
            text = %preview(text, 50),
            "Sending save request"
        );

        let request = self
            .http
            .post(endpoint)
            .json(&json!({ "text_string": text, "category": category }));
        let response = self.authorized(request, creds).send().await?;

        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), "Save response received");

        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        // An empty or non-JSON 2xx body still counts as saved.
        let parsed: SaveResponse = serde_json::from_str(&body).unwrap_or_default();
        if parsed.success == Some(false) {
            let message = parsed
                .message
                .unwrap_or_else(|| extract_error_message(&body, &status_line(status)));
            return Err(SnippetError::Remote {
                status: status.as_u16(),
                message,
            });
        }

        Ok(parsed.post_id)
    }

    async fn fetch_page(
        &self,
        page: u64,
        search: &str,
        creds: &Credentials,
    ) -> Result<ListResponse, SnippetError> {
        let endpoint = creds.strings_endpoint()?;
        let mut request = self.http.get(endpoint).query(&[
            ("page", page.to_string()),
            ("per_page", self.config.page_size.to_string()),
        ]);
        if !search.is_empty() {
            request = request.query(&[("search", search)]);
        }
        debug!(page, search = %search, "Listing snippets");

        let body: ListResponse = self.fetch_json(self.authorized(request, creds)).await?;
        if body.success == Some(false) {
            return Err(SnippetError::Remote {
                status: StatusCode::OK.as_u16(),
                message: body
                    .message
                    .unwrap_or_else(|| "server reported failure".to_string()),
            });
        }
        Ok(body)
    }

    /// Send an authorized GET and decode a 2xx JSON body.
    async fn fetch_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, SnippetError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(status_error(status, &body));
        }
        Ok(serde_json::from_str(&body)?)
    }
}

impl Default for SnippetClient {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

#[async_trait]
impl SnippetApi for SnippetClient {
    async fn save(&self, text: &str, category: &str, creds: &Credentials) -> SaveResult {
        match self.try_save(text, category, creds).await {
            Ok(post_id) => {
                info!(post_id = ?post_id, category = %category, "Text saved");
                SaveResult::success(post_id)
            }
            Err(e) => {
                warn!(kind = e.kind(), error = %e, "Save failed");
                e.into()
            }
        }
    }

    async fn list(
        &self,
        page: u64,
        search: &str,
        creds: &Credentials,
    ) -> Result<ListResult, SnippetError> {
        let page = page.max(1);
        let search = search.trim();

        let mut fetched = page;
        let mut body = self.fetch_page(page, search, creds).await?;
        let total = body.total.unwrap_or(body.data.len() as u64);
        let total_pages = total.div_ceil(u64::from(self.config.page_size.max(1)));

        // Past the end: show the last page instead of an empty one.
        if total_pages >= 1 && page > total_pages {
            debug!(page, total_pages, "Requested page out of range, fetching last page");
            fetched = total_pages;
            body = self.fetch_page(total_pages, search, creds).await?;
        }

        let total = body.total.unwrap_or(body.data.len() as u64);
        let current = body.current_page.unwrap_or(fetched);
        Ok(ListResult::from_page(
            body.data,
            total,
            self.config.page_size,
            current,
        ))
    }

    async fn get_one(&self, id: i64, creds: &Credentials) -> Result<Snippet, SnippetError> {
        let endpoint = creds.snippet_endpoint(id)?;
        debug!(id, "Fetching snippet");

        let request = self.authorized(self.http.get(endpoint), creds);
        let body: SingleResponse = self.fetch_json(request).await?;
        if body.success == Some(false) {
            return Err(SnippetError::NotFound(format!("snippet {id}")));
        }
        Ok(body.data)
    }
}

fn status_line(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    }
}

fn status_error(status: StatusCode, body: &str) -> SnippetError {
    let message = extract_error_message(body, &status_line(status));
    SnippetError::from_status(status.as_u16(), message)
}
