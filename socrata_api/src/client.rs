//! HTTP client for Socrata Open Data (SODA) endpoints.

use std::time::Duration;

use crate::{
    query::{encode_query, QueryParams},
    table::{DataTable, ResponseFormat},
    Error,
};

/// Rows fetched per page when paging and no `limit` parameter is set.
pub const DEFAULT_PAGE_SIZE: u64 = 1000;

/// Client for one SODA resource endpoint.
///
/// Holds the endpoint, the application token, and the query parameters,
/// and keeps the derived request URL in step with them: every mutation
/// re-derives the URL while a token is set, so no fetch can run against
/// a URL that predates the latest change. Each request builds a fresh
/// `reqwest::Client` with a 30-second timeout.
///
/// One instance covers one logical query session; it owns no shared or
/// persistent state.
pub struct Client {
    /// Resource URL; its suffix (`.json`, `.csv`) selects the decoder.
    endpoint: String,
    token: Option<String>,
    params: QueryParams,
    /// Derived request URL. `Some` exactly while a token is set.
    url: Option<String>,
}

impl Client {
    /// Creates a client for `endpoint` with no token and no parameters.
    /// URL derivation is deferred until a token is set.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: None,
            params: QueryParams::new(),
            url: None,
        }
    }

    /// Sets the application token at construction time and derives the
    /// request URL. An empty token is left unset.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        if !token.is_empty() {
            self.token = Some(token);
            self.rebuild_url();
        }
        self
    }

    /// Merges `params` into the query at construction time, deriving the
    /// request URL if a token is already set.
    pub fn with_params(mut self, params: QueryParams) -> Self {
        self.params.merge(params);
        self.rebuild_url();
        self
    }

    /// Stores the token and re-derives the request URL. An empty token
    /// is a credential error.
    pub fn set_token(&mut self, token: impl Into<String>) -> Result<(), Error> {
        let token = token.into();
        if token.is_empty() {
            return Err(Error::MissingToken);
        }
        self.token = Some(token);
        self.rebuild_url();
        Ok(())
    }

    /// Replaces the parameter mapping and re-derives the request URL.
    /// Fails with a credential error if no token is set.
    pub fn set_params(&mut self, params: QueryParams) -> Result<(), Error> {
        self.params = params;
        if self.token.is_none() {
            return Err(Error::MissingToken);
        }
        self.rebuild_url();
        Ok(())
    }

    /// Merges `params` into the existing mapping (incoming keys win) and
    /// re-derives the request URL while a token is set. With no token,
    /// derivation stays deferred as at construction.
    pub fn update_params(&mut self, params: QueryParams) {
        self.params.merge(params);
        self.rebuild_url();
    }

    /// Recomputes the derived URL from the current token and parameters.
    /// A no-op while no token is set.
    fn rebuild_url(&mut self) {
        if let Some(token) = self.token.as_deref() {
            let mut raw = format!("{}?$$app_token={}", self.endpoint, token);
            for (key, value) in self.params.iter() {
                raw.push_str(&format!("&${}={}", key, value));
            }
            self.url = Some(encode_query(&raw));
        }
    }

    /// The derived request URL. Fails with a credential error while no
    /// token is set; the failure does not touch the stored URL.
    pub fn url(&self) -> Result<&str, Error> {
        self.url.as_deref().ok_or(Error::MissingToken)
    }

    /// Current query parameters.
    pub fn params(&self) -> &QueryParams {
        &self.params
    }

    /// Resource endpoint this client was constructed for.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Issues one GET against the derived URL and returns the raw body.
    pub async fn fetch_raw(&self) -> Result<String, Error> {
        let url = self.url()?.to_string();
        self.get(&url).await
    }

    async fn get(&self, url: &str) -> Result<String, Error> {
        tracing::debug!("GET {}", url);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                Error::Transport(e)
            })?;
        let resp = client.get(url).send().await.map_err(|e| {
            tracing::error!("Failed to reach endpoint: {}", e);
            Error::Transport(e)
        })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| {
            tracing::error!("Failed to read response body: {}", e);
            Error::Transport(e)
        })?;

        if !status.is_success() {
            let snippet = truncate_body(&body);
            tracing::error!("Request failed with status {}: {}", status, snippet);
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: snippet,
            });
        }

        Ok(body)
    }

    /// Fetches one page and decodes it into a [`DataTable`]. The decoder
    /// comes from the endpoint suffix; an unsupported suffix fails
    /// before any network I/O.
    pub async fn fetch_table(&self) -> Result<DataTable, Error> {
        let format = ResponseFormat::from_endpoint(&self.endpoint)?;
        let body = self.fetch_raw().await?;
        DataTable::decode(format, &body)
    }

    /// Fetches the full result set page by page and returns the
    /// concatenation, in fetch order.
    ///
    /// The page size is the `limit` parameter if one is set and numeric,
    /// otherwise `page_size`. Pages are requested strictly sequentially
    /// at offsets 0, limit, 2*limit, ... until one comes back with zero
    /// rows; an empty first page yields an empty table. A transport or
    /// decode failure on any page aborts the whole fetch and discards
    /// the pages accumulated so far. The final `limit`/`offset` values
    /// remain in the parameter map afterwards.
    pub async fn fetch_all_pages(&mut self, page_size: u64) -> Result<DataTable, Error> {
        let format = ResponseFormat::from_endpoint(&self.endpoint)?;
        let limit = self
            .params
            .get("limit")
            .and_then(|v| v.as_u64())
            .unwrap_or(page_size);

        let mut acc = DataTable::new();
        let mut offset = 0u64;
        loop {
            self.update_params(QueryParams::new().with_limit(limit).with_offset(offset));
            let body = self.fetch_raw().await?;
            let page = DataTable::decode(format, &body)?;
            if page.is_empty() {
                break;
            }
            tracing::debug!("page at offset {} has {} rows", offset, page.len());
            acc.append(page);
            offset += limit;
        }
        Ok(acc)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 2000;
    if body.len() <= MAX {
        body.to_string()
    } else {
        format!("{}...[truncated]", &body[..MAX])
    }
}
