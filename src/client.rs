use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tokio::runtime::Handle;
use tracing::debug;

use crate::config::Config;
use crate::error::SearchError;
use crate::models::SearchResult;

/// Matching is restricted to the login field.
const LOGIN_QUALIFIER: &str = " in:login";

/// A fully built `GET /search/users` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub endpoint: String,
    /// Percent-encoded query followed by the login qualifier.
    pub query_expression: String,
    pub page: u32,
    pub per_page: u32,
}

impl SearchRequest {
    pub fn url(&self) -> String {
        format!(
            "{}?q={}&page={}&per_page={}",
            self.endpoint,
            self.query_expression.replace(' ', "%20"),
            self.page,
            self.per_page
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issues the HTTP request. Futures are polled on the UI thread, so they need not be `Send`.
#[async_trait(?Send)]
pub trait Transport {
    /// Network failures are reported as `SearchError::Api` with status 0.
    async fn get(&self, request: &SearchRequest) -> Result<HttpResponse, SearchError>;
}

/// Creates a preconfigured HTTP client with required headers.
pub fn build_client(config: &Config) -> Result<Client> {
    use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};

    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&config.user_agent).context("Invalid user agent value")?,
    );
    headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github.v3+json"));

    Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .context("Failed to build HTTP client")
}

/// reqwest-backed transport. Requests run on the tokio runtime behind `runtime`;
/// the caller only awaits the join handle.
pub struct HttpTransport {
    client: Client,
    runtime: Handle,
}

impl HttpTransport {
    pub fn new(client: Client, runtime: Handle) -> Self {
        Self { client, runtime }
    }
}

#[async_trait(?Send)]
impl Transport for HttpTransport {
    async fn get(&self, request: &SearchRequest) -> Result<HttpResponse, SearchError> {
        let client = self.client.clone();
        let url = request.url();

        let task = self.runtime.spawn(async move {
            let response = client.get(&url).send().await?;
            let status = response.status().as_u16();
            let body = response.text().await?;
            Ok::<_, reqwest::Error>(HttpResponse { status, body })
        });

        match task.await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(SearchError::network(e.to_string())),
            Err(e) => Err(SearchError::network(format!("Request task failed: {e}"))),
        }
    }
}

/// Client for the GitHub Search Users endpoint.
pub struct SearchClient<T> {
    transport: T,
    endpoint: String,
}

impl<T: Transport> SearchClient<T> {
    pub fn new(transport: T, api_url: &str) -> Self {
        Self {
            transport,
            endpoint: format!("{}/search/users", api_url.trim_end_matches('/')),
        }
    }

    /// Searches GitHub users whose login matches `query`.
    ///
    /// Pagination values are checked before the transport is touched. Transport
    /// and API failures are returned as-is; nothing is retried.
    pub async fn search(
        &self,
        query: &str,
        page: i64,
        page_size: i64,
    ) -> Result<SearchResult, SearchError> {
        let request = self.request(query, page, page_size)?;

        debug!(url = %request.url(), "Searching users");
        let response = self.transport.get(&request).await?;

        if !response.is_success() {
            return Err(SearchError::from_response(response.status, response.body));
        }

        let payload: serde_json::Value =
            serde_json::from_str(&response.body).map_err(|e| SearchError::Api {
                status: response.status,
                message: format!("Failed to deserialize search response: {e}"),
                body: response.body.clone(),
            })?;

        let result = SearchResult::from_payload(payload)?;
        debug!(
            total = result.total_count,
            returned = result.items.len(),
            "Search settled"
        );
        Ok(result)
    }

    fn request(&self, query: &str, page: i64, page_size: i64) -> Result<SearchRequest, SearchError> {
        let (Ok(page), Ok(per_page)) = (u32::try_from(page), u32::try_from(page_size)) else {
            return Err(SearchError::InvalidPagination);
        };
        if page == 0 || per_page == 0 {
            return Err(SearchError::InvalidPagination);
        }

        Ok(SearchRequest {
            endpoint: self.endpoint.clone(),
            query_expression: format!("{}{LOGIN_QUALIFIER}", encode_query(query)),
            page,
            per_page,
        })
    }
}

/// Percent-encodes a URI component: every UTF-8 byte outside
/// `A-Z a-z 0-9 - _ . ! ~ * ' ( )` becomes `%XX`.
pub fn encode_query(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(byte as char),
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}
