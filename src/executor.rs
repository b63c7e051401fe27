//! # Query Executor
//!
//! Sends one SuiteQL query to the REST query service and turns the response
//! into a [`QueryResult`] or a classified [`QueryError`].

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER};
use serde::Deserialize;
use serde_json::{Map, Value};
use url::Url;

use crate::error::{ErrorDetail, QueryError};
use crate::oauth;
use crate::pagination::PageWindow;
use crate::profile::Credentials;

/// One row as returned by the service, columns in service order
pub type Row = Map<String, Value>;

static FETCH_FIRST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bFETCH\s+(FIRST|NEXT)\s+\d+\s+ROWS?\s+ONLY\b").unwrap());
static OFFSET_ROWS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bOFFSET\s+\d+\s+ROWS?\b").unwrap());

/// Immutable settings shared by every request of a process
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    pub credentials: Credentials,
    pub endpoint: Url,
    pub timeout: Duration,
}

/// Rows of one page plus the window that produced them
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub rows: Vec<Row>,
    pub window: PageWindow,
    /// Row count reported by the service for this page
    pub count: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultEnvelope {
    #[serde(default)]
    items: Vec<Row>,
    #[serde(default)]
    has_more: bool,
    count: Option<u64>,
    offset: Option<u64>,
    total_results: Option<u64>,
}

/// A fully prepared request: exact URL, headers and body
#[derive(Debug, Clone)]
pub struct SignedRequest {
    pub method: reqwest::Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Value,
}

pub struct QueryExecutor {
    client: reqwest::Client,
    config: ExecutorConfig,
}

impl QueryExecutor {
    pub fn new(config: ExecutorConfig) -> anyhow::Result<Self> {
        tracing::debug!("Creating query executor for {}", config.endpoint);
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Target URL with transport-level paging parameters.
    ///
    /// A bound already written into the query text wins; the matching
    /// parameter is left off so the service sees only one.
    pub fn target_url(&self, query: &str, window: &PageWindow) -> Url {
        let mut url = self.config.endpoint.clone();
        let limit = window.limit().filter(|_| !FETCH_FIRST.is_match(query));
        let offset = Some(window.offset())
            .filter(|offset| *offset > 0 || window.limit().is_some())
            .filter(|_| !OFFSET_ROWS.is_match(query));

        if window.limit().is_some() && limit.is_none() {
            tracing::debug!("Query text carries FETCH FIRST; not sending limit");
        }

        if limit.is_some() || offset.is_some() {
            let mut pairs = url.query_pairs_mut();
            if let Some(limit) = limit {
                pairs.append_pair("limit", &limit.to_string());
            }
            if let Some(offset) = offset {
                pairs.append_pair("offset", &offset.to_string());
            }
        }
        url
    }

    /// Build and sign the request with the given nonce and timestamp
    pub fn prepare(
        &self,
        query: &str,
        window: &PageWindow,
        nonce: &str,
        timestamp: i64,
    ) -> Result<SignedRequest, QueryError> {
        let method = reqwest::Method::POST;
        let url = self.target_url(query, window);
        let authorization = oauth::sign(
            method.as_str(),
            &url,
            &self.config.credentials,
            nonce,
            timestamp,
        );

        let authorization = authorization_header(&authorization)?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("prefer", HeaderValue::from_static("transient"));
        headers.insert(AUTHORIZATION, authorization);

        Ok(SignedRequest {
            method,
            url,
            headers,
            body: serde_json::json!({ "q": query }),
        })
    }

    /// Run `query` for the given window.
    ///
    /// The window passed in is never modified; the returned result carries an
    /// updated copy.
    pub async fn execute(&self, query: &str, window: &PageWindow) -> Result<QueryResult, QueryError> {
        let request = self.prepare(query, window, &oauth::generate_nonce(), oauth::current_timestamp())?;
        tracing::debug!("POST {}", request.url);

        let response = self
            .client
            .request(request.method, request.url)
            .headers(request.headers)
            .json(&request.body)
            .send()
            .await?;

        let status = response.status();
        let retry_after = parse_retry_after(response.headers());
        let body = response.text().await?;
        tracing::debug!("Response status {} ({} bytes)", status, body.len());

        if !status.is_success() {
            let err = QueryError::from_status(status.as_u16(), &body, retry_after);
            tracing::warn!("Query failed: {}", err);
            return Err(err);
        }

        parse_envelope(status.as_u16(), &body, window)
    }
}

fn authorization_header(value: &str) -> Result<HeaderValue, QueryError> {
    HeaderValue::from_str(value).map_err(|e| QueryError::Transport {
        message: format!("invalid Authorization header: {e}"),
        timed_out: false,
    })
}

/// `Retry-After` in delta-seconds form
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Parse a success body into rows and the updated window
pub fn parse_envelope(status: u16, body: &str, window: &PageWindow) -> Result<QueryResult, QueryError> {
    let envelope: ResultEnvelope = serde_json::from_str(body).map_err(|e| {
        QueryError::Server(ErrorDetail {
            status,
            code: None,
            message: format!("invalid response body: {e}"),
        })
    })?;

    let rows: Vec<Row> = envelope
        .items
        .into_iter()
        .map(|mut row| {
            row.shift_remove("links");
            row
        })
        .collect();

    Ok(QueryResult {
        window: window.after_response(envelope.offset, envelope.has_more, envelope.total_results),
        count: envelope.count.or(Some(rows.len() as u64)),
        rows,
    })
}
