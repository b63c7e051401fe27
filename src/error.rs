//! # Query Error Taxonomy
//!
//! Every failure of a query execution is classified into one of a handful of
//! kinds so the caller can decide whether to retry, report or abort.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Status, service error code and message of a rejected request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDetail {
    pub status: u16,
    pub code: Option<String>,
    pub message: String,
}

impl std::fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.code {
            Some(code) => write!(f, "HTTP {} [{}]: {}", self.status, code, self.message),
            None => write!(f, "HTTP {}: {}", self.status, self.message),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    /// Signature rejected or credentials invalid (401/403)
    #[error("Authentication failed: {0}")]
    Auth(ErrorDetail),

    /// The service rejected the SuiteQL text or the request (400 and other 4xx)
    #[error("Query rejected: {0}")]
    Query(ErrorDetail),

    /// Too many requests (429)
    #[error("Rate limited: {detail}{}", retry_hint(.retry_after))]
    RateLimited {
        detail: ErrorDetail,
        retry_after: Option<Duration>,
    },

    /// 5xx, or a success response whose body is not a result envelope
    #[error("Server error: {0}")]
    Server(ErrorDetail),

    /// Connection, timeout and other failures below HTTP
    #[error("Transport error: {message}")]
    Transport { message: String, timed_out: bool },
}

fn retry_hint(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(delay) => format!(" (retry after {}s)", delay.as_secs()),
        None => String::new(),
    }
}

impl QueryError {
    /// Whether an outer loop may reasonably try the same request again
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Transport { .. })
    }

    /// Delay suggested by the service, if any
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Classify a non-success HTTP response
    pub fn from_status(status: u16, body: &str, retry_after: Option<Duration>) -> Self {
        let detail = parse_error_body(status, body);
        match status {
            401 | 403 => Self::Auth(detail),
            429 => Self::RateLimited {
                detail,
                retry_after,
            },
            500..=599 => Self::Server(detail),
            _ => Self::Query(detail),
        }
    }
}

impl From<reqwest::Error> for QueryError {
    fn from(err: reqwest::Error) -> Self {
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            message.push_str(&format!(": {cause}"));
            source = cause.source();
        }
        Self::Transport {
            message,
            timed_out: err.is_timeout(),
        }
    }
}

/// NetSuite REST error body
#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    title: Option<String>,
    #[serde(rename = "o:errorDetails", default)]
    error_details: Vec<ServiceErrorItem>,
}

#[derive(Debug, Deserialize)]
struct ServiceErrorItem {
    detail: Option<String>,
    #[serde(rename = "o:errorCode")]
    error_code: Option<String>,
}

/// Pull the message out of a structured error body, falling back to the raw text
pub fn parse_error_body(status: u16, body: &str) -> ErrorDetail {
    if let Ok(parsed) = serde_json::from_str::<ServiceErrorBody>(body) {
        let first = parsed.error_details.into_iter().next();
        let code = first.as_ref().and_then(|item| item.error_code.clone());
        let message = first
            .and_then(|item| item.detail)
            .or(parsed.title)
            .filter(|m| !m.trim().is_empty());
        if let Some(message) = message {
            return ErrorDetail {
                status,
                code,
                message,
            };
        }
    }

    let trimmed = body.trim();
    ErrorDetail {
        status,
        code: None,
        message: if trimmed.is_empty() {
            "(empty response body)".to_string()
        } else {
            trimmed.to_string()
        },
    }
}
