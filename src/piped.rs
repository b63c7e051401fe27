//! # Piped Mode
//!
//! Runs one query read from a file or standard input and prints the result
//! as JSON on stdout. Rate limiting and transport failures are retried a
//! bounded number of times; everything else fails the run.

use std::future::Future;
use std::io::Read;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::error::QueryError;
use crate::executor::{QueryExecutor, QueryResult};
use crate::pagination::PageWindow;
use crate::render::{OutputMode, ResultRenderer};

/// Retry behavior for retryable failures
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Consecutive retryable failures before giving up
    pub max_attempts: u32,
    /// Wait used when the service suggests none
    pub default_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            default_delay: Duration::from_secs(1),
        }
    }
}

/// Read the query from `path`, or from stdin when there is none
pub fn read_query(path: Option<&str>) -> Result<String> {
    let text = match path {
        Some(path) => {
            let expanded = shellexpand::tilde(path).into_owned();
            std::fs::read_to_string(&expanded)
                .with_context(|| format!("Failed to read query file '{path}'"))?
        }
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read query from stdin")?;
            text
        }
    };

    let query = text.trim().trim_end_matches(';').trim_end().to_string();
    if query.is_empty() {
        bail!("No query provided");
    }
    Ok(query)
}

/// Call `attempt` until it succeeds, fails for good, or runs out of retries
pub async fn execute_with_retry<F, Fut>(
    policy: RetryPolicy,
    mut attempt: F,
) -> Result<QueryResult, QueryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<QueryResult, QueryError>>,
{
    let mut failures = 0;
    loop {
        match attempt().await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_retryable() && failures + 1 < policy.max_attempts => {
                failures += 1;
                let delay = e.retry_after().unwrap_or(policy.default_delay);
                tracing::warn!(
                    "{} (attempt {}/{}), retrying in {:?}",
                    e,
                    failures,
                    policy.max_attempts,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Run a single query and print it in JSON form
pub async fn run_piped<R: ResultRenderer>(
    executor: &QueryExecutor,
    renderer: &R,
    query: &str,
    window: PageWindow,
    policy: RetryPolicy,
) -> Result<()> {
    eprintln!("Running query...");
    let window = &window;
    let result = execute_with_retry(policy, || executor.execute(query, window)).await?;
    tracing::debug!("Received {} rows", result.rows.len());

    println!("{}", renderer.render(&result, OutputMode::Json)?);
    Ok(())
}
