//! Rate-limited HTTP fetcher
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the pooled HTTP client with the crawler's user agent
//! - Global request pacing through a single shared gate
//! - Bounded retry with exponential backoff on transient statuses
//! - Transport error classification

use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;
use url::Url;

/// User agent sent with every request
pub const USER_AGENT: &str = "wapper/0.1 (+mirror)";

/// Per-request timeout; there is no crawl-wide deadline
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// HTTP statuses that trigger a retry
const TRANSIENT_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Total attempts per URL: the first try plus two retries
const MAX_ATTEMPTS: u32 = 3;

/// Transport-level fetch failure: no response was produced
///
/// The coordinator converts these into per-URL crawl records; they never
/// abort the run.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out for {url}")]
    Timeout { url: String },

    #[error("connection failed for {url}: {message}")]
    Connect { url: String, message: String },

    #[error("transport error for {url}: {message}")]
    Transport { url: String, message: String },
}

/// A completed HTTP exchange, body fully read
#[derive(Debug)]
pub struct FetchedResponse {
    pub status: u16,
    /// Whether the status is in the 2xx range
    pub success: bool,
    /// Lower-cased media type with parameters stripped, if the header was
    /// present
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Builds the pooled HTTP client shared by the whole crawl
///
/// Redirects are followed (reqwest's default limit), compressed bodies are
/// decoded transparently.
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Global pacing gate enforcing a minimum interval between fetch starts
///
/// The mutex is held across the sleep, so all concurrent callers serialize
/// on the gate and request starts stay at least `1/rate_rps` seconds apart
/// crawl-wide. Callers suspend while waiting; nothing busy-waits.
#[derive(Debug)]
pub struct RateGate {
    interval: Duration,
    last_start: Mutex<Option<Instant>>,
}

impl RateGate {
    pub fn new(rate_rps: f64) -> Self {
        Self {
            interval: Duration::from_secs_f64(1.0 / rate_rps.max(0.1)),
            last_start: Mutex::new(None),
        }
    }

    /// Waits until this caller is allowed to start a request
    pub async fn wait(&self) {
        let mut last = self.last_start.lock().await;
        if let Some(previous) = *last {
            let next_allowed = previous + self.interval;
            let now = Instant::now();
            if next_allowed > now {
                tokio::time::sleep_until(next_allowed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

/// HTTP fetcher combining the shared client and the pacing gate
#[derive(Debug)]
pub struct Fetcher {
    client: Client,
    gate: RateGate,
}

impl Fetcher {
    pub fn new(client: Client, rate_rps: f64) -> Self {
        Self {
            client,
            gate: RateGate::new(rate_rps),
        }
    }

    /// Fetches a URL with pacing and bounded retry
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | HTTP 429/500/502/503/504 | Retry up to 2 more times, sleeping 2^attempt seconds |
    /// | Any other status | Return the response as-is |
    /// | Timeout / connect / other transport fault | Immediate error, no retry |
    ///
    /// A transient status that survives all attempts is still returned as a
    /// normal response; escalating it is the caller's decision.
    pub async fn fetch(&self, url: &Url) -> Result<FetchedResponse, FetchError> {
        let mut attempt = 0;
        loop {
            self.gate.wait().await;

            let response = self
                .client
                .get(url.clone())
                .send()
                .await
                .map_err(|e| classify_error(url, e))?;

            let status = response.status().as_u16();
            if TRANSIENT_STATUSES.contains(&status) && attempt + 1 < MAX_ATTEMPTS {
                tracing::debug!(
                    "Transient HTTP {} from {}, retrying (attempt {}/{})",
                    status,
                    url,
                    attempt + 1,
                    MAX_ATTEMPTS
                );
                tokio::time::sleep(Duration::from_secs(1 << attempt)).await;
                attempt += 1;
                continue;
            }

            return read_response(url, response).await;
        }
    }
}

/// Drains the body and extracts the pieces the crawler cares about
async fn read_response(
    url: &Url,
    response: reqwest::Response,
) -> Result<FetchedResponse, FetchError> {
    let status = response.status();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().to_lowercase());

    let body = response
        .bytes()
        .await
        .map_err(|e| classify_error(url, e))?
        .to_vec();

    Ok(FetchedResponse {
        status: status.as_u16(),
        success: status.is_success(),
        content_type,
        body,
    })
}

/// Classifies a reqwest error into a fetch error kind
fn classify_error(url: &Url, error: reqwest::Error) -> FetchError {
    let url = url.to_string();
    if error.is_timeout() {
        FetchError::Timeout { url }
    } else if error.is_connect() {
        FetchError::Connect {
            url,
            message: error.to_string(),
        }
    } else {
        FetchError::Transport {
            url,
            message: error.to_string(),
        }
    }
}
