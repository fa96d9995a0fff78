// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - HTTP Request Engine
 * Rate-limited request execution with failure classification and
 * transient-only retry
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::adaptive_concurrency::PerformanceStats;
use crate::errors::{classify_reqwest_error, ErrorKind, ScannerError, ScannerResult};
use crate::rate_limiter::AdaptiveRateLimiter;
use anyhow::{Context, Result};
use rand::Rng;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use url::Url;

/// Realistic browser User-Agents, rotated across requests
const BROWSER_USER_AGENTS: &[&str] = &[
    // Chrome on Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    // Chrome on macOS
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    // Firefox on Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    // Safari on macOS
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
    // Edge on Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0",
];

fn next_user_agent() -> &'static str {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let index = COUNTER.fetch_add(1, Ordering::Relaxed) % BROWSER_USER_AGENTS.len();
    BROWSER_USER_AGENTS[index]
}

/// Maximum response body size (10MB) to prevent memory exhaustion
const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

const DEFAULT_POOL_IDLE_PER_HOST: usize = 32;

/// HTTP method selector for probe requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    Get,
    PostForm,
    PostJson,
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status_code: u16,
    pub body: String,
    pub headers: HashMap<String, String>,
    pub elapsed: Duration,
}

impl HttpResponse {
    pub fn contains(&self, pattern: &str) -> bool {
        self.body.contains(pattern)
    }

    pub fn header(&self, name: &str) -> Option<&String> {
        self.headers.get(&name.to_lowercase())
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}

/// Rate-limited HTTP driver shared by all probes in one scan.
///
/// Every request waits for the target host's token, runs under a bounded
/// timeout, and reports its outcome (elapsed time or classified error) back
/// to the rate limiter and the scan's performance counters. Only transient
/// failures are retried.
#[derive(Clone)]
pub struct RequestEngine {
    client: Arc<Client>,
    timeout: Duration,
    max_retries: u32,
    rate_limiter: Arc<AdaptiveRateLimiter>,
    stats: Arc<PerformanceStats>,
}

impl RequestEngine {
    pub fn new(
        timeout_secs: u64,
        max_retries: u32,
        rate_limiter: Arc<AdaptiveRateLimiter>,
        stats: Arc<PerformanceStats>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(next_user_agent())
            .pool_max_idle_per_host(DEFAULT_POOL_IDLE_PER_HOST)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .tcp_nodelay(true)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client: Arc::new(client),
            timeout: Duration::from_secs(timeout_secs),
            max_retries,
            rate_limiter,
            stats,
        })
    }

    /// The per-request timeout; time-blind probes treat a timeout as a
    /// delay of exactly this long.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn host_of(url: &str) -> String {
        Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_string()))
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Send a GET request
    pub async fn get(&self, url: &str) -> ScannerResult<HttpResponse> {
        self.request(url, RequestMethod::Get, None, None).await
    }

    /// Send a GET request with extra headers
    pub async fn get_with_headers(
        &self,
        url: &str,
        headers: Vec<(String, String)>,
    ) -> ScannerResult<HttpResponse> {
        self.request(url, RequestMethod::Get, Some(headers), None)
            .await
    }

    /// POST a form-encoded body
    pub async fn post_form(&self, url: &str, body: String) -> ScannerResult<HttpResponse> {
        self.request(url, RequestMethod::PostForm, None, Some(body))
            .await
    }

    /// POST a JSON body
    pub async fn post_json(
        &self,
        url: &str,
        json: &serde_json::Value,
    ) -> ScannerResult<HttpResponse> {
        self.request(url, RequestMethod::PostJson, None, Some(json.to_string()))
            .await
    }

    /// Single-shot GET with no retry. A timeout surfaces as
    /// `ScannerError::Timeout` so time-blind probes can count it as
    /// maximal delay instead of losing the signal to retries.
    pub async fn get_once(&self, url: &str) -> ScannerResult<HttpResponse> {
        let host = Self::host_of(url);
        self.rate_limiter.wait_for_token(&host).await;

        let started = Instant::now();
        let outcome = self.perform(url, RequestMethod::Get, None, None).await;
        let elapsed = started.elapsed();

        match outcome {
            Ok(response) => {
                match ErrorKind::from_status(response.status_code) {
                    Some(kind) => self.rate_limiter.report_error(&host, kind).await,
                    None => {
                        self.rate_limiter.report_success(&host, elapsed).await;
                        self.stats.record_success(elapsed);
                    }
                }
                Ok(HttpResponse { elapsed, ..response })
            }
            Err(err) => {
                let kind = classify_reqwest_error(&err);
                self.rate_limiter.report_error(&host, kind).await;
                self.stats.record_failure();

                if err.is_timeout() {
                    Err(ScannerError::Timeout {
                        duration: self.timeout,
                    })
                } else {
                    Err(ScannerError::Request {
                        url: url.to_string(),
                        kind,
                        reason: err.to_string(),
                    })
                }
            }
        }
    }

    /// Issue one request under the rate limiter's gate, retrying transient
    /// failures with exponential backoff. Exhausted retries return an error;
    /// the caller must treat the probe as untestable, not as clean.
    pub async fn request(
        &self,
        url: &str,
        method: RequestMethod,
        headers: Option<Vec<(String, String)>>,
        body: Option<String>,
    ) -> ScannerResult<HttpResponse> {
        let host = Self::host_of(url);
        let mut attempt = 0u32;
        let mut last_kind = ErrorKind::Transient;
        let mut last_reason = String::new();

        loop {
            self.rate_limiter.wait_for_token(&host).await;

            let started = Instant::now();
            let outcome = self.perform(url, method, headers.as_deref(), body.as_deref()).await;
            let elapsed = started.elapsed();

            match outcome {
                Ok(response) => {
                    // Error-class statuses still carry a body the detection
                    // logic needs, so they are returned, but 429/5xx feed the
                    // limiter's backoff instead of counting as successes.
                    match ErrorKind::from_status(response.status_code) {
                        Some(kind) => {
                            self.rate_limiter.report_error(&host, kind).await;
                            self.stats.record_failure();

                            if kind == ErrorKind::Transient && attempt < self.max_retries {
                                attempt += 1;
                                self.backoff(attempt).await;
                                continue;
                            }
                        }
                        None => {
                            self.rate_limiter.report_success(&host, elapsed).await;
                            self.stats.record_success(elapsed);
                        }
                    }
                    return Ok(HttpResponse { elapsed, ..response });
                }
                Err(err) => {
                    let kind = classify_reqwest_error(&err);
                    self.rate_limiter.report_error(&host, kind).await;
                    self.stats.record_failure();

                    last_kind = kind;
                    last_reason = err.to_string();
                    debug!("Request error ({}) for {}: {}", kind, url, last_reason);

                    if kind.is_retryable() && attempt < self.max_retries {
                        attempt += 1;
                        self.backoff(attempt).await;
                        continue;
                    }

                    break;
                }
            }
        }

        warn!(
            "Request to {} failed after {} attempts: {}",
            url,
            attempt + 1,
            last_reason
        );
        Err(ScannerError::Request {
            url: url.to_string(),
            kind: last_kind,
            reason: last_reason,
        })
    }

    async fn perform(
        &self,
        url: &str,
        method: RequestMethod,
        headers: Option<&[(String, String)]>,
        body: Option<&str>,
    ) -> Result<HttpResponse, reqwest::Error> {
        let mut builder = match method {
            RequestMethod::Get => self.client.get(url),
            RequestMethod::PostForm => self
                .client
                .post(url)
                .header("Content-Type", "application/x-www-form-urlencoded"),
            RequestMethod::PostJson => self
                .client
                .post(url)
                .header("Content-Type", "application/json")
                .header("Accept", "*/*"),
        };

        if let Some(headers) = headers {
            for (key, value) in headers {
                builder = builder.header(key, value);
            }
        }
        if let Some(body) = body {
            builder = builder.body(body.to_string());
        }

        let response = builder.send().await?;
        let status_code = response.status().as_u16();

        let headers_map = {
            let headers = response.headers();
            let mut map = HashMap::with_capacity(headers.len());
            for (k, v) in headers.iter() {
                if let Ok(value) = v.to_str() {
                    map.insert(k.as_str().to_lowercase(), value.to_string());
                }
            }
            map
        };

        let body_bytes = response.bytes().await.unwrap_or_default();
        let body = if body_bytes.len() > MAX_BODY_SIZE {
            String::from_utf8_lossy(&body_bytes[..MAX_BODY_SIZE]).to_string()
        } else {
            String::from_utf8_lossy(&body_bytes).to_string()
        };

        Ok(HttpResponse {
            status_code,
            body,
            headers: headers_map,
            elapsed: Duration::ZERO,
        })
    }

    /// Retry backoff: min(60, 2^attempt) seconds with 0.75-1.25 jitter
    async fn backoff(&self, attempt: u32) {
        let base = 2f64.powi(attempt as i32).min(60.0);
        let jitter = rand::rng().random_range(0.75..1.25);
        let delay = Duration::from_secs_f64(base * jitter);
        debug!("Retrying in {:.2}s (attempt {})", delay.as_secs_f64(), attempt);
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_extraction() {
        assert_eq!(
            RequestEngine::host_of("https://example.com/a?id=1"),
            "example.com"
        );
        assert_eq!(RequestEngine::host_of("not a url"), "unknown");
    }

    #[test]
    fn user_agents_rotate() {
        let first = next_user_agent();
        let mut saw_other = false;
        for _ in 0..BROWSER_USER_AGENTS.len() {
            if next_user_agent() != first {
                saw_other = true;
            }
        }
        assert!(saw_other);
    }

    #[test]
    fn response_header_lookup_is_case_insensitive() {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "text/html".to_string());
        let response = HttpResponse {
            status_code: 200,
            body: String::new(),
            headers,
            elapsed: Duration::from_millis(10),
        };
        assert_eq!(
            response.header("Content-Type"),
            Some(&"text/html".to_string())
        );
    }
}
