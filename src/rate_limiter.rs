// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Adaptive Rate Limiter
 * Per-host token bucket with error-driven backoff and performance-driven
 * rate adjustment
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::errors::ErrorKind;
use rand::Rng;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

/// Number of recent response times kept per host
const RESPONSE_WINDOW_CAP: usize = 10;

/// Rate limiter configuration
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimiterConfig {
    /// Requests per second granted to a freshly seen host
    #[serde(default = "default_base_rate")]
    pub base_rate: f64,

    /// Token bucket capacity (burst size)
    #[serde(default = "default_burst")]
    pub burst_capacity: f64,

    /// Hard floor; the limiter never throttles below this
    #[serde(default = "default_min_rate")]
    pub min_rate: f64,
}

fn default_base_rate() -> f64 {
    5.0
}

fn default_burst() -> f64 {
    10.0
}

fn default_min_rate() -> f64 {
    0.1
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            base_rate: default_base_rate(),
            burst_capacity: default_burst(),
            min_rate: default_min_rate(),
        }
    }
}

impl RateLimiterConfig {
    /// Recovery ceiling: hosts may earn up to 5x the configured base rate
    pub fn max_rate(&self) -> f64 {
        self.base_rate * 5.0
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.base_rate <= 0.0 || self.burst_capacity < 1.0 {
            anyhow::bail!("rate limiter base_rate/burst_capacity out of range");
        }
        if self.min_rate <= 0.0 || self.min_rate > self.base_rate {
            anyhow::bail!("rate limiter min_rate out of range");
        }
        Ok(())
    }
}

/// Per-host bucket plus rolling performance statistics.
/// Mutated only while the limiter's lock is held; no I/O under the lock.
#[derive(Debug)]
struct DomainRateState {
    tokens: f64,
    capacity: f64,
    rate_per_sec: f64,
    last_refill: Instant,
    consecutive_errors: u32,
    consecutive_successes: u32,
    response_window: VecDeque<f64>,
    error_kind_counts: HashMap<ErrorKind, u32>,
    failures: u64,
    successes: u64,
}

impl DomainRateState {
    fn new(config: &RateLimiterConfig) -> Self {
        Self {
            tokens: config.burst_capacity,
            capacity: config.burst_capacity,
            rate_per_sec: config.base_rate,
            last_refill: Instant::now(),
            consecutive_errors: 0,
            consecutive_successes: 0,
            response_window: VecDeque::with_capacity(RESPONSE_WINDOW_CAP),
            error_kind_counts: HashMap::new(),
            failures: 0,
            successes: 0,
        }
    }

    /// Replenish tokens from elapsed wall time, capped at capacity
    fn refill(&mut self, now: Instant) {
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.rate_per_sec).min(self.capacity);
        self.last_refill = now;
    }

    fn avg_response_time(&self) -> f64 {
        if self.response_window.is_empty() {
            return 0.0;
        }
        self.response_window.iter().sum::<f64>() / self.response_window.len() as f64
    }

    fn error_rate(&self) -> f64 {
        let total = self.failures + self.successes;
        if total == 0 {
            return 0.0;
        }
        self.failures as f64 / total as f64
    }

    fn push_response_time(&mut self, elapsed: f64) {
        if self.response_window.len() == RESPONSE_WINDOW_CAP {
            self.response_window.pop_front();
        }
        self.response_window.push_back(elapsed);
    }

    fn set_rate(&mut self, rate: f64, config: &RateLimiterConfig) {
        self.rate_per_sec = rate.clamp(config.min_rate, config.max_rate());
    }
}

/// Host-level performance view exposed to the concurrency controller
#[derive(Debug, Clone, Default)]
pub struct HostPerformance {
    pub avg_response_time: f64,
    pub error_rate: f64,
    pub current_rate: f64,
}

/// Adaptive rate limiter with per-host token buckets.
///
/// Hosts that respond quickly and cleanly earn more throughput; hosts that
/// error or slow down get throttled and backed off, down to a hard floor.
pub struct AdaptiveRateLimiter {
    config: RateLimiterConfig,
    hosts: Mutex<HashMap<String, DomainRateState>>,
}

impl AdaptiveRateLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            hosts: Mutex::new(HashMap::new()),
        }
    }

    /// Non-blocking token check: consumes one token if available
    pub async fn acquire(&self, host: &str) -> bool {
        let mut hosts = self.hosts.lock().await;
        let state = hosts
            .entry(host.to_string())
            .or_insert_with(|| DomainRateState::new(&self.config));

        state.refill(Instant::now());
        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            debug!("Rate limiting applied for host: {}", host);
            false
        }
    }

    /// Wait until a token is admitted for this host.
    ///
    /// Applies exponential backoff with jitter scaled by consecutive errors
    /// before polling the bucket; the poll interval tracks the inverse of
    /// the current rate and stretches further on slow hosts.
    pub async fn wait_for_token(&self, host: &str) {
        let (backoff, poll_base, slow_factor) = {
            let mut hosts = self.hosts.lock().await;
            let state = hosts
                .entry(host.to_string())
                .or_insert_with(|| DomainRateState::new(&self.config));

            let backoff = if state.consecutive_errors > 0 {
                let factor = 2f64
                    .powi(state.consecutive_errors.saturating_sub(1) as i32)
                    .min(30.0);
                let critical = *state
                    .error_kind_counts
                    .get(&ErrorKind::Critical)
                    .unwrap_or(&0);
                // Up to 3.5x longer backoff when critical errors accumulate
                let critical_scale = 1.0 + 0.5 * (critical.min(5) as f64);
                Some(factor * critical_scale)
            } else {
                None
            };

            let avg = state.avg_response_time();
            let slow_factor = if avg > 2.0 {
                (avg / 2.0).min(3.0)
            } else {
                1.0
            };

            (backoff, 1.0 / state.rate_per_sec, slow_factor)
        };

        if let Some(base) = backoff {
            let sleep_secs = base * jitter(0.75, 1.25);
            debug!(
                "Backing off {:.2}s for {} before next request",
                sleep_secs, host
            );
            tokio::time::sleep(Duration::from_secs_f64(sleep_secs)).await;
        }

        while !self.acquire(host).await {
            let wait = poll_base * jitter(1.0, 1.2) * slow_factor;
            tokio::time::sleep(Duration::from_secs_f64(wait)).await;
        }
    }

    /// Record a successful request and its elapsed time.
    ///
    /// Fast, consistently healthy hosts earn up to 1.2x rate increases,
    /// capped at five times the configured base rate.
    pub async fn report_success(&self, host: &str, elapsed: Duration) {
        let mut hosts = self.hosts.lock().await;
        let state = hosts
            .entry(host.to_string())
            .or_insert_with(|| DomainRateState::new(&self.config));

        state.consecutive_successes += 1;
        state.consecutive_errors = 0;
        state.successes += 1;
        state.push_response_time(elapsed.as_secs_f64());

        let avg = state.avg_response_time();
        if avg < 0.5 && state.consecutive_successes >= 5 {
            let new_rate = (state.rate_per_sec * 1.2).min(self.config.max_rate());
            if new_rate > state.rate_per_sec {
                debug!(
                    "Increasing rate for {}: {:.2} -> {:.2} req/s (fast responses)",
                    host, state.rate_per_sec, new_rate
                );
                state.set_rate(new_rate, &self.config);
            }
        } else if state.rate_per_sec < self.config.base_rate
            && state.consecutive_successes >= 5
        {
            // Gradually restore a previously throttled host toward base
            let increase = 1.0 + (state.consecutive_successes as f64 * 0.02).min(0.2);
            let new_rate = (state.rate_per_sec * increase).min(self.config.base_rate);
            if new_rate > state.rate_per_sec {
                debug!(
                    "Restoring rate for {}: {:.2} -> {:.2} req/s after {} successes",
                    host, state.rate_per_sec, new_rate, state.consecutive_successes
                );
                state.set_rate(new_rate, &self.config);
            }
        }
    }

    /// Record a failed request. Critical errors halve the rate immediately;
    /// three or more consecutive errors of any kind reduce it by 30%.
    pub async fn report_error(&self, host: &str, kind: ErrorKind) {
        let mut hosts = self.hosts.lock().await;
        let state = hosts
            .entry(host.to_string())
            .or_insert_with(|| DomainRateState::new(&self.config));

        state.consecutive_errors += 1;
        state.consecutive_successes = 0;
        state.failures += 1;
        *state.error_kind_counts.entry(kind).or_insert(0) += 1;

        if kind == ErrorKind::Critical || state.consecutive_errors >= 3 {
            let reduction = if kind == ErrorKind::Critical { 0.5 } else { 0.7 };
            let new_rate = (state.rate_per_sec * reduction).max(self.config.min_rate);
            debug!(
                "Reducing rate for {}: {:.2} -> {:.2} req/s ({} errors)",
                host, state.rate_per_sec, new_rate, kind
            );
            state.set_rate(new_rate, &self.config);
        }
    }

    /// Current performance view for a host
    pub async fn performance_snapshot(&self, host: &str) -> HostPerformance {
        let hosts = self.hosts.lock().await;
        hosts
            .get(host)
            .map(|s| HostPerformance {
                avg_response_time: s.avg_response_time(),
                error_rate: s.error_rate(),
                current_rate: s.rate_per_sec,
            })
            .unwrap_or_default()
    }

    /// Current rate for a host (base rate for unseen hosts)
    pub async fn current_rate(&self, host: &str) -> f64 {
        let hosts = self.hosts.lock().await;
        hosts
            .get(host)
            .map(|s| s.rate_per_sec)
            .unwrap_or(self.config.base_rate)
    }
}

fn jitter(lo: f64, hi: f64) -> f64 {
    rand::rng().random_range(lo..hi)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter() -> AdaptiveRateLimiter {
        AdaptiveRateLimiter::new(RateLimiterConfig {
            base_rate: 5.0,
            burst_capacity: 10.0,
            min_rate: 0.1,
        })
    }

    #[tokio::test]
    async fn acquire_consumes_burst() {
        let limiter = limiter();

        // Burst capacity admits the first ten requests immediately
        for _ in 0..10 {
            assert!(limiter.acquire("example.com").await);
        }
        assert!(!limiter.acquire("example.com").await);
    }

    #[tokio::test]
    async fn hosts_are_isolated() {
        let limiter = limiter();

        for _ in 0..10 {
            assert!(limiter.acquire("a.example.com").await);
        }
        assert!(!limiter.acquire("a.example.com").await);
        assert!(limiter.acquire("b.example.com").await);
    }

    #[tokio::test]
    async fn critical_error_halves_rate() {
        let limiter = limiter();
        let host = "example.com";

        limiter.report_error(host, ErrorKind::Critical).await;
        assert!((limiter.current_rate(host).await - 2.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn consecutive_transient_errors_reduce_rate() {
        let limiter = limiter();
        let host = "example.com";

        limiter.report_error(host, ErrorKind::Transient).await;
        limiter.report_error(host, ErrorKind::Transient).await;
        assert!((limiter.current_rate(host).await - 5.0).abs() < 1e-9);

        limiter.report_error(host, ErrorKind::Transient).await;
        assert!(limiter.current_rate(host).await < 5.0);
    }

    #[tokio::test]
    async fn rate_never_leaves_bounds() {
        let limiter = limiter();
        let host = "example.com";
        let max_rate = 25.0;

        // Hammer with errors: must floor at min_rate
        for _ in 0..50 {
            limiter.report_error(host, ErrorKind::Critical).await;
        }
        let rate = limiter.current_rate(host).await;
        assert!(rate >= 0.1 - 1e-9, "rate {} fell below floor", rate);

        // Then flood with fast successes: must cap at 5x base
        for _ in 0..200 {
            limiter
                .report_success(host, Duration::from_millis(50))
                .await;
        }
        let rate = limiter.current_rate(host).await;
        assert!(rate <= max_rate + 1e-9, "rate {} exceeded cap", rate);
    }

    #[tokio::test]
    async fn fast_successes_raise_rate() {
        let limiter = limiter();
        let host = "example.com";

        for _ in 0..10 {
            limiter
                .report_success(host, Duration::from_millis(100))
                .await;
        }
        assert!(limiter.current_rate(host).await > 5.0);
    }

    #[tokio::test]
    async fn success_resets_error_streak() {
        let limiter = limiter();
        let host = "example.com";

        limiter.report_error(host, ErrorKind::Transient).await;
        limiter.report_error(host, ErrorKind::Transient).await;
        limiter
            .report_success(host, Duration::from_millis(100))
            .await;
        // A third error after the reset is a streak of one, not three
        limiter.report_error(host, ErrorKind::Transient).await;
        assert!((limiter.current_rate(host).await - 5.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn snapshot_tracks_error_rate() {
        let limiter = limiter();
        let host = "example.com";

        limiter
            .report_success(host, Duration::from_millis(100))
            .await;
        limiter.report_error(host, ErrorKind::Transient).await;

        let perf = limiter.performance_snapshot(host).await;
        assert!((perf.error_rate - 0.5).abs() < 1e-9);
        assert!(perf.avg_response_time > 0.0);
    }
}
