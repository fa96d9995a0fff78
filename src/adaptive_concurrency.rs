// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Adaptive Concurrency Module
 * Scan-wide performance counters and the feedback loop that retunes
 * concurrency and chunk size from observed error rates and latency
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info};

/// Chunk size bounds for the orchestrator
const MIN_CHUNK_SIZE: usize = 10;
const MAX_CHUNK_SIZE: usize = 50;

/// How often the feedback loop inspects the counters
pub const ADJUSTMENT_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
struct StatsInner {
    requests_total: u64,
    requests_successful: u64,
    requests_failed: u64,
    avg_response_time: f64,
    current_concurrency: usize,
    min_concurrency: usize,
    max_concurrency: usize,
    chunk_size: usize,
}

/// Per-scan performance counters. One instance lives in the ScanContext;
/// the request engine writes, the feedback controller and orchestrator read.
/// All access is a short lock hold with no I/O.
pub struct PerformanceStats {
    inner: Mutex<StatsInner>,
}

impl PerformanceStats {
    pub fn new(
        initial_concurrency: usize,
        min_concurrency: usize,
        max_concurrency: usize,
        initial_chunk_size: usize,
    ) -> Self {
        let min_concurrency = min_concurrency.max(1).min(max_concurrency);
        let initial = initial_concurrency.clamp(min_concurrency, max_concurrency);
        Self {
            inner: Mutex::new(StatsInner {
                requests_total: 0,
                requests_successful: 0,
                requests_failed: 0,
                avg_response_time: 0.0,
                current_concurrency: initial,
                min_concurrency,
                max_concurrency,
                chunk_size: initial_chunk_size.clamp(MIN_CHUNK_SIZE, MAX_CHUNK_SIZE),
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StatsInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn record_success(&self, elapsed: Duration) {
        let mut inner = self.lock();
        inner.requests_total += 1;
        inner.requests_successful += 1;

        let secs = elapsed.as_secs_f64();
        if inner.avg_response_time == 0.0 {
            inner.avg_response_time = secs;
        } else {
            // Weighted moving average favoring recent samples
            inner.avg_response_time = 0.8 * inner.avg_response_time + 0.2 * secs;
        }
    }

    pub fn record_failure(&self) {
        let mut inner = self.lock();
        inner.requests_total += 1;
        inner.requests_failed += 1;
    }

    pub fn error_rate(&self) -> f64 {
        let inner = self.lock();
        if inner.requests_total == 0 {
            return 0.0;
        }
        inner.requests_failed as f64 / inner.requests_total as f64
    }

    pub fn avg_response_time(&self) -> f64 {
        self.lock().avg_response_time
    }

    pub fn current_concurrency(&self) -> usize {
        self.lock().current_concurrency
    }

    pub fn chunk_size(&self) -> usize {
        self.lock().chunk_size
    }

    pub fn requests_total(&self) -> u64 {
        self.lock().requests_total
    }

    /// One adjustment round over the counters. Called by the feedback loop;
    /// exposed for deterministic testing.
    pub fn adjust(&self) {
        let mut inner = self.lock();
        if inner.requests_total == 0 {
            return;
        }

        let error_rate = inner.requests_failed as f64 / inner.requests_total as f64;
        let avg = inner.avg_response_time;
        let current = inner.current_concurrency;

        let new_concurrency = if error_rate > 0.2 || avg > 3.0 {
            // Significant problems: halve
            (current / 2).max(inner.min_concurrency)
        } else if error_rate > 0.1 || avg > 2.0 {
            // Moderate problems: back off by a quarter
            ((current as f64 * 0.75) as usize).max(inner.min_concurrency)
        } else if error_rate < 0.05 && avg < 1.0 {
            // Healthy target: ramp up to 20%
            let factor = 1.0 + (0.2 * (1.0 - error_rate) * (1.0 / avg.max(0.5))).min(0.2);
            ((current as f64 * factor) as usize).min(inner.max_concurrency)
        } else {
            current
        };

        if new_concurrency != current {
            info!(
                "Adjusting concurrency: {} -> {} (error rate: {:.2}, avg response: {:.2}s)",
                current, new_concurrency, error_rate, avg
            );
            inner.current_concurrency = new_concurrency;
        }

        let chunk = inner.chunk_size;
        let new_chunk = if error_rate > 0.2 || avg > 3.0 {
            ((chunk as f64 / 1.5) as usize).max(MIN_CHUNK_SIZE)
        } else if error_rate < 0.1 && avg < 1.0 {
            ((chunk as f64 * 1.5) as usize).min(MAX_CHUNK_SIZE)
        } else {
            chunk
        };

        if new_chunk != chunk {
            debug!("Adjusting chunk size: {} -> {}", chunk, new_chunk);
            inner.chunk_size = new_chunk;
        }
    }
}

/// Periodic feedback controller.
///
/// Spawned alongside the scan; the returned handle is aborted when the scan
/// completes or its deadline fires.
pub struct ConcurrencyController;

impl ConcurrencyController {
    pub fn spawn(stats: std::sync::Arc<PerformanceStats>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(ADJUSTMENT_INTERVAL).await;
                stats.adjust();
            }
        })
    }
}
