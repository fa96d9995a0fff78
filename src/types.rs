// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use crate::adaptive_concurrency::PerformanceStats;
use crate::config::ScannerConfig;
use crate::rate_limiter::AdaptiveRateLimiter;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Scan intensity determines crawl depth and URL budget
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ScanIntensity {
    Low,
    Medium,
    High,
    Max,
}

impl Default for ScanIntensity {
    fn default() -> Self {
        ScanIntensity::Medium
    }
}

impl std::fmt::Display for ScanIntensity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ScanIntensity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanIntensity::Low => "low",
            ScanIntensity::Medium => "medium",
            ScanIntensity::High => "high",
            ScanIntensity::Max => "max",
        }
    }

    /// Crawl depth budget for this intensity
    pub fn crawl_depth(&self) -> u32 {
        match self {
            ScanIntensity::Low => 1,
            ScanIntensity::Medium => 3,
            ScanIntensity::High => 5,
            ScanIntensity::Max => 15,
        }
    }

    /// Maximum number of URLs the crawler may return
    pub fn url_budget(&self) -> usize {
        match self {
            ScanIntensity::Low => 25,
            ScanIntensity::Medium => 100,
            ScanIntensity::High => 400,
            ScanIntensity::Max => 1000,
        }
    }
}

/// Severity levels, ordered for consolidation (critical wins)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl Severity {
    /// Numeric rank used when merging findings (higher wins)
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 4,
            Severity::High => 3,
            Severity::Medium => 2,
            Severity::Low => 1,
            Severity::Info => 0,
        }
    }

    pub fn max(self, other: Severity) -> Severity {
        if other.rank() > self.rank() {
            other
        } else {
            self
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Critical => write!(f, "critical"),
            Severity::High => write!(f, "high"),
            Severity::Medium => write!(f, "medium"),
            Severity::Low => write!(f, "low"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A confirmed vulnerability finding. Immutable once created; the
/// consolidator builds new values rather than mutating in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub id: String,
    pub name: String,
    pub severity: Severity,
    pub url: String,
    pub parameter: String,
    pub evidence: String,
    pub remediation: String,
}

impl Finding {
    pub fn new(
        name: impl Into<String>,
        severity: Severity,
        url: impl Into<String>,
        parameter: impl Into<String>,
        evidence: impl Into<String>,
        remediation: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            severity,
            url: url.into(),
            parameter: parameter.into(),
            evidence: evidence.into(),
            remediation: remediation.into(),
        }
    }
}

/// Where an injectable parameter lives in the request
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ParamLocation {
    Query,
    Form,
    Header,
    Cookie,
    JsonBody,
}

impl ParamLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamLocation::Query => "query",
            ParamLocation::Form => "form",
            ParamLocation::Header => "header",
            ParamLocation::Cookie => "cookie",
            ParamLocation::JsonBody => "jsonBody",
        }
    }
}

/// An input surface selected for injection testing. Transient, not persisted.
#[derive(Debug, Clone)]
pub struct CandidateParameter {
    pub url: String,
    pub name: String,
    pub original_value: String,
    pub location: ParamLocation,
    pub priority: f64,
}

impl CandidateParameter {
    pub fn query(
        url: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
            original_value: value.into(),
            location: ParamLocation::Query,
            priority: 1.0,
        }
    }
}

/// Reference response captured once per (url, parameter) before payload
/// testing. Must be refreshed whenever the target URL changes.
#[derive(Debug, Clone)]
pub struct BaselineResponse {
    pub status_code: u16,
    pub body_length: usize,
    pub fingerprint: String,
    pub elapsed_secs: f64,
}

/// Final results handed back to the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResults {
    pub scan_id: String,
    pub target: String,
    pub findings: Vec<Finding>,
    pub urls_tested: usize,
    pub started_at: String,
    pub completed_at: String,
    pub duration_seconds: f64,
    #[serde(default)]
    pub early_terminated: bool,
}

/// Per-scan state bundle passed into every component. Replaces the
/// class-level shared attributes of older designs; nothing here outlives
/// the scan and there are no process-wide singletons.
pub struct ScanContext {
    pub config: ScannerConfig,
    pub intensity: ScanIntensity,
    pub rate_limiter: Arc<AdaptiveRateLimiter>,
    pub stats: Arc<PerformanceStats>,
    pub started_at: Instant,
    pub deadline: Instant,
}

impl ScanContext {
    pub fn new(config: ScannerConfig, intensity: ScanIntensity) -> Self {
        let rate_limiter = Arc::new(AdaptiveRateLimiter::new(config.rate_limiter.clone()));
        let stats = Arc::new(PerformanceStats::new(
            config.initial_concurrency,
            config.min_concurrency,
            config.max_concurrency,
            config.initial_chunk_size,
        ));
        let started_at = Instant::now();
        let deadline = started_at + Duration::from_secs(config.scan_timeout_secs);

        Self {
            config,
            intensity,
            rate_limiter,
            stats,
            started_at,
            deadline,
        }
    }

    /// True once the overall scan budget is exhausted
    pub fn deadline_exceeded(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// Time left before the overall deadline
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_merge_keeps_highest() {
        assert_eq!(Severity::Medium.max(Severity::Critical), Severity::Critical);
        assert_eq!(Severity::Critical.max(Severity::Low), Severity::Critical);
        assert_eq!(Severity::Info.max(Severity::Info), Severity::Info);
    }

    #[test]
    fn finding_gets_fresh_identity() {
        let a = Finding::new("SQL Injection", Severity::High, "http://x/", "id", "e", "r");
        let b = Finding::new("SQL Injection", Severity::High, "http://x/", "id", "e", "r");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn intensity_budgets_scale() {
        assert!(ScanIntensity::Low.url_budget() < ScanIntensity::Max.url_budget());
        assert!(ScanIntensity::Low.crawl_depth() < ScanIntensity::Max.crawl_depth());
    }
}
