// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Scan Engine
 * End-to-end scan orchestration: discovery, prioritization, adaptive
 * chunked dispatch and finding consolidation
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::adaptive_concurrency::ConcurrencyController;
use crate::config::ScannerConfig;
use crate::crawler::WebCrawler;
use crate::http_client::RequestEngine;
use crate::reporting::FindingConsolidator;
use crate::types::{
    CandidateParameter, Finding, ScanContext, ScanIntensity, ScanResults,
};
use anyhow::{Context, Result};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use url::Url;

pub mod registry;
pub mod sqli;
pub mod url_prioritizer;

pub use registry::{Scanner, ScannerKind, ScannerRegistry};
pub use sqli::SqliScanner;

use crate::payloads::{COMMON_ENDPOINTS, COMMON_PARAM_GUESSES, SKIP_PARAMS};

/// File extensions that never reach a database
const STATIC_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".ico", ".svg", ".css", ".js", ".pdf", ".doc",
    ".docx", ".xls", ".xlsx", ".zip", ".rar", ".tar", ".gz", ".mp3", ".mp4", ".avi", ".mov",
    ".ttf", ".woff", ".woff2", ".eot",
];

/// Discovery results below this size trigger endpoint synthesis
const SPARSE_DISCOVERY_THRESHOLD: usize = 5;

/// Drives one scan end to end and returns consolidated findings.
pub struct ScanEngine {
    config: ScannerConfig,
}

impl ScanEngine {
    pub fn new(config: ScannerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Run a full SQL injection scan against a seed URL.
    ///
    /// The overall deadline is enforced at chunk boundaries: when it fires,
    /// the scan stops early and keeps everything found so far.
    pub async fn execute_scan(
        &self,
        target: &str,
        intensity: ScanIntensity,
    ) -> Result<ScanResults> {
        let scan_id = uuid::Uuid::new_v4().to_string();
        let started_at = chrono::Utc::now();

        let target = normalize_target(target);
        Url::parse(&target).with_context(|| format!("invalid target URL: {}", target))?;

        info!(
            "Starting SQL injection scan {} for {} (intensity: {})",
            scan_id, target, intensity
        );

        let ctx = ScanContext::new(self.config.clone(), intensity);
        let engine = RequestEngine::new(
            ctx.config.request_timeout_secs,
            ctx.config.max_retries,
            ctx.rate_limiter.clone(),
            ctx.stats.clone(),
        )?;
        let registry = ScannerRegistry::new(engine.clone());
        let crawler = WebCrawler::new(engine.clone());

        let controller = ConcurrencyController::spawn(ctx.stats.clone());

        let mut discovered = crawler.discover(&target, ctx.intensity).await;
        discovered.insert(target.clone());

        if discovered.len() < SPARSE_DISCOVERY_THRESHOLD {
            // The crawler is best-effort; synthesize likely endpoints so a
            // JS-heavy or link-poor site still gets coverage
            let synthesized = self.synthesize_endpoints(&target, &engine).await;
            info!(
                "Sparse discovery ({} URLs); synthesized {} candidate endpoints",
                discovered.len(),
                synthesized.len()
            );
            discovered.extend(synthesized);
        }

        let prioritized = url_prioritizer::prioritize(discovered);
        info!("Testing {} prioritized URLs", prioritized.len());

        let mut findings: Vec<Finding> = Vec::new();
        let mut urls_tested = 0usize;
        let mut early_terminated = false;
        let tested_fingerprints: Arc<Mutex<HashSet<u64>>> =
            Arc::new(Mutex::new(HashSet::new()));

        let mut position = 0usize;
        let mut chunk_index = 0usize;
        while position < prioritized.len() {
            if ctx.deadline_exceeded() {
                warn!(
                    "Scan deadline reached after {} chunks; keeping completed findings",
                    chunk_index
                );
                early_terminated = true;
                break;
            }

            // Chunk size and concurrency follow the feedback controller
            let chunk_size = ctx.stats.chunk_size();
            let concurrency = ctx.stats.current_concurrency();
            let chunk: Vec<String> = prioritized[position..]
                .iter()
                .take(chunk_size)
                .cloned()
                .collect();
            position += chunk.len();
            chunk_index += 1;

            debug!(
                "Processing chunk {} ({} URLs, concurrency {})",
                chunk_index,
                chunk.len(),
                concurrency
            );

            let semaphore = Arc::new(Semaphore::new(concurrency));
            let chunk_futures = chunk.iter().map(|chunk_url| {
                let semaphore = semaphore.clone();
                let tested = tested_fingerprints.clone();
                let ctx = &ctx;
                let registry = &registry;
                let crawler = &crawler;
                async move {
                    let Ok(_permit) = semaphore.acquire().await else {
                        return None;
                    };
                    self.process_url(chunk_url, ctx, registry, crawler, &tested)
                        .await
                }
            });

            let chunk_results = futures::future::join_all(chunk_futures).await;
            for result in chunk_results {
                if let Some(url_findings) = result {
                    urls_tested += 1;
                    findings.extend(url_findings);
                }
            }

            info!(
                "Chunk {} done: {} findings so far ({} URLs tested)",
                chunk_index,
                findings.len(),
                urls_tested
            );
        }

        controller.abort();

        let findings = FindingConsolidator::consolidate(findings);

        let completed_at = chrono::Utc::now();
        let duration_seconds = (completed_at - started_at).num_milliseconds() as f64 / 1000.0;
        info!(
            "Scan {} completed in {:.2}s: {} findings",
            scan_id,
            duration_seconds,
            findings.len()
        );

        Ok(ScanResults {
            scan_id,
            target,
            findings,
            urls_tested,
            started_at: started_at.to_rfc3339(),
            completed_at: completed_at.to_rfc3339(),
            duration_seconds,
            early_terminated,
        })
    }

    /// Probe one URL: enumerate its candidate parameters and run the SQLi
    /// scanner over each. Returns None for URLs that were skipped.
    async fn process_url(
        &self,
        url: &str,
        ctx: &ScanContext,
        registry: &ScannerRegistry,
        crawler: &WebCrawler,
        tested: &Mutex<HashSet<u64>>,
    ) -> Option<Vec<Finding>> {
        if !should_scan_url(url) {
            return None;
        }
        {
            let mut seen = match tested.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if !seen.insert(url_fingerprint(url)) {
                return None;
            }
        }

        let mut findings = Vec::new();

        let mut candidates = query_candidates(url);
        // Parameterless endpoints still get probed through common
        // parameter guesses
        if candidates.is_empty() {
            candidates = guessed_candidates(url);
        }

        for param in &candidates {
            if ctx.deadline_exceeded() {
                return Some(findings);
            }
            if let Some(finding) = registry.sqli().scan_parameter(param, ctx).await {
                findings.push(finding);
            }
        }

        // Form fields discovered on the page are a separate surface
        for form in crawler.extract_forms(url).await {
            for param in &form.fields {
                if ctx.deadline_exceeded() {
                    return Some(findings);
                }
                if let Some(finding) = registry.sqli().scan_parameter(param, ctx).await {
                    findings.push(finding);
                }
            }
        }

        Some(findings)
    }

    /// Common-endpoint guesses for sparse discovery, kept only when the
    /// endpoint actually answers
    async fn synthesize_endpoints(
        &self,
        target: &str,
        engine: &RequestEngine,
    ) -> HashSet<String> {
        let mut synthesized = HashSet::new();
        let Ok(base) = Url::parse(target) else {
            return synthesized;
        };
        if base.host_str().is_none() {
            return synthesized;
        }
        let origin = base.origin().ascii_serialization();

        for endpoint in COMMON_ENDPOINTS {
            let candidate = format!("{}{}?id=1", origin, endpoint);
            match engine.get(&candidate).await {
                Ok(response) if response.status_code == 200 => {
                    synthesized.insert(candidate);
                }
                _ => {}
            }
        }

        synthesized
    }
}

fn normalize_target(target: &str) -> String {
    if target.starts_with("http://") || target.starts_with("https://") {
        target.to_string()
    } else {
        format!("http://{}", target)
    }
}

/// Static assets and unparseable URLs are never probed
fn should_scan_url(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    if !parsed.scheme().starts_with("http") || parsed.host_str().is_none() {
        return false;
    }

    let path = parsed.path().to_lowercase();
    !STATIC_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Stable URL identity for dedup: scheme, host, path and the sorted set of
/// parameter names (values excluded so payload variants collapse)
fn url_fingerprint(url: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    match Url::parse(url) {
        Ok(parsed) => {
            parsed.scheme().hash(&mut hasher);
            parsed.host_str().unwrap_or_default().hash(&mut hasher);
            parsed.path().hash(&mut hasher);
            let mut names: Vec<String> =
                parsed.query_pairs().map(|(k, _)| k.into_owned()).collect();
            names.sort();
            names.hash(&mut hasher);
        }
        Err(_) => url.hash(&mut hasher),
    }
    hasher.finish()
}

/// Candidate parameters from a URL's query string, skipping security tokens
fn query_candidates(url: &str) -> Vec<CandidateParameter> {
    let Ok(parsed) = Url::parse(url) else {
        return Vec::new();
    };

    parsed
        .query_pairs()
        .filter(|(name, _)| {
            let lower = name.to_lowercase();
            !SKIP_PARAMS.iter().any(|s| lower.contains(s))
        })
        .map(|(name, value)| {
            let value = if value.is_empty() {
                "1".to_string()
            } else {
                value.into_owned()
            };
            CandidateParameter::query(url, name.into_owned(), value)
        })
        .collect()
}

/// Synthesized candidates for endpoints without query parameters
fn guessed_candidates(url: &str) -> Vec<CandidateParameter> {
    COMMON_PARAM_GUESSES
        .iter()
        .map(|name| CandidateParameter::query(url, *name, "1"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_assets_are_skipped() {
        assert!(!should_scan_url("http://x.test/logo.png"));
        assert!(!should_scan_url("http://x.test/app.js"));
        assert!(should_scan_url("http://x.test/item.php?id=1"));
        assert!(!should_scan_url("ftp://x.test/file"));
        assert!(!should_scan_url("not a url"));
    }

    #[test]
    fn fingerprint_collapses_payload_variants() {
        let a = url_fingerprint("http://x.test/item?id=1");
        let b = url_fingerprint("http://x.test/item?id=1%27%20OR%201=1");
        assert_eq!(a, b);

        let c = url_fingerprint("http://x.test/item?id=1&page=2");
        assert_ne!(a, c);

        let d = url_fingerprint("http://x.test/other?id=1");
        assert_ne!(a, d);
    }

    #[test]
    fn query_candidates_skip_security_tokens() {
        let candidates =
            query_candidates("http://x.test/form?id=3&csrf_token=abc&q=test");
        let names: Vec<&str> = candidates.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "q"]);
        assert_eq!(candidates[0].original_value, "3");
    }

    #[test]
    fn empty_query_values_get_placeholder() {
        let candidates = query_candidates("http://x.test/search?q=");
        assert_eq!(candidates[0].original_value, "1");
    }

    #[test]
    fn parameterless_urls_get_guesses() {
        let candidates = guessed_candidates("http://x.test/products");
        assert!(!candidates.is_empty());
        assert!(candidates.iter().any(|c| c.name == "id"));
    }

    #[test]
    fn target_normalization_adds_scheme() {
        assert_eq!(normalize_target("x.test"), "http://x.test");
        assert_eq!(normalize_target("https://x.test"), "https://x.test");
    }
}
