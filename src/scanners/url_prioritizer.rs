// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - URL Prioritizer
 * Orders discovered URLs by heuristic injection likelihood
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::payloads::{AUTH_PARAMS, ID_PARAMS, SEARCH_PARAMS};
use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use regex::{Regex, RegexBuilder};
use std::collections::HashSet;
use tracing::debug;
use url::Url;

/// Server-side script extensions that almost always sit in front of a query
const SCRIPT_EXTENSIONS: &[&str] = &[".php", ".asp", ".aspx", ".jsp", ".do", ".action", ".cgi"];

/// Path segments that suggest database-backed endpoints
const ENDPOINT_SEGMENTS: &[&str] = &[
    "admin", "login", "user", "account", "profile", "product", "item", "search", "api", "query",
    "report", "view", "show", "display", "list", "catalog", "category", "cart", "order", "shop",
    "store",
];

static ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(&format!(r"[?&]({})=\d+", ID_PARAMS.join("|")))
        .case_insensitive(true)
        .build()
        .expect("static id pattern")
});

static SEARCH_PATTERN: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(&format!(r"[?&]({})=", SEARCH_PARAMS.join("|")))
        .case_insensitive(true)
        .build()
        .expect("static search pattern")
});

static AUTH_PATTERN: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(&format!(r"[?&]({})=", AUTH_PARAMS.join("|")))
        .case_insensitive(true)
        .build()
        .expect("static auth pattern")
});

static NUMERIC_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/\d+(?:/|$)").expect("static segment pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    High,
    Medium,
    Low,
}

fn classify(url: &str) -> Tier {
    let path_lower = Url::parse(url)
        .map(|u| u.path().to_lowercase())
        .unwrap_or_default();

    // Numeric id parameters are the single most common injection point
    if ID_PATTERN.is_match(url) || SEARCH_PATTERN.is_match(url) || AUTH_PATTERN.is_match(url) {
        return Tier::High;
    }
    // Complex queries are frequently assembled by string concatenation
    if url.matches('=').count() > 2 {
        return Tier::High;
    }
    if SCRIPT_EXTENSIONS.iter().any(|e| path_lower.ends_with(e)) && url.contains('=') {
        return Tier::High;
    }

    if url.contains('=') {
        return Tier::Medium;
    }
    if ENDPOINT_SEGMENTS.iter().any(|s| path_lower.contains(s)) {
        return Tier::Medium;
    }
    if NUMERIC_SEGMENT.is_match(&path_lower) {
        return Tier::Medium;
    }

    Tier::Low
}

/// Order discovered URLs by vulnerability likelihood: high-risk first, each
/// tier independently shuffled so the request sequence stays unpredictable
/// to defensive systems.
pub fn prioritize(urls: HashSet<String>) -> Vec<String> {
    let mut high = Vec::new();
    let mut medium = Vec::new();
    let mut low = Vec::new();

    for url in urls {
        match classify(&url) {
            Tier::High => high.push(url),
            Tier::Medium => medium.push(url),
            Tier::Low => low.push(url),
        }
    }

    debug!(
        "URL priority breakdown: {} high, {} medium, {} low",
        high.len(),
        medium.len(),
        low.len()
    );

    let mut rng = rand::rng();
    high.shuffle(&mut rng);
    medium.shuffle(&mut rng);
    low.shuffle(&mut rng);

    let mut ordered = high;
    ordered.extend(medium);
    ordered.extend(low);
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_id_parameters_rank_high() {
        assert_eq!(classify("http://x.test/item.html?id=42"), Tier::High);
        assert_eq!(classify("http://x.test/p?product_id=7"), Tier::High);
    }

    #[test]
    fn search_and_auth_parameters_rank_high() {
        assert_eq!(classify("http://x.test/find?query=shoes"), Tier::High);
        assert_eq!(classify("http://x.test/a?username=bob"), Tier::High);
    }

    #[test]
    fn many_parameters_rank_high() {
        assert_eq!(
            classify("http://x.test/r?a=1&b=2&c=3"),
            Tier::High
        );
    }

    #[test]
    fn script_extension_with_parameter_ranks_high() {
        assert_eq!(classify("http://x.test/view.php?x=1"), Tier::High);
    }

    #[test]
    fn other_parameterized_urls_rank_medium() {
        assert_eq!(classify("http://x.test/page?theme=dark"), Tier::Medium);
    }

    #[test]
    fn endpoint_paths_rank_medium() {
        assert_eq!(classify("http://x.test/products"), Tier::Medium);
        assert_eq!(classify("http://x.test/resource/123"), Tier::Medium);
    }

    #[test]
    fn static_pages_rank_low() {
        assert_eq!(classify("http://x.test/imprint.html"), Tier::Low);
    }

    #[test]
    fn ordering_is_high_before_medium_before_low() {
        let urls: HashSet<String> = [
            "http://x.test/imprint.html",
            "http://x.test/page?theme=dark",
            "http://x.test/item.php?id=42",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let ordered = prioritize(urls);
        assert_eq!(ordered[0], "http://x.test/item.php?id=42");
        assert_eq!(ordered[1], "http://x.test/page?theme=dark");
        assert_eq!(ordered[2], "http://x.test/imprint.html");
    }

    #[test]
    fn prioritize_keeps_every_url() {
        let urls: HashSet<String> = (0..50)
            .map(|i| format!("http://x.test/page{}?id={}", i, i))
            .collect();
        assert_eq!(prioritize(urls.clone()).len(), urls.len());
    }
}
