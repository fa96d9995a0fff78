// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Response Fingerprinting
 * Stable structural digests of response bodies for similarity scoring
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use once_cell::sync::Lazy;
use scraper::{Html, Selector};

static STRUCTURE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title, h1, h2, h3").expect("static selector"));

static META_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("meta[content]").expect("static selector"));

static CHROME_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("nav, header, footer").expect("static selector"));

static PARAGRAPH_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p").expect("static selector"));

/// Bodies beyond this length are compared via sampled windows
const LARGE_BODY_THRESHOLD: usize = 10_000;

fn truncated(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect::<String>().trim().to_string()
}

/// Derive a stable digest of a response body.
///
/// Markup bodies contribute their title/heading text, meta content, page
/// chrome snippets and early paragraph excerpts; script and style content
/// never reaches the digest (scraper ignores non-rendered text). Non-markup
/// bodies fall back to fixed-offset snippets so the digest stays comparable.
pub fn fingerprint(body: &str) -> String {
    let document = Html::parse_document(body);

    let mut parts: Vec<String> = Vec::new();

    for element in document.select(&STRUCTURE_SELECTOR) {
        let text = element.text().collect::<String>();
        if !text.trim().is_empty() {
            parts.push(truncated(&text, 50));
        }
    }

    for element in document.select(&META_SELECTOR) {
        if let Some(content) = element.value().attr("content") {
            if !content.trim().is_empty() {
                parts.push(truncated(content, 30));
            }
        }
    }

    for element in document.select(&CHROME_SELECTOR) {
        let text = element.text().collect::<String>();
        if !text.trim().is_empty() {
            parts.push(truncated(&text, 20));
        }
    }

    for element in document.select(&PARAGRAPH_SELECTOR).take(5) {
        let text = element.text().collect::<String>();
        if !text.trim().is_empty() {
            parts.push(truncated(&text, 50));
        }
    }

    if !parts.is_empty() {
        return parts.join("||");
    }

    // Non-markup fallback: fixed-offset snippets keep digests of JSON or
    // plain-text bodies comparable without hashing away small differences
    let chars: Vec<char> = body.chars().collect();
    if chars.len() > 500 {
        let snippets: Vec<String> = (0..500)
            .step_by(100)
            .map(|offset| chars[offset..(offset + 50).min(chars.len())].iter().collect())
            .collect();
        snippets.join("||")
    } else {
        body.to_string()
    }
}

/// Similarity of two digests (or raw bodies) in [0, 1].
///
/// Combines a length-ratio term (weight 0.4) with a positional character
/// match ratio (weight 0.6). Wildly different lengths short-circuit to a
/// heavy penalty. Symmetric; identical inputs score exactly 1.0.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    if a.len() > LARGE_BODY_THRESHOLD || b.len() > LARGE_BODY_THRESHOLD {
        return sampled_similarity(a, b);
    }

    weighted_similarity(a, b)
}

fn weighted_similarity(a: &str, b: &str) -> f64 {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    let length_ratio =
        a_chars.len().min(b_chars.len()) as f64 / a_chars.len().max(b_chars.len()) as f64;
    if length_ratio < 0.5 {
        return length_ratio * 0.5;
    }

    let matches = a_chars
        .iter()
        .zip(b_chars.iter())
        .filter(|(x, y)| x == y)
        .count();
    let positional_ratio = matches as f64 / a_chars.len().max(b_chars.len()) as f64;

    length_ratio * 0.4 + positional_ratio * 0.6
}

/// Large bodies: compare head, middle and tail windows instead of the
/// full content
fn sampled_similarity(a: &str, b: &str) -> f64 {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    let sample = (a_chars.len().min(b_chars.len()) / 10).max(1000);
    let window = sample / 3;

    let windows_of = |chars: &[char]| -> [String; 3] {
        let len = chars.len();
        let head: String = chars[..window.min(len)].iter().collect();
        let mid_start = len / 2;
        let middle: String = chars[mid_start..(mid_start + window).min(len)].iter().collect();
        let tail: String = chars[len.saturating_sub(window)..].iter().collect();
        [head, middle, tail]
    };

    let a_windows = windows_of(&a_chars);
    let b_windows = windows_of(&b_chars);

    let total: f64 = a_windows
        .iter()
        .zip(b_windows.iter())
        .map(|(x, y)| weighted_similarity(x, y))
        .sum();
    total / 3.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_input_scores_one() {
        let body = "<html><head><title>Products</title></head><body><p>Welcome to the shop</p></body></html>";
        let fp = fingerprint(body);
        assert!((similarity(&fp, &fp) - 1.0).abs() < 1e-12);
        assert!((similarity(body, body) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn similarity_is_symmetric() {
        let a = "Welcome back, user";
        let b = "Error: access denied for user";
        assert!((similarity(a, b) - similarity(b, a)).abs() < 1e-12);
    }

    #[test]
    fn script_content_does_not_reach_fingerprint() {
        let with_script = "<html><head><title>Page</title><script>var session='abc123';</script></head><body><p>Hello</p></body></html>";
        let without_script =
            "<html><head><title>Page</title></head><body><p>Hello</p></body></html>";
        assert_eq!(fingerprint(with_script), fingerprint(without_script));
    }

    #[test]
    fn markup_fingerprint_captures_headings() {
        let body = "<html><body><h1>Order history</h1><p>Nothing here yet</p></body></html>";
        let fp = fingerprint(body);
        assert!(fp.contains("Order history"));
        assert!(fp.contains("Nothing here yet"));
    }

    #[test]
    fn plain_text_falls_back_to_snippets() {
        let body = "just a short error string";
        assert_eq!(fingerprint(body), body);

        let long_body = "x".repeat(2000);
        let fp = fingerprint(&long_body);
        assert!(fp.contains("||"));
    }

    #[test]
    fn very_different_lengths_are_penalized() {
        let a = "Welcome";
        let b = "a".repeat(500);
        assert!(similarity(a, &b) < 0.25);
    }

    #[test]
    fn divergent_bodies_score_below_identical() {
        let a = "Welcome";
        let b = "Error: access denied";
        let score = similarity(a, b);
        assert!(score < 0.7, "expected divergence, got {}", score);
    }

    #[test]
    fn large_bodies_use_window_sampling() {
        let a = "a".repeat(20_000);
        let b = "a".repeat(20_000);
        assert!((similarity(&a, &b) - 1.0).abs() < 1e-12);

        let mut c = "a".repeat(20_000);
        c.push_str(&"b".repeat(20_000));
        assert!(similarity(&a, &c) < 1.0);
    }
}
