// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Web Crawler Module
 * Bounded same-host URL discovery and injectable form-field extraction
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::http_client::RequestEngine;
use crate::types::{CandidateParameter, ParamLocation, ScanIntensity};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::collections::{HashSet, VecDeque};
use tracing::{debug, info};
use url::Url;

static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("static selector"));

static FORM_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("form").expect("static selector"));

static FIELD_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("input, textarea, select").expect("static selector"));

static OPTION_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("option").expect("static selector"));

/// Input types that carry no injectable value
const NON_INJECTABLE_TYPES: &[&str] = &[
    "submit", "button", "file", "image", "reset", "checkbox", "radio",
];

/// An extracted form with its resolved submission target
#[derive(Debug, Clone)]
pub struct DiscoveredForm {
    pub action: String,
    pub method: String,
    pub fields: Vec<CandidateParameter>,
}

/// Best-effort URL discovery for a seed. The orchestrator treats this as an
/// opaque source and must tolerate it returning very few URLs.
pub struct WebCrawler {
    engine: RequestEngine,
}

impl WebCrawler {
    pub fn new(engine: RequestEngine) -> Self {
        Self { engine }
    }

    /// Breadth-first same-host crawl bounded by the intensity's depth and
    /// URL budgets. Fetch failures just prune that branch.
    pub async fn discover(&self, seed: &str, intensity: ScanIntensity) -> HashSet<String> {
        let max_depth = intensity.crawl_depth();
        let budget = intensity.url_budget();

        let seed_url = match Url::parse(seed) {
            Ok(u) => u,
            Err(_) => return HashSet::new(),
        };
        let host = seed_url.host_str().unwrap_or_default().to_string();

        let mut discovered: HashSet<String> = HashSet::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<(String, u32)> = VecDeque::new();

        discovered.insert(seed.to_string());
        queue.push_back((seed.to_string(), 0));

        while let Some((url, depth)) = queue.pop_front() {
            if discovered.len() >= budget {
                break;
            }
            if depth >= max_depth || !visited.insert(url.clone()) {
                continue;
            }

            let response = match self.engine.get(&url).await {
                Ok(r) => r,
                Err(e) => {
                    debug!("Crawl fetch failed for {}: {}", url, e);
                    continue;
                }
            };
            if response.status_code != 200 {
                continue;
            }

            for link in extract_links(&response.body, &url) {
                let parsed = match Url::parse(&link) {
                    Ok(u) => u,
                    Err(_) => continue,
                };
                // Same-host only; fragments already stripped
                if parsed.host_str() != Some(host.as_str()) {
                    continue;
                }
                if discovered.insert(link.clone()) {
                    queue.push_back((link, depth + 1));
                    if discovered.len() >= budget {
                        break;
                    }
                }
            }
        }

        info!(
            "Crawl of {} discovered {} URLs (depth {}, budget {})",
            seed,
            discovered.len(),
            max_depth,
            budget
        );
        discovered
    }

    /// Fetch a page and extract its injectable form fields
    pub async fn extract_forms(&self, url: &str) -> Vec<DiscoveredForm> {
        match self.engine.get(url).await {
            Ok(response) if response.status_code == 200 => {
                extract_form_fields(&response.body, url)
            }
            _ => Vec::new(),
        }
    }
}

/// Collect absolute same-document links from a page body
pub fn extract_links(body: &str, base: &str) -> Vec<String> {
    let base_url = match Url::parse(base) {
        Ok(u) => u,
        Err(_) => return Vec::new(),
    };

    let document = Html::parse_document(body);
    let mut links = Vec::new();

    for element in document.select(&LINK_SELECTOR) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        if href.starts_with('#') || href.starts_with("javascript:") || href.starts_with("mailto:")
        {
            continue;
        }
        if let Ok(mut resolved) = base_url.join(href) {
            resolved.set_fragment(None);
            links.push(resolved.to_string());
        }
    }

    links
}

/// Extract injectable input surfaces from a page body.
///
/// Submit/button/file/image/reset/checkbox/radio fields are excluded;
/// hidden fields are kept (they routinely carry record ids). Each field
/// gets a type-appropriate probe value when the markup provides none.
pub fn extract_form_fields(body: &str, base: &str) -> Vec<DiscoveredForm> {
    let base_url = match Url::parse(base) {
        Ok(u) => u,
        Err(_) => return Vec::new(),
    };

    let document = Html::parse_document(body);
    let mut forms = Vec::new();

    for form in document.select(&FORM_SELECTOR) {
        let method = form
            .value()
            .attr("method")
            .unwrap_or("get")
            .to_lowercase();

        let action = match form.value().attr("action") {
            Some(action) if !action.is_empty() => base_url
                .join(action)
                .map(|u| u.to_string())
                .unwrap_or_else(|_| base.to_string()),
            _ => base.to_string(),
        };

        let mut fields = Vec::new();
        for field in form.select(&FIELD_SELECTOR) {
            let Some(name) = field.value().attr("name") else {
                continue;
            };
            let field_type = field.value().attr("type").unwrap_or("text").to_lowercase();
            if NON_INJECTABLE_TYPES.contains(&field_type.as_str()) {
                continue;
            }

            let value = match field.value().name() {
                "select" => field
                    .select(&OPTION_SELECTOR)
                    .find(|o| o.value().attr("selected").is_some())
                    .or_else(|| field.select(&OPTION_SELECTOR).next())
                    .and_then(|o| o.value().attr("value").map(|v| v.to_string()))
                    .unwrap_or_default(),
                _ => field.value().attr("value").unwrap_or("").to_string(),
            };

            let value = if value.is_empty() {
                default_probe_value(&field_type).to_string()
            } else {
                value
            };

            fields.push(CandidateParameter {
                url: action.clone(),
                name: name.to_string(),
                original_value: value,
                location: ParamLocation::Form,
                priority: 1.0,
            });
        }

        if !fields.is_empty() {
            forms.push(DiscoveredForm {
                action,
                method,
                fields,
            });
        }
    }

    forms
}

/// Probe value matched to the declared input type so the form still submits
fn default_probe_value(field_type: &str) -> &'static str {
    match field_type {
        "number" | "range" => "1",
        "email" => "test@example.com",
        "date" => "2022-01-01",
        "url" => "http://example.com",
        "tel" => "1234567890",
        "color" => "#ffffff",
        "password" => "password123",
        "search" => "test search",
        _ => "test123",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_resolve_against_base() {
        let body = r##"<html><body>
            <a href="/products?id=1">Products</a>
            <a href="detail.php?item=2">Detail</a>
            <a href="#top">Top</a>
            <a href="javascript:void(0)">Noop</a>
            <a href="https://other.example.org/external">External</a>
        </body></html>"##;

        let links = extract_links(body, "http://shop.example.com/catalog/");
        assert!(links.contains(&"http://shop.example.com/products?id=1".to_string()));
        assert!(links.contains(&"http://shop.example.com/catalog/detail.php?item=2".to_string()));
        assert!(links.iter().all(|l| !l.contains('#')));
        assert!(!links.iter().any(|l| l.contains("javascript")));
    }

    #[test]
    fn form_extraction_skips_non_injectable_fields() {
        let body = r#"<html><body><form action="/login" method="post">
            <input type="text" name="username" value="guest">
            <input type="password" name="password">
            <input type="hidden" name="record_id" value="42">
            <input type="submit" name="go" value="Log in">
            <input type="checkbox" name="remember">
            <input type="file" name="avatar">
        </form></body></html>"#;

        let forms = extract_form_fields(body, "http://example.com/index.html");
        assert_eq!(forms.len(), 1);

        let form = &forms[0];
        assert_eq!(form.action, "http://example.com/login");
        assert_eq!(form.method, "post");

        let names: Vec<&str> = form.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["username", "password", "record_id"]);
        assert!(form
            .fields
            .iter()
            .all(|f| f.location == ParamLocation::Form));
    }

    #[test]
    fn hidden_fields_keep_their_values() {
        let body = r#"<form action="/view"><input type="hidden" name="id" value="7"></form>"#;
        let forms = extract_form_fields(body, "http://example.com/");
        assert_eq!(forms[0].fields[0].original_value, "7");
    }

    #[test]
    fn empty_values_get_type_appropriate_defaults() {
        let body = r#"<form action="/s">
            <input type="search" name="q">
            <input type="number" name="page">
            <input type="email" name="contact">
        </form>"#;
        let forms = extract_form_fields(body, "http://example.com/");
        let values: Vec<&str> = forms[0]
            .fields
            .iter()
            .map(|f| f.original_value.as_str())
            .collect();
        assert_eq!(values, vec!["test search", "1", "test@example.com"]);
    }

    #[test]
    fn formless_page_yields_nothing() {
        assert!(extract_form_fields("<html><body><p>hi</p></body></html>", "http://x/").is_empty());
    }
}
