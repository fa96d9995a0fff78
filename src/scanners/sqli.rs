// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - SQL Injection Detection Engine
 * Error-based, UNION-based, boolean-blind and time-blind probing with
 * confirmation rounds and false-positive filtering
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::errors::{ScannerError, ScannerResult};
use crate::fingerprint::{fingerprint, similarity};
use crate::http_client::{HttpResponse, RequestEngine};
use crate::payloads::{
    DbmsFamily, PayloadSelector, SKIP_PARAMS, SQL_ERROR_PATTERNS, SQL_TUTORIAL_PATTERNS,
};
use crate::types::{
    BaselineResponse, CandidateParameter, Finding, ParamLocation, ScanContext, Severity,
};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

const REMEDIATION: &str = "Use parameterized queries or prepared statements. \
Validate and sanitize all user inputs.";

/// Seconds of injected delay for time-blind probes
const TIME_DELAY_SECS: u32 = 4;

/// Detection state for one candidate parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProbeState {
    Untested,
    BaselineCaptured,
    Confirmed,
    Clean,
}

/// Outcome of a single technique run. Inconclusive probes emit nothing:
/// absence of a finding is never evidence of absence of a vulnerability.
enum TechniqueOutcome {
    Confirmed(Finding),
    Clean,
    Inconclusive,
}

/// Baseline plus the raw body the comparisons run against
struct CapturedBaseline {
    summary: BaselineResponse,
    body: String,
}

/// Snapshot of one probe response used by the boolean-blind decision
#[derive(Debug, Clone)]
pub struct ProbeView {
    pub fingerprint: String,
    pub status_code: u16,
    pub body_length: usize,
}

impl ProbeView {
    fn of(response: &HttpResponse) -> Self {
        Self {
            fingerprint: fingerprint(&response.body),
            status_code: response.status_code,
            body_length: response.body.len(),
        }
    }
}

/// SQL injection detection engine.
///
/// Runs the four techniques against one parameter in cheapest-first order,
/// stopping at the first confirmed finding. Every probe request flows
/// through the shared rate-limited engine.
pub struct SqliScanner {
    engine: RequestEngine,
}

impl SqliScanner {
    pub fn new(engine: RequestEngine) -> Self {
        Self { engine }
    }

    /// Probe one parameter. Returns at most one finding (first technique
    /// to confirm wins). Technique failures are contained here and logged;
    /// they never abort the surrounding scan.
    pub async fn scan_parameter(
        &self,
        param: &CandidateParameter,
        ctx: &ScanContext,
    ) -> Option<Finding> {
        let name_lower = param.name.to_lowercase();
        if SKIP_PARAMS.iter().any(|s| name_lower.contains(s)) {
            debug!("Skipping security-token parameter '{}'", param.name);
            return None;
        }

        let mut state = ProbeState::Untested;
        debug!("Parameter '{}' state: {:?}", param.name, state);

        let baseline = match self.capture_baseline(param).await {
            Ok(baseline) => baseline,
            Err(e) => {
                debug!(
                    "Baseline capture failed for {} '{}': {}",
                    param.url, param.name, e
                );
                return None;
            }
        };
        state = ProbeState::BaselineCaptured;
        debug!("Parameter '{}' state: {:?}", param.name, state);

        let budget = Duration::from_secs(ctx.config.technique_timeout_secs);
        let family_hint = DbmsFamily::from_url_hint(&param.url);

        let mut finding = self
            .run_technique("error-based", budget, self.error_based(param, &baseline))
            .await;

        if finding.is_none() && !ctx.deadline_exceeded() {
            finding = self
                .run_technique("union-based", budget, self.union_based(param, &baseline))
                .await;
        }
        if finding.is_none() && !ctx.deadline_exceeded() {
            finding = self
                .run_technique(
                    "boolean-blind",
                    budget,
                    self.boolean_blind(param, &baseline),
                )
                .await;
        }
        if finding.is_none() && !ctx.deadline_exceeded() {
            finding = self
                .run_technique("time-blind", budget, self.time_blind(param, family_hint))
                .await;
        }

        state = if finding.is_some() {
            ProbeState::Confirmed
        } else {
            ProbeState::Clean
        };
        debug!(
            "Parameter '{}' on {} finished {:?}",
            param.name, param.url, state
        );
        finding
    }

    /// Run one technique under its sub-deadline, containing its failures.
    async fn run_technique<F>(&self, label: &str, budget: Duration, technique: F) -> Option<Finding>
    where
        F: std::future::Future<Output = ScannerResult<TechniqueOutcome>>,
    {
        match tokio::time::timeout(budget, technique).await {
            Ok(Ok(TechniqueOutcome::Confirmed(finding))) => {
                info!(
                    "{} SQL injection confirmed: {} (parameter '{}')",
                    label, finding.url, finding.parameter
                );
                Some(finding)
            }
            Ok(Ok(TechniqueOutcome::Clean)) => None,
            Ok(Ok(TechniqueOutcome::Inconclusive)) => {
                debug!("{} probe inconclusive", label);
                None
            }
            Ok(Err(e)) => {
                // Contained at the technique boundary
                warn!("{} probe error: {}", label, e);
                None
            }
            Err(_) => {
                debug!("{} probe exceeded its {}s budget", label, budget.as_secs());
                None
            }
        }
    }

    async fn capture_baseline(&self, param: &CandidateParameter) -> ScannerResult<CapturedBaseline> {
        let response = self.send_payload(param, &param.original_value).await?;
        Ok(CapturedBaseline {
            summary: BaselineResponse {
                status_code: response.status_code,
                body_length: response.body.len(),
                fingerprint: fingerprint(&response.body),
                elapsed_secs: response.elapsed_secs(),
            },
            body: response.body,
        })
    }

    /// Build and send a probe request with `value` substituted into the
    /// parameter's location.
    async fn send_payload(
        &self,
        param: &CandidateParameter,
        value: &str,
    ) -> ScannerResult<HttpResponse> {
        match param.location {
            ParamLocation::Query => {
                let url = inject_query(&param.url, &param.name, value)?;
                self.engine.get(&url).await
            }
            ParamLocation::Form => {
                let body = format!(
                    "{}={}",
                    urlencoding::encode(&param.name),
                    urlencoding::encode(value)
                );
                self.engine.post_form(&param.url, body).await
            }
            ParamLocation::Header => {
                self.engine
                    .get_with_headers(&param.url, vec![(param.name.clone(), value.to_string())])
                    .await
            }
            ParamLocation::Cookie => {
                let cookie = format!("{}={}", param.name, urlencoding::encode(value));
                self.engine
                    .get_with_headers(&param.url, vec![("Cookie".to_string(), cookie)])
                    .await
            }
            ParamLocation::JsonBody => {
                let mut object = serde_json::Map::new();
                object.insert(
                    param.name.clone(),
                    serde_json::Value::String(value.to_string()),
                );
                self.engine
                    .post_json(&param.url, &serde_json::Value::Object(object))
                    .await
            }
        }
    }

    /// Timed single-shot probe for latency measurements. Timeouts count as
    /// a delay of the full request timeout, not as a failure.
    async fn timed_probe(
        &self,
        param: &CandidateParameter,
        value: &str,
    ) -> ScannerResult<Duration> {
        let url = match param.location {
            ParamLocation::Query => inject_query(&param.url, &param.name, value)?,
            // Non-query locations measure against the same URL with the
            // payload in its place
            _ => {
                return match self.send_payload(param, value).await {
                    Ok(response) => Ok(response.elapsed),
                    Err(e) if e.is_timeout() => Ok(self.engine.timeout()),
                    Err(e) => Err(e),
                };
            }
        };

        match self.engine.get_once(&url).await {
            Ok(response) => Ok(response.elapsed),
            Err(e) if e.is_timeout() => Ok(self.engine.timeout()),
            Err(e) => Err(e),
        }
    }

    // ------------------------------------------------------------------
    // Technique 1: error-based
    // ------------------------------------------------------------------

    async fn error_based(
        &self,
        param: &CandidateParameter,
        baseline: &CapturedBaseline,
    ) -> ScannerResult<TechniqueOutcome> {
        let payloads =
            PayloadSelector::error_payloads(&param.url, &param.name, &param.original_value);
        let mut inconclusive = false;

        for payload in payloads {
            let response = match self.send_payload(param, &payload).await {
                Ok(r) => r,
                Err(e) => {
                    debug!("Error probe request failed: {}", e);
                    inconclusive = true;
                    continue;
                }
            };

            if response.body == baseline.body {
                continue;
            }

            for (pattern, _family) in SQL_ERROR_PATTERNS.iter() {
                let Some(m) = pattern.find(&response.body) else {
                    continue;
                };
                // The same pattern firing on the baseline means the page
                // leaks errors regardless of our input
                if pattern.is_match(&baseline.body) {
                    continue;
                }
                if is_false_positive(
                    &baseline.body,
                    baseline.summary.status_code,
                    &response.body,
                    response.status_code,
                    &payload,
                    &param.original_value,
                ) {
                    debug!("Discarding likely false positive for '{}'", param.name);
                    continue;
                }

                let family = DbmsFamily::from_error_text(&response.body);
                let name = match family {
                    Some(f) => format!("SQL Injection ({})", f.name()),
                    None => "SQL Injection".to_string(),
                };
                let excerpt = error_excerpt(&response.body, m.start(), m.end());

                let finding = Finding::new(
                    name,
                    Severity::High,
                    &param.url,
                    &param.name,
                    format!("Payload: {}\nError: {}", payload, excerpt),
                    REMEDIATION,
                );
                return Ok(TechniqueOutcome::Confirmed(finding));
            }
        }

        Ok(if inconclusive {
            TechniqueOutcome::Inconclusive
        } else {
            TechniqueOutcome::Clean
        })
    }

    // ------------------------------------------------------------------
    // Technique 2: UNION-based
    // ------------------------------------------------------------------

    async fn union_based(
        &self,
        param: &CandidateParameter,
        baseline: &CapturedBaseline,
    ) -> ScannerResult<TechniqueOutcome> {
        for columns in 1..=7usize {
            let marker = PayloadSelector::union_marker();
            let position = columns / 2;
            let (all_markers, null_padded) =
                PayloadSelector::union_payloads(&marker, columns, position);

            for payload in [all_markers, null_padded] {
                let response = match self.send_payload(param, &payload).await {
                    Ok(r) => r,
                    Err(e) => {
                        debug!("UNION probe request failed: {}", e);
                        continue;
                    }
                };

                if !response.body.contains(&marker) || baseline.body.contains(&marker) {
                    continue;
                }

                // Single-marker matches are insufficient: demand a second,
                // independently marked payload at the same column/position
                let confirm_marker = PayloadSelector::union_marker();
                let (_, confirm_payload) =
                    PayloadSelector::union_payloads(&confirm_marker, columns, position);

                let confirmed = match self.send_payload(param, &confirm_payload).await {
                    Ok(confirm) => confirm.body.contains(&confirm_marker),
                    Err(_) => false,
                };
                if !confirmed {
                    debug!(
                        "UNION marker for '{}' not reproduced; treating as reflection",
                        param.name
                    );
                    continue;
                }

                let finding = Finding::new(
                    "UNION-based SQL Injection",
                    Severity::High,
                    &param.url,
                    &param.name,
                    format!(
                        "Marker '{}' reflected via UNION SELECT with {} columns \
                         (position {}); independently confirmed with marker '{}'",
                        marker,
                        columns,
                        position + 1,
                        confirm_marker
                    ),
                    REMEDIATION,
                );
                return Ok(TechniqueOutcome::Confirmed(finding));
            }
        }

        Ok(TechniqueOutcome::Clean)
    }

    // ------------------------------------------------------------------
    // Technique 3: boolean-blind
    // ------------------------------------------------------------------

    async fn boolean_blind(
        &self,
        param: &CandidateParameter,
        baseline: &CapturedBaseline,
    ) -> ScannerResult<TechniqueOutcome> {
        let pairs = PayloadSelector::boolean_pairs(&param.original_value);

        for (index, pair) in pairs.iter().enumerate() {
            // TRUE before FALSE, sequentially, to keep causal attribution
            // of side effects deterministic within a pair
            let true_response = match self.send_payload(param, &pair.true_payload).await {
                Ok(r) => r,
                Err(_) => continue,
            };
            let false_response = match self.send_payload(param, &pair.false_payload).await {
                Ok(r) => r,
                Err(_) => continue,
            };

            let hit = boolean_hit(
                &baseline.summary.fingerprint,
                baseline.summary.status_code,
                &ProbeView::of(&true_response),
                &ProbeView::of(&false_response),
            );
            if !hit {
                continue;
            }

            // Dynamic pages produce one-off divergences; demand the same
            // signal from a different pair before reporting
            for confirm_pair in pairs.iter().skip(index + 1) {
                let confirm_true = match self.send_payload(param, &confirm_pair.true_payload).await
                {
                    Ok(r) => r,
                    Err(_) => continue,
                };
                let confirm_false =
                    match self.send_payload(param, &confirm_pair.false_payload).await {
                        Ok(r) => r,
                        Err(_) => continue,
                    };

                if boolean_hit(
                    &baseline.summary.fingerprint,
                    baseline.summary.status_code,
                    &ProbeView::of(&confirm_true),
                    &ProbeView::of(&confirm_false),
                ) {
                    let finding = Finding::new(
                        "Boolean-based Blind SQL Injection",
                        Severity::High,
                        &param.url,
                        &param.name,
                        format!(
                            "TRUE payload: {} | FALSE payload: {} ({}); \
                             reconfirmed with TRUE: {} | FALSE: {}",
                            pair.true_payload,
                            pair.false_payload,
                            pair.description,
                            confirm_pair.true_payload,
                            confirm_pair.false_payload
                        ),
                        REMEDIATION,
                    );
                    return Ok(TechniqueOutcome::Confirmed(finding));
                }
            }

            debug!(
                "Boolean divergence on '{}' not reproduced by a second pair",
                param.name
            );
        }

        Ok(TechniqueOutcome::Clean)
    }

    // ------------------------------------------------------------------
    // Technique 4: time-blind
    // ------------------------------------------------------------------

    async fn time_blind(
        &self,
        param: &CandidateParameter,
        family_hint: Option<DbmsFamily>,
    ) -> ScannerResult<TechniqueOutcome> {
        // Calibrate against the unmodified value; a flaky baseline makes
        // the whole probe inconclusive
        let mut samples = Vec::with_capacity(3);
        for _ in 0..3 {
            match self.timed_probe(param, &param.original_value).await {
                Ok(elapsed) => samples.push(elapsed.as_secs_f64()),
                Err(e) => {
                    debug!("Time-blind calibration failed: {}", e);
                    return Ok(TechniqueOutcome::Inconclusive);
                }
            }
        }
        let baseline_latency = samples.iter().sum::<f64>() / samples.len() as f64;
        let threshold = (2.0 * baseline_latency).max(2.5);

        let family = family_hint.unwrap_or(DbmsFamily::Generic);
        let payloads = family.delay_payloads(&param.original_value, TIME_DELAY_SECS);

        for payload in payloads {
            let first = match self.timed_probe(param, &payload).await {
                Ok(elapsed) => elapsed.as_secs_f64(),
                Err(_) => continue,
            };
            if first < threshold {
                continue;
            }

            // A single slow response proves nothing on a jittery network;
            // an identical second probe must reproduce the delay
            let second = match self.timed_probe(param, &payload).await {
                Ok(elapsed) => elapsed.as_secs_f64(),
                Err(_) => continue,
            };
            if second < threshold {
                debug!(
                    "Delay of {:.2}s on '{}' not reproduced (second: {:.2}s)",
                    first, param.name, second
                );
                continue;
            }

            let finding = Finding::new(
                format!("Time-based Blind SQL Injection ({})", family.name()),
                Severity::High,
                &param.url,
                &param.name,
                format!(
                    "Payload: {} delayed responses by {:.2}s and {:.2}s \
                     against a {:.2}s baseline (threshold {:.2}s)",
                    payload, first, second, baseline_latency, threshold
                ),
                REMEDIATION,
            );
            return Ok(TechniqueOutcome::Confirmed(finding));
        }

        Ok(TechniqueOutcome::Clean)
    }
}

/// Substitute `value` for the named query parameter, preserving all other
/// pairs (the parameter is appended when absent).
pub fn inject_query(url: &str, name: &str, value: &str) -> ScannerResult<String> {
    let parsed = Url::parse(url).map_err(|_| ScannerError::InvalidUrl(url.to_string()))?;

    let mut pairs: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();
    match pairs.iter_mut().find(|(k, _)| k == name) {
        Some(pair) => pair.1 = value.to_string(),
        None => pairs.push((name.to_string(), value.to_string())),
    }

    let query = pairs
        .iter()
        .map(|(k, v)| {
            format!(
                "{}={}",
                urlencoding::encode(k),
                urlencoding::encode(v)
            )
        })
        .collect::<Vec<_>>()
        .join("&");

    let mut rebuilt = parsed;
    rebuilt.set_query(Some(&query));
    rebuilt.set_fragment(None);
    Ok(rebuilt.to_string())
}

/// Boolean-blind hit decision over baseline and TRUE/FALSE probe views.
///
/// Flags when (a) the TRUE response tracks the baseline while FALSE
/// diverges, (b) TRUE and FALSE differ substantially in both fingerprint
/// and length, or (c) exactly one of the pair keeps the baseline status.
pub fn boolean_hit(
    baseline_fingerprint: &str,
    baseline_status: u16,
    true_view: &ProbeView,
    false_view: &ProbeView,
) -> bool {
    let true_vs_baseline = similarity(baseline_fingerprint, &true_view.fingerprint);
    let false_vs_baseline = similarity(baseline_fingerprint, &false_view.fingerprint);
    if true_vs_baseline > 0.8 && false_vs_baseline < 0.6 {
        return true;
    }

    let true_vs_false = similarity(&true_view.fingerprint, &false_view.fingerprint);
    let length_delta = true_view.body_length.abs_diff(false_view.body_length);
    if true_vs_false < 0.7 && length_delta > 50 {
        return true;
    }

    (true_view.status_code == baseline_status) != (false_view.status_code == baseline_status)
}

/// Reject matches that are explainable without injection
pub fn is_false_positive(
    baseline_body: &str,
    baseline_status: u16,
    probe_body: &str,
    probe_status: u16,
    payload: &str,
    original_value: &str,
) -> bool {
    if baseline_body == probe_body {
        return true;
    }

    // Standard reflection: payload echoed where the original value was
    // echoed before
    if probe_body.contains(payload)
        && !original_value.is_empty()
        && baseline_body.contains(original_value)
    {
        return true;
    }

    // SQL-educational content matches its own error-like phrasing
    for pattern in SQL_TUTORIAL_PATTERNS.iter() {
        if pattern.is_match(baseline_body) && pattern.is_match(probe_body) {
            return true;
        }
    }

    // A 404 swap explains the difference unless the body carries real
    // DBMS detail
    if probe_status == 404
        && baseline_status != 404
        && DbmsFamily::from_error_text(probe_body)
            .map(|f| f == DbmsFamily::Generic)
            .unwrap_or(true)
    {
        return true;
    }

    // Same for generic 500 pages without SQL specifics
    if probe_status == 500
        && baseline_status != 500
        && DbmsFamily::from_error_text(probe_body)
            .map(|f| f == DbmsFamily::Generic)
            .unwrap_or(true)
    {
        return true;
    }

    false
}

/// Trimmed context window around an error-pattern match, kept on char
/// boundaries
fn error_excerpt(body: &str, start: usize, end: usize) -> String {
    let mut lo = start.saturating_sub(100);
    while lo > 0 && !body.is_char_boundary(lo) {
        lo -= 1;
    }
    let mut hi = (end + 100).min(body.len());
    while hi < body.len() && !body.is_char_boundary(hi) {
        hi += 1;
    }
    body[lo..hi].split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(fingerprint: &str, status: u16, length: usize) -> ProbeView {
        ProbeView {
            fingerprint: fingerprint.to_string(),
            status_code: status,
            body_length: length,
        }
    }

    #[test]
    fn query_injection_replaces_value() {
        let url = inject_query("http://x.test/item?id=5&page=2", "id", "5' OR '1'='1").unwrap();
        assert!(url.contains("page=2"));
        assert!(url.contains("id=5%27%20OR%20%271%27%3D%271"));
        assert!(!url.contains("id=5&"));
    }

    #[test]
    fn query_injection_appends_missing_parameter() {
        let url = inject_query("http://x.test/search", "q", "test").unwrap();
        assert!(url.ends_with("?q=test"));
    }

    #[test]
    fn boolean_example_flags_candidate() {
        // Baseline "Welcome": TRUE response identical, FALSE response an
        // access-denied page. Must register as a candidate hit.
        let baseline = "Welcome";
        let true_view = view("Welcome", 200, 7);
        let false_view = view("Error: access denied", 200, 20);
        assert!(boolean_hit(baseline, 200, &true_view, &false_view));
    }

    #[test]
    fn identical_true_false_is_no_hit() {
        let baseline = "Welcome";
        let true_view = view("Welcome", 200, 7);
        let false_view = view("Welcome", 200, 7);
        assert!(!boolean_hit(baseline, 200, &true_view, &false_view));
    }

    #[test]
    fn status_divergence_is_a_hit() {
        let baseline = "page";
        let true_view = view("page", 200, 4);
        let false_view = view("page", 500, 4);
        assert!(boolean_hit(baseline, 200, &true_view, &false_view));

        // Both diverging from baseline status is not a boolean signal
        let both_off_true = view("page", 500, 4);
        assert!(!boolean_hit(baseline, 200, &both_off_true, &false_view));
    }

    #[test]
    fn large_divergence_without_baseline_match_is_a_hit() {
        let baseline = "something else entirely";
        let true_view = view(&"a".repeat(300), 200, 300);
        let false_view = view(&"b".repeat(150), 200, 150);
        assert!(boolean_hit(baseline, 200, &true_view, &false_view));
    }

    #[test]
    fn reflection_is_false_positive() {
        // Baseline echoes the original value, probe echoes the payload:
        // plain reflection, not injection
        let baseline = "You searched for: shoes";
        let probe = "You searched for: shoes' OR SQL syntax error '";
        assert!(is_false_positive(
            baseline,
            200,
            probe,
            200,
            "shoes' OR SQL syntax error '",
            "shoes"
        ));
    }

    #[test]
    fn identical_bodies_are_false_positive() {
        assert!(is_false_positive("same body", 200, "same body", 200, "'", "1"));
    }

    #[test]
    fn tutorial_content_is_false_positive() {
        let baseline = "Our SQL tutorial covers the syntax error message";
        let probe = "Our SQL tutorial covers the syntax error message and more";
        assert!(is_false_positive(baseline, 200, probe, 200, "'", "1"));
    }

    #[test]
    fn unrelated_404_is_false_positive_without_dbms_detail() {
        let baseline = "product page";
        let probe = "404 Not Found - error near line 3";
        assert!(is_false_positive(baseline, 200, probe, 404, "'", "1"));
    }

    #[test]
    fn dbms_detail_survives_404_filter() {
        let baseline = "product page";
        let probe = "404 handler crashed: ORA-00933: SQL command not properly ended";
        assert!(!is_false_positive(baseline, 200, probe, 404, "'", "1"));
    }

    #[test]
    fn genuine_error_is_not_false_positive() {
        let baseline = "Welcome to the catalog";
        let probe = "You have an error in your SQL syntax near ''1'='1'";
        assert!(!is_false_positive(baseline, 200, probe, 200, "' OR '1'='1", "1"));
    }

    #[test]
    fn excerpt_is_bounded_and_clean() {
        let body = format!(
            "{}ORA-00933: SQL command not properly ended{}",
            "x".repeat(500),
            "y\n\n\t".repeat(200)
        );
        let excerpt = error_excerpt(&body, 500, 500 + 41);
        assert!(excerpt.contains("ORA-00933"));
        assert!(excerpt.len() < 300);
        assert!(!excerpt.contains('\n'));
    }
}
