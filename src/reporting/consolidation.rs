// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Finding Consolidation
 * Merges raw findings describing the same underlying vulnerability
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::types::Finding;
use std::collections::HashMap;
use tracing::info;

/// Evidence examples carried forward when merging a group
const MAX_EVIDENCE_EXAMPLES: usize = 5;

/// Groups raw findings by (location, parameter) and merges each group with
/// more than one entry into a single finding. Merged findings get the union
/// of evidence (first five examples plus a count of the rest), the maximum
/// observed severity and a fresh identity. Consolidating an already
/// consolidated list is a no-op.
pub struct FindingConsolidator;

impl FindingConsolidator {
    pub fn consolidate(findings: Vec<Finding>) -> Vec<Finding> {
        if findings.is_empty() {
            return findings;
        }

        let raw_count = findings.len();
        let mut groups: HashMap<String, Vec<Finding>> = HashMap::new();
        let mut order: Vec<String> = Vec::new();

        for finding in findings {
            let key = format!("{}:{}", normalize_url(&finding.url), finding.parameter);
            if !groups.contains_key(&key) {
                order.push(key.clone());
            }
            groups.entry(key).or_default().push(finding);
        }

        let consolidated: Vec<Finding> = order
            .into_iter()
            .filter_map(|key| groups.remove(&key))
            .map(|mut group| {
                if group.len() == 1 {
                    group.remove(0)
                } else {
                    merge_group(group)
                }
            })
            .collect();

        if consolidated.len() < raw_count {
            info!(
                "Consolidated {} raw findings into {} unique findings",
                raw_count,
                consolidated.len()
            );
        }
        consolidated
    }
}

fn normalize_url(url: &str) -> String {
    url.split('?').next().unwrap_or(url).to_lowercase()
}

/// Merge a multi-entry group: evidence union capped at five examples, the
/// highest severity observed, and one fresh identity.
fn merge_group(group: Vec<Finding>) -> Finding {
    let severity = group
        .iter()
        .map(|f| f.severity)
        .fold(group[0].severity, |acc, s| acc.max(s));

    let mut evidence: Vec<String> = Vec::new();
    for finding in &group {
        if !evidence.contains(&finding.evidence) {
            evidence.push(finding.evidence.clone());
        }
    }

    let shown = evidence.len().min(MAX_EVIDENCE_EXAMPLES);
    let mut merged_evidence = format!(
        "Multiple successful probes: {}",
        evidence[..shown].join(" | ")
    );
    if evidence.len() > MAX_EVIDENCE_EXAMPLES {
        merged_evidence.push_str(&format!(
            " ({} more)",
            evidence.len() - MAX_EVIDENCE_EXAMPLES
        ));
    }

    let first = &group[0];
    Finding::new(
        first.name.clone(),
        severity,
        first.url.clone(),
        first.parameter.clone(),
        merged_evidence,
        first.remediation.clone(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Severity;

    fn finding(url: &str, parameter: &str, severity: Severity, evidence: &str) -> Finding {
        Finding::new(
            "SQL Injection",
            severity,
            url,
            parameter,
            evidence,
            "Use parameterized queries.",
        )
    }

    #[test]
    fn distinct_parameters_stay_separate() {
        let findings = vec![
            finding("http://x/a?id=1", "id", Severity::High, "e1"),
            finding("http://x/a?id=1", "cat", Severity::High, "e2"),
        ];
        assert_eq!(FindingConsolidator::consolidate(findings).len(), 2);
    }

    #[test]
    fn same_parameter_merges_with_max_severity() {
        let findings = vec![
            finding("/x", "id", Severity::Medium, "e1"),
            finding("/x", "id", Severity::Critical, "e2"),
        ];
        let merged = FindingConsolidator::consolidate(findings);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].severity, Severity::Critical);
    }

    #[test]
    fn query_strings_do_not_split_groups() {
        let findings = vec![
            finding("http://x/a?id=1", "id", Severity::High, "e1"),
            finding("http://x/a?id=1%27", "id", Severity::High, "e2"),
        ];
        assert_eq!(FindingConsolidator::consolidate(findings).len(), 1);
    }

    #[test]
    fn merged_finding_gets_fresh_identity_and_evidence_union() {
        let first = finding("/x", "id", Severity::High, "payload A");
        let second = finding("/x", "id", Severity::High, "payload B");
        let original_ids = [first.id.clone(), second.id.clone()];

        let merged = FindingConsolidator::consolidate(vec![first, second]);
        assert_eq!(merged.len(), 1);
        assert!(!original_ids.contains(&merged[0].id));
        assert!(merged[0].evidence.contains("payload A"));
        assert!(merged[0].evidence.contains("payload B"));
    }

    #[test]
    fn evidence_is_capped_with_remainder_count() {
        let findings: Vec<Finding> = (0..8)
            .map(|i| finding("/x", "id", Severity::High, &format!("payload {}", i)))
            .collect();

        let merged = FindingConsolidator::consolidate(findings);
        assert_eq!(merged.len(), 1);
        assert!(merged[0].evidence.contains("payload 4"));
        assert!(!merged[0].evidence.contains("payload 5"));
        assert!(merged[0].evidence.contains("(3 more)"));
    }

    #[test]
    fn consolidation_is_idempotent() {
        let findings = vec![
            finding("/x", "id", Severity::Medium, "e1"),
            finding("/x", "id", Severity::Critical, "e2"),
            finding("/y", "q", Severity::High, "e3"),
        ];

        let once = FindingConsolidator::consolidate(findings);
        let twice = FindingConsolidator::consolidate(once.clone());

        assert_eq!(once.len(), twice.len());
        for (a, b) in once.iter().zip(twice.iter()) {
            assert_eq!(a.severity, b.severity);
            assert_eq!(a.evidence, b.evidence);
            assert_eq!(a.url, b.url);
            assert_eq!(a.parameter, b.parameter);
        }
    }

    #[test]
    fn empty_input_passes_through() {
        assert!(FindingConsolidator::consolidate(Vec::new()).is_empty());
    }
}
