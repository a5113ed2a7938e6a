//! Per-group analysis: severity tiers and known-issue classification

use logsift_core::{Analysis, ErrorGroup, Severity};

use crate::registry::registry;

/// Count-based severity tiers. Critical is reserved for future promotion
/// rules and never assigned here.
pub fn severity_for_count(count: u64) -> Severity {
    if count >= 50 {
        Severity::High
    } else if count >= 10 {
        Severity::Medium
    } else {
        Severity::Low
    }
}

/// Build one analysis per error group, classifying each against the
/// known-issue registry.
pub fn analyze(groups: &[ErrorGroup]) -> Vec<Analysis> {
    let registry = registry();

    groups
        .iter()
        .map(|group| {
            let matched =
                registry.match_content_and_service(&group.normalized_content, &group.service_name);

            Analysis {
                error_group_id: group.fingerprint[..8].to_string(),
                is_known: matched.is_some(),
                issue_id: matched.map(|issue| issue.id).unwrap_or_default(),
                severity: severity_for_count(group.total_count),
                // the reporter parses the count back out of this string
                reason: format!(
                    "error occurred {} times in service {}",
                    group.total_count, group.service_name
                ),
                suggested_actions: vec![
                    format!(
                        "investigate error pattern: {}",
                        truncate(&group.normalized_content, 60)
                    ),
                    format!("check logs from caller: {}", group.caller),
                    "correlate with recent deployments or configuration changes".to_string(),
                ],
            }
        })
        .collect()
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let cut: String = s.chars().take(max_chars).collect();
    format!("{}...", cut)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_tiers() {
        assert_eq!(severity_for_count(5), Severity::Low);
        assert_eq!(severity_for_count(9), Severity::Low);
        assert_eq!(severity_for_count(10), Severity::Medium);
        assert_eq!(severity_for_count(49), Severity::Medium);
        assert_eq!(severity_for_count(50), Severity::High);
        assert_eq!(severity_for_count(120), Severity::High);
    }

    #[test]
    fn test_truncate_keeps_short_strings() {
        assert_eq!(truncate("short", 60), "short");
        let long = "x".repeat(80);
        let cut = truncate(&long, 60);
        assert_eq!(cut.chars().count(), 63);
        assert!(cut.ends_with("..."));
    }
}
