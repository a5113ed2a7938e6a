use chrono::{DateTime, Timelike};

use logsift_analysis::{analyze, Aggregator};
use logsift_core::normalizer::{GroupingConfig, Normalizer};
use logsift_core::{LogLevel, ParsedLog, Severity};

fn record(content: &str, service: &str, caller: &str, ts: &str) -> ParsedLog {
    ParsedLog {
        timestamp: DateTime::parse_from_rfc3339(ts).unwrap(),
        caller: caller.to_string(),
        content: content.to_string(),
        level: LogLevel::Error,
        span: String::new(),
        trace: String::new(),
        service_name: service.to_string(),
    }
}

fn repeat(content: &str, service: &str, caller: &str, ts: &str, n: usize) -> Vec<ParsedLog> {
    (0..n).map(|_| record(content, service, caller, ts)).collect()
}

#[test]
fn test_known_issue_classification() {
    let normalizer = Normalizer::new();
    let logs = vec![record(
        "unexpected end of JSON input at offset 17",
        "pp-slot-api",
        "decode.go:55",
        "2026-01-15T10:00:00Z",
    )];
    let groups = normalizer.group(&logs, GroupingConfig::default());
    let analyses = analyze(&groups);

    assert_eq!(analyses.len(), 1);
    assert!(analyses[0].is_known);
    assert_eq!(analyses[0].issue_id, "ISSUE-002");
}

#[test]
fn test_unknown_pattern_stays_unclassified() {
    let normalizer = Normalizer::new();
    let logs = vec![record(
        "flux capacitor misaligned",
        "pp-slot-api",
        "f.go:1",
        "2026-01-15T10:00:00Z",
    )];
    let groups = normalizer.group(&logs, GroupingConfig::default());
    let analyses = analyze(&groups);

    assert!(!analyses[0].is_known);
    assert!(analyses[0].issue_id.is_empty());
}

#[test]
fn test_severity_tiers_across_groups() {
    let normalizer = Normalizer::new();
    let mut logs = Vec::new();
    logs.extend(repeat("low frequency", "svc", "a.go:1", "2026-01-15T10:00:00Z", 5));
    logs.extend(repeat("medium frequency", "svc", "b.go:2", "2026-01-15T10:00:00Z", 25));
    logs.extend(repeat("high frequency", "svc", "c.go:3", "2026-01-15T10:00:00Z", 120));

    let groups = normalizer.group(&logs, GroupingConfig::default());
    let analyses = analyze(&groups);

    // groups are ordered by count desc, so analyses follow the same order
    assert_eq!(analyses[0].severity, Severity::High);
    assert_eq!(analyses[1].severity, Severity::Medium);
    assert_eq!(analyses[2].severity, Severity::Low);
}

#[test]
fn test_reason_embeds_count_and_service() {
    let normalizer = Normalizer::new();
    let logs = repeat("boom", "pp-slot-api", "x.go:9", "2026-01-15T10:00:00Z", 4);
    let groups = normalizer.group(&logs, GroupingConfig::default());
    let analyses = analyze(&groups);

    assert_eq!(
        analyses[0].reason,
        "error occurred 4 times in service pp-slot-api"
    );
    assert_eq!(analyses[0].suggested_actions.len(), 3);
    assert!(analyses[0].suggested_actions[1].ends_with("x.go:9"));
}

#[test]
fn test_error_group_id_is_fingerprint_prefix() {
    let normalizer = Normalizer::new();
    let logs = vec![record("boom", "svc", "x.go:1", "2026-01-15T10:00:00Z")];
    let groups = normalizer.group(&logs, GroupingConfig::default());
    let analyses = analyze(&groups);

    assert_eq!(analyses[0].error_group_id.len(), 8);
    assert!(groups[0].fingerprint.starts_with(&analyses[0].error_group_id));
}

// AGGREGATOR //

#[test]
fn test_aggregate_per_service_stats() {
    let normalizer = Normalizer::new();
    let mut logs = Vec::new();
    logs.extend(repeat("err a", "svc-a", "a.go:1", "2026-01-15T10:00:00Z", 7));
    logs.extend(repeat("err b", "svc-a", "b.go:2", "2026-01-15T11:00:00Z", 3));
    logs.extend(repeat("err c", "svc-b", "c.go:3", "2026-01-15T10:00:00Z", 2));

    let groups = normalizer.group(&logs, GroupingConfig::default());
    let result = Aggregator::new().aggregate(&groups);

    assert_eq!(result.total_logs, 12);
    assert_eq!(result.total_error_groups, 3);

    let svc_a = &result.service_stats["svc-a"];
    assert_eq!(svc_a.error_group_count, 2);
    assert_eq!(svc_a.total_errors, 10);

    let svc_b = &result.service_stats["svc-b"];
    assert_eq!(svc_b.error_group_count, 1);
    assert_eq!(svc_b.total_errors, 2);
}

#[test]
fn test_aggregate_hourly_distribution_and_peak_hour() {
    let normalizer = Normalizer::new();
    let mut logs = Vec::new();
    logs.extend(repeat("x", "svc", "a.go:1", "2026-01-15T10:00:00Z", 4));
    logs.extend(repeat("y", "svc", "b.go:2", "2026-01-15T10:30:00Z", 2));
    logs.extend(repeat("z", "svc", "c.go:3", "2026-01-15T14:00:00Z", 3));

    let groups = normalizer.group(&logs, GroupingConfig::default());
    let result = Aggregator::new().aggregate(&groups);

    assert_eq!(result.time_stats.hourly_distribution.get(&10), Some(&6));
    assert_eq!(result.time_stats.hourly_distribution.get(&14), Some(&3));
    assert_eq!(result.time_stats.peak_hour, 10);
    assert_eq!(result.time_stats.peak_count, 6);
}

#[test]
fn test_peak_hour_tie_prefers_lowest_hour() {
    let normalizer = Normalizer::new();
    let mut logs = Vec::new();
    logs.extend(repeat("x", "svc", "a.go:1", "2026-01-15T17:00:00Z", 3));
    logs.extend(repeat("y", "svc", "b.go:2", "2026-01-15T08:00:00Z", 3));

    let groups = normalizer.group(&logs, GroupingConfig::default());
    let result = Aggregator::new().aggregate(&groups);

    assert_eq!(result.time_stats.peak_hour, 8);
}

#[test]
fn test_thirty_minute_peak_window() {
    let normalizer = Normalizer::new();
    let mut logs = Vec::new();
    // distinct callers keep every record as a retained sample
    for i in 0..10 {
        logs.push(record("spike", "svc", &format!("a.go:{}", i), "2026-01-15T10:05:00Z"));
    }
    for i in 0..30 {
        logs.push(record("spike", "svc", &format!("b.go:{}", i), "2026-01-15T10:20:00Z"));
    }
    for i in 0..5 {
        logs.push(record("spike", "svc", &format!("c.go:{}", i), "2026-01-15T10:45:00Z"));
    }

    let groups = normalizer.group(&logs, GroupingConfig::default());
    let result = Aggregator::new().aggregate(&groups);

    // the 10:00 half-hour bin holds 40 samples, 10:30 holds 5
    assert_eq!(result.time_stats.peak_window_count, 40);
    let start = result.time_stats.peak_window_start.unwrap();
    let end = result.time_stats.peak_window_end.unwrap();
    assert_eq!((start.hour(), start.minute()), (10, 0));
    assert_eq!((end.hour(), end.minute()), (10, 30));
}

#[test]
fn test_query_duration_spans_samples() {
    let normalizer = Normalizer::new();
    let logs = vec![
        record("a", "svc", "a.go:1", "2026-01-15T08:00:00Z"),
        record("b", "svc", "b.go:2", "2026-01-15T14:30:00Z"),
    ];
    let groups = normalizer.group(&logs, GroupingConfig::default());
    let result = Aggregator::new().aggregate(&groups);

    assert_eq!(
        result.time_stats.query_duration,
        std::time::Duration::from_secs(6 * 3600 + 1800)
    );
    assert_eq!(result.time_stats.earliest_log_time.unwrap().hour(), 8);
    assert_eq!(result.time_stats.latest_log_time.unwrap().hour(), 14);
}

#[test]
fn test_average_density_ignores_groups_without_peak() {
    let normalizer = Normalizer::new();
    let logs = repeat("boom", "svc", "a.go:1", "2026-01-15T10:00:00Z", 6);
    let groups = normalizer.group(&logs, GroupingConfig::default());
    let result = Aggregator::new().aggregate(&groups);

    // one group, peak count 6 over an hour
    assert!((result.time_stats.average_density - 0.1).abs() < 1e-9);
}

#[test]
fn test_empty_input_aggregates_to_zero() {
    let result = Aggregator::new().aggregate(&[]);
    assert_eq!(result.total_logs, 0);
    assert_eq!(result.total_error_groups, 0);
    assert!(result.service_stats.is_empty());
    assert!(result.time_stats.earliest_log_time.is_none());
    assert_eq!(result.time_stats.peak_window_count, 0);
}
