use chrono::DateTime;

use logsift_analysis::{analyze, Aggregator};
use logsift_core::normalizer::{GroupingConfig, Normalizer};
use logsift_core::{LogLevel, ParsedLog};
use logsift_report::{save_analysis_json, MarkdownReporter};

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

fn fixture_logs() -> Vec<ParsedLog> {
    let mut logs = Vec::new();
    for _ in 0..120 {
        logs.push(record(
            "unexpected end of JSON input at offset 17",
            "pp-slot-api",
            "decode.go:55",
            "2026-01-15T10:05:00Z",
        ));
    }
    for _ in 0..25 {
        logs.push(record(
            "redis timeout after 200 ms",
            "pp-slot-index",
            "cache.go:31",
            "2026-01-15T11:20:00Z",
        ));
    }
    logs.push(record(
        "flux capacitor misaligned",
        "pp-slot-api",
        "f.go:9",
        "2026-01-15T12:00:00Z",
    ));
    logs
}

#[test]
fn test_one_report_per_service() {
    let dir = tempfile::tempdir().unwrap();

    let normalizer = Normalizer::new();
    let groups = normalizer.group(&fixture_logs(), GroupingConfig::default());
    let stats = Aggregator::new().aggregate(&groups);
    let analyses = analyze(&groups);

    let reporter = MarkdownReporter::new(dir.path());
    let report = reporter
        .generate_per_service(&analyses, &groups, &stats)
        .unwrap();

    let files: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();

    assert_eq!(files.len(), 2);
    assert!(files.iter().any(|f| f.contains("_pp-slot-api_")));
    assert!(files.iter().any(|f| f.contains("_pp-slot-index_")));
    for file in &files {
        assert!(file.ends_with(".md"));
    }

    assert_eq!(report.total_logs, 146);
    assert_eq!(report.error_group_count, 3);
    assert_eq!(report.high_priority_count, 1);
    assert_eq!(report.new_issue_count, 1);
}

#[test]
fn test_report_sections_and_ordering() {
    let dir = tempfile::tempdir().unwrap();

    let normalizer = Normalizer::new();
    let groups = normalizer.group(&fixture_logs(), GroupingConfig::default());
    let stats = Aggregator::new().aggregate(&groups);
    let analyses = analyze(&groups);

    let reporter = MarkdownReporter::new(dir.path());
    reporter
        .generate_per_service(&analyses, &groups, &stats)
        .unwrap();

    let api_report = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .find(|p| p.to_string_lossy().contains("_pp-slot-api_"))
        .unwrap();
    let content = std::fs::read_to_string(api_report).unwrap();

    assert!(content.contains("## 📊 Daily Verdict"));
    assert!(content.contains("## 🚨 Top Problems"));
    // one high-severity issue -> warning verdict
    assert!(content.contains("🟡 **Warning**"));
    // known-issue tag for the JSON parse group
    assert!(content.contains("`ISSUE-002` - JSON parse failure"));
    // the 120-count group is listed first
    let top = content.find("### 1.").unwrap();
    assert!(content[top..].contains("unexpected end of json input"));
}

#[test]
fn test_empty_run_produces_normal_verdict() {
    let dir = tempfile::tempdir().unwrap();

    let stats = Aggregator::new().aggregate(&[]);
    let reporter = MarkdownReporter::new(dir.path());
    let report = reporter.generate_per_service(&[], &[], &stats).unwrap();

    assert_eq!(report.total_logs, 0);
    assert_eq!(report.error_group_count, 0);
    assert_eq!(report.high_priority_count, 0);

    let files: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(files.len(), 1);
    assert!(files[0].to_string_lossy().contains("all-services"));

    let content = std::fs::read_to_string(&files[0]).unwrap();
    assert!(content.contains("🟢 **Normal**"));
    assert!(content.contains("**Total errors**: 0"));
}

#[test]
fn test_snapshot_written_with_expected_shape() {
    let dir = tempfile::tempdir().unwrap();

    let normalizer = Normalizer::new();
    let groups = normalizer.group(&fixture_logs(), GroupingConfig::default());
    let stats = Aggregator::new().aggregate(&groups);
    let analyses = analyze(&groups);

    let path = save_analysis_json(&analyses, &stats, dir.path()).unwrap();
    assert!(path
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("analysis_"));

    let raw = std::fs::read_to_string(&path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();

    assert!(parsed["timestamp"].is_string());
    assert_eq!(parsed["analyses"].as_array().unwrap().len(), 3);
    assert_eq!(parsed["aggregation"]["total_logs"], 146);
    assert_eq!(parsed["agg_stats"]["total_services"], 2);
    // services sorted by error count descending
    assert_eq!(
        parsed["agg_stats"]["services_sorted"][0]["service_name"],
        "pp-slot-api"
    );
}

#[test]
fn test_rendered_bytes_are_deterministic() {
    let normalizer = Normalizer::new();
    let groups = normalizer.group(&fixture_logs(), GroupingConfig::default());
    let stats = Aggregator::new().aggregate(&groups);
    let analyses = analyze(&groups);

    let dir_a = tempfile::tempdir().unwrap();
    let dir_b = tempfile::tempdir().unwrap();
    MarkdownReporter::new(dir_a.path())
        .generate_per_service(&analyses, &groups, &stats)
        .unwrap();
    MarkdownReporter::new(dir_b.path())
        .generate_per_service(&analyses, &groups, &stats)
        .unwrap();

    let read_sorted = |dir: &std::path::Path| -> Vec<String> {
        let mut contents: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| std::fs::read_to_string(entry.unwrap().path()).unwrap())
            .collect();
        contents.sort();
        contents
    };

    let a = read_sorted(dir_a.path());
    let b = read_sorted(dir_b.path());

    // identical up to the embedded generation timestamps
    let strip_generated = |s: &str| -> String {
        s.lines()
            .filter(|line| !line.starts_with("**Generated**"))
            .collect::<Vec<_>>()
            .join("\n")
    };
    assert_eq!(
        a.iter().map(|s| strip_generated(s)).collect::<Vec<_>>(),
        b.iter().map(|s| strip_generated(s)).collect::<Vec<_>>()
    );
}
