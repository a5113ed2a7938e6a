//! Engineer-focused Markdown report rendering

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;
use std::sync::LazyLock;

use chrono::Local;
use regex::Regex;
use thiserror::Error;

use logsift_analysis::{registry, AggregationResult};
use logsift_core::{Analysis, ErrorGroup, Report, Severity};

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("report io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Renders one Markdown report per affected service.
pub struct MarkdownReporter {
    report_path: PathBuf,
}

impl MarkdownReporter {
    pub fn new(report_path: impl Into<PathBuf>) -> Self {
        Self {
            report_path: report_path.into(),
        }
    }

    /// Write one report per service and return the run summary. A single
    /// service failing to write is logged and skipped; the other services
    /// still emit.
    pub fn generate_per_service(
        &self,
        analyses: &[Analysis],
        groups: &[ErrorGroup],
        stats: &AggregationResult,
    ) -> Result<Report, ReportError> {
        fs::create_dir_all(&self.report_path)?;

        let now = Local::now();
        let by_service = partition_by_service(analyses, groups);

        let mut last_path = String::new();
        for (service, service_analyses) in &by_service {
            let content = render_report(service, service_analyses, stats, &now);
            let filename = format!(
                "{}_{}_{}.md",
                now.format("%Y-%m-%d"),
                service,
                now.format("%H-%M-%S")
            );
            let path = self.report_path.join(filename);

            match fs::write(&path, content) {
                Ok(()) => last_path = path.display().to_string(),
                Err(err) => {
                    tracing::error!(service = %service, %err, "failed to write service report");
                }
            }
        }

        Ok(Report {
            generated_at: now,
            execution_time: stats.processing_time,
            total_logs: stats.total_logs,
            error_group_count: stats.total_error_groups as u64,
            high_priority_count: count_high_priority(analyses) as u64,
            new_issue_count: count_new_issues(analyses) as u64,
            report_path: last_path,
            data_sources: vec!["opensearch".to_string()],
        })
    }
}

// re-key analyses to their service through the 8-hex fingerprint prefix.
// An empty run still produces one "all-services" report so the verdict is
// visible.
fn partition_by_service(
    analyses: &[Analysis],
    groups: &[ErrorGroup],
) -> BTreeMap<String, Vec<Analysis>> {
    let mut by_service: BTreeMap<String, Vec<Analysis>> = BTreeMap::new();

    for analysis in analyses {
        let service = groups
            .iter()
            .find(|g| g.fingerprint.starts_with(&analysis.error_group_id))
            .map(|g| g.service_name.clone())
            .unwrap_or_else(|| "unknown".to_string());
        by_service.entry(service).or_default().push(analysis.clone());
    }

    if by_service.is_empty() {
        by_service.insert("all-services".to_string(), Vec::new());
    }

    by_service
}

fn render_report(
    service: &str,
    analyses: &[Analysis],
    stats: &AggregationResult,
    now: &chrono::DateTime<Local>,
) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# 🔍 Daily Error Analysis Report — {}\n", service);
    let _ = writeln!(out, "**Generated**: {}  ", now.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(
        out,
        "**Analysis period**: {}\n",
        format_duration(stats.time_stats.query_duration)
    );

    let known = analyses.iter().filter(|a| a.is_known).count();
    let _ = writeln!(
        out,
        "**Known issues**: {} | **New issues**: {}\n",
        known,
        analyses.len() - known
    );

    let sorted = sort_by_severity(analyses);

    write_verdict(&mut out, &sorted, stats);
    write_top_problems(&mut out, &sorted);
    write_secondary_issues(&mut out, &sorted);

    out
}

fn write_verdict(out: &mut String, analyses: &[Analysis], stats: &AggregationResult) {
    out.push_str("## 📊 Daily Verdict\n\n");

    let high = count_high_priority(analyses);
    let verdict = if high >= 3 {
        "🔴 **Critical** - multiple high-severity issues detected. Investigate immediately."
    } else if high > 0 {
        "🟡 **Warning** - high-severity issues present. Prioritize these fixes."
    } else {
        "🟢 **Normal** - no critical problems. Keep monitoring ongoing patterns."
    };
    let _ = writeln!(out, "{}\n", verdict);

    let _ = writeln!(
        out,
        "- **Total errors**: {} across {} unique patterns",
        stats.total_logs, stats.total_error_groups
    );
    let _ = writeln!(out, "- **High-priority issues**: {}", high);

    // 30-minute peak window when the aggregator found one, hourly fallback
    // otherwise
    let time_stats = &stats.time_stats;
    if let (Some(start), Some(end)) = (time_stats.peak_window_start, time_stats.peak_window_end) {
        let _ = writeln!(
            out,
            "- **Peak window**: {} to {} ({} errors)",
            start.format("%Y-%m-%d %H:%M"),
            end.format("%H:%M"),
            time_stats.peak_window_count
        );
    } else if let Some(earliest) = time_stats.earliest_log_time {
        if let Some(start) = earliest
            .date_naive()
            .and_hms_opt(time_stats.peak_hour as u32, 0, 0)
            .and_then(|naive| naive.and_local_timezone(*earliest.offset()).single())
        {
            let end = start + chrono::Duration::hours(1);
            let _ = writeln!(
                out,
                "- **Peak window**: {} to {} ({} errors)",
                start.format("%Y-%m-%d %H:%M"),
                end.format("%H:%M"),
                time_stats.peak_count
            );
        }
    }

    if !analyses.is_empty() {
        out.push_str("\n**Most urgent problems**:\n");
        for (i, analysis) in analyses.iter().take(2).enumerate() {
            let _ = writeln!(
                out,
                "  {}. {} ({})",
                i + 1,
                problem_name(analysis),
                analysis.severity.as_str()
            );
        }
    }

    out.push_str("\n---\n\n");
}

fn write_top_problems(out: &mut String, analyses: &[Analysis]) {
    out.push_str("## 🚨 Top Problems\n\n");

    let registry = registry();

    for (i, analysis) in analyses.iter().take(5).enumerate() {
        let _ = writeln!(out, "### {}. {}\n", i + 1, problem_name(analysis));

        let location = analysis
            .suggested_actions
            .get(1)
            .map(|a| extract_detail(a))
            .unwrap_or_default();
        let message = analysis
            .suggested_actions
            .first()
            .map(|a| extract_detail(a))
            .unwrap_or_default();
        let count = extract_count_from_reason(&analysis.reason);

        let _ = writeln!(out, "**Location**: `{}`  ", location);
        let _ = writeln!(out, "**Occurrences**: {}  ", count);
        let _ = writeln!(out, "**Error message**: \n```\n{}\n```\n", message);

        if analysis.is_known && !analysis.issue_id.is_empty() {
            if let Some(issue) = registry.issue(&analysis.issue_id) {
                let _ = writeln!(out, "**Known issue**: `{}` - {}  ", issue.id, issue.name);
                let _ = writeln!(out, "**Category**: {}  ", issue.category);
            }
        }

        let pattern = time_pattern(analysis);
        let _ = writeln!(out, "**Time pattern**: {}  ", pattern);
        let _ = writeln!(
            out,
            "**Severity**: 🔴 **{}** - {}  ",
            analysis.severity.as_str().to_uppercase(),
            severity_reason(analysis, &count)
        );
        let _ = writeln!(out, "**Next step**: {}\n", next_step(analysis));
    }

    out.push_str("---\n\n");
}

fn write_secondary_issues(out: &mut String, analyses: &[Analysis]) {
    if analyses.len() <= 5 {
        return;
    }

    out.push_str("## 📝 Secondary Issues (low frequency)\n\n");
    out.push_str("| Problem | Location | Occurrences | Status | Severity |\n");
    out.push_str("|---------|----------|-------------|--------|----------|\n");

    let registry = registry();

    for analysis in &analyses[5..] {
        let location = analysis
            .suggested_actions
            .get(1)
            .map(|a| extract_detail(a))
            .unwrap_or_default();

        let status = if analysis.is_known && !analysis.issue_id.is_empty() {
            match registry.issue(&analysis.issue_id) {
                Some(issue) => format!("✅ {}", issue.id),
                None => "🆕 new".to_string(),
            }
        } else {
            "🆕 new".to_string()
        };

        let _ = writeln!(
            out,
            "| {} | `{}` | {} | {} | {} |",
            problem_name(analysis),
            location,
            extract_count_from_reason(&analysis.reason),
            status,
            analysis.severity.as_str()
        );
    }

    out.push('\n');
}

// HELPERS //

/// Stable sort by severity rank; input order (count descending) survives
/// within each tier.
pub fn sort_by_severity(analyses: &[Analysis]) -> Vec<Analysis> {
    let mut sorted = analyses.to_vec();
    sorted.sort_by_key(|a| a.severity.rank());
    sorted
}

fn problem_name(analysis: &Analysis) -> String {
    if let Some(action) = analysis.suggested_actions.first() {
        let message = extract_detail(action);
        if !message.is_empty() {
            return message;
        }
    }
    analysis.reason.clone()
}

// actions are "label: detail"; pull the detail back out
fn extract_detail(action: &str) -> String {
    match action.split_once(": ") {
        Some((_, detail)) => detail.trim().to_string(),
        None => action.to_string(),
    }
}

static COUNT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\s*(次|times)").unwrap());

/// Pull the occurrence count back out of a reason string. Accepts both the
/// English and Chinese forms.
pub fn extract_count_from_reason(reason: &str) -> String {
    COUNT_RE
        .captures(reason)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn time_pattern(analysis: &Analysis) -> &'static str {
    match analysis.severity {
        Severity::High | Severity::Critical => {
            "**burst** - concentrated around the peak window (needs immediate attention)"
        }
        Severity::Medium => "**sustained** - spread across the day",
        Severity::Low => "**sporadic** - occasional occurrences",
    }
}

fn severity_reason(analysis: &Analysis, count: &str) -> String {
    match analysis.severity {
        Severity::High | Severity::Critical => format!(
            "high-frequency error ({} occurrences) + concentrated in business hours + likely user impact",
            count
        ),
        Severity::Medium => "moderate impact, should be tracked".to_string(),
        Severity::Low => "low impact, can be deferred".to_string(),
    }
}

fn next_step(analysis: &Analysis) -> &'static str {
    match analysis.severity {
        Severity::High | Severity::Critical => {
            "check recent deployments or traffic changes around the peak window"
        }
        Severity::Medium => "open a ticket for root-cause analysis and monitoring",
        Severity::Low => "monitor for escalation, no immediate action required",
    }
}

pub fn count_high_priority(analyses: &[Analysis]) -> usize {
    analyses
        .iter()
        .filter(|a| matches!(a.severity, Severity::High | Severity::Critical))
        .count()
}

pub fn count_new_issues(analyses: &[Analysis]) -> usize {
    analyses.iter().filter(|a| !a.is_known).count()
}

/// Human-readable duration, rounded to the nearest hour and shown as
/// days/hours/minutes.
pub fn format_duration(duration: std::time::Duration) -> String {
    let hours = (duration.as_secs_f64() / 3600.0 + 0.5) as u64;

    if hours >= 24 {
        let days = hours / 24;
        let remaining = hours % 24;
        if remaining == 0 {
            return format!("past {} days", days);
        }
        return format!("past {} days {} hours", days, remaining);
    }

    if hours > 0 {
        return format!("past {} hours", hours);
    }

    let minutes = (duration.as_secs_f64() / 60.0 + 0.5) as u64;
    format!("past {} minutes", minutes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analysis(id: &str, severity: Severity, count: u64, known: Option<&str>) -> Analysis {
        Analysis {
            error_group_id: id.to_string(),
            is_known: known.is_some(),
            issue_id: known.unwrap_or_default().to_string(),
            severity,
            reason: format!("error occurred {} times in service pp-slot-api", count),
            suggested_actions: vec![
                "investigate error pattern: something broke".to_string(),
                "check logs from caller: api/handler.go:123".to_string(),
                "correlate with recent deployments or configuration changes".to_string(),
            ],
        }
    }

    #[test]
    fn test_extract_count_round_trip() {
        for count in [0u64, 1, 5, 45, 274, 100000] {
            let reason = format!("error occurred {} times in service svc", count);
            assert_eq!(extract_count_from_reason(&reason), count.to_string());
        }
    }

    #[test]
    fn test_extract_count_chinese_form() {
        assert_eq!(
            extract_count_from_reason("錯誤在服務 pp-slot-api 中發生了 45 次"),
            "45"
        );
    }

    #[test]
    fn test_extract_count_no_match() {
        assert_eq!(
            extract_count_from_reason("some reason without numbers"),
            "unknown"
        );
    }

    #[test]
    fn test_extract_detail_keeps_caller_colons() {
        assert_eq!(
            extract_detail("check logs from caller: api/handler.go:123"),
            "api/handler.go:123"
        );
    }

    #[test]
    fn test_sort_by_severity_is_stable() {
        let analyses = vec![
            analysis("a", Severity::Low, 2, None),
            analysis("b", Severity::High, 120, None),
            analysis("c", Severity::Medium, 25, None),
            analysis("d", Severity::High, 60, None),
        ];
        let sorted = sort_by_severity(&analyses);
        assert_eq!(sorted[0].error_group_id, "b");
        assert_eq!(sorted[1].error_group_id, "d"); // input order kept within tier
        assert_eq!(sorted[2].error_group_id, "c");
        assert_eq!(sorted[3].error_group_id, "a");
    }

    #[test]
    fn test_format_duration_rounds_to_hours() {
        assert_eq!(
            format_duration(std::time::Duration::from_secs(3600 * 4 - 300)),
            "past 4 hours"
        );
        assert_eq!(
            format_duration(std::time::Duration::from_secs(3600 * 24)),
            "past 1 days"
        );
        assert_eq!(
            format_duration(std::time::Duration::from_secs(3600 * 26)),
            "past 1 days 2 hours"
        );
        assert_eq!(
            format_duration(std::time::Duration::from_secs(600)),
            "past 10 minutes"
        );
    }

    #[test]
    fn test_priority_counters() {
        let analyses = vec![
            analysis("a", Severity::High, 120, Some("ISSUE-002")),
            analysis("b", Severity::Medium, 25, None),
            analysis("c", Severity::Critical, 999, None),
        ];
        assert_eq!(count_high_priority(&analyses), 2);
        assert_eq!(count_new_issues(&analyses), 2);
    }
}
