//! JSON snapshot of a full analysis run

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;

use logsift_analysis::{AggregationResult, AggregationStats};
use logsift_core::Analysis;

use crate::markdown::ReportError;

/// Persist the analyses and aggregation result for downstream tooling.
/// Unlike the per-service Markdown files, a failure here is fatal.
pub fn save_analysis_json(
    analyses: &[Analysis],
    stats: &AggregationResult,
    output_path: &Path,
) -> Result<PathBuf, ReportError> {
    fs::create_dir_all(output_path)?;

    let now = Local::now();
    let data = serde_json::json!({
        "timestamp": now,
        "analyses": analyses,
        "aggregation": stats,
        "agg_stats": AggregationStats::from_result(stats),
    });

    let filename = format!("analysis_{}.json", now.format("%Y-%m-%d_%H-%M-%S"));
    let path = output_path.join(filename);
    fs::write(&path, serde_json::to_string_pretty(&data)?)?;

    Ok(path)
}
