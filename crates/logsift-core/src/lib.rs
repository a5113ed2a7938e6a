//! Core types for the log analysis pipeline
//! this crate contains shared data structures used across all stages.

pub mod normalizer;
pub mod parser;

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

// SEVERITY //

/// Error severity assigned to an analysis (ordered from most to least urgent
/// by `rank`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Sort rank, critical first
    pub fn rank(&self) -> u8 {
        match self {
            Self::Critical => 0,
            Self::High => 1,
            Self::Medium => 2,
            Self::Low => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

// LOG LEVEL //

/// Log severity levels accepted by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Parse log level from string (case-insensitive). Folds the common
    /// aliases; anything else is rejected so the record gets dropped.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "error" | "err" => Some(Self::Error),
            "warn" | "warning" => Some(Self::Warn),
            "info" => Some(Self::Info),
            "debug" => Some(Self::Debug),
            "trace" => Some(Self::Trace),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

// RAW DOCUMENT (one search hit) //

/// One hit returned by the search backend, before any parsing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawLog {
    pub index: String,

    pub id: String,

    pub source: SearchSource,

    // ingestion timestamp as reported by the backend
    #[serde(default)]
    pub timestamp: Option<DateTime<FixedOffset>>,
}

/// The `_source` payload of a search hit. The auxiliary maps (`agent`,
/// `host`, `log`) carry whatever the shipper attached; fields we care about
/// are pulled out through the accessor helpers in `parser::service`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchSource {
    #[serde(default)]
    pub event: EventData,

    #[serde(default)]
    pub message: String,

    #[serde(default)]
    pub fields: FieldsData,

    #[serde(default)]
    pub agent: HashMap<String, serde_json::Value>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub log: HashMap<String, serde_json::Value>,

    #[serde(default)]
    pub host: HashMap<String, serde_json::Value>,

    #[serde(rename = "@timestamp", default)]
    pub timestamp: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventData {
    #[serde(default)]
    pub original: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldsData {
    #[serde(default)]
    pub servicename: String,
}

// PARSED RECORD //

/// A log event extracted from a raw document. Timestamps keep the offset
/// they were written with, hour bucketing happens in the record's own zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedLog {
    #[serde(rename = "@timestamp")]
    pub timestamp: DateTime<FixedOffset>,

    pub caller: String, // file:line

    pub content: String,

    pub level: LogLevel,

    #[serde(default)]
    pub span: String,

    #[serde(default)]
    pub trace: String,

    pub service_name: String,
}

// ERROR GROUP //

/// The time bin with the highest error count for a group (1 hour wide)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeakWindow {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub count: u64,
    pub density: f64, // errors per minute
}

/// A group of deduplicated errors sharing one fingerprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorGroup {
    pub fingerprint: String,

    pub normalized_content: String,

    pub service_name: String,

    pub caller: String,

    pub total_count: u64,

    // retained exemplars, sorted by ascending timestamp
    pub samples: Vec<ParsedLog>,

    // "HH:00" -> count, in each record's own zone
    pub hourly_distribution: BTreeMap<String, u64>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub peak_window: Option<PeakWindow>,
}

// ANALYSIS //

/// Classification result for one error group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    // first 8 hex chars of the group fingerprint
    pub error_group_id: String,

    pub is_known: bool,

    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub issue_id: String,

    pub severity: Severity,

    pub reason: String,

    pub suggested_actions: Vec<String>,
}

// REPORT //

/// Summary of one pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub generated_at: DateTime<chrono::Local>,
    pub execution_time: std::time::Duration,
    pub total_logs: u64,
    pub error_group_count: u64,
    pub high_priority_count: u64,
    pub new_issue_count: u64,
    pub report_path: String,
    pub data_sources: Vec<String>,
}
