//! Report emission: per-service Markdown files and the JSON snapshot

pub mod markdown;
pub mod snapshot;

pub use markdown::{MarkdownReporter, ReportError};
pub use snapshot::save_analysis_json;
