//! preprocessor - turns raw search hits into validated ParsedLog records

pub mod inner;
pub mod service;
pub mod wrapper;

pub use inner::InnerParser;
pub use service::ServiceExtractor;
pub use wrapper::WrapperRemover;

use std::collections::BTreeMap;

use thiserror::Error;

use crate::{ParsedLog, RawLog};

// why a single record was dropped
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no message content found in document")]
    EmptyMessage,

    #[error("no wrapper pattern matched: {0}")]
    WrapperMismatch(String),

    #[error("invalid inner payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    #[error("unparseable timestamp: {0}")]
    BadTimestamp(String),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid log level: {0}")]
    InvalidLevel(String),

    #[error("unable to extract a service name")]
    NoServiceName,
}

/// Runs the full preprocessing chain: wrapper removal, inner payload parse,
/// service extraction, validation. Records that fail any step are dropped,
/// the run keeps going.
pub struct LogPreprocessor {
    wrapper: WrapperRemover,
    inner: InnerParser,
    services: ServiceExtractor,
}

impl LogPreprocessor {
    pub fn new() -> Self {
        Self {
            wrapper: WrapperRemover::new(),
            inner: InnerParser::new(),
            services: ServiceExtractor::new(),
        }
    }

    /// Process raw documents into parsed records. Failures are logged at
    /// debug and counted via `ProcessingStats::collect`.
    pub fn process(&self, raw_logs: &[RawLog]) -> Vec<ParsedLog> {
        let mut parsed = Vec::new();

        for raw in raw_logs {
            match self.process_one(raw) {
                Ok(record) => parsed.push(record),
                Err(err) => {
                    tracing::debug!(id = %raw.id, index = %raw.index, %err, "dropping document");
                }
            }
        }

        parsed
    }

    fn process_one(&self, raw: &RawLog) -> Result<ParsedLog, ParseError> {
        // message can live in two places depending on the shipper
        let message = if !raw.source.message.is_empty() {
            &raw.source.message
        } else if !raw.source.event.original.is_empty() {
            &raw.source.event.original
        } else {
            return Err(ParseError::EmptyMessage);
        };

        let payload = self.wrapper.remove(message)?;
        let fields = self.inner.parse(&payload)?;

        let service_name = self
            .services
            .extract(raw)
            .ok_or(ParseError::NoServiceName)?;

        Ok(ParsedLog {
            timestamp: fields.timestamp,
            caller: fields.caller,
            content: fields.content,
            level: fields.level,
            span: fields.span,
            trace: fields.trace,
            service_name,
        })
    }
}

impl Default for LogPreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

// PROCESSING STATS //

/// Statistics about one preprocessing pass, for the CLI progress output
#[derive(Debug, Clone, serde::Serialize)]
pub struct ProcessingStats {
    pub total_raw_logs: usize,
    pub successfully_parsed: usize,
    pub failed: usize,
    pub success_rate: f64,
    pub level_counts: BTreeMap<String, u64>,
}

impl ProcessingStats {
    pub fn collect(raw_logs: &[RawLog], parsed: &[ParsedLog]) -> Self {
        let total = raw_logs.len();
        let ok = parsed.len();

        let mut level_counts: BTreeMap<String, u64> = BTreeMap::new();
        for record in parsed {
            *level_counts
                .entry(record.level.as_str().to_string())
                .or_default() += 1;
        }

        Self {
            total_raw_logs: total,
            successfully_parsed: ok,
            failed: total.saturating_sub(ok),
            success_rate: if total > 0 { ok as f64 / total as f64 } else { 0.0 },
            level_counts,
        }
    }
}
