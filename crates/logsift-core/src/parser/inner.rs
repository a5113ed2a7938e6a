// Inner payload parsing

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::Deserialize;

use super::ParseError;
use crate::LogLevel;

// naive formats are assumed UTC
const ZONED_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M:%S%z"];
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.fZ", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"];

// raw shape of the structured payload
#[derive(Debug, Deserialize)]
struct InnerFields {
    #[serde(rename = "@timestamp", default)]
    timestamp: String,

    #[serde(default)]
    caller: String,

    #[serde(default)]
    content: String,

    #[serde(default)]
    level: String,

    #[serde(default)]
    span: String,

    #[serde(default)]
    trace: String,

    // fallbacks some services emit instead of `content`
    #[serde(default)]
    message: String,

    #[serde(default)]
    logger: String,

    #[serde(default)]
    thread: String,

    #[serde(default)]
    request_id: String,
}

/// Validated fields of the inner payload
#[derive(Debug, Clone)]
pub struct InnerPayload {
    pub timestamp: DateTime<FixedOffset>,
    pub caller: String,
    pub content: String,
    pub level: LogLevel,
    pub span: String,
    pub trace: String,
    pub logger: String,
    pub thread: String,
    pub request_id: String,
}

/// Parses the structured payload extracted by the wrapper remover.
pub struct InnerParser;

impl InnerParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, payload: &str) -> Result<InnerPayload, ParseError> {
        let clean = clean_payload(payload);
        let fields: InnerFields = serde_json::from_str(&clean)?;

        let timestamp = parse_timestamp(&fields.timestamp)?;

        // message substitutes when content is missing
        let content = if fields.content.is_empty() && !fields.message.is_empty() {
            fields.message.clone()
        } else {
            fields.content
        };
        if content.is_empty() {
            return Err(ParseError::MissingField("content"));
        }

        let level_raw = fields.level.trim().to_lowercase();
        if level_raw.is_empty() {
            return Err(ParseError::MissingField("level"));
        }
        let level = LogLevel::from_str(&level_raw).ok_or(ParseError::InvalidLevel(level_raw))?;

        Ok(InnerPayload {
            timestamp,
            caller: fields.caller,
            content,
            level,
            span: fields.span,
            trace: fields.trace,
            logger: fields.logger,
            thread: fields.thread,
            request_id: fields.request_id,
        })
    }
}

impl Default for InnerParser {
    fn default() -> Self {
        Self::new()
    }
}

// trailing commas before a closing brace show up in forwarded payloads and
// are invalid JSON
fn clean_payload(payload: &str) -> String {
    let payload = payload.trim();
    let payload = payload.replace(",}", "}");
    payload.replace(",]", "]")
}

/// Try the known timestamp shapes in order; the first one that parses wins.
pub fn parse_timestamp(value: &str) -> Result<DateTime<FixedOffset>, ParseError> {
    if value.is_empty() {
        return Err(ParseError::MissingField("@timestamp"));
    }

    // RFC3339 covers the nano variant as well
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed);
    }

    for format in ZONED_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(value, format) {
            return Ok(parsed);
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(parsed.and_utc().fixed_offset());
        }
    }

    Err(ParseError::BadTimestamp(value.to_string()))
}
