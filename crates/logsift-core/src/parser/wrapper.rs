// Container runtime wrapper removal

use regex::Regex;

use super::ParseError;

/// Strips the container-runtime framing around each log line:
/// `<timestamp> (stderr|stdout) [FP] <payload>`
pub struct WrapperRemover {
    patterns: Vec<Regex>,
}

impl WrapperRemover {
    pub fn new() -> Self {
        let patterns = vec![
            // standard form: "TIMESTAMP stderr F PAYLOAD"
            Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d+Z\s+stderr\s+F\s+(.*)$")
                .unwrap(),
            // stdout variant
            Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d+Z\s+stdout\s+F\s+(.*)$")
                .unwrap(),
            // without fractional seconds
            Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}Z\s+stderr\s+F\s+(.*)$").unwrap(),
            // generic: either stream, full or partial line marker
            Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d*Z\s+(stderr|stdout)\s+[FP]\s+(.*)$")
                .unwrap(),
        ];

        Self { patterns }
    }

    /// Extract the inner payload. If no wrapper pattern matches but the
    /// trimmed text looks like a bare JSON object, it is taken as-is.
    pub fn remove(&self, message: &str) -> Result<String, ParseError> {
        for pattern in &self.patterns {
            if let Some(caps) = pattern.captures(message) {
                // payload is always the last capture group
                if let Some(inner) = caps.get(caps.len() - 1) {
                    return Ok(clean_content(inner.as_str()));
                }
            }
        }

        let trimmed = message.trim();
        if trimmed.starts_with('{') && trimmed.ends_with('}') {
            return Ok(trimmed.to_string());
        }

        let preview: String = message.chars().take(100).collect();
        Err(ParseError::WrapperMismatch(preview))
    }
}

impl Default for WrapperRemover {
    fn default() -> Self {
        Self::new()
    }
}

// unescape once: forwarded logs arrive with quotes and backslashes escaped
fn clean_content(content: &str) -> String {
    let content = content.trim();
    let content = content.replace("\\\"", "\"");
    content.replace("\\\\", "\\")
}
