// Service name extraction

use std::collections::HashMap;

use regex::Regex;

use crate::RawLog;

// infrastructure labels that are never a real service
const BLACKLIST: &[&str] = &[
    "filebeat", "logstash", "fluentd", "unknown", "default", "system", "kernel",
];

// environment prefixes stripped before normalization
const ENV_PREFIXES: &[&str] = &[
    "lc-jade-prod_",
    "lc-jade-staging_",
    "lc-jade-dev_",
    "prod_",
    "staging_",
    "dev_",
];

// index suffixes stripped when deriving a service from the index name
const INDEX_SUFFIXES: &[&str] = &["-log", "-prod", "-staging"];

/// Derives the owning service of a document. Fallback chain: explicit
/// `fields.servicename`, then container/pod identity (log file path, host
/// name, agent name), then the index name. Returns `None` when nothing
/// yields a valid name, which drops the record.
pub struct ServiceExtractor {
    patterns: Vec<Regex>,
}

impl ServiceExtractor {
    pub fn new() -> Self {
        let patterns = vec![
            // pod name with replicaset and pod hash: "pp-slot-rpc-dd4bcd599-vlkp5"
            Regex::new(r"^([a-zA-Z0-9-]+)-[a-f0-9]{8,10}-[a-z0-9]{5}$").unwrap(),
            // generic pod name with hash suffixes
            Regex::new(r"^([a-zA-Z0-9-]+)-[a-f0-9]+-[a-z0-9]+$").unwrap(),
            // bare service token
            Regex::new(r"^([a-zA-Z0-9][a-zA-Z0-9-_]*[a-zA-Z0-9])$").unwrap(),
        ];

        Self { patterns }
    }

    pub fn extract(&self, raw: &RawLog) -> Option<String> {
        // 1. explicit service hint from the shipper
        if !raw.source.fields.servicename.is_empty() {
            let name = normalize(&raw.source.fields.servicename);
            if is_valid(&name) {
                return Some(name);
            }
        }

        // 2. container identity fields
        if let Some(path) = nested_str(&raw.source.log, &["file", "path"]) {
            if let Some(name) = self.from_file_path(path) {
                return Some(name);
            }
        }
        for candidate in [
            string_field(&raw.source.host, "name"),
            string_field(&raw.source.agent, "name"),
        ]
        .into_iter()
        .flatten()
        {
            if let Some(name) = self.from_token(candidate) {
                return Some(name);
            }
        }

        // 3. derive from the index name
        self.from_index(&raw.index)
    }

    // try the pod-name patterns against one token, then the cleaned token
    // itself
    fn from_token(&self, token: &str) -> Option<String> {
        if token.is_empty() {
            return None;
        }

        let stripped = strip_env_prefix(token);

        for pattern in &self.patterns {
            if let Some(caps) = pattern.captures(stripped) {
                if let Some(m) = caps.get(1) {
                    let name = normalize(m.as_str());
                    if is_valid(&name) {
                        return Some(name);
                    }
                }
            }
        }

        let cleaned = normalize(stripped);
        if is_valid(&cleaned) {
            return Some(cleaned);
        }

        None
    }

    // e.g. /var/lib/docker/containers/lc-jade-prod_pp-slot-rpc-dd4bcd599-vlkp5_f0b.../0.log
    fn from_file_path(&self, path: &str) -> Option<String> {
        for part in path.split('/') {
            if part.is_empty() {
                continue;
            }
            if matches!(part, "var" | "lib" | "docker" | "containers" | "pods") {
                continue;
            }
            if let Some(name) = self.from_token(part) {
                return Some(name);
            }
        }
        None
    }

    // "pp-slot-api-log*" -> "pp-slot-api"
    fn from_index(&self, index: &str) -> Option<String> {
        let mut name = index.trim_end_matches('*');
        for suffix in INDEX_SUFFIXES {
            name = name.strip_suffix(suffix).unwrap_or(name);
        }

        let cleaned = normalize(name);
        if is_valid(&cleaned) {
            return Some(cleaned);
        }
        None
    }
}

impl Default for ServiceExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn strip_env_prefix(token: &str) -> &str {
    for prefix in ENV_PREFIXES {
        if let Some(rest) = token.strip_prefix(prefix) {
            return rest;
        }
    }
    token
}

/// Canonical service name form: lowercase, hyphen-separated, no stray
/// characters.
pub fn normalize(name: &str) -> String {
    let lowered = name.to_lowercase().replace('_', "-");

    let mut cleaned: String = lowered
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect();

    while cleaned.contains("--") {
        cleaned = cleaned.replace("--", "-");
    }

    cleaned.trim_matches('-').to_string()
}

pub fn is_valid(name: &str) -> bool {
    if name.len() < 2 || name.len() > 100 {
        return false;
    }

    let first = name.as_bytes()[0];
    let last = name.as_bytes()[name.len() - 1];
    if !first.is_ascii_alphanumeric() || !last.is_ascii_alphanumeric() {
        return false;
    }

    !BLACKLIST.contains(&name)
}

// accessor helpers for the loosely typed backend maps. Missing or
// wrongly-typed fields degrade to None.

fn string_field<'a>(map: &'a HashMap<String, serde_json::Value>, key: &str) -> Option<&'a str> {
    map.get(key).and_then(serde_json::Value::as_str)
}

fn nested_str<'a>(
    map: &'a HashMap<String, serde_json::Value>,
    path: &[&str],
) -> Option<&'a str> {
    let (head, rest) = path.split_first()?;
    let mut value = map.get(*head)?;
    for key in rest {
        value = value.get(key)?;
    }
    value.as_str()
}
