//! Content normalization, fingerprinting and error grouping

use std::collections::BTreeMap;

use chrono::Timelike;
use regex::Regex;
use sha2::{Digest, Sha256};

use crate::{ErrorGroup, ParsedLog, PeakWindow};

/// Sample retention bounds for each error group
#[derive(Debug, Clone, Copy)]
pub struct GroupingConfig {
    pub min_samples: usize,
    pub max_samples: usize,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            min_samples: 3,
            max_samples: 5,
        }
    }
}

/// Reduces messages to a canonical form and groups them by fingerprint.
pub struct Normalizer {
    uuid_re: Regex,
    num_re: Regex,
    space_re: Regex,
}

impl Normalizer {
    pub fn new() -> Self {
        Self {
            // both the dashed 8-4-4-4-12 form and the bare 32-hex form
            uuid_re: Regex::new(
                r"[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}|\b[0-9a-f]{32}\b",
            )
            .unwrap(),
            num_re: Regex::new(r"\d+").unwrap(),
            space_re: Regex::new(r"\s+").unwrap(),
        }
    }

    /// Canonical form of a message: lowercase, identifiers masked,
    /// whitespace collapsed.
    pub fn normalize_content(&self, content: &str) -> String {
        let lowered = content.to_lowercase();
        let masked = self.uuid_re.replace_all(&lowered, "[uuid]");
        let masked = self.num_re.replace_all(&masked, "[num]");
        let collapsed = self.space_re.replace_all(&masked, " ");
        collapsed.trim().to_string()
    }

    /// Group parsed records by fingerprint. Output is ordered by descending
    /// total count, fingerprint ascending on ties, so downstream stages and
    /// reports are deterministic.
    pub fn group(&self, logs: &[ParsedLog], config: GroupingConfig) -> Vec<ErrorGroup> {
        let mut by_fingerprint: BTreeMap<String, ErrorGroup> = BTreeMap::new();

        for log in logs {
            let normalized = self.normalize_content(&log.content);
            let key = fingerprint(&normalized, &log.service_name, &log.caller);

            let group = by_fingerprint.entry(key.clone()).or_insert_with(|| ErrorGroup {
                fingerprint: key,
                normalized_content: normalized,
                service_name: log.service_name.clone(),
                caller: log.caller.clone(),
                total_count: 0,
                samples: Vec::new(),
                hourly_distribution: BTreeMap::new(),
                peak_window: None,
            });

            group.total_count += 1;

            if group.samples.len() < config.max_samples {
                group.samples.push(log.clone());
            }

            // hour bucket in the record's own zone
            let hour_key = format!("{:02}:00", log.timestamp.hour());
            *group.hourly_distribution.entry(hour_key).or_insert(0) += 1;
        }

        let mut groups: Vec<ErrorGroup> = by_fingerprint.into_values().collect();

        for group in &mut groups {
            group.samples.sort_by_key(|s| s.timestamp);
            if group.samples.len() > config.min_samples {
                group.samples.truncate(config.min_samples);
            }
            group.peak_window = peak_window(&group.hourly_distribution, &group.samples);
        }

        groups.sort_by(|a, b| {
            b.total_count
                .cmp(&a.total_count)
                .then_with(|| a.fingerprint.cmp(&b.fingerprint))
        });

        groups
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Stable group key: 64-hex SHA-256 over the normalized content, service
/// and caller.
pub fn fingerprint(normalized_content: &str, service_name: &str, caller: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalized_content.as_bytes());
    hasher.update(b"|");
    hasher.update(service_name.as_bytes());
    hasher.update(b"|");
    hasher.update(caller.as_bytes());
    hex::encode(hasher.finalize())
}

// the hour with the highest count, anchored on the date of the earliest
// retained sample. Ties go to the earliest hour.
fn peak_window(
    distribution: &BTreeMap<String, u64>,
    samples: &[ParsedLog],
) -> Option<PeakWindow> {
    let mut best: Option<(&str, u64)> = None;
    for (hour, &count) in distribution {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((hour, count));
        }
    }
    let (hour_key, count) = best?;

    let earliest = samples.first()?;
    let hour: u32 = hour_key[..2].parse().ok()?;

    let start = earliest
        .timestamp
        .date_naive()
        .and_hms_opt(hour, 0, 0)?
        .and_local_timezone(*earliest.timestamp.offset())
        .single()?;

    Some(PeakWindow {
        start,
        end: start + chrono::Duration::hours(1),
        count,
        density: count as f64 / 60.0,
    })
}

// DUPLICATION STATS //

#[derive(Debug, Clone, serde::Serialize)]
pub struct NormalizationStats {
    pub total_logs: usize,
    pub unique_groups: usize,
    pub duplication_rate: f64,
}

pub fn normalization_stats(original_count: usize, groups: &[ErrorGroup]) -> NormalizationStats {
    let duplication_rate = if original_count > 0 {
        1.0 - (groups.len() as f64 / original_count as f64)
    } else {
        0.0
    };

    NormalizationStats {
        total_logs: original_count,
        unique_groups: groups.len(),
        duplication_rate,
    }
}
