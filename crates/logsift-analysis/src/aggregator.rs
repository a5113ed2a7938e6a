//! Statistical aggregation over error groups

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::{DateTime, FixedOffset, Timelike};
use serde::Serialize;

use logsift_core::ErrorGroup;

// per-service rollup
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStats {
    pub service_name: String,
    pub error_group_count: u64,
    pub total_errors: u64,
    pub peak_density: f64,
}

// time-based rollup across all groups
#[derive(Debug, Clone, Default, Serialize)]
pub struct TimeStats {
    // hour of day -> count
    pub hourly_distribution: BTreeMap<u8, u64>,
    pub peak_hour: u8,
    pub peak_count: u64,
    pub average_density: f64,

    pub earliest_log_time: Option<DateTime<FixedOffset>>,
    pub latest_log_time: Option<DateTime<FixedOffset>>,
    pub query_duration: std::time::Duration,

    // 30-minute peak window over the retained samples
    pub peak_window_start: Option<DateTime<FixedOffset>>,
    pub peak_window_end: Option<DateTime<FixedOffset>>,
    pub peak_window_count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregationResult {
    pub service_stats: BTreeMap<String, ServiceStats>,
    pub time_stats: TimeStats,
    pub total_error_groups: usize,
    pub total_logs: u64,
    pub processing_time: std::time::Duration,
}

pub struct Aggregator;

impl Aggregator {
    pub fn new() -> Self {
        Self
    }

    pub fn aggregate(&self, groups: &[ErrorGroup]) -> AggregationResult {
        let started = Instant::now();

        let mut service_stats: BTreeMap<String, ServiceStats> = BTreeMap::new();
        let mut hourly: BTreeMap<u8, u64> = BTreeMap::new();
        let mut total_logs = 0u64;

        for group in groups {
            total_logs += group.total_count;

            let stats = service_stats
                .entry(group.service_name.clone())
                .or_insert_with(|| ServiceStats {
                    service_name: group.service_name.clone(),
                    error_group_count: 0,
                    total_errors: 0,
                    peak_density: 0.0,
                });
            stats.error_group_count += 1;
            stats.total_errors += group.total_count;
            if let Some(peak) = &group.peak_window {
                if peak.density > stats.peak_density {
                    stats.peak_density = peak.density;
                }
            }

            for (hour_key, count) in &group.hourly_distribution {
                let hour: u8 = hour_key[..2].parse().unwrap_or(0);
                *hourly.entry(hour).or_insert(0) += count;
            }
        }

        let mut time_stats = TimeStats {
            hourly_distribution: hourly,
            ..Default::default()
        };

        // peak hour: strictly-greater comparison over ascending hours, so
        // ties resolve to the lowest hour
        for (&hour, &count) in &time_stats.hourly_distribution {
            if count > time_stats.peak_count {
                time_stats.peak_count = count;
                time_stats.peak_hour = hour;
            }
        }

        self.fill_sample_time_stats(groups, &mut time_stats);

        // mean of per-group peak densities, over groups that have one
        let densities: Vec<f64> = groups
            .iter()
            .filter_map(|g| g.peak_window.as_ref())
            .map(|w| w.density)
            .collect();
        if !densities.is_empty() {
            time_stats.average_density = densities.iter().sum::<f64>() / densities.len() as f64;
        }

        AggregationResult {
            service_stats,
            time_stats,
            total_error_groups: groups.len(),
            total_logs,
            processing_time: started.elapsed(),
        }
    }

    // earliest/latest sample timestamps and the 30-minute peak bin
    fn fill_sample_time_stats(&self, groups: &[ErrorGroup], time_stats: &mut TimeStats) {
        let mut earliest: Option<DateTime<FixedOffset>> = None;
        let mut latest: Option<DateTime<FixedOffset>> = None;
        // "HH:MM" half-hour bin -> count; string keys sort chronologically
        let mut bins: BTreeMap<String, u64> = BTreeMap::new();

        for group in groups {
            for sample in &group.samples {
                let ts = sample.timestamp;
                if earliest.map_or(true, |e| ts < e) {
                    earliest = Some(ts);
                }
                if latest.map_or(true, |l| ts > l) {
                    latest = Some(ts);
                }

                let half = if ts.minute() < 30 { "00" } else { "30" };
                let key = format!("{:02}:{}", ts.hour(), half);
                *bins.entry(key).or_insert(0) += 1;
            }
        }

        time_stats.earliest_log_time = earliest;
        time_stats.latest_log_time = latest;
        if let (Some(earliest), Some(latest)) = (earliest, latest) {
            time_stats.query_duration = (latest - earliest).to_std().unwrap_or_default();
        }

        // winning bin, earliest on ties
        let mut best: Option<(&str, u64)> = None;
        for (bin, &count) in &bins {
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((bin, count));
            }
        }

        if let (Some((bin, count)), Some(earliest)) = (best, earliest) {
            let hour: u32 = bin[..2].parse().unwrap_or(0);
            let minute: u32 = bin[3..].parse().unwrap_or(0);

            // anchor on the day of the earliest sample, in its zone
            let start = earliest
                .date_naive()
                .and_hms_opt(hour, minute, 0)
                .and_then(|naive| naive.and_local_timezone(*earliest.offset()).single());

            if let Some(start) = start {
                time_stats.peak_window_start = Some(start);
                time_stats.peak_window_end = Some(start + chrono::Duration::minutes(30));
                time_stats.peak_window_count = count;
            }
        }
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

// SUMMARY STATS //

/// Flattened aggregation summary for the CLI output and the JSON snapshot
#[derive(Debug, Clone, Serialize)]
pub struct AggregationStats {
    pub total_error_groups: usize,
    pub total_logs: u64,
    pub total_services: usize,
    pub peak_hour: u8,
    pub peak_count: u64,
    pub average_density: f64,
    pub services_sorted: Vec<ServiceStats>,
    pub processing_time_ms: u128,
}

impl AggregationStats {
    pub fn from_result(result: &AggregationResult) -> Self {
        let mut services_sorted: Vec<ServiceStats> =
            result.service_stats.values().cloned().collect();
        services_sorted.sort_by(|a, b| {
            b.total_errors
                .cmp(&a.total_errors)
                .then_with(|| a.service_name.cmp(&b.service_name))
        });

        Self {
            total_error_groups: result.total_error_groups,
            total_logs: result.total_logs,
            total_services: result.service_stats.len(),
            peak_hour: result.time_stats.peak_hour,
            peak_count: result.time_stats.peak_count,
            average_density: result.time_stats.average_density,
            services_sorted,
            processing_time_ms: result.processing_time.as_millis(),
        }
    }
}
