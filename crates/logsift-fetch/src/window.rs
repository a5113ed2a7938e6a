// Time-window splitting for the fetch stage

use chrono::{DateTime, Duration, Utc};

use logsift_core::RawLog;

use crate::client::{FetchError, SearchClient};
use crate::query;

/// Fetches a time range as a series of fixed-size sub-windows, one search
/// request per window per index. Splitting keeps each window under the
/// backend's 500-hit page cap so older hits are not silently dropped.
pub struct WindowedFetcher {
    client: SearchClient,
    indices: Vec<String>,
    keyword: String,
    window: Duration,
}

impl WindowedFetcher {
    pub fn new(client: SearchClient, indices: Vec<String>, keyword: String) -> Self {
        Self {
            client,
            indices,
            keyword,
            window: Duration::minutes(30),
        }
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Fetch `[end - range, end]`. All window requests run concurrently; a
    /// failed window is logged and skipped. The fetch fails only when every
    /// request failed.
    pub async fn fetch(
        &self,
        range: Duration,
        end: DateTime<Utc>,
    ) -> Result<Vec<RawLog>, FetchError> {
        self.fetch_with_cancel(range, end, std::future::pending()).await
    }

    /// Like `fetch`, but stops early when `cancel` resolves: in-flight
    /// requests are aborted and whatever windows were already collected are
    /// returned as partial data.
    pub async fn fetch_with_cancel(
        &self,
        range: Duration,
        end: DateTime<Utc>,
        cancel: impl std::future::Future<Output = ()>,
    ) -> Result<Vec<RawLog>, FetchError> {
        use futures::stream::{FuturesUnordered, StreamExt};

        let windows = plan_windows(range, self.window, end);

        tracing::info!(
            windows = windows.len(),
            window_minutes = self.window.num_minutes(),
            indices = self.indices.len(),
            "fetching logs across time windows"
        );

        let mut requests = FuturesUnordered::new();
        for (start, stop) in &windows {
            for index in &self.indices {
                requests.push(self.fetch_one(index, *start, *stop));
            }
        }
        let total = requests.len();

        tokio::pin!(cancel);

        let mut logs = Vec::new();
        let mut failed = 0usize;
        let mut cancelled = false;

        loop {
            tokio::select! {
                outcome = requests.next() => match outcome {
                    Some(Ok(mut batch)) => logs.append(&mut batch),
                    Some(Err(_)) => failed += 1,
                    None => break,
                },
                _ = &mut cancel => {
                    tracing::warn!(
                        collected = logs.len(),
                        "fetch cancelled, aborting in-flight requests"
                    );
                    cancelled = true;
                    break;
                }
            }
        }

        if !cancelled && total > 0 && failed == total {
            return Err(FetchError::AllWindowsFailed(total));
        }

        Ok(logs)
    }

    async fn fetch_one(
        &self,
        index: &str,
        start: DateTime<Utc>,
        stop: DateTime<Utc>,
    ) -> Result<Vec<RawLog>, FetchError> {
        let body = query::search_body(&self.keyword, start, stop);

        match self.client.search(index, body).await {
            Ok(batch) => {
                tracing::info!(
                    index,
                    window = %format!("{} - {}", start.format("%H:%M:%S"), stop.format("%H:%M:%S")),
                    hits = batch.len(),
                    "window fetched"
                );
                Ok(batch)
            }
            Err(err) => {
                tracing::warn!(
                    index,
                    window = %format!("{} - {}", start.format("%H:%M:%S"), stop.format("%H:%M:%S")),
                    %err,
                    "window skipped"
                );
                Err(err)
            }
        }
    }
}

/// Split `[end - range, end]` into contiguous non-overlapping windows,
/// newest first. When the range is shorter than one window, the single
/// window narrows to the range rather than padding out to the window size.
pub fn plan_windows(
    range: Duration,
    window: Duration,
    end: DateTime<Utc>,
) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    if range <= Duration::zero() || window <= Duration::zero() {
        return Vec::new();
    }

    if range < window {
        return vec![(end - range, end)];
    }

    let count = (range.num_seconds() / window.num_seconds()).max(1) as i32;
    (0..count)
        .map(|i| (end - window * (i + 1), end - window * i))
        .collect()
}

/// Parse a time range literal like `1h`, `24h`, `7d`, `90m`.
pub fn parse_time_range(literal: &str) -> Result<Duration, FetchError> {
    let trimmed = literal.trim();
    let invalid = || FetchError::InvalidTimeRange(literal.to_string());

    let unit = trimmed.chars().last().ok_or_else(invalid)?;
    let value: i64 = trimmed[..trimmed.len() - unit.len_utf8()]
        .parse()
        .map_err(|_| invalid())?;

    if value <= 0 {
        return Err(invalid());
    }

    match unit {
        's' => Ok(Duration::seconds(value)),
        'm' => Ok(Duration::minutes(value)),
        'h' => Ok(Duration::hours(value)),
        'd' => Ok(Duration::days(value)),
        _ => Err(invalid()),
    }
}
