//! OpenSearch Dashboards fetch layer: query construction, the HTTP client
//! and the time-window splitter that works around the 500-hit page cap.

pub mod client;
pub mod query;
pub mod window;

pub use client::{FetchError, SearchClient};
pub use window::{parse_time_range, WindowedFetcher};
