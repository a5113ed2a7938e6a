// Search body construction for the Dashboards internal search API

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};

/// The backend caps a single response at this many hits. Window sizing in
/// `window.rs` exists to keep per-window density under this cap.
pub const RESULT_PAGE_CAP: u64 = 500;

/// Build the search body for one time window: descending timestamp sort,
/// the page cap, and a bool filter combining a phrase match on the keyword
/// with an RFC3339 time range.
pub fn search_body(keyword: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Value {
    json!({
        "sort": [
            {
                "@timestamp": {
                    "order": "desc",
                    "unmapped_type": "boolean"
                }
            }
        ],
        "size": RESULT_PAGE_CAP,
        "_source": {
            "excludes": []
        },
        "query": {
            "bool": {
                "must": [],
                "filter": [
                    {
                        "multi_match": {
                            "type": "phrase",
                            "query": keyword,
                            "lenient": true
                        }
                    },
                    {
                        "range": {
                            "@timestamp": {
                                "gte": start.to_rfc3339_opts(SecondsFormat::Secs, true),
                                "lte": end.to_rfc3339_opts(SecondsFormat::Secs, true),
                                "format": "strict_date_optional_time"
                            }
                        }
                    }
                ],
                "should": [],
                "must_not": []
            }
        }
    })
}

// the Dashboards endpoint wants the index and body wrapped in "params"
pub(crate) fn request_envelope(index: &str, body: Value) -> Value {
    json!({
        "params": {
            "index": index,
            "body": body
        }
    })
}
