//! Global ranking: the sheet-backed endpoint and a short-lived cache in front
//! of it.

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

use crate::error::{GameError, GameResult};
use crate::timer::format_mm_ss;

/// Row shape the endpoint reads and writes. `time` travels as a string; the
/// sheet sometimes hands numbers back, so both are accepted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteRankingEntry {
    pub name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub time: String,
    #[serde(default)]
    pub formatted_time: String,
    #[serde(default)]
    pub date: String,
}

impl RemoteRankingEntry {
    pub fn new(name: &str, secs: u32, date: &str) -> Self {
        Self {
            name: name.to_string(),
            time: secs.to_string(),
            formatted_time: format_mm_ss(secs),
            date: date.to_string(),
        }
    }

    pub fn seconds(&self) -> Option<u32> {
        let t = self.time.trim();
        t.parse::<u32>().ok().or_else(|| t.parse::<f64>().ok().map(|f| f.max(0.0) as u32))
    }

    /// `formattedTime` when the sheet supplied one, otherwise derived from `time`.
    pub fn display_time(&self) -> String {
        if !self.formatted_time.is_empty() {
            return self.formatted_time.clone();
        }
        self.seconds().map(format_mm_ss).unwrap_or_else(|| self.time.clone())
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }
    Ok(match Raw::deserialize(de)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

/// Request/response contract of the ranking sheet.
#[allow(async_fn_in_trait)]
pub trait RankingEndpoint {
    /// All rows, pre-sorted ascending by time.
    async fn fetch(&self) -> GameResult<Vec<RemoteRankingEntry>>;
    /// Record one row. The response body is not inspected.
    async fn push(&self, entry: &RemoteRankingEntry) -> GameResult<()>;
}

/// Last good fetch, stamped with the time the request was issued.
#[derive(Debug)]
pub struct RankingCache {
    entries: Option<Vec<RemoteRankingEntry>>,
    requested_at_ms: f64,
    /// Responses to requests issued before this instant predate an upload.
    invalidated_at_ms: f64,
    in_flight_since: Option<f64>,
    fresh_for_ms: f64,
}

impl RankingCache {
    pub fn new(fresh_for_ms: f64) -> Self {
        Self {
            entries: None,
            requested_at_ms: 0.0,
            invalidated_at_ms: f64::NEG_INFINITY,
            in_flight_since: None,
            fresh_for_ms,
        }
    }

    /// Cached rows if they are recent enough to skip the network.
    pub fn fresh(&self, now_ms: f64) -> Option<&[RemoteRankingEntry]> {
        match &self.entries {
            Some(rows)
                if self.requested_at_ms >= self.invalidated_at_ms
                    && now_ms - self.requested_at_ms < self.fresh_for_ms =>
            {
                Some(rows.as_slice())
            }
            _ => None,
        }
    }

    /// Claim the network for one request. Returns the request time to pass
    /// to `store`, or `None` while another request is still pending. A
    /// request pending longer than the freshness window counts as lost.
    pub fn begin_request(&mut self, now_ms: f64) -> Option<f64> {
        if let Some(since) = self.in_flight_since {
            if now_ms - since < self.fresh_for_ms {
                return None;
            }
            warn!(since, "abandoning unanswered ranking request");
        }
        self.in_flight_since = Some(now_ms);
        Some(now_ms)
    }

    pub fn is_fetching(&self) -> bool {
        self.in_flight_since.is_some()
    }

    /// Cached rows regardless of age.
    pub fn last_known(&self) -> Option<&[RemoteRankingEntry]> {
        self.entries.as_deref()
    }

    /// Store the outcome of a request issued at `requested_at_ms`. Returns the
    /// rows to show. A response older than what is cached, or issued before
    /// the last invalidation, is discarded.
    pub fn store(
        &mut self,
        result: GameResult<Vec<RemoteRankingEntry>>,
        requested_at_ms: f64,
    ) -> FetchReport {
        if self.in_flight_since.is_some_and(|since| since <= requested_at_ms) {
            self.in_flight_since = None;
        }
        match result {
            Ok(rows) => {
                let superseded = self.entries.is_some() && requested_at_ms < self.requested_at_ms;
                if superseded || requested_at_ms < self.invalidated_at_ms {
                    debug!(requested_at_ms, "discarding stale ranking response");
                } else {
                    debug!(count = rows.len(), "global ranking cached");
                    self.entries = Some(rows);
                    self.requested_at_ms = requested_at_ms;
                }
                FetchReport { entries: self.entries.clone().unwrap_or_default(), error: None }
            }
            Err(err) => {
                warn!(%err, "global ranking fetch failed, using cache");
                FetchReport { entries: self.entries.clone().unwrap_or_default(), error: Some(err) }
            }
        }
    }

    /// Force the next view to refetch after a score upload that finished at
    /// `now_ms`. Requests issued earlier can no longer refill the cache.
    pub fn invalidate(&mut self, now_ms: f64) {
        self.invalidated_at_ms = self.invalidated_at_ms.max(now_ms);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchReport {
    pub entries: Vec<RemoteRankingEntry>,
    /// Set when the network failed and `entries` came from the cache.
    pub error: Option<GameError>,
}

/// Fetch through the cache: fresh rows short-circuit the network, failures
/// fall back to whatever was last fetched.
pub async fn fetch_cached<E: RankingEndpoint + ?Sized>(
    endpoint: &E,
    cache: &mut RankingCache,
    now_ms: f64,
) -> FetchReport {
    if let Some(rows) = cache.fresh(now_ms) {
        return FetchReport { entries: rows.to_vec(), error: None };
    }
    let Some(requested_at) = cache.begin_request(now_ms) else {
        return FetchReport { entries: cache.last_known().map(<[_]>::to_vec).unwrap_or_default(), error: None };
    };
    let result = endpoint.fetch().await;
    cache.store(result, requested_at)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_accepts_strings_and_numbers() {
        let rows: Vec<RemoteRankingEntry> = serde_json::from_str(
            r#"[{"name":"a","time":"47","formattedTime":"00:47","date":"d"},
                {"name":"b","time":63}]"#,
        )
        .unwrap();
        assert_eq!(rows[0].seconds(), Some(47));
        assert_eq!(rows[1].time, "63");
        assert_eq!(rows[1].display_time(), "01:03");
    }

    #[test]
    fn serializes_with_sheet_field_names() {
        let json = serde_json::to_string(&RemoteRankingEntry::new("a", 47, "d")).unwrap();
        assert_eq!(json, r#"{"name":"a","time":"47","formattedTime":"00:47","date":"d"}"#);
    }

    #[test]
    fn cache_expires_after_window() {
        let mut cache = RankingCache::new(1_000.0);
        cache.store(Ok(vec![RemoteRankingEntry::new("a", 1, "d")]), 0.0);
        assert!(cache.fresh(999.0).is_some());
        assert!(cache.fresh(1_000.0).is_none());
        assert!(cache.last_known().is_some());
        cache.invalidate(10.0);
        assert!(cache.fresh(10.0).is_none());
    }

    #[test]
    fn failure_reports_last_good_rows() {
        let mut cache = RankingCache::new(1_000.0);
        let empty = cache.store(Err(GameError::RemoteFetchFailed("down".into())), 0.0);
        assert!(empty.entries.is_empty());
        cache.store(Ok(vec![RemoteRankingEntry::new("a", 1, "d")]), 10.0);
        let report = cache.store(Err(GameError::RemoteFetchFailed("down".into())), 5_000.0);
        assert_eq!(report.entries.len(), 1);
        assert!(report.error.is_some());
    }

    #[test]
    fn older_response_does_not_replace_newer() {
        let mut cache = RankingCache::new(1_000.0);
        cache.store(Ok(vec![RemoteRankingEntry::new("new", 1, "d")]), 200.0);
        let report = cache.store(Ok(vec![RemoteRankingEntry::new("old", 2, "d")]), 100.0);
        assert_eq!(report.entries[0].name, "new");
    }

    #[test]
    fn response_sent_before_an_upload_cannot_refill_the_cache() {
        let mut cache = RankingCache::new(30_000.0);
        cache.store(Ok(vec![RemoteRankingEntry::new("a", 1, "d")]), 0.0);
        let before_upload = cache.begin_request(40_000.0).unwrap();
        cache.invalidate(41_000.0);

        let report = cache.store(Ok(vec![RemoteRankingEntry::new("a", 1, "d")]), before_upload);
        assert_eq!(report.entries.len(), 1);
        assert!(cache.fresh(42_000.0).is_none());
        assert!(!cache.is_fetching());

        let after = cache.begin_request(42_000.0).unwrap();
        let rows = vec![RemoteRankingEntry::new("a", 1, "d"), RemoteRankingEntry::new("b", 2, "d")];
        cache.store(Ok(rows), after);
        assert_eq!(cache.fresh(43_000.0).map(<[_]>::len), Some(2));
    }

    #[test]
    fn one_request_at_a_time() {
        let mut cache = RankingCache::new(30_000.0);
        let first = cache.begin_request(0.0);
        assert_eq!(first, Some(0.0));
        assert_eq!(cache.begin_request(500.0), None);
        cache.store(Err(GameError::RemoteFetchFailed("down".into())), 0.0);
        assert_eq!(cache.begin_request(600.0), Some(600.0));
    }

    #[test]
    fn unanswered_request_is_abandoned_after_the_window() {
        let mut cache = RankingCache::new(1_000.0);
        assert!(cache.begin_request(0.0).is_some());
        assert_eq!(cache.begin_request(999.0), None);
        assert_eq!(cache.begin_request(1_000.0), Some(1_000.0));
    }
}
