//! Best-time board kept on the device, and the rows the ranking view shows.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GameError, GameResult};
use crate::remote::RemoteRankingEntry;
use crate::storage::{KeyValueStore, RANKINGS_KEY, load_json, save_json};
use crate::timer::format_mm_ss;

/// One finished game as stored under `rankings`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub name: String,
    /// Seconds.
    pub time: u32,
    pub timestamp: String,
}

pub struct LocalRankings {
    capacity: usize,
    dedupe_names: bool,
}

impl LocalRankings {
    pub fn new(capacity: usize, dedupe_names: bool) -> Self {
        Self { capacity, dedupe_names }
    }

    pub fn load<S: KeyValueStore + ?Sized>(&self, store: &S) -> Vec<RankingEntry> {
        load_json(store, RANKINGS_KEY).unwrap_or_default()
    }

    /// Record a finished game and persist the trimmed, sorted board.
    pub fn add<S: KeyValueStore + ?Sized>(
        &self,
        store: &mut S,
        name: &str,
        time: u32,
        timestamp: &str,
    ) -> GameResult<Vec<RankingEntry>> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GameError::InvalidName);
        }
        let mut entries = self.load(store);
        let entry = RankingEntry { name: name.to_string(), time, timestamp: timestamp.to_string() };
        insert_entry(&mut entries, entry, self.capacity, self.dedupe_names);
        save_json(store, RANKINGS_KEY, &entries)?;
        debug!(name, time, size = entries.len(), "local ranking saved");
        Ok(entries)
    }
}

/// Merge `entry` into `entries`: a known name keeps its best time (the
/// timestamp moves only on improvement), then the list is sorted ascending and
/// cut to `capacity`.
pub fn insert_entry(entries: &mut Vec<RankingEntry>, entry: RankingEntry, capacity: usize, dedupe_names: bool) {
    let existing = if dedupe_names {
        entries.iter().position(|e| e.name == entry.name)
    } else {
        None
    };
    match existing {
        Some(idx) => {
            let known = &mut entries[idx];
            if entry.time < known.time {
                known.time = entry.time;
                known.timestamp = entry.timestamp;
            }
        }
        None => entries.push(entry),
    }
    entries.sort_by_key(|e| e.time);
    entries.truncate(capacity);
}

/// Where the rows on screen came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RankingSource {
    Global,
    Local,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RankingRow {
    pub rank: usize,
    pub name: String,
    pub time: String,
    pub date: String,
}

/// Rows for the ranking view. The remote list wins whenever one has been
/// fetched; the device board is only the fallback.
pub fn ranking_rows(
    remote: Option<&[RemoteRankingEntry]>,
    local: &[RankingEntry],
    limit: usize,
) -> (RankingSource, Vec<RankingRow>) {
    match remote {
        Some(remote) => {
            let rows = remote
                .iter()
                .take(limit)
                .enumerate()
                .map(|(i, e)| RankingRow {
                    rank: i + 1,
                    name: e.name.clone(),
                    time: e.display_time(),
                    date: e.date.clone(),
                })
                .collect();
            (RankingSource::Global, rows)
        }
        None => {
            let rows = local
                .iter()
                .take(limit)
                .enumerate()
                .map(|(i, e)| RankingRow {
                    rank: i + 1,
                    name: e.name.clone(),
                    time: format_mm_ss(e.time),
                    date: e.timestamp.clone(),
                })
                .collect();
            (RankingSource::Local, rows)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn entry(name: &str, time: u32) -> RankingEntry {
        RankingEntry { name: name.into(), time, timestamp: format!("t{time}") }
    }

    #[test]
    fn board_is_capped_and_sorted() {
        let mut list = Vec::new();
        for i in 0..25u32 {
            insert_entry(&mut list, entry(&format!("p{i}"), 100 - i * 3), 10, true);
            assert!(list.len() <= 10);
            assert!(list.windows(2).all(|w| w[0].time <= w[1].time));
        }
        assert_eq!(list[0].time, 28);
    }

    #[test]
    fn known_name_keeps_best_time() {
        let mut list = vec![entry("ana", 40)];
        insert_entry(&mut list, entry("ana", 55), 10, true);
        assert_eq!(list, vec![entry("ana", 40)]);
        insert_entry(&mut list, entry("ana", 31), 10, true);
        assert_eq!(list, vec![entry("ana", 31)]);
    }

    #[test]
    fn duplicates_allowed_without_dedupe() {
        let mut list = Vec::new();
        insert_entry(&mut list, entry("ana", 40), 10, false);
        insert_entry(&mut list, entry("ana", 50), 10, false);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn add_persists_and_rejects_blank_names() {
        let mut store = MemoryStore::new();
        let board = LocalRankings::new(10, true);
        assert_eq!(board.add(&mut store, "   ", 10, "now"), Err(GameError::InvalidName));
        board.add(&mut store, " bo ", 47, "2026-01-01").unwrap();
        let raw = store.get_item(RANKINGS_KEY).unwrap();
        assert_eq!(raw, r#"[{"name":"bo","time":47,"timestamp":"2026-01-01"}]"#);
        assert_eq!(board.load(&store).len(), 1);
    }

    #[test]
    fn local_rows_are_used_without_remote_data() {
        let local = vec![entry("bo", 47)];
        let (source, rows) = ranking_rows(None, &local, 10);
        assert_eq!(source, RankingSource::Local);
        assert_eq!(rows[0].time, "00:47");
        assert_eq!(rows[0].rank, 1);
    }

    #[test]
    fn remote_rows_win_over_local() {
        let local = vec![entry("bo", 47)];
        let remote = vec![RemoteRankingEntry::new("cy", 12, "2026-02-02")];
        let (source, rows) = ranking_rows(Some(&remote), &local, 10);
        assert_eq!(source, RankingSource::Global);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "cy");
        assert_eq!(rows[0].time, "00:12");
    }
}
