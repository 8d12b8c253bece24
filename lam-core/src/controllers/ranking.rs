//! The player's local ranking.
use chrono::{Local, NaiveDateTime};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::events::{EventBus, GameEvent};
use crate::floors::FloorLevel;
use crate::record::RankingRecord;
use crate::sinners::Sinner;
use crate::state::AppState;
use crate::storage::LocalRecordStorage;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A run saved on this device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalRecord {
    /// Local wall-clock time, `YYYY-MM-DD HH:MM:SS`.
    pub timestamp: String,
    pub sinner: String,
    pub sinner_id: u8,
    pub persona: String,
    pub time: u64,
    #[serde(default)]
    pub note: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor_level: Option<FloorLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_ego: Option<bool>,
}

impl LocalRecord {
    /// A record stamped with the current local time.
    pub fn new(sinner: &str, sinner_id: u8, persona: &str, time: u64, note: &str) -> Self {
        Self {
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            sinner: sinner.to_string(),
            sinner_id,
            persona: persona.to_string(),
            time,
            note: note.to_string(),
            floor_level: None,
            used_ego: None,
        }
    }

    fn saved_at(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.timestamp, TIMESTAMP_FORMAT).ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocalSort {
    /// Fastest first.
    #[default]
    Time,
    /// Newest first.
    Date,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalStatistics {
    pub total_records: usize,
    pub best_time: Option<u64>,
    pub average_time: Option<f64>,
    pub most_used_sinner: Option<String>,
    pub most_used_persona: Option<String>,
}

pub struct LocalRanking<'a, L: LocalRecordStorage> {
    state: &'a mut AppState,
    bus: &'a mut EventBus,
    storage: &'a L,
}

impl<'a, L: LocalRecordStorage> LocalRanking<'a, L> {
    pub const fn new(state: &'a mut AppState, bus: &'a mut EventBus, storage: &'a L) -> Self {
        Self { state, bus, storage }
    }

    fn persist(&mut self) {
        if let Err(err) = self.storage.save_local_records(self.state.local_records()) {
            error!("Failed to persist local records: {err}");
            self.bus.emit(&GameEvent::Error {
                message: format!("failed to persist local records: {err}"),
            });
        }
    }

    /// Save a run. Returns `false` when the persona name is empty.
    pub fn save(
        &mut self,
        sinner: &Sinner,
        persona: &str,
        time: u64,
        note: &str,
        floor_level: Option<FloorLevel>,
        used_ego: Option<bool>,
    ) -> bool {
        if persona.trim().is_empty() {
            error!("Refusing to save a local record without a persona");
            return false;
        }
        let mut record = LocalRecord::new(sinner.name, sinner.id, persona, time, note);
        record.floor_level = floor_level;
        record.used_ego = used_ego;

        self.state.add_local_record(record.clone());
        self.persist();
        info!("Saved local record: {} - {persona} ({time}s)", sinner.name);
        self.bus.emit(&GameEvent::LocalRecordSaved(record));
        true
    }

    #[must_use]
    pub fn records(&self, sort: LocalSort) -> Vec<LocalRecord> {
        let mut records = self.state.local_records().to_vec();
        match sort {
            LocalSort::Time => records.sort_by_key(|r| r.time),
            // Unparseable timestamps sort last.
            LocalSort::Date => records.sort_by(|a, b| b.saved_at().cmp(&a.saved_at())),
        }
        records
    }

    /// Delete by index into the stored (insertion-ordered) list.
    pub fn delete(&mut self, index: usize) -> bool {
        let mut records = self.state.local_records().to_vec();
        if index >= records.len() {
            warn!("Cannot delete local record {index}: only {} stored", records.len());
            return false;
        }
        records.remove(index);
        let count = records.len();
        self.state.set_local_records(records);
        self.persist();
        self.bus.emit(&GameEvent::RankingUpdated { count });
        info!("Deleted local record {index}");
        true
    }

    pub fn clear(&mut self) {
        self.state.set_local_records(Vec::new());
        self.persist();
        self.bus.emit(&GameEvent::RankingUpdated { count: 0 });
        info!("Local ranking cleared");
    }

    #[must_use]
    pub fn statistics(&self) -> LocalStatistics {
        let records = self.state.local_records();
        if records.is_empty() {
            return LocalStatistics {
                total_records: 0,
                best_time: None,
                average_time: None,
                most_used_sinner: None,
                most_used_persona: None,
            };
        }

        let total: u64 = records.iter().map(|r| r.time).sum();
        #[allow(clippy::cast_precision_loss)]
        let average = total as f64 / records.len() as f64;

        LocalStatistics {
            total_records: records.len(),
            best_time: records.iter().map(|r| r.time).min(),
            average_time: Some(average),
            most_used_sinner: most_common(records.iter().map(|r| r.sinner.as_str())),
            most_used_persona: most_common(records.iter().map(|r| r.persona.as_str())),
        }
    }

    /// Replace the global leaderboard snapshot from a JSON array of records.
    ///
    /// # Errors
    ///
    /// Returns the parse error; the previous snapshot is kept in that case.
    pub fn load_global(&mut self, json: &str) -> Result<usize, serde_json::Error> {
        let records: Vec<RankingRecord> = serde_json::from_str(json).inspect_err(|err| {
            error!("Failed to load the global ranking: {err}");
        })?;
        let count = records.len();
        self.state.set_global_records(records);
        self.bus.emit(&GameEvent::RankingUpdated { count });
        info!("Loaded {count} global records");
        Ok(count)
    }
}

/// Most frequent value; on a tie, the one whose first occurrence comes last.
fn most_common<'r>(values: impl Iterator<Item = &'r str>) -> Option<String> {
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (order, value) in values.enumerate() {
        counts.entry(value).or_insert((0, order)).0 += 1;
    }
    counts
        .into_iter()
        .max_by(|(_, (ca, oa)), (_, (cb, ob))| ca.cmp(cb).then(oa.cmp(ob)))
        .map(|(value, _)| value.to_string())
}
