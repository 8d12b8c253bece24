//! The moderated leaderboard.
//!
//! Every operation is a full load → change → save cycle against the storage
//! backend. The service takes `&mut self` for writes, so whoever shares it
//! (the HTTP server puts it behind a mutex) serializes those cycles.
use chrono::Utc;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error;

use crate::floors::FloorLevel;
use crate::record::{
    ModerationAction, RankingRecord, RecordStatus, Submission, TransitionError, ValidationError,
};
use crate::storage::RankingStorage;

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Error)]
pub enum RankingError<E: std::error::Error + 'static> {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("record {0} not found")]
    NotFound(u64),
    #[error("record {id}: {source}")]
    Conflict {
        id: u64,
        #[source]
        source: TransitionError,
    },
    #[error("storage failure: {0}")]
    Storage(#[source] E),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    Time,
    CreatedAt,
    FloorLevel,
}

impl SortField {
    /// Unknown names fall back to sorting by time.
    #[must_use]
    pub fn parse_lenient(raw: &str) -> Self {
        match raw {
            "created_at" => Self::CreatedAt,
            "floor_level" => Self::FloorLevel,
            _ => Self::Time,
        }
    }

    fn compare(self, a: &RankingRecord, b: &RankingRecord) -> Ordering {
        match self {
            Self::Time => a.time.cmp(&b.time),
            Self::CreatedAt => a.created_at.cmp(&b.created_at),
            Self::FloorLevel => a.floor_level.cmp(&b.floor_level),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Anything but `desc` sorts ascending.
    #[must_use]
    pub fn parse_lenient(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("desc") {
            Self::Desc
        } else {
            Self::Asc
        }
    }
}

/// Filters, ordering and paging for [`RankingService::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub sinner: Option<String>,
    pub floor_level: Option<FloorLevel>,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
    pub page: usize,
    pub page_size: usize,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            sinner: None,
            floor_level: None,
            sort_by: SortField::Time,
            sort_order: SortOrder::Asc,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ListQuery {
    /// Build a query from raw request parameters, applying the defaults and
    /// bounds used by the public endpoint. `"all"` disables a filter; `limit`
    /// takes precedence over `page_size`.
    ///
    /// # Errors
    ///
    /// Returns an error if a floor filter is given that is not a known label.
    pub fn from_params(
        sinner: Option<&str>,
        floor_level: Option<&str>,
        sort_by: Option<&str>,
        sort_order: Option<&str>,
        page: Option<&str>,
        limit: Option<&str>,
        page_size: Option<&str>,
    ) -> Result<Self, ValidationError> {
        fn active(v: Option<&str>) -> Option<&str> {
            v.map(str::trim).filter(|s| !s.is_empty() && *s != "all")
        }
        fn number(v: Option<&str>) -> Option<usize> {
            v.and_then(|s| s.trim().parse().ok())
        }

        let floor_level = active(floor_level)
            .map(str::parse::<FloorLevel>)
            .transpose()?;
        let size = number(limit)
            .or_else(|| number(page_size))
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);

        Ok(Self {
            sinner: active(sinner).map(str::to_string),
            floor_level,
            sort_by: sort_by.map(SortField::parse_lenient).unwrap_or_default(),
            sort_order: sort_order.map(SortOrder::parse_lenient).unwrap_or_default(),
            page: number(page).unwrap_or(1).max(1),
            page_size: size,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub total_pages: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingPage {
    pub records: Vec<RankingRecord>,
    pub pagination: Pagination,
}

pub struct RankingService<S: RankingStorage> {
    storage: S,
}

impl<S: RankingStorage> RankingService<S> {
    pub const fn new(storage: S) -> Self {
        Self { storage }
    }

    pub const fn storage(&self) -> &S {
        &self.storage
    }

    fn load(&self) -> Result<crate::storage::RankingDocument, RankingError<S::Error>> {
        self.storage.load().map_err(RankingError::Storage)
    }

    fn save(&self, doc: &crate::storage::RankingDocument) -> Result<(), RankingError<S::Error>> {
        self.storage.save(doc).map_err(RankingError::Storage)
    }

    /// Validate and store a new submission as pending. Returns its id.
    ///
    /// # Errors
    ///
    /// Returns a validation error for missing fields or an invalid floor, or a
    /// storage error if the document cannot be loaded or saved.
    pub fn submit(&mut self, submission: Submission) -> Result<u64, RankingError<S::Error>> {
        let valid = submission.validate()?;
        let mut doc = self.load()?;
        let id = doc.allocate_id();
        let record = valid.into_record(id, Utc::now());
        info!(
            "New submission #{id}: {} / {} / {} on floor {} in {}s",
            record.username, record.sinner, record.persona, record.floor_level, record.time
        );
        doc.rankings.push(record);
        self.save(&doc)?;
        Ok(id)
    }

    /// Approved records matching the query, sorted and paginated.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the document cannot be loaded.
    pub fn list(&self, query: &ListQuery) -> Result<RankingPage, RankingError<S::Error>> {
        let doc = self.load()?;
        let mut records: Vec<RankingRecord> = doc
            .rankings
            .into_iter()
            .filter(|r| r.status == RecordStatus::Approved)
            .filter(|r| query.sinner.as_ref().is_none_or(|s| &r.sinner == s))
            .filter(|r| query.floor_level.is_none_or(|f| r.floor_level == f))
            .collect();

        records.sort_by(|a, b| {
            let ord = query.sort_by.compare(a, b);
            match query.sort_order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });

        let page_size = query.page_size.max(1);
        let page = query.page.max(1);
        let total = records.len();
        let start = (page - 1).saturating_mul(page_size);
        let records = records.into_iter().skip(start).take(page_size).collect();

        Ok(RankingPage {
            records,
            pagination: Pagination {
                page,
                page_size,
                total,
                total_pages: total.div_ceil(page_size),
            },
        })
    }

    /// Any record by id, regardless of status.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id, or a storage error.
    pub fn get(&self, id: u64) -> Result<RankingRecord, RankingError<S::Error>> {
        self.load()?
            .rankings
            .into_iter()
            .find(|r| r.id == id)
            .ok_or(RankingError::NotFound(id))
    }

    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id, or a storage error.
    pub fn delete(&mut self, id: u64) -> Result<RankingRecord, RankingError<S::Error>> {
        let mut doc = self.load()?;
        let index = doc
            .rankings
            .iter()
            .position(|r| r.id == id)
            .ok_or(RankingError::NotFound(id))?;
        let removed = doc.rankings.remove(index);
        self.save(&doc)?;
        info!("Deleted record #{id}");
        Ok(removed)
    }

    /// Records waiting for a moderation decision, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the document cannot be loaded.
    pub fn pending(&self) -> Result<Vec<RankingRecord>, RankingError<S::Error>> {
        Ok(self
            .load()?
            .rankings
            .into_iter()
            .filter(|r| r.status == RecordStatus::Pending)
            .collect())
    }

    /// Approve or reject a pending record.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id, `Conflict` if the record was
    /// already decided, or a storage error.
    pub fn moderate(
        &mut self,
        id: u64,
        action: ModerationAction,
    ) -> Result<RankingRecord, RankingError<S::Error>> {
        let mut doc = self.load()?;
        let record = doc
            .rankings
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(RankingError::NotFound(id))?;

        record.status = record.status.apply(action).map_err(|source| {
            warn!("Refused to move record #{id} from {} to {}", source.from, source.to);
            RankingError::Conflict { id, source }
        })?;
        record.updated_at = Utc::now();
        let updated = record.clone();

        self.save(&doc)?;
        info!("Record #{id} is now {}", updated.status);
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use serde_json::json;

    fn submission(username: &str, sinner: &str, time: i64, floor: &str) -> Submission {
        serde_json::from_value(json!({
            "username": username,
            "sinner": sinner,
            "persona": "LCB罪人",
            "time": time,
            "floorLevel": floor,
        }))
        .unwrap()
    }

    fn seeded() -> RankingService<MemoryStorage> {
        let mut service = RankingService::new(MemoryStorage::new());
        let runs = [
            ("a", "Faust", 9000, "5-1"),
            ("b", "Faust", 7300, "10"),
            ("c", "Outis", 8100, "5-2"),
            ("d", "Faust", 12000, "15"),
        ];
        for (user, sinner, time, floor) in runs {
            let id = service.submit(submission(user, sinner, time, floor)).unwrap();
            service.moderate(id, ModerationAction::Approve).unwrap();
        }
        service
    }

    #[test]
    fn submissions_are_pending_with_increasing_ids() {
        let mut service = RankingService::new(MemoryStorage::new());
        let first = service.submit(submission("a", "Faust", 8000, "5-1")).unwrap();
        let second = service.submit(submission("b", "Faust", 8000, "5-1")).unwrap();
        assert_eq!((first, second), (1, 2));
        let record = service.get(first).unwrap();
        assert_eq!(record.status, RecordStatus::Pending);
        assert_eq!(record.created_at, record.updated_at);
        assert_eq!(service.pending().unwrap().len(), 2);
    }

    #[test]
    fn invalid_submissions_do_not_consume_ids() {
        let mut service = RankingService::new(MemoryStorage::new());
        let err = service.submit(submission("a", "Faust", 8000, "16")).unwrap_err();
        assert!(matches!(err, RankingError::Validation(ValidationError::InvalidFloor(_))));
        assert_eq!(service.submit(submission("a", "Faust", 8000, "1")).unwrap(), 1);
    }

    #[test]
    fn list_hides_unapproved_records() {
        let mut service = seeded();
        let pending = service.submit(submission("e", "Faust", 100, "1")).unwrap();
        let rejected = service.submit(submission("f", "Faust", 200, "1")).unwrap();
        service.moderate(rejected, ModerationAction::Reject).unwrap();

        let page = service.list(&ListQuery::default()).unwrap();
        assert_eq!(page.pagination.total, 4);
        assert!(page.records.iter().all(|r| r.status == RecordStatus::Approved));
        assert!(page.records.iter().all(|r| r.id != pending && r.id != rejected));
    }

    #[test]
    fn list_filters_sorts_and_pages() {
        let service = seeded();

        let times: Vec<u64> = service
            .list(&ListQuery::default())
            .unwrap()
            .records
            .iter()
            .map(|r| r.time)
            .collect();
        assert_eq!(times, vec![7300, 8100, 9000, 12000]);

        let faust_desc = ListQuery {
            sinner: Some("Faust".into()),
            sort_order: SortOrder::Desc,
            ..ListQuery::default()
        };
        let page = service.list(&faust_desc).unwrap();
        assert_eq!(page.records.first().map(|r| r.time), Some(12000));
        assert_eq!(page.pagination.total, 3);

        let by_floor = ListQuery {
            sort_by: SortField::FloorLevel,
            ..ListQuery::default()
        };
        let floors: Vec<String> = service
            .list(&by_floor)
            .unwrap()
            .records
            .iter()
            .map(|r| r.floor_level.to_string())
            .collect();
        assert_eq!(floors, vec!["5-1", "5-2", "10", "15"]);

        let second_page = ListQuery {
            page: 2,
            page_size: 3,
            ..ListQuery::default()
        };
        let page = service.list(&second_page).unwrap();
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.pagination.total_pages, 2);

        let only_floor = ListQuery {
            floor_level: Some(FloorLevel::F5Hard),
            ..ListQuery::default()
        };
        assert_eq!(service.list(&only_floor).unwrap().records[0].sinner, "Outis");
    }

    #[test]
    fn decisions_are_final() {
        let mut service = RankingService::new(MemoryStorage::new());
        let id = service.submit(submission("a", "Faust", 8000, "5-1")).unwrap();
        service.moderate(id, ModerationAction::Approve).unwrap();

        let err = service.moderate(id, ModerationAction::Reject).unwrap_err();
        assert!(matches!(err, RankingError::Conflict { id: 1, .. }));
        assert_eq!(service.get(id).unwrap().status, RecordStatus::Approved);
    }

    #[test]
    fn unknown_ids_are_not_found() {
        let mut service = seeded();
        assert!(matches!(service.get(99), Err(RankingError::NotFound(99))));
        assert!(matches!(service.delete(99), Err(RankingError::NotFound(99))));
        assert!(matches!(
            service.moderate(99, ModerationAction::Approve),
            Err(RankingError::NotFound(99))
        ));
    }

    #[test]
    fn deleted_ids_are_not_reused() {
        let mut service = RankingService::new(MemoryStorage::new());
        let id = service.submit(submission("a", "Faust", 8000, "5-1")).unwrap();
        service.delete(id).unwrap();
        assert_eq!(service.submit(submission("a", "Faust", 8000, "5-1")).unwrap(), 2);
    }

    #[test]
    fn query_params_apply_defaults_and_bounds() {
        let q = ListQuery::from_params(
            None,
            Some("all"),
            Some("bogus"),
            None,
            Some("0"),
            None,
            None,
        )
        .unwrap();
        assert_eq!(q, ListQuery::default());

        let q = ListQuery::from_params(
            Some("Faust"),
            Some("5-2"),
            Some("created_at"),
            Some("desc"),
            Some("3"),
            Some("500"),
            Some("10"),
        )
        .unwrap();
        assert_eq!(q.sinner.as_deref(), Some("Faust"));
        assert_eq!(q.floor_level, Some(FloorLevel::F5Hard));
        assert_eq!(q.sort_by, SortField::CreatedAt);
        assert_eq!(q.sort_order, SortOrder::Desc);
        assert_eq!(q.page, 3);
        assert_eq!(q.page_size, MAX_PAGE_SIZE);

        let q = ListQuery::from_params(None, None, None, None, None, None, Some("10")).unwrap();
        assert_eq!(q.page_size, 10);

        let q = ListQuery::from_params(Some(" all "), Some(" 6 "), None, None, None, None, None)
            .unwrap();
        assert_eq!(q.sinner, None);
        assert_eq!(q.floor_level, Some(FloorLevel::F6));

        assert!(ListQuery::from_params(None, Some("99"), None, None, None, None, None).is_err());
    }
}
