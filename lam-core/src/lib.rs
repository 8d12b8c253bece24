//! LAM Core
//!
//! Platform-agnostic logic for the LAM clear-run companion: the record model,
//! persona-name mapping, the moderated leaderboard service over a JSON store,
//! and the state/event architecture the front-ends drive through controllers.
//! This crate has no HTTP or UI dependencies.

pub mod controllers;
pub mod events;
pub mod floors;
pub mod personas;
pub mod ranking;
pub mod record;
pub mod sinners;
pub mod state;
pub mod storage;

// Re-export commonly used types
pub use controllers::{
    IssueRepository, LocalRanking, LocalRecord, LocalSort, LocalStatistics, MIN_RECORD_SECONDS,
    MIN_UPLOAD_TIME, Session, UploadError, UploadKind, format_hms,
};
pub use events::{EventBus, EventKind, GameEvent, HandlerFailure, SubscriptionId};
pub use floors::{FloorLevel, InvalidFloor};
pub use personas::{is_template_name, mapping_for, normalize_persona_name, strip_sinner_suffix};
pub use ranking::{
    DEFAULT_PAGE_SIZE, ListQuery, MAX_PAGE_SIZE, Pagination, RankingError, RankingPage,
    RankingService, SortField, SortOrder,
};
pub use record::{
    ModerationAction, RankingRecord, RecordStatus, Submission, TransitionError, UnknownAction,
    ValidationError,
};
pub use sinners::{SINNERS, Sinner, sinner_by_id, sinner_by_name};
pub use state::{AppState, PersonaChoice, Snapshot, StateKey};
pub use storage::{
    JsonFile, LocalRecordStorage, MemoryStorage, RankingDocument, RankingStorage, StorageError,
};
