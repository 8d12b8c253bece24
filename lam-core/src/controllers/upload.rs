//! Global leaderboard submission links.
//!
//! Nothing is sent from here. A submission is a pre-filled issue form on the
//! tracker; this controller builds that URL and the host opens it.
use log::info;
use std::fmt::Write as _;
use thiserror::Error;

use crate::events::{EventBus, GameEvent};
use crate::floors::FloorLevel;
use crate::state::AppState;

/// Full-record submissions need at least two hours on the clock.
pub const MIN_UPLOAD_TIME: u64 = 7200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadKind {
    /// Time, floor and E.G.O usage.
    Full,
    /// Floor reached only; no time requirement.
    FloorOnly,
}

impl UploadKind {
    #[must_use]
    pub const fn template(self) -> &'static str {
        match self {
            Self::Full => "submit-clear-run.yml",
            Self::FloorOnly => "submit-floor-only.yml",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Full => "通关记录",
            Self::FloorOnly => "层数记录",
        }
    }
}

/// Where the issue forms live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRepository {
    pub owner: String,
    pub name: String,
}

impl Default for IssueRepository {
    fn default() -> Self {
        Self {
            owner: "Jhh003".to_string(),
            name: "lam".to_string(),
        }
    }
}

impl IssueRepository {
    #[must_use]
    pub fn new_issue_url(&self) -> String {
        format!("https://github.com/{}/{}/issues/new", self.owner, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("select a sinner first")]
    NoSinner,
    #[error("select a persona first")]
    NoPersona,
    #[error("select the floor you cleared")]
    NoFloor,
    #[error("a full record needs at least {} hours (got {elapsed}s)", MIN_UPLOAD_TIME / 3600)]
    TooShort { elapsed: u64 },
}

/// Everything the issue form is pre-filled with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueDraft {
    pub kind: UploadKind,
    pub sinner: String,
    pub persona: String,
    /// Seconds; only sent for full records.
    pub time: u64,
    pub floor_level: Option<FloorLevel>,
    pub used_ego: bool,
    pub note: String,
}

impl IssueDraft {
    /// # Errors
    ///
    /// Returns the first missing piece, or `TooShort` for a full record under
    /// [`MIN_UPLOAD_TIME`].
    pub fn validate(&self) -> Result<FloorLevel, UploadError> {
        if self.sinner.trim().is_empty() {
            return Err(UploadError::NoSinner);
        }
        if self.persona.trim().is_empty() {
            return Err(UploadError::NoPersona);
        }
        if self.kind == UploadKind::Full && self.time < MIN_UPLOAD_TIME {
            return Err(UploadError::TooShort { elapsed: self.time });
        }
        self.floor_level.ok_or(UploadError::NoFloor)
    }

    /// Query parameters in form order.
    fn params(&self, floor: FloorLevel) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("template", self.kind.template().to_string()),
            (
                "title",
                format!("{} - {} / {}", self.kind.label(), self.sinner, self.persona),
            ),
            ("labels", self.kind.label().to_string()),
            ("sinner", self.sinner.clone()),
            ("persona", self.persona.clone()),
        ];
        if self.kind == UploadKind::Full {
            params.push(("time", self.time.to_string()));
        }
        params.push(("floor", floor.label().to_string()));
        if self.kind == UploadKind::Full {
            params.push(("ego", if self.used_ego { "是" } else { "否" }.to_string()));
        }
        if !self.note.is_empty() {
            params.push(("note", self.note.clone()));
        }
        params
    }

    /// The pre-filled issue form URL.
    ///
    /// # Errors
    ///
    /// Returns the validation error if the draft is incomplete.
    pub fn issue_url(&self, repository: &IssueRepository) -> Result<String, UploadError> {
        let floor = self.validate()?;
        let query = self
            .params(floor)
            .iter()
            .map(|(k, v)| format!("{}={}", form_encode(k), form_encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        Ok(format!("{}?{query}", repository.new_issue_url()))
    }
}

/// `application/x-www-form-urlencoded` encoding of one key or value.
#[must_use]
pub fn form_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for b in input.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'*' | b'-' | b'.' | b'_' => {
                out.push(b as char);
            }
            b' ' => out.push('+'),
            _ => {
                let _ = write!(out, "%{b:02X}");
            }
        }
    }
    out
}

/// Form options the player fills in before submitting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadForm {
    pub floor_level: Option<FloorLevel>,
    pub used_ego: bool,
    pub note: String,
}

pub struct UploadController<'a> {
    state: &'a AppState,
    bus: &'a mut EventBus,
    repository: &'a IssueRepository,
}

impl<'a> UploadController<'a> {
    pub const fn new(
        state: &'a AppState,
        bus: &'a mut EventBus,
        repository: &'a IssueRepository,
    ) -> Self {
        Self {
            state,
            bus,
            repository,
        }
    }

    /// Gate for opening the upload dialog: a sinner and persona must be selected.
    ///
    /// # Errors
    ///
    /// Returns `NoSinner` or `NoPersona`.
    pub fn can_open(&self) -> Result<(), UploadError> {
        if self.state.sinner().is_none() {
            return Err(UploadError::NoSinner);
        }
        if self.state.persona().is_none() {
            return Err(UploadError::NoPersona);
        }
        Ok(())
    }

    /// Draft from the current selection, timer and form.
    #[must_use]
    pub fn draft(&self, kind: UploadKind, form: &UploadForm) -> IssueDraft {
        IssueDraft {
            kind,
            sinner: self.state.sinner().map(|s| s.name.to_string()).unwrap_or_default(),
            persona: self.state.persona().map(|p| p.name.clone()).unwrap_or_default(),
            time: self.state.elapsed_seconds(),
            floor_level: form.floor_level,
            used_ego: form.used_ego,
            note: form.note.clone(),
        }
    }

    /// Build the submission URL and announce the submission.
    ///
    /// # Errors
    ///
    /// Returns the validation error if the selection, timer or form is incomplete.
    pub fn submit(&mut self, kind: UploadKind, form: &UploadForm) -> Result<String, UploadError> {
        self.can_open()?;
        let url = self.draft(kind, form).issue_url(self.repository)?;
        self.bus.emit(&GameEvent::RecordSubmitted { kind });
        info!("Prepared {kind:?} submission link");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::Session;
    use crate::storage::MemoryStorage;

    fn draft(kind: UploadKind, time: u64) -> IssueDraft {
        IssueDraft {
            kind,
            sinner: "浮士德".into(),
            persona: "LCB罪人".into(),
            time,
            floor_level: Some(FloorLevel::F5Hard),
            used_ego: true,
            note: String::new(),
        }
    }

    #[test]
    fn encodes_like_url_search_params() {
        assert_eq!(form_encode("a b&c=d"), "a+b%26c%3Dd");
        assert_eq!(form_encode("A-z_0.9*~"), "A-z_0.9*%7E");
        assert_eq!(form_encode("是"), "%E6%98%AF");
    }

    #[test]
    fn full_record_url_carries_every_field() {
        let url = draft(UploadKind::Full, 8000)
            .issue_url(&IssueRepository::default())
            .unwrap();
        assert!(url.starts_with(
            "https://github.com/Jhh003/lam/issues/new?template=submit-clear-run.yml&title="
        ));
        assert!(url.contains("&time=8000&floor=5-2&ego=%E6%98%AF"));
        assert!(!url.contains("note="));
    }

    #[test]
    fn floor_only_url_skips_time_and_ego() {
        let mut d = draft(UploadKind::FloorOnly, 10);
        d.note = "first clear".into();
        let url = d.issue_url(&IssueRepository::default()).unwrap();
        assert!(url.contains("template=submit-floor-only.yml"));
        assert!(!url.contains("time="));
        assert!(!url.contains("ego="));
        assert!(url.ends_with("&floor=5-2&note=first+clear"));
    }

    #[test]
    fn full_records_need_two_hours() {
        assert_eq!(
            draft(UploadKind::Full, MIN_UPLOAD_TIME - 1).validate(),
            Err(UploadError::TooShort { elapsed: MIN_UPLOAD_TIME - 1 })
        );
        assert!(draft(UploadKind::Full, MIN_UPLOAD_TIME).validate().is_ok());
    }

    #[test]
    fn missing_floor_is_reported() {
        let mut d = draft(UploadKind::FloorOnly, 0);
        d.floor_level = None;
        assert_eq!(d.validate(), Err(UploadError::NoFloor));
    }

    #[test]
    fn controller_uses_selection_and_emits() {
        let mut session = Session::new(MemoryStorage::new());
        let form = UploadForm {
            floor_level: Some(FloorLevel::F15),
            ..UploadForm::default()
        };
        assert_eq!(
            session.upload().submit(UploadKind::FloorOnly, &form),
            Err(UploadError::NoSinner)
        );

        session.selection().select_sinner(12).unwrap();
        session.selection().select_persona(0, "黑兽-卯");
        let url = session.upload().submit(UploadKind::FloorOnly, &form).unwrap();
        assert!(url.contains(&format!("sinner={}", form_encode("奥提斯"))));
        assert_eq!(session.bus.stats().emitted.get("record:submitted"), Some(&1));
    }
}
