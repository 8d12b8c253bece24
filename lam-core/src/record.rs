//! Leaderboard records and the moderation status machine.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::floors::FloorLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Pending,
    Approved,
    Rejected,
}

impl RecordStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    #[must_use]
    pub const fn is_final(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Apply a moderation decision. Only pending records can be decided, and a
    /// decision is never revisited.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] when the record has already been approved or rejected.
    pub const fn apply(self, action: ModerationAction) -> Result<Self, TransitionError> {
        match self {
            Self::Pending => Ok(action.target()),
            from => Err(TransitionError {
                from,
                to: action.target(),
            }),
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("record is already {from}; cannot change it to {to}")]
pub struct TransitionError {
    pub from: RecordStatus,
    pub to: RecordStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationAction {
    Approve,
    Reject,
}

impl ModerationAction {
    #[must_use]
    pub const fn target(self) -> RecordStatus {
        match self {
            Self::Approve => RecordStatus::Approved,
            Self::Reject => RecordStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown moderation action '{0}' (expected approve or reject)")]
pub struct UnknownAction(pub String);

impl FromStr for ModerationAction {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            other => Err(UnknownAction(other.to_string())),
        }
    }
}

/// A stored leaderboard entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingRecord {
    pub id: u64,
    pub username: String,
    pub sinner: String,
    pub persona: String,
    /// Clear time in whole seconds.
    pub time: u64,
    pub floor_level: FloorLevel,
    #[serde(default)]
    pub ego_gifts: Vec<String>,
    #[serde(default)]
    pub combat_passives: Vec<String>,
    #[serde(default)]
    pub support_passives: Vec<String>,
    #[serde(default)]
    pub screenshot_url: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("time must not be negative (got {0})")]
    NegativeTime(i64),
    #[error(transparent)]
    InvalidFloor(#[from] crate::floors::InvalidFloor),
}

/// An incoming submission, as posted by the client.
///
/// Every field is optional at this stage so that a missing field surfaces as a
/// validation error rather than a decoding failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub username: Option<String>,
    pub sinner: Option<String>,
    pub persona: Option<String>,
    pub time: Option<i64>,
    pub floor_level: Option<serde_json::Value>,
    pub ego_gifts: Option<Vec<String>>,
    pub combat_passives: Option<Vec<String>>,
    pub support_passives: Option<Vec<String>>,
    pub screenshot_url: Option<String>,
    pub video_url: Option<String>,
    pub notes: Option<String>,
}

/// A submission that passed validation, ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSubmission {
    pub username: String,
    pub sinner: String,
    pub persona: String,
    pub time: u64,
    pub floor_level: FloorLevel,
    pub ego_gifts: Vec<String>,
    pub combat_passives: Vec<String>,
    pub support_passives: Vec<String>,
    pub screenshot_url: Option<String>,
    pub video_url: Option<String>,
    pub notes: Option<String>,
}

fn present(value: Option<&String>) -> Option<String> {
    value.filter(|s| !s.is_empty()).cloned()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

fn floor_label(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl Submission {
    /// Check required fields, the time sign and the floor label.
    ///
    /// A zero time counts as missing.
    ///
    /// # Errors
    ///
    /// Returns the first class of problem found: missing fields, then a
    /// negative time, then an unknown floor label.
    pub fn validate(self) -> Result<ValidSubmission, ValidationError> {
        let username = present(self.username.as_ref());
        let sinner = present(self.sinner.as_ref());
        let persona = present(self.persona.as_ref());
        let floor = self.floor_level.as_ref().and_then(floor_label);
        let time = self.time.filter(|t| *t != 0);

        let mut missing = Vec::new();
        if username.is_none() {
            missing.push("username");
        }
        if sinner.is_none() {
            missing.push("sinner");
        }
        if persona.is_none() {
            missing.push("persona");
        }
        if time.is_none() {
            missing.push("time");
        }
        if floor.is_none() {
            missing.push("floorLevel");
        }

        match (username, sinner, persona, time, floor) {
            (Some(username), Some(sinner), Some(persona), Some(time), Some(floor)) => {
                let time = u64::try_from(time).map_err(|_| ValidationError::NegativeTime(time))?;
                let floor_level = floor.parse::<FloorLevel>()?;
                Ok(ValidSubmission {
                    username,
                    sinner,
                    persona,
                    time,
                    floor_level,
                    ego_gifts: self.ego_gifts.unwrap_or_default(),
                    combat_passives: self.combat_passives.unwrap_or_default(),
                    support_passives: self.support_passives.unwrap_or_default(),
                    screenshot_url: non_empty(self.screenshot_url),
                    video_url: non_empty(self.video_url),
                    notes: non_empty(self.notes),
                })
            }
            _ => Err(ValidationError::MissingFields(missing)),
        }
    }
}

impl ValidSubmission {
    #[must_use]
    pub fn into_record(self, id: u64, now: DateTime<Utc>) -> RankingRecord {
        RankingRecord {
            id,
            username: self.username,
            sinner: self.sinner,
            persona: self.persona,
            time: self.time,
            floor_level: self.floor_level,
            ego_gifts: self.ego_gifts,
            combat_passives: self.combat_passives,
            support_passives: self.support_passives,
            screenshot_url: self.screenshot_url,
            video_url: self.video_url,
            notes: self.notes,
            status: RecordStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}
