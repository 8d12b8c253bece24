//! Floor labels of the challenge mode.
//!
//! Floors run 1 through 15. Floor 5 is split into a normal (`5-1`) and a hard
//! (`5-2`) variant, so the set is a list of labels rather than a number range.
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FloorLevel {
    F1,
    F2,
    F3,
    F4,
    F5Normal,
    F5Hard,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    F13,
    F14,
    F15,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid floor label '{0}' (expected 1-15, with 5-1 or 5-2 for floor 5)")]
pub struct InvalidFloor(pub String);

impl FloorLevel {
    pub const ALL: [Self; 16] = [
        Self::F1,
        Self::F2,
        Self::F3,
        Self::F4,
        Self::F5Normal,
        Self::F5Hard,
        Self::F6,
        Self::F7,
        Self::F8,
        Self::F9,
        Self::F10,
        Self::F11,
        Self::F12,
        Self::F13,
        Self::F14,
        Self::F15,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::F1 => "1",
            Self::F2 => "2",
            Self::F3 => "3",
            Self::F4 => "4",
            Self::F5Normal => "5-1",
            Self::F5Hard => "5-2",
            Self::F6 => "6",
            Self::F7 => "7",
            Self::F8 => "8",
            Self::F9 => "9",
            Self::F10 => "10",
            Self::F11 => "11",
            Self::F12 => "12",
            Self::F13 => "13",
            Self::F14 => "14",
            Self::F15 => "15",
        }
    }

    /// Every accepted label, in floor order.
    pub fn labels() -> impl Iterator<Item = &'static str> {
        Self::ALL.iter().map(|floor| floor.label())
    }

    #[must_use]
    pub fn is_valid_label(label: &str) -> bool {
        label.parse::<Self>().is_ok()
    }
}

impl FromStr for FloorLevel {
    type Err = InvalidFloor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|floor| floor.label() == s)
            .ok_or_else(|| InvalidFloor(s.to_string()))
    }
}

impl fmt::Display for FloorLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for FloorLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for FloorLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Older clients send plain floors as numbers.
        let raw = serde_json::Value::deserialize(deserializer)?;
        let label = match raw {
            serde_json::Value::String(s) => s,
            serde_json::Value::Number(n) => n.to_string(),
            other => return Err(serde::de::Error::custom(format!("invalid floor: {other}"))),
        };
        label.parse().map_err(serde::de::Error::custom)
    }
}
