//! The twelve playable sinners.
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Sinner {
    pub id: u8,
    /// Display name used by the issue templates and the leaderboard.
    pub name: &'static str,
    pub english_name: &'static str,
}

pub const SINNER_COUNT: u8 = 12;

pub const SINNERS: [Sinner; SINNER_COUNT as usize] = [
    Sinner {
        id: 1,
        name: "李箱",
        english_name: "Yi Sang",
    },
    Sinner {
        id: 2,
        name: "浮士德",
        english_name: "Faust",
    },
    Sinner {
        id: 3,
        name: "堂吉诃德",
        english_name: "Don Quixote",
    },
    Sinner {
        id: 4,
        name: "良秀",
        english_name: "Ryoshu",
    },
    Sinner {
        id: 5,
        name: "默尔索",
        english_name: "Meursault",
    },
    Sinner {
        id: 6,
        name: "鸿璐",
        english_name: "Hong Lu",
    },
    Sinner {
        id: 7,
        name: "希斯克利夫",
        english_name: "Heathcliff",
    },
    Sinner {
        id: 8,
        name: "以实玛利",
        english_name: "Ishmael",
    },
    Sinner {
        id: 9,
        name: "罗佳",
        english_name: "Rodion",
    },
    Sinner {
        id: 10,
        name: "辛克莱",
        english_name: "Sinclair",
    },
    Sinner {
        id: 11,
        name: "格里高尔",
        english_name: "Gregor",
    },
    Sinner {
        id: 12,
        name: "奥提斯",
        english_name: "Outis",
    },
];

/// Parse a sinner id the way form fields arrive: `"8"`, `" 8 "`, `"08"`.
#[must_use]
pub fn parse_sinner_id(raw: &str) -> Option<u8> {
    raw.trim()
        .parse::<u8>()
        .ok()
        .filter(|id| (1..=SINNER_COUNT).contains(id))
}

#[must_use]
pub fn sinner_by_id(id: u8) -> Option<&'static Sinner> {
    SINNERS.iter().find(|s| s.id == id)
}

/// Look a sinner up by either display name, case-insensitively for the English one.
#[must_use]
pub fn sinner_by_name(name: &str) -> Option<&'static Sinner> {
    let name = name.trim();
    SINNERS
        .iter()
        .find(|s| s.name == name || s.english_name.eq_ignore_ascii_case(name))
}

#[must_use]
pub fn all_sinner_ids() -> Vec<u8> {
    SINNERS.iter().map(|s| s.id).collect()
}
