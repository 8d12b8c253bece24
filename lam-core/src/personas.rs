//! Persona name resolution.
//!
//! The issue templates disambiguate personas that several sinners share by
//! appending the sinner's name, e.g. `"LCB罪人(浮士德)"`. Records and avatars are
//! keyed by the plain persona name, so submitted names are normalized here.
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use crate::sinners::parse_sinner_id;

/// Template name → canonical name, per sinner id.
const TEMPLATE_ALIASES: &[(u8, &[(&str, &str)])] = &[
    (1, &[]),
    (
        2,
        &[
            ("LCB罪人(浮士德)", "LCB罪人"),
            ("剑契组杀手(浮士德)", "剑契组杀手"),
        ],
    ),
    (
        3,
        &[
            ("W公司3级清扫人员(堂吉诃德)", "W公司3级清扫人员"),
            ("LCB罪人(堂吉诃德)", "LCB罪人"),
            ("脑叶公司E.G.O:提灯(堂吉诃德)", "脑叶公司E.G.O:提灯"),
            ("剑契组杀手(堂吉诃德)", "剑契组杀手"),
        ],
    ),
    (
        4,
        &[
            ("W公司3级清扫人员(良秀)", "W公司3级清扫人员"),
            ("Seven协会南部6科(良秀)", "Seven协会南部6科"),
            ("LCB罪人(良秀)", "LCB罪人"),
        ],
    ),
    (
        5,
        &[
            ("W公司2级清扫人员(默尔索)", "W公司2级清扫人员"),
            ("LCB罪人(默尔索)", "LCB罪人"),
        ],
    ),
    (
        6,
        &[
            ("W公司2级清扫人员(鸿璐)", "W公司2级清扫人员"),
            ("LCB罪人(鸿璐)", "LCB罪人"),
            ("Dieci协会南部4科(鸿璐)", "Dieci协会南部4科"),
            ("黑云会若众(鸿璐)", "黑云会若众"),
            ("20区圣愚(鸿璐)", "20区圣愚"),
        ],
    ),
    (
        7,
        &[
            ("Seven协会南部4科(希斯克利夫)", "Seven协会南部4科"),
            ("LCB罪人(希斯克利夫)", "LCB罪人"),
            ("句点事务所收尾人(希斯克利夫)", "句点事务所收尾人"),
            ("黑云会若众(希斯克利夫)", "黑云会若众"),
        ],
    ),
    (
        8,
        &[
            ("し协会南部5科(以实玛利)", "し协会南部5科"),
            ("R公司第四集团军驯鹿队(以实玛利)", "R公司第四集团军驯鹿队"),
            ("LCCB系长(以实玛利)", "LCCB系长"),
            ("LCB罪人(以实玛利)", "LCB罪人"),
            ("六协会南部4科(以实玛利)", "六协会南部4科"),
        ],
    ),
    (
        9,
        &[
            ("N公司中锤(罗佳)", "N公司中锤"),
            ("LCCB系长(罗佳)", "LCCB系长"),
            ("LCB罪人(罗佳)", "LCB罪人"),
            ("Dieci协会南部4科(罗佳)", "Dieci协会南部4科"),
            ("黑云会若众(罗佳)", "黑云会若众"),
        ],
    ),
    (
        10,
        &[
            ("Девять协会北部3科(辛克莱)", "Девять协会北部3科"),
            ("Zwei协会西部3科(辛克莱)", "Zwei协会西部3科"),
            ("LCB罪人(辛克莱)", "LCB罪人"),
            ("中指幼弟(辛克莱)", "中指幼弟"),
            ("臼齿修船厂收尾人(辛克莱)", "臼齿修船厂收尾人"),
            ("剑契组杀手(辛克莱)", "剑契组杀手"),
        ],
    ),
    (
        11,
        &[
            ("Zwei协会南部4科(格里高尔)", "Zwei协会南部4科"),
            ("LCB罪人(格里高尔)", "LCB罪人"),
            ("玫瑰扳手工坊收尾人(格里高尔)", "玫瑰扳手工坊收尾人"),
            ("六协会南部6科(格里高尔)", "六协会南部6科"),
            ("黑云会副会长(格里高尔)", "黑云会副会长"),
            ("黑兽-巳(格里高尔)", "黑兽-巳"),
        ],
    ),
    (
        12,
        &[
            ("LCB罪人(奥提斯)", "LCB罪人"),
            ("Cinq协会南部4科(奥提斯)", "Cinq协会南部4科"),
            ("臼齿事务所收尾人(奥提斯)", "臼齿事务所收尾人"),
            ("剑契组杀手(奥提斯)", "剑契组杀手"),
            ("环指点彩派学徒(奥提斯)", "环指点彩派学徒"),
            ("黑兽-卯(奥提斯)", "黑兽-卯"),
        ],
    ),
];

type AliasTable = HashMap<&'static str, &'static str>;

static PERSONA_NAME_MAPPING: Lazy<HashMap<u8, AliasTable>> = Lazy::new(|| {
    TEMPLATE_ALIASES
        .iter()
        .map(|(id, pairs)| (*id, pairs.iter().copied().collect()))
        .collect()
});

// `None` only if the pattern fails to compile, in which case stripping is skipped.
static SUFFIX_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^(.+?)\([^)]+\)$").ok());

/// Canonical persona name for a (possibly suffixed) template name.
///
/// Resolution order: the sinner's explicit alias table, then stripping a
/// trailing `"(...)"` suffix, then the input as-is. Never fails; a name given
/// with an unknown or malformed sinner id is returned unchanged.
///
/// ```
/// use lam_core::normalize_persona_name;
///
/// assert_eq!(normalize_persona_name("8", "六协会南部4科(以实玛利)"), "六协会南部4科");
/// assert_eq!(normalize_persona_name("9", "新人格(罗佳)"), "新人格");
/// assert_eq!(normalize_persona_name("x", "新人格(某人)"), "新人格(某人)");
/// assert_eq!(normalize_persona_name("1", "LCB罪人"), "LCB罪人");
/// ```
#[must_use]
pub fn normalize_persona_name(sinner_id: &str, persona_name: &str) -> String {
    if persona_name.is_empty() {
        return String::new();
    }

    let Some(id) = parse_sinner_id(sinner_id) else {
        return persona_name.to_string();
    };
    if let Some(canonical) = PERSONA_NAME_MAPPING
        .get(&id)
        .and_then(|table| table.get(persona_name))
    {
        return (*canonical).to_string();
    }

    strip_sinner_suffix(persona_name).to_string()
}

/// `"X(Y)"` → `"X"`; anything else is returned untouched.
#[must_use]
pub fn strip_sinner_suffix(persona_name: &str) -> &str {
    SUFFIX_PATTERN
        .as_ref()
        .and_then(|re| re.captures(persona_name))
        .and_then(|caps| caps.get(1))
        .map_or(persona_name, |m| m.as_str())
}

/// The alias table for one sinner, sorted by template name.
#[must_use]
pub fn mapping_for(sinner_id: u8) -> Vec<(&'static str, &'static str)> {
    let mut pairs: Vec<_> = PERSONA_NAME_MAPPING
        .get(&sinner_id)
        .map(|table| table.iter().map(|(k, v)| (*k, *v)).collect())
        .unwrap_or_default();
    pairs.sort_unstable();
    pairs
}

#[must_use]
pub fn is_template_name(sinner_id: u8, persona_name: &str) -> bool {
    PERSONA_NAME_MAPPING
        .get(&sinner_id)
        .is_some_and(|table| table.contains_key(persona_name))
}
