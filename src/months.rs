// 📅 Month codes - two-digit "01".."12" month identifiers
// Payments are recorded per calendar month, with no year component.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

const LONG_LABELS: [&str; 12] = [
    "Janvier",
    "Février",
    "Mars",
    "Avril",
    "Mai",
    "Juin",
    "Juillet",
    "Août",
    "Septembre",
    "Octobre",
    "Novembre",
    "Décembre",
];

const SHORT_LABELS: [&str; 12] = [
    "Jan", "Fév", "Mar", "Avr", "Mai", "Juin", "Juil", "Août", "Sep", "Oct", "Nov", "Déc",
];

// ============================================================================
// MONTH CODE
// ============================================================================

/// A calendar month, always in 1..=12.
///
/// Renders as the zero-padded code used everywhere on the wire ("01".."12").
/// Ordering is numeric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthCode(u8);

impl MonthCode {
    pub const JANUARY: MonthCode = MonthCode(1);
    pub const DECEMBER: MonthCode = MonthCode(12);

    /// Build from a month number, rejecting anything outside 1..=12
    pub fn new(month: u8) -> Option<Self> {
        if (1..=12).contains(&month) {
            Some(MonthCode(month))
        } else {
            None
        }
    }

    /// Parse a month code. Accepts "01" as well as "1"; surrounding
    /// whitespace is ignored. Non-numeric or out-of-domain input is `None`.
    pub fn parse(code: &str) -> Option<Self> {
        code.trim().parse::<u8>().ok().and_then(Self::new)
    }

    pub fn number(&self) -> u8 {
        self.0
    }

    /// Two-digit code, e.g. "04"
    pub fn code(&self) -> String {
        format!("{:02}", self.0)
    }

    /// French month name, e.g. "Avril"
    pub fn long_label(&self) -> &'static str {
        LONG_LABELS[(self.0 - 1) as usize]
    }

    /// Abbreviation used in payment tables, e.g. "Avr"
    pub fn short_label(&self) -> &'static str {
        SHORT_LABELS[(self.0 - 1) as usize]
    }

    /// All twelve months in calendar order
    pub fn all() -> impl Iterator<Item = MonthCode> {
        (1..=12).map(MonthCode)
    }
}

impl fmt::Display for MonthCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

impl Serialize for MonthCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.code())
    }
}

impl<'de> Deserialize<'de> for MonthCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        MonthCode::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid month code: {raw:?}")))
    }
}

// ============================================================================
// RANGE EXPANSION
// ============================================================================

/// Order-normalized bounds of a month range.
///
/// Returns `None` when either end is not a valid month code.
pub fn normalized_bounds(start: &str, end: &str) -> Option<(MonthCode, MonthCode)> {
    let start = MonthCode::parse(start)?;
    let end = MonthCode::parse(end)?;

    if start > end {
        Some((end, start))
    } else {
        Some((start, end))
    }
}

/// Every month between `start` and `end` inclusive, ascending.
///
/// A reversed range is swapped, so `("06", "01")` yields January to June.
/// Invalid input yields an empty list; callers render that as "no data".
pub fn expand_month_range(start: &str, end: &str) -> Vec<MonthCode> {
    match normalized_bounds(start, end) {
        Some((from, to)) => (from.0..=to.0).map(MonthCode).collect(),
        None => Vec::new(),
    }
}
