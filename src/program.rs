// 🏷️ Program Classifier - map free-text program labels to categories
// Students carry a free-text "programme" field; payment views group them
// into three fixed categories by substring token.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// TEXT NORMALIZATION
// ============================================================================

/// Lower-case and strip the Latin diacritics found in French labels.
///
/// "Décoration Avancée" -> "decoration avancee"
pub fn fold_text(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
            'ç' => 'c',
            'è' | 'é' | 'ê' | 'ë' => 'e',
            'ì' | 'í' | 'î' | 'ï' => 'i',
            'ñ' => 'n',
            'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
            'ù' | 'ú' | 'û' | 'ü' => 'u',
            'ý' | 'ÿ' => 'y',
            other => other,
        })
        .collect()
}

// ============================================================================
// PROGRAM
// ============================================================================

/// The closed set of program categories taught by the school.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Program {
    Maquillage,
    Cosmetologie,
    Decoration,
}

impl Program {
    /// Classification order; the first matching token wins.
    pub const ALL: [Program; 3] = [Program::Maquillage, Program::Cosmetologie, Program::Decoration];

    /// Stable key used in URLs, CSV file names and the database
    pub fn key(&self) -> &'static str {
        match self {
            Program::Maquillage => "maquillage",
            Program::Cosmetologie => "cosmetologie",
            Program::Decoration => "decoration",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Program::Maquillage => "Maquillage",
            Program::Cosmetologie => "Cosmétologie",
            Program::Decoration => "Décoration",
        }
    }

    /// Substring identifying this program inside a folded label
    pub fn token(&self) -> &'static str {
        match self {
            Program::Maquillage => "maquill",
            Program::Cosmetologie => "cosm",
            Program::Decoration => "dec",
        }
    }

    /// Parse a program key ("maquillage", "Cosmétologie", ...)
    pub fn from_key(key: &str) -> Option<Program> {
        let folded = fold_text(key.trim());
        Program::ALL.into_iter().find(|p| p.key() == folded)
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Does a free-text program label belong to `program`?
///
/// Missing or blank labels never match.
pub fn program_matches(label: Option<&str>, program: Program) -> bool {
    match label {
        Some(text) if !text.trim().is_empty() => fold_text(text).contains(program.token()),
        _ => false,
    }
}

/// Category of a free-text label, if any token matches.
pub fn classify(label: Option<&str>) -> Option<Program> {
    Program::ALL
        .into_iter()
        .find(|program| program_matches(label, *program))
}

// ============================================================================
// SCHEDULE GROUP
// ============================================================================

/// Weekday vs weekend track.
///
/// Legacy rows store this as text ("semaine", "weekend") or as a numeric
/// code (1 = weekday, 2 = weekend).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleGroup {
    Semaine,
    Weekend,
}

impl ScheduleGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleGroup::Semaine => "semaine",
            ScheduleGroup::Weekend => "weekend",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScheduleGroup::Semaine => "Semaine",
            ScheduleGroup::Weekend => "Weekend",
        }
    }

    /// Normalize a textual group code. Empty text has no group.
    pub fn from_text(text: &str) -> Option<ScheduleGroup> {
        let value = text.trim().to_lowercase();
        if value.is_empty() {
            None
        } else if value.contains("week") || value == "2" {
            Some(ScheduleGroup::Weekend)
        } else {
            Some(ScheduleGroup::Semaine)
        }
    }

    pub fn from_number(code: i64) -> ScheduleGroup {
        if code == 2 {
            ScheduleGroup::Weekend
        } else {
            ScheduleGroup::Semaine
        }
    }

    /// Normalize a JSON value that may be a string, a number or null.
    pub fn from_json(value: &serde_json::Value) -> Option<ScheduleGroup> {
        match value {
            serde_json::Value::String(text) => Self::from_text(text),
            serde_json::Value::Number(n) => n.as_i64().map(Self::from_number),
            _ => None,
        }
    }
}
