// 🎓 Student Entity - enrolled students ("étudiantes")
//
// Field names on the wire follow the school's table columns
// (nom, telephone, programme, groupe, statut, ...).

use crate::months::MonthCode;
use crate::program::{classify, fold_text, ScheduleGroup};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// STUDENT STATUS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StudentStatus {
    #[default]
    #[serde(rename = "actif")]
    Active,

    #[serde(rename = "archive")]
    Archived,
}

impl StudentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StudentStatus::Active => "actif",
            StudentStatus::Archived => "archive",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StudentStatus::Active => "Actif",
            StudentStatus::Archived => "Archivé",
        }
    }

    /// Missing or unknown status is treated as active.
    pub fn from_text(text: &str) -> StudentStatus {
        if fold_text(text.trim()).starts_with("archiv") {
            StudentStatus::Archived
        } else {
            StudentStatus::Active
        }
    }
}

// ============================================================================
// STUDENT ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    /// Stable identity (UUID)
    pub id: String,

    pub created_at: DateTime<Utc>,

    #[serde(rename = "nom")]
    pub name: Option<String>,

    pub email: Option<String>,

    #[serde(rename = "telephone")]
    pub phone: Option<String>,

    #[serde(rename = "date_naissance")]
    pub birth_date: Option<NaiveDate>,

    #[serde(rename = "responsable_nom")]
    pub guardian_name: Option<String>,

    #[serde(rename = "responsable_tel")]
    pub guardian_phone: Option<String>,

    /// Free-text program label, loosely one of maquillage / cosmetologie / decoration
    #[serde(rename = "programme")]
    pub program: Option<String>,

    #[serde(rename = "specialites", default)]
    pub specialties: Vec<String>,

    #[serde(rename = "groupe")]
    pub group: Option<ScheduleGroup>,

    #[serde(rename = "statut", default)]
    pub status: StudentStatus,
}

impl Student {
    /// Create a new active student with a fresh UUID
    pub fn new(name: &str) -> Self {
        Student {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            name: Some(name.to_string()),
            email: None,
            phone: None,
            birth_date: None,
            guardian_name: None,
            guardian_phone: None,
            program: None,
            specialties: Vec::new(),
            group: None,
            status: StudentStatus::Active,
        }
    }

    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => "(Sans nom)",
        }
    }

    /// Program label, falling back to the first specialty when the
    /// program column is empty.
    pub fn program_label(&self) -> Option<&str> {
        self.program
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .or_else(|| self.specialties.first().map(String::as_str))
    }

    pub fn group_label(&self) -> &'static str {
        self.group.map(|g| g.label()).unwrap_or("-")
    }

    pub fn is_active(&self) -> bool {
        self.status == StudentStatus::Active
    }
}

// ============================================================================
// EDIT FORM
// ============================================================================

/// Partial update coming from the admin edit form.
///
/// Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentUpdate {
    #[serde(rename = "nom")]
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "telephone")]
    pub phone: Option<String>,
    #[serde(rename = "date_naissance")]
    pub birth_date: Option<NaiveDate>,
    #[serde(rename = "responsable_nom")]
    pub guardian_name: Option<String>,
    #[serde(rename = "responsable_tel")]
    pub guardian_phone: Option<String>,
    #[serde(rename = "programme")]
    pub program: Option<String>,
    #[serde(rename = "groupe")]
    pub group: Option<ScheduleGroup>,
    #[serde(rename = "statut")]
    pub status: Option<StudentStatus>,
}

impl StudentUpdate {
    pub fn apply(&self, student: &mut Student) {
        if let Some(name) = &self.name {
            student.name = non_blank(name);
        }
        if let Some(email) = &self.email {
            student.email = non_blank(email);
        }
        if let Some(phone) = &self.phone {
            student.phone = non_blank(phone);
        }
        if let Some(date) = self.birth_date {
            student.birth_date = Some(date);
        }
        if let Some(name) = &self.guardian_name {
            student.guardian_name = non_blank(name);
        }
        if let Some(phone) = &self.guardian_phone {
            student.guardian_phone = non_blank(phone);
        }
        if let Some(program) = &self.program {
            // specialties mirror the chosen program
            student.program = non_blank(program);
            student.specialties = student.program.iter().cloned().collect();
        }
        if let Some(group) = self.group {
            student.group = Some(group);
        }
        if let Some(status) = self.status {
            student.status = status;
        }
    }
}

fn non_blank(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

// ============================================================================
// LIST FILTER
// ============================================================================

/// Filters of the admin student list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentFilter {
    /// Free-text needle over name, email, phone, program and group
    #[serde(rename = "q")]
    pub query: Option<String>,
    pub group: Option<ScheduleGroup>,
    pub status: Option<StudentStatus>,
    pub birth_month: Option<MonthCode>,
}

impl StudentFilter {
    pub fn matches(&self, student: &Student) -> bool {
        if let Some(group) = self.group {
            if student.group != Some(group) {
                return false;
            }
        }

        if let Some(status) = self.status {
            if student.status != status {
                return false;
            }
        }

        if let Some(month) = self.birth_month {
            let born_in = student
                .birth_date
                .and_then(|d| MonthCode::new(d.month() as u8));
            if born_in != Some(month) {
                return false;
            }
        }

        let needle = match self.query.as_deref().map(|q| fold_text(q.trim())) {
            Some(needle) if !needle.is_empty() => needle,
            _ => return true,
        };

        let program = student
            .program_label()
            .map(|label| classify(Some(label)).map(|p| p.label()).unwrap_or(label))
            .unwrap_or("");

        let haystack = [
            student.name.as_deref().unwrap_or(""),
            student.email.as_deref().unwrap_or(""),
            student.phone.as_deref().unwrap_or(""),
            program,
            student.group.map(|g| g.label()).unwrap_or(""),
        ]
        .join(" ");

        fold_text(&haystack).contains(&needle)
    }

    pub fn apply<'a>(&self, students: &'a [Student]) -> Vec<&'a Student> {
        students.iter().filter(|s| self.matches(s)).collect()
    }
}
