// 📝 Inscription - registration request submitted from the public site
//
// An admin confirms an inscription, which creates the matching Student.

use crate::entities::student::{Student, StudentStatus};
use crate::program::ScheduleGroup;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inscription {
    pub id: String,

    pub created_at: DateTime<Utc>,

    #[serde(rename = "nom")]
    pub name: String,

    pub email: Option<String>,

    #[serde(rename = "telephone")]
    pub phone: Option<String>,

    #[serde(rename = "date_naissance")]
    pub birth_date: Option<NaiveDate>,

    #[serde(rename = "responsable_nom")]
    pub guardian_name: Option<String>,

    #[serde(rename = "responsable_tel")]
    pub guardian_phone: Option<String>,

    /// Requested programs, normalized to lower-case keys
    #[serde(rename = "specialites", default)]
    pub specialties: Vec<String>,

    /// Weekday or weekend track chosen at registration
    #[serde(rename = "horaire")]
    pub schedule: ScheduleGroup,

    pub notes: Option<String>,

    /// Student created when this inscription was confirmed
    #[serde(rename = "etudiant_id")]
    pub confirmed_student_id: Option<String>,
}

impl Inscription {
    pub fn new(name: &str, schedule: ScheduleGroup) -> Self {
        Inscription {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            name: name.trim().to_string(),
            email: None,
            phone: None,
            birth_date: None,
            guardian_name: None,
            guardian_phone: None,
            specialties: Vec::new(),
            schedule,
            notes: None,
            confirmed_student_id: None,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed_student_id.is_some()
    }

    /// "Maquillage / Weekend" style summary used in notifications and lists
    pub fn summary(&self) -> String {
        let specialties = if self.specialties.is_empty() {
            "Non spécifiées".to_string()
        } else {
            self.specialties
                .iter()
                .map(|s| specialty_label(s))
                .collect::<Vec<_>>()
                .join(", ")
        };
        format!("{} / {}", specialties, self.schedule.label())
    }

    /// Student record created on confirmation.
    ///
    /// The first requested specialty becomes the program.
    pub fn to_student(&self) -> Student {
        let mut student = Student::new(&self.name);
        student.email = self.email.clone();
        student.phone = self.phone.clone();
        student.birth_date = self.birth_date;
        student.guardian_name = self.guardian_name.clone();
        student.guardian_phone = self.guardian_phone.clone();
        student.program = self.specialties.first().cloned();
        student.specialties = self.specialties.clone();
        student.group = Some(self.schedule);
        student.status = StudentStatus::Active;
        student
    }
}

/// Lower-case, trim and drop empty specialty entries
pub fn normalize_specialties(raw: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for value in raw {
        let key = value.trim().to_lowercase();
        if !key.is_empty() && !out.contains(&key) {
            out.push(key);
        }
    }
    out
}

fn specialty_label(key: &str) -> String {
    match key {
        "maquillage" => "Maquillage".to_string(),
        "cosmetologie" => "Cosmétologie".to_string(),
        "decoration" => "Décoration".to_string(),
        "style-crochet" => "Style crochet".to_string(),
        other => other.to_string(),
    }
}

/// Parse a birth date typed as ISO ("2004-09-14", optionally with a time
/// part) or French ("14/09/2004"). Years before 1900 are rejected.
pub fn parse_birth_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let date = if text.contains('/') {
        NaiveDate::parse_from_str(text, "%d/%m/%Y").ok()?
    } else {
        let day_part = text.split('T').next().unwrap_or(text);
        NaiveDate::parse_from_str(day_part, "%Y-%m-%d").ok()?
    };

    if date.year() < 1900 {
        None
    } else {
        Some(date)
    }
}
