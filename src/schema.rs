// 📐 Shape Layer - Schema Validation
// Loosely typed rows (optional fields, groups as text or numbers) are
// validated into entities here, before anything else touches them.

use crate::entities::{
    normalize_specialties, parse_birth_date, Inscription, PaymentRecord, PaymentStatus,
    Publication, PublicationStatus, Student, StudentStatus, Testimonial,
};
use crate::months::MonthCode;
use crate::program::ScheduleGroup;
use chrono::{DateTime, Utc};
use serde::Deserialize;

// ============================================================================
// VALIDATION RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub context: String,
}

impl ValidationError {
    pub fn new(field: &str, message: &str, context: &str) -> Self {
        ValidationError {
            field: field.to_string(),
            message: message.to_string(),
            context: context.to_string(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.context, self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult<T> = Result<T, Vec<ValidationError>>;

// ============================================================================
// RAW ROWS
// ============================================================================

/// A month column stored either as "04" or as 4.
///
/// Any other shape (2.0, true, ...) lands in `Other` so the row fails
/// validation instead of deserialization.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MonthField {
    Text(String),
    Number(i64),
    Other(serde_json::Value),
}

impl MonthField {
    fn to_month(&self) -> Option<MonthCode> {
        match self {
            MonthField::Text(text) => MonthCode::parse(text),
            MonthField::Number(n) => u8::try_from(*n).ok().and_then(MonthCode::new),
            MonthField::Other(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawStudentRow {
    pub id: Option<String>,
    pub created_at: Option<String>,
    pub nom: Option<String>,
    pub email: Option<String>,
    pub telephone: Option<String>,
    pub date_naissance: Option<String>,
    pub responsable_nom: Option<String>,
    pub responsable_tel: Option<String>,
    pub programme: Option<String>,
    pub specialites: Option<Vec<String>>,
    /// "semaine" | "weekend" | 1 | 2 | null
    #[serde(default)]
    pub groupe: serde_json::Value,
    pub statut: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawPaymentRow {
    pub id: Option<String>,
    pub etudiant_id: Option<String>,
    pub mois: Option<MonthField>,
    pub statut: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawInscriptionRow {
    pub nom: Option<String>,
    pub email: Option<String>,
    pub telephone: Option<String>,
    pub date_naissance: Option<String>,
    pub responsable_nom: Option<String>,
    pub responsable_tel: Option<String>,
    pub specialites: Option<Vec<String>>,
    /// The public form posts the track as "programme"
    #[serde(alias = "programme")]
    pub horaire: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPublicationRow {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub cover_url: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTestimonialRow {
    pub nom: Option<String>,
    pub message: Option<String>,
    /// 1..=5, as a number or numeric text; null or blank means no rating
    #[serde(default)]
    pub note: serde_json::Value,
}

// ============================================================================
// SCHEMA VALIDATOR
// ============================================================================

pub struct SchemaValidator;

impl SchemaValidator {
    pub fn new() -> Self {
        SchemaValidator
    }

    /// Validate a student row; a missing id gets a fresh UUID.
    pub fn student(&self, raw: &RawStudentRow) -> ValidationResult<Student> {
        let mut errors = Vec::new();
        let context = "Student";

        let name = clean(&raw.nom);
        let mut student = Student::new("");
        student.name = name;

        if let Some(id) = clean(&raw.id) {
            student.id = id;
        }

        if let Some(created_at) = clean(&raw.created_at) {
            match parse_timestamp(&created_at) {
                Some(ts) => student.created_at = ts,
                None => errors.push(ValidationError::new(
                    "created_at",
                    "Not an RFC 3339 timestamp",
                    context,
                )),
            }
        }

        student.email = clean(&raw.email);
        if let Some(email) = &student.email {
            if !email.contains('@') {
                errors.push(ValidationError::new("email", "Not an email address", context));
            }
        }

        student.phone = clean(&raw.telephone);
        student.guardian_name = clean(&raw.responsable_nom);
        student.guardian_phone = clean(&raw.responsable_tel);

        if let Some(text) = clean(&raw.date_naissance) {
            match parse_birth_date(&text) {
                Some(date) => student.birth_date = Some(date),
                None => errors.push(ValidationError::new(
                    "date_naissance",
                    "Expected YYYY-MM-DD or JJ/MM/AAAA",
                    context,
                )),
            }
        }

        student.program = clean(&raw.programme);
        student.specialties = normalize_specialties(raw.specialites.as_deref().unwrap_or_default());
        student.group = ScheduleGroup::from_json(&raw.groupe);
        student.status = raw
            .statut
            .as_deref()
            .map(StudentStatus::from_text)
            .unwrap_or_default();

        if errors.is_empty() {
            Ok(student)
        } else {
            Err(errors)
        }
    }

    pub fn payment(&self, raw: &RawPaymentRow) -> ValidationResult<PaymentRecord> {
        let mut errors = Vec::new();
        let context = "Payment";

        let student_id = clean(&raw.etudiant_id);
        if student_id.is_none() {
            errors.push(ValidationError::new("etudiant_id", "Required field is empty", context));
        }

        let month = raw.mois.as_ref().and_then(MonthField::to_month);
        if month.is_none() {
            errors.push(ValidationError::new("mois", "Expected a month code 01-12", context));
        }

        let status = raw.statut.as_deref().and_then(PaymentStatus::parse);
        if status.is_none() {
            errors.push(ValidationError::new(
                "statut",
                "Expected \"paye\" or \"non_paye\"",
                context,
            ));
        }

        let created_at = match clean(&raw.created_at) {
            Some(text) => match parse_timestamp(&text) {
                Some(ts) => Some(ts),
                None => {
                    errors.push(ValidationError::new(
                        "created_at",
                        "Not an RFC 3339 timestamp",
                        context,
                    ));
                    None
                }
            },
            None => None,
        };

        match (student_id, month, status) {
            (Some(student_id), Some(month), Some(status)) if errors.is_empty() => {
                let mut record = PaymentRecord::new(&student_id, month, status);
                if let Some(id) = clean(&raw.id) {
                    record.id = id;
                }
                if let Some(ts) = created_at {
                    record.created_at = ts;
                }
                Ok(record)
            }
            _ => Err(errors),
        }
    }

    pub fn inscription(&self, raw: &RawInscriptionRow) -> ValidationResult<Inscription> {
        let mut errors = Vec::new();
        let context = "Inscription";

        let name = clean(&raw.nom);
        if name.is_none() {
            errors.push(ValidationError::new("nom", "Required field is empty", context));
        }

        let email = clean(&raw.email);
        let phone = clean(&raw.telephone);
        if email.is_none() && phone.is_none() {
            errors.push(ValidationError::new(
                "telephone",
                "An email or a phone number is required",
                context,
            ));
        }
        if let Some(email) = &email {
            if !email.contains('@') {
                errors.push(ValidationError::new("email", "Not an email address", context));
            }
        }

        let birth_date = match clean(&raw.date_naissance) {
            Some(text) => {
                let parsed = parse_birth_date(&text);
                if parsed.is_none() {
                    errors.push(ValidationError::new(
                        "date_naissance",
                        "Expected YYYY-MM-DD or JJ/MM/AAAA",
                        context,
                    ));
                }
                parsed
            }
            None => None,
        };

        // Unknown or missing track defaults to weekday
        let schedule = clean(&raw.horaire)
            .and_then(|h| ScheduleGroup::from_text(&h))
            .unwrap_or(ScheduleGroup::Semaine);

        if !errors.is_empty() {
            return Err(errors);
        }

        let mut inscription = Inscription::new(name.as_deref().unwrap_or_default(), schedule);
        inscription.email = email;
        inscription.phone = phone;
        inscription.birth_date = birth_date;
        inscription.guardian_name = clean(&raw.responsable_nom);
        inscription.guardian_phone = clean(&raw.responsable_tel);
        inscription.specialties =
            normalize_specialties(raw.specialites.as_deref().unwrap_or_default());
        inscription.notes = clean(&raw.notes);
        Ok(inscription)
    }

    pub fn publication(&self, raw: &RawPublicationRow) -> ValidationResult<Publication> {
        let mut errors = Vec::new();
        let context = "Publication";

        let title = clean(&raw.title);
        let content = clean(&raw.content);
        if title.is_none() {
            errors.push(ValidationError::new("title", "Required field is empty", context));
        }
        if content.is_none() {
            errors.push(ValidationError::new("content", "Required field is empty", context));
        }

        let status = match clean(&raw.status) {
            Some(tag) => match PublicationStatus::parse(&tag) {
                Some(status) => status,
                None => {
                    errors.push(ValidationError::new(
                        "status",
                        "Expected \"draft\" or \"published\"",
                        context,
                    ));
                    PublicationStatus::default()
                }
            },
            None => PublicationStatus::default(),
        };

        let (title, content) = match (title, content) {
            (Some(title), Some(content)) if errors.is_empty() => (title, content),
            _ => return Err(errors),
        };

        let mut post = Publication::new(&title, &content, raw.slug.as_deref());
        if post.slug.is_empty() {
            return Err(vec![ValidationError::new(
                "slug",
                "Slug is empty after normalization",
                context,
            )]);
        }
        post.cover_url = clean(&raw.cover_url);
        post.status = status;
        Ok(post)
    }

    pub fn testimonial(&self, raw: &RawTestimonialRow) -> ValidationResult<Testimonial> {
        let mut errors = Vec::new();
        let context = "Testimonial";

        let name = clean(&raw.nom);
        if name.is_none() {
            errors.push(ValidationError::new("nom", "Required field is empty", context));
        }
        let message = clean(&raw.message);
        if message.is_none() {
            errors.push(ValidationError::new("message", "Required field is empty", context));
        }

        let rating = match &raw.note {
            serde_json::Value::Null => None,
            serde_json::Value::String(text) if text.trim().is_empty() => None,
            value => {
                let parsed = match value {
                    serde_json::Value::Number(n) => n.as_i64(),
                    serde_json::Value::String(text) => text.trim().parse::<i64>().ok(),
                    _ => None,
                };
                match parsed.filter(|n| (1..=5).contains(n)) {
                    Some(n) => Some(n as u8),
                    None => {
                        errors.push(ValidationError::new(
                            "note",
                            "Expected a rating from 1 to 5",
                            context,
                        ));
                        None
                    }
                }
            }
        };

        match (name, message) {
            (Some(name), Some(message)) if errors.is_empty() => {
                Ok(Testimonial::new(&name, &message, rating))
            }
            _ => Err(errors),
        }
    }

    /// Validate an edit of `existing`.
    ///
    /// Status, slug and cover keep their stored values when the edit does
    /// not carry them; an explicitly blank cover clears it.
    pub fn publication_update(
        &self,
        raw: &RawPublicationRow,
        existing: &Publication,
    ) -> ValidationResult<Publication> {
        let mut post = self.publication(raw)?;

        post.id = existing.id.clone();
        post.created_at = existing.created_at;
        if clean(&raw.status).is_none() {
            post.status = existing.status;
        }
        if clean(&raw.slug).is_none() {
            post.slug = existing.slug.clone();
        }
        if raw.cover_url.is_none() {
            post.cover_url = existing.cover_url.clone();
        }

        Ok(post)
    }
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// Trimmed, non-empty string or None
fn clean(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
