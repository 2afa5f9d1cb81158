use crate::entities::{
    Inscription, PaymentRecord, PaymentStatus, Publication, PublicationStatus, Student,
    StudentStatus, Testimonial,
};
use crate::error::AdminError;
use crate::months::MonthCode;
use crate::program::ScheduleGroup;
use crate::schema::{RawPaymentRow, SchemaValidator, ValidationError};
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Event for audit trail: every write leaves one
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Event {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub data: serde_json::Value,
    pub actor: String,
}

impl Event {
    pub fn new(
        event_type: &str,
        entity_type: &str,
        entity_id: &str,
        data: serde_json::Value,
        actor: &str,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type: event_type.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            data,
            actor: actor.to_string(),
        }
    }
}

const ADMIN_ACTOR: &str = "admin";

/// Open (or create) the database file and make sure the schema exists
pub fn open_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database at {}", path.display()))?;
    setup_database(&conn)?;
    info!(path = %path.display(), "database ready");
    Ok(conn)
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS students (
            id TEXT PRIMARY KEY,
            created_at TEXT NOT NULL,
            nom TEXT,
            email TEXT,
            telephone TEXT,
            date_naissance TEXT,
            responsable_nom TEXT,
            responsable_tel TEXT,
            programme TEXT,
            specialites TEXT NOT NULL DEFAULT '[]',
            groupe TEXT,
            statut TEXT NOT NULL DEFAULT 'actif'
        )",
        [],
    )?;

    // Insert-only; import_hash is set for rows that came from a CSV import
    conn.execute(
        "CREATE TABLE IF NOT EXISTS payments (
            id TEXT PRIMARY KEY,
            etudiant_id TEXT NOT NULL REFERENCES students(id) ON DELETE CASCADE,
            mois TEXT NOT NULL,
            statut TEXT NOT NULL,
            created_at TEXT NOT NULL,
            import_hash TEXT UNIQUE
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS inscriptions (
            id TEXT PRIMARY KEY,
            created_at TEXT NOT NULL,
            nom TEXT NOT NULL,
            email TEXT,
            telephone TEXT,
            date_naissance TEXT,
            responsable_nom TEXT,
            responsable_tel TEXT,
            specialites TEXT NOT NULL DEFAULT '[]',
            horaire TEXT NOT NULL,
            notes TEXT,
            etudiant_id TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS publications (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            slug TEXT UNIQUE NOT NULL,
            content TEXT NOT NULL,
            cover_url TEXT,
            status TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS testimonials (
            id TEXT PRIMARY KEY,
            created_at TEXT NOT NULL,
            nom TEXT NOT NULL,
            message TEXT NOT NULL,
            note INTEGER CHECK (note IS NULL OR note BETWEEN 1 AND 5)
        )",
        [],
    )?;

    // ==========================================================================
    // Events Table (audit trail)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            timestamp TEXT NOT NULL,
            event_type TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            data TEXT NOT NULL,
            actor TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_payments_student ON payments(etudiant_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_students_nom ON students(nom)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_entity ON events(entity_type, entity_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_timestamp ON events(timestamp)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// AUDIT TRAIL
// ============================================================================

/// Insert event into audit trail
pub fn insert_event(conn: &Connection, event: &Event) -> Result<()> {
    let data_json = serde_json::to_string(&event.data)?;

    conn.execute(
        "INSERT INTO events (
            event_id, timestamp, event_type, entity_type, entity_id, data, actor
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            event.event_id,
            event.timestamp.to_rfc3339(),
            event.event_type,
            event.entity_type,
            event.entity_id,
            data_json,
            event.actor,
        ],
    )?;

    Ok(())
}

fn log_event(
    conn: &Connection,
    event_type: &str,
    entity_type: &str,
    entity_id: &str,
    data: serde_json::Value,
) -> Result<()> {
    let event = Event::new(event_type, entity_type, entity_id, data, ADMIN_ACTOR);
    insert_event(conn, &event)
}

/// Get events for a specific entity, newest first
pub fn get_events_for_entity(
    conn: &Connection,
    entity_type: &str,
    entity_id: &str,
) -> Result<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, timestamp, event_type, entity_type, entity_id, data, actor
         FROM events
         WHERE entity_type = ?1 AND entity_id = ?2
         ORDER BY timestamp DESC, id DESC",
    )?;

    let events = stmt
        .query_map(params![entity_type, entity_id], |row| {
            let data_json: String = row.get(5)?;

            Ok(Event {
                event_id: row.get(0)?,
                timestamp: time_column(row, 1)?,
                event_type: row.get(2)?,
                entity_type: row.get(3)?,
                entity_id: row.get(4)?,
                data: serde_json::from_str(&data_json)
                    .map_err(|e| conversion_error(5, e))?,
                actor: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(events)
}

// ============================================================================
// COLUMN HELPERS
// ============================================================================

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn time_column(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn date_column(row: &Row, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let text: Option<String> = row.get(idx)?;
    text.map(|t| NaiveDate::parse_from_str(&t, "%Y-%m-%d").map_err(|e| conversion_error(idx, e)))
        .transpose()
}

fn list_column(row: &Row, idx: usize) -> rusqlite::Result<Vec<String>> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text).map_err(|e| conversion_error(idx, e))
}

fn month_column(row: &Row, idx: usize) -> rusqlite::Result<MonthCode> {
    let text: String = row.get(idx)?;
    MonthCode::parse(&text).ok_or_else(|| {
        let message = format!("invalid month code {text:?}");
        conversion_error(idx, ValidationError::new("mois", &message, "Payment"))
    })
}

fn date_text(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format("%Y-%m-%d").to_string())
}

// ============================================================================
// STUDENTS
// ============================================================================

const STUDENT_COLUMNS: &str = "id, created_at, nom, email, telephone, date_naissance,
    responsable_nom, responsable_tel, programme, specialites, groupe, statut";

fn student_from_row(row: &Row) -> rusqlite::Result<Student> {
    let group: Option<String> = row.get(10)?;
    let status: String = row.get(11)?;

    Ok(Student {
        id: row.get(0)?,
        created_at: time_column(row, 1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        birth_date: date_column(row, 5)?,
        guardian_name: row.get(6)?,
        guardian_phone: row.get(7)?,
        program: row.get(8)?,
        specialties: list_column(row, 9)?,
        group: group.as_deref().and_then(ScheduleGroup::from_text),
        status: StudentStatus::from_text(&status),
    })
}

pub fn insert_student(conn: &Connection, student: &Student) -> Result<()> {
    conn.execute(
        "INSERT INTO students (
            id, created_at, nom, email, telephone, date_naissance,
            responsable_nom, responsable_tel, programme, specialites, groupe, statut
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            student.id,
            student.created_at.to_rfc3339(),
            student.name,
            student.email,
            student.phone,
            date_text(student.birth_date),
            student.guardian_name,
            student.guardian_phone,
            student.program,
            serde_json::to_string(&student.specialties)?,
            student.group.map(|g| g.as_str()),
            student.status.as_str(),
        ],
    )
    .with_context(|| format!("Failed to insert student {}", student.id))?;

    log_event(
        conn,
        "student_created",
        "student",
        &student.id,
        serde_json::json!({ "nom": student.name, "programme": student.program }),
    )?;
    debug!(student_id = %student.id, "student inserted");

    Ok(())
}

/// All students, sorted by name
pub fn get_all_students(conn: &Connection) -> Result<Vec<Student>> {
    let sql = format!(
        "SELECT {STUDENT_COLUMNS} FROM students ORDER BY nom COLLATE NOCASE ASC, id ASC"
    );
    let mut stmt = conn.prepare(&sql)?;

    let students = stmt
        .query_map([], student_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(students)
}

pub fn get_student(conn: &Connection, id: &str) -> Result<Option<Student>> {
    let sql = format!("SELECT {STUDENT_COLUMNS} FROM students WHERE id = ?1");
    let student = conn
        .query_row(&sql, [id], student_from_row)
        .optional()?;

    Ok(student)
}

fn student_exists(conn: &Connection, id: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM students WHERE id = ?1",
        [id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Overwrite every column of an existing student
pub fn update_student(conn: &Connection, student: &Student) -> Result<()> {
    let changed = conn.execute(
        "UPDATE students SET
            nom = ?2, email = ?3, telephone = ?4, date_naissance = ?5,
            responsable_nom = ?6, responsable_tel = ?7, programme = ?8,
            specialites = ?9, groupe = ?10, statut = ?11
         WHERE id = ?1",
        params![
            student.id,
            student.name,
            student.email,
            student.phone,
            date_text(student.birth_date),
            student.guardian_name,
            student.guardian_phone,
            student.program,
            serde_json::to_string(&student.specialties)?,
            student.group.map(|g| g.as_str()),
            student.status.as_str(),
        ],
    )?;

    if changed == 0 {
        return Err(AdminError::not_found("student", &student.id).into());
    }

    log_event(
        conn,
        "student_updated",
        "student",
        &student.id,
        serde_json::to_value(student)?,
    )?;

    Ok(())
}

/// Archive or restore a student
pub fn set_student_status(conn: &Connection, id: &str, status: StudentStatus) -> Result<()> {
    let changed = conn.execute(
        "UPDATE students SET statut = ?2 WHERE id = ?1",
        params![id, status.as_str()],
    )?;

    if changed == 0 {
        return Err(AdminError::not_found("student", id).into());
    }

    let event_type = match status {
        StudentStatus::Archived => "student_archived",
        StudentStatus::Active => "student_restored",
    };
    log_event(conn, event_type, "student", id, serde_json::json!({}))?;
    info!(student_id = id, status = status.as_str(), "student status changed");

    Ok(())
}

/// Delete a student and, through the foreign key, their payments
pub fn delete_student(conn: &Connection, id: &str) -> Result<()> {
    let changed = conn.execute("DELETE FROM students WHERE id = ?1", [id])?;

    if changed == 0 {
        return Err(AdminError::not_found("student", id).into());
    }

    log_event(conn, "student_deleted", "student", id, serde_json::json!({}))?;
    info!(student_id = id, "student deleted");

    Ok(())
}

// ============================================================================
// PAYMENTS
// ============================================================================

fn payment_from_row(row: &Row) -> rusqlite::Result<PaymentRecord> {
    let status: String = row.get(3)?;

    Ok(PaymentRecord {
        id: row.get(0)?,
        student_id: row.get(1)?,
        month: month_column(row, 2)?,
        status: PaymentStatus::parse(&status).ok_or_else(|| {
            let message = format!("unknown status {status:?}");
            conversion_error(3, ValidationError::new("statut", &message, "Payment"))
        })?,
        created_at: time_column(row, 4)?,
    })
}

fn insert_payment_row(
    conn: &Connection,
    record: &PaymentRecord,
    import_hash: Option<&str>,
) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO payments (id, etudiant_id, mois, statut, created_at, import_hash)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            record.id,
            record.student_id,
            record.month.code(),
            record.status.as_str(),
            record.created_at.to_rfc3339(),
            import_hash,
        ],
    )
}

/// Record one month's payment for an existing student
pub fn insert_payment(conn: &Connection, record: &PaymentRecord) -> Result<()> {
    if !student_exists(conn, &record.student_id)? {
        return Err(AdminError::not_found("student", &record.student_id).into());
    }

    insert_payment_row(conn, record, None)
        .with_context(|| format!("Failed to insert payment {}", record.id))?;

    log_event(
        conn,
        "payment_recorded",
        "student",
        &record.student_id,
        serde_json::json!({
            "payment_id": record.id,
            "mois": record.month.code(),
            "statut": record.status.as_str(),
        }),
    )?;
    info!(
        student_id = %record.student_id,
        month = %record.month,
        status = record.status.as_str(),
        "payment recorded"
    );

    Ok(())
}

/// All payment records, newest first
pub fn get_all_payments(conn: &Connection) -> Result<Vec<PaymentRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, etudiant_id, mois, statut, created_at
         FROM payments
         ORDER BY created_at DESC",
    )?;

    let payments = stmt
        .query_map([], payment_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(payments)
}

pub fn get_payments_for_student(conn: &Connection, student_id: &str) -> Result<Vec<PaymentRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, etudiant_id, mois, statut, created_at
         FROM payments
         WHERE etudiant_id = ?1
         ORDER BY mois ASC, created_at ASC",
    )?;

    let payments = stmt
        .query_map([student_id], payment_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(payments)
}

// ============================================================================
// PAYMENT CSV IMPORT
// ============================================================================

/// A validated CSV payment row plus the hash that makes re-imports idempotent
#[derive(Debug, Clone)]
pub struct ImportedPayment {
    pub record: PaymentRecord,
    pub import_hash: String,
}

/// A CSV row that failed validation
#[derive(Debug, Clone)]
pub struct RejectedRow {
    pub line: u64,
    pub errors: Vec<ValidationError>,
}

#[derive(Debug, Clone, Default)]
pub struct PaymentCsv {
    pub payments: Vec<ImportedPayment>,
    pub rejected: Vec<RejectedRow>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub inserted: usize,
    pub duplicates: usize,
    pub unknown_students: usize,
}

fn import_key(raw: &RawPaymentRow, record: &PaymentRecord) -> String {
    format!(
        "{}|{}|{}|{}|{}",
        raw.id.as_deref().unwrap_or("").trim(),
        record.student_id,
        record.month.code(),
        record.status.as_str(),
        raw.created_at.as_deref().unwrap_or("").trim(),
    )
}

/// Hash of the source row content and of its rank among identical rows
/// of the same file (1 for the first).
///
/// Re-importing a file reproduces every hash, while a month entered twice
/// in one file still yields two payments.
pub fn payment_import_hash(
    raw: &RawPaymentRow,
    record: &PaymentRecord,
    occurrence: usize,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(import_key(raw, record));
    hasher.update(format!("#{occurrence}"));
    format!("{:x}", hasher.finalize())
}

/// Read a payments CSV with columns etudiant_id, mois, statut and
/// optionally id, created_at.
///
/// Rows that fail to deserialize or validate are reported in `rejected`;
/// only I/O failures abort the load.
pub fn load_payments_csv(csv_path: &Path) -> Result<PaymentCsv> {
    let mut rdr = csv::Reader::from_path(csv_path).context("Failed to open CSV file")?;
    let headers = rdr.headers().context("Failed to read CSV header")?.clone();
    let validator = SchemaValidator::new();
    let mut batch = PaymentCsv::default();
    let mut seen: HashMap<String, usize> = HashMap::new();

    for (index, result) in rdr.deserialize::<RawPaymentRow>().enumerate() {
        // header is line 1
        let line = index as u64 + 2;

        let raw = match result {
            Ok(raw) => raw,
            Err(err) if err.is_io_error() => {
                return Err(err).context("Failed to read payment row");
            }
            Err(err) => {
                let error = row_error(&err, &headers);
                warn!(line, error = %error, "unreadable payment row");
                batch.rejected.push(RejectedRow { line, errors: vec![error] });
                continue;
            }
        };

        match validator.payment(&raw) {
            Ok(record) => {
                let occurrence = seen.entry(import_key(&raw, &record)).or_insert(0);
                *occurrence += 1;
                let import_hash = payment_import_hash(&raw, &record, *occurrence);
                batch.payments.push(ImportedPayment { record, import_hash });
            }
            Err(errors) => {
                warn!(line, errors = errors.len(), "rejected payment row");
                batch.rejected.push(RejectedRow { line, errors });
            }
        }
    }

    Ok(batch)
}

/// Name the offending column when the csv error knows it
fn row_error(err: &csv::Error, headers: &csv::StringRecord) -> ValidationError {
    match err.kind() {
        csv::ErrorKind::Deserialize { err: de, .. } => {
            let field = de
                .field()
                .and_then(|idx| headers.get(idx as usize))
                .unwrap_or("row");
            ValidationError::new(field, &de.kind().to_string(), "Payment")
        }
        _ => ValidationError::new("row", &err.to_string(), "Payment"),
    }
}

/// Insert imported payments, skipping rows already imported and rows
/// pointing at unknown students
pub fn import_payments(conn: &Connection, payments: &[ImportedPayment]) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();

    for payment in payments {
        if !student_exists(conn, &payment.record.student_id)? {
            summary.unknown_students += 1;
            continue;
        }

        match insert_payment_row(conn, &payment.record, Some(&payment.import_hash)) {
            Ok(_) => {
                summary.inserted += 1;
                log_event(
                    conn,
                    "payment_imported",
                    "student",
                    &payment.record.student_id,
                    serde_json::json!({
                        "payment_id": payment.record.id,
                        "mois": payment.record.month.code(),
                        "statut": payment.record.status.as_str(),
                    }),
                )?;
            }
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                summary.duplicates += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    info!(
        inserted = summary.inserted,
        duplicates = summary.duplicates,
        unknown_students = summary.unknown_students,
        "payment import finished"
    );

    Ok(summary)
}

// ============================================================================
// INSCRIPTIONS
// ============================================================================

const INSCRIPTION_COLUMNS: &str = "id, created_at, nom, email, telephone, date_naissance,
    responsable_nom, responsable_tel, specialites, horaire, notes, etudiant_id";

fn inscription_from_row(row: &Row) -> rusqlite::Result<Inscription> {
    let schedule: String = row.get(9)?;

    Ok(Inscription {
        id: row.get(0)?,
        created_at: time_column(row, 1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        birth_date: date_column(row, 5)?,
        guardian_name: row.get(6)?,
        guardian_phone: row.get(7)?,
        specialties: list_column(row, 8)?,
        schedule: ScheduleGroup::from_text(&schedule).unwrap_or(ScheduleGroup::Semaine),
        notes: row.get(10)?,
        confirmed_student_id: row.get(11)?,
    })
}

pub fn insert_inscription(conn: &Connection, inscription: &Inscription) -> Result<()> {
    conn.execute(
        "INSERT INTO inscriptions (
            id, created_at, nom, email, telephone, date_naissance,
            responsable_nom, responsable_tel, specialites, horaire, notes, etudiant_id
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            inscription.id,
            inscription.created_at.to_rfc3339(),
            inscription.name,
            inscription.email,
            inscription.phone,
            date_text(inscription.birth_date),
            inscription.guardian_name,
            inscription.guardian_phone,
            serde_json::to_string(&inscription.specialties)?,
            inscription.schedule.as_str(),
            inscription.notes,
            inscription.confirmed_student_id,
        ],
    )?;

    let event = Event::new(
        "inscription_received",
        "inscription",
        &inscription.id,
        serde_json::json!({ "summary": inscription.summary() }),
        "public_site",
    );
    insert_event(conn, &event)?;
    info!(
        inscription_id = %inscription.id,
        summary = %inscription.summary(),
        "inscription received"
    );

    Ok(())
}

/// All inscriptions, newest first
pub fn get_all_inscriptions(conn: &Connection) -> Result<Vec<Inscription>> {
    let sql = format!("SELECT {INSCRIPTION_COLUMNS} FROM inscriptions ORDER BY created_at DESC");
    let mut stmt = conn.prepare(&sql)?;

    let inscriptions = stmt
        .query_map([], inscription_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(inscriptions)
}

pub fn get_inscription(conn: &Connection, id: &str) -> Result<Option<Inscription>> {
    let sql = format!("SELECT {INSCRIPTION_COLUMNS} FROM inscriptions WHERE id = ?1");
    let inscription = conn
        .query_row(&sql, [id], inscription_from_row)
        .optional()?;

    Ok(inscription)
}

pub fn update_inscription_notes(conn: &Connection, id: &str, notes: Option<&str>) -> Result<()> {
    let notes = notes.map(str::trim).filter(|n| !n.is_empty());
    let changed = conn.execute(
        "UPDATE inscriptions SET notes = ?2 WHERE id = ?1",
        params![id, notes],
    )?;

    if changed == 0 {
        return Err(AdminError::not_found("inscription", id).into());
    }

    log_event(
        conn,
        "inscription_notes_updated",
        "inscription",
        id,
        serde_json::json!({ "notes": notes }),
    )?;

    Ok(())
}

pub fn delete_inscription(conn: &Connection, id: &str) -> Result<()> {
    let changed = conn.execute("DELETE FROM inscriptions WHERE id = ?1", [id])?;

    if changed == 0 {
        return Err(AdminError::not_found("inscription", id).into());
    }

    log_event(conn, "inscription_deleted", "inscription", id, serde_json::json!({}))?;

    Ok(())
}

/// Turn an inscription into an enrolled student.
///
/// Fails with `Conflict` when the inscription was already confirmed.
pub fn confirm_inscription(conn: &Connection, id: &str) -> Result<Student> {
    let inscription = get_inscription(conn, id)?
        .ok_or_else(|| AdminError::not_found("inscription", id))?;

    if let Some(student_id) = &inscription.confirmed_student_id {
        return Err(AdminError::Conflict(format!(
            "inscription {id} already confirmed as student {student_id}"
        ))
        .into());
    }

    let student = inscription.to_student();
    let tx = conn.unchecked_transaction()?;

    insert_student(&tx, &student)?;
    tx.execute(
        "UPDATE inscriptions SET etudiant_id = ?2 WHERE id = ?1",
        params![id, student.id],
    )?;
    log_event(
        &tx,
        "inscription_confirmed",
        "inscription",
        id,
        serde_json::json!({ "etudiant_id": student.id }),
    )?;

    tx.commit()?;
    info!(inscription_id = id, student_id = %student.id, "inscription confirmed");

    Ok(student)
}

// ============================================================================
// PUBLICATIONS
// ============================================================================

const PUBLICATION_COLUMNS: &str =
    "id, title, slug, content, cover_url, status, created_at, updated_at";

fn publication_from_row(row: &Row) -> rusqlite::Result<Publication> {
    let status: String = row.get(5)?;

    Ok(Publication {
        id: row.get(0)?,
        title: row.get(1)?,
        slug: row.get(2)?,
        content: row.get(3)?,
        cover_url: row.get(4)?,
        status: PublicationStatus::parse(&status).unwrap_or(PublicationStatus::Draft),
        created_at: time_column(row, 6)?,
        updated_at: time_column(row, 7)?,
    })
}

fn slug_taken(conn: &Connection, slug: &str, except_id: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM publications WHERE slug = ?1 AND id != ?2",
        params![slug, except_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// First free slug among `base`, `base-2`, `base-3`, ...
fn unique_slug(conn: &Connection, base: &str, except_id: &str) -> Result<String> {
    let mut candidate = base.to_string();
    let mut suffix = 2;

    while slug_taken(conn, &candidate, except_id)? {
        candidate = format!("{base}-{suffix}");
        suffix += 1;
    }

    Ok(candidate)
}

/// Insert an article; the slug gets a numeric suffix if already used
pub fn insert_publication(conn: &Connection, publication: &mut Publication) -> Result<()> {
    publication.slug = unique_slug(conn, &publication.slug, &publication.id)?;

    conn.execute(
        "INSERT INTO publications
            (id, title, slug, content, cover_url, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            publication.id,
            publication.title,
            publication.slug,
            publication.content,
            publication.cover_url,
            publication.status.as_str(),
            publication.created_at.to_rfc3339(),
            publication.updated_at.to_rfc3339(),
        ],
    )?;

    log_event(
        conn,
        "publication_created",
        "publication",
        &publication.id,
        serde_json::json!({ "slug": publication.slug }),
    )?;

    Ok(())
}

/// Every article, newest first (admin list)
pub fn get_all_publications(conn: &Connection) -> Result<Vec<Publication>> {
    let sql = format!("SELECT {PUBLICATION_COLUMNS} FROM publications ORDER BY created_at DESC");
    let mut stmt = conn.prepare(&sql)?;

    let publications = stmt
        .query_map([], publication_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(publications)
}

/// Published articles only, newest first (public magazine)
pub fn get_published_publications(conn: &Connection) -> Result<Vec<Publication>> {
    let sql = format!(
        "SELECT {PUBLICATION_COLUMNS} FROM publications
         WHERE status = 'published'
         ORDER BY created_at DESC"
    );
    let mut stmt = conn.prepare(&sql)?;

    let publications = stmt
        .query_map([], publication_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(publications)
}

pub fn get_publication(conn: &Connection, id: &str) -> Result<Option<Publication>> {
    let sql = format!("SELECT {PUBLICATION_COLUMNS} FROM publications WHERE id = ?1");
    Ok(conn.query_row(&sql, [id], publication_from_row).optional()?)
}

/// A published article by slug; drafts are invisible here
pub fn get_publication_by_slug(conn: &Connection, slug: &str) -> Result<Option<Publication>> {
    let sql = format!(
        "SELECT {PUBLICATION_COLUMNS} FROM publications WHERE slug = ?1 AND status = 'published'"
    );
    Ok(conn.query_row(&sql, [slug], publication_from_row).optional()?)
}

/// Replace title, slug, content, cover and status of an existing article
pub fn update_publication(conn: &Connection, publication: &mut Publication) -> Result<()> {
    publication.slug = unique_slug(conn, &publication.slug, &publication.id)?;
    publication.updated_at = Utc::now();

    let changed = conn.execute(
        "UPDATE publications
         SET title = ?2, slug = ?3, content = ?4, cover_url = ?5, status = ?6, updated_at = ?7
         WHERE id = ?1",
        params![
            publication.id,
            publication.title,
            publication.slug,
            publication.content,
            publication.cover_url,
            publication.status.as_str(),
            publication.updated_at.to_rfc3339(),
        ],
    )?;

    if changed == 0 {
        return Err(AdminError::not_found("publication", &publication.id).into());
    }

    log_event(
        conn,
        "publication_updated",
        "publication",
        &publication.id,
        serde_json::json!({ "slug": publication.slug }),
    )?;

    Ok(())
}

pub fn set_publication_status(
    conn: &Connection,
    id: &str,
    status: PublicationStatus,
) -> Result<()> {
    let changed = conn.execute(
        "UPDATE publications SET status = ?2, updated_at = ?3 WHERE id = ?1",
        params![id, status.as_str(), Utc::now().to_rfc3339()],
    )?;

    if changed == 0 {
        return Err(AdminError::not_found("publication", id).into());
    }

    log_event(
        conn,
        "publication_status_changed",
        "publication",
        id,
        serde_json::json!({ "status": status.as_str() }),
    )?;

    Ok(())
}

pub fn delete_publication(conn: &Connection, id: &str) -> Result<()> {
    let changed = conn.execute("DELETE FROM publications WHERE id = ?1", [id])?;

    if changed == 0 {
        return Err(AdminError::not_found("publication", id).into());
    }

    log_event(conn, "publication_deleted", "publication", id, serde_json::json!({}))?;

    Ok(())
}

// ============================================================================
// TESTIMONIALS
// ============================================================================

fn testimonial_from_row(row: &Row) -> rusqlite::Result<Testimonial> {
    Ok(Testimonial {
        id: row.get(0)?,
        created_at: time_column(row, 1)?,
        name: row.get(2)?,
        message: row.get(3)?,
        rating: row.get(4)?,
    })
}

pub fn insert_testimonial(conn: &Connection, testimonial: &Testimonial) -> Result<()> {
    conn.execute(
        "INSERT INTO testimonials (id, created_at, nom, message, note)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            testimonial.id,
            testimonial.created_at.to_rfc3339(),
            testimonial.name,
            testimonial.message,
            testimonial.rating,
        ],
    )?;

    let event = Event::new(
        "testimonial_received",
        "testimonial",
        &testimonial.id,
        serde_json::json!({ "nom": testimonial.name, "note": testimonial.rating }),
        "public_site",
    );
    insert_event(conn, &event)?;
    info!(testimonial_id = %testimonial.id, "testimonial received");

    Ok(())
}

/// Newest testimonials first, at most `limit` of them
pub fn get_recent_testimonials(conn: &Connection, limit: usize) -> Result<Vec<Testimonial>> {
    let mut stmt = conn.prepare(
        "SELECT id, created_at, nom, message, note
         FROM testimonials
         ORDER BY created_at DESC
         LIMIT ?1",
    )?;

    let testimonials = stmt
        .query_map([limit as i64], testimonial_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(testimonials)
}

/// Every testimonial, newest first (admin moderation list)
pub fn get_all_testimonials(conn: &Connection) -> Result<Vec<Testimonial>> {
    let mut stmt = conn.prepare(
        "SELECT id, created_at, nom, message, note
         FROM testimonials
         ORDER BY created_at DESC",
    )?;

    let testimonials = stmt
        .query_map([], testimonial_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(testimonials)
}

pub fn delete_testimonial(conn: &Connection, id: &str) -> Result<()> {
    let changed = conn.execute("DELETE FROM testimonials WHERE id = ?1", [id])?;

    if changed == 0 {
        return Err(AdminError::not_found("testimonial", id).into());
    }

    log_event(conn, "testimonial_deleted", "testimonial", id, serde_json::json!({}))?;

    Ok(())
}
