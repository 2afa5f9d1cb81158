// 📊 Category View - payment summary table for one program category
//
// Rows are recomputed from scratch for every configuration; there is no
// cached state between calls.

use crate::entities::{PaymentRecord, Student};
use crate::months::{expand_month_range, normalized_bounds, MonthCode};
use crate::program::{program_matches, Program};
use crate::reconciliation::{paid_month_set, reconcile, records_in_bounds, RangeStatus};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::io::Write;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Global paid / unpaid selector shared by every category table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StatusFilter {
    #[default]
    #[serde(rename = "all")]
    All,

    #[serde(rename = "paye")]
    Paid,

    #[serde(rename = "non_paye")]
    Unpaid,
}

impl StatusFilter {
    pub fn parse(key: &str) -> Option<StatusFilter> {
        match key.trim() {
            "" | "all" => Some(StatusFilter::All),
            "paye" => Some(StatusFilter::Paid),
            "non_paye" => Some(StatusFilter::Unpaid),
            _ => None,
        }
    }

    /// Rows without data (empty range) only show under `All`.
    pub fn accepts(&self, status: RangeStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Paid => status == RangeStatus::Paid,
            StatusFilter::Unpaid => status == RangeStatus::Unpaid,
        }
    }
}

/// Everything that shapes one category table.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewConfig {
    pub program: Program,
    pub start_month: String,
    pub end_month: String,
    pub status_filter: StatusFilter,
    /// Deep link from another page: show only this student
    pub focused_student: Option<String>,
}

impl ViewConfig {
    /// Whole year, no filter
    pub fn new(program: Program) -> Self {
        ViewConfig {
            program,
            start_month: MonthCode::JANUARY.code(),
            end_month: MonthCode::DECEMBER.code(),
            status_filter: StatusFilter::All,
            focused_student: None,
        }
    }

    pub fn with_range(self, start: &str, end: &str) -> Self {
        ViewConfig {
            start_month: start.to_string(),
            end_month: end.to_string(),
            ..self
        }
    }

    pub fn with_status(self, status_filter: StatusFilter) -> Self {
        ViewConfig { status_filter, ..self }
    }

    pub fn focused_on(self, student_id: Option<String>) -> Self {
        ViewConfig {
            focused_student: student_id.filter(|id| !id.trim().is_empty()),
            ..self
        }
    }

    /// `paiements_<program>_<start>-<end>.csv` with normalized two-digit
    /// codes, or `paiements_<program>.csv` when the range is invalid.
    ///
    /// Only built from month codes and the program key, so it is always
    /// safe inside a `Content-Disposition` header.
    pub fn export_file_name(&self) -> String {
        match normalized_bounds(&self.start_month, &self.end_month) {
            Some((from, to)) => format!(
                "paiements_{}_{}-{}.csv",
                self.program.key(),
                from.code(),
                to.code()
            ),
            None => format!("paiements_{}.csv", self.program.key()),
        }
    }
}

// ============================================================================
// ROWS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRow {
    pub student_id: String,
    /// Stored name, empty when missing
    pub name: String,
    /// Name as shown on screen, "(Sans nom)" when missing
    pub display_name: String,
    pub group: String,
    /// Paid months within range, e.g. "Jan - Fév - Mar", or "-"
    pub paid_months: String,
    pub status: RangeStatus,
    pub status_label: String,
}

/// Build the rows of one category table.
///
/// Output follows the order of `students` (sorted by name at load time).
pub fn compose_category_view(
    students: &[Student],
    payments: &[PaymentRecord],
    config: &ViewConfig,
) -> Vec<CategoryRow> {
    let range = expand_month_range(&config.start_month, &config.end_month);
    let bounds = normalized_bounds(&config.start_month, &config.end_month);

    students
        .iter()
        .filter(|s| program_matches(s.program.as_deref(), config.program))
        .map(|student| {
            let in_range: Vec<&PaymentRecord> =
                records_in_bounds(payments, &student.id, bounds).collect();
            let status = reconcile(in_range.iter().copied(), &range);
            let paid = paid_month_set(in_range.iter().copied());

            CategoryRow {
                student_id: student.id.clone(),
                name: student.name.clone().unwrap_or_default(),
                display_name: student.display_name().to_string(),
                group: student.group_label().to_string(),
                paid_months: paid_months_label(paid.iter()),
                status,
                status_label: status.label().to_string(),
            }
        })
        .filter(|row| match &config.focused_student {
            Some(id) => &row.student_id == id,
            None => true,
        })
        .filter(|row| config.status_filter.accepts(row.status))
        .collect()
}

fn paid_months_label<'a>(months: impl Iterator<Item = &'a MonthCode>) -> String {
    let labels: Vec<&str> = months.map(|m| m.short_label()).collect();
    if labels.is_empty() {
        "-".to_string()
    } else {
        labels.join(" - ")
    }
}

// ============================================================================
// CSV EXPORT
// ============================================================================

/// Write one category table as CSV: Nom, Groupe, Mois payés, Status.
///
/// Commas inside values are replaced with spaces so spreadsheet imports
/// that split on commas still line up.
pub fn write_category_csv<W: Write>(rows: &[CategoryRow], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["Nom", "Groupe", "Mois payés", "Status"])?;

    for row in rows {
        wtr.write_record([
            strip_commas(&row.name),
            strip_commas(&row.group),
            strip_commas(&row.paid_months),
            strip_commas(&row.status_label),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

fn strip_commas(value: &str) -> String {
    value.replace(',', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::PaymentStatus;
    use crate::program::ScheduleGroup;

    fn student(id: &str, name: &str, program: Option<&str>) -> Student {
        let mut s = Student::new(name);
        s.id = id.to_string();
        s.program = program.map(str::to_string);
        s.group = Some(ScheduleGroup::Semaine);
        s
    }

    fn pay(student: &str, month: u8, status: PaymentStatus) -> PaymentRecord {
        PaymentRecord::new(student, MonthCode::new(month).unwrap(), status)
    }

    fn fixture() -> (Vec<Student>, Vec<PaymentRecord>) {
        let students = vec![
            student("a", "Anne", Some("Maquillage")),
            student("b", "Berthe", Some("maquillage avancé")),
            student("c", "Carla", Some("Cosmétologie Avancée")),
            student("d", "Dora", None),
        ];
        let payments = vec![
            pay("a", 1, PaymentStatus::Paid),
            pay("a", 2, PaymentStatus::Paid),
            pay("a", 3, PaymentStatus::Paid),
            pay("b", 1, PaymentStatus::Paid),
            pay("b", 2, PaymentStatus::Unpaid),
            pay("c", 1, PaymentStatus::Paid),
        ];
        (students, payments)
    }

    #[test]
    fn test_rows_follow_input_order_and_category() {
        let (students, payments) = fixture();
        let config = ViewConfig::new(Program::Maquillage).with_range("01", "03");
        let rows = compose_category_view(&students, &payments, &config);

        let ids: Vec<&str> = rows.iter().map(|r| r.student_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(rows[0].status, RangeStatus::Paid);
        assert_eq!(rows[0].paid_months, "Jan - Fév - Mar");
        assert_eq!(rows[1].status, RangeStatus::Unpaid);
        assert_eq!(rows[1].paid_months, "Jan");
    }

    #[test]
    fn test_range_extension_flips_status() {
        let (students, payments) = fixture();
        let base = ViewConfig::new(Program::Maquillage).focused_on(Some("a".to_string()));

        let rows =
            compose_category_view(&students, &payments, &base.clone().with_range("01", "03"));
        assert_eq!(rows[0].status_label, "Payé");

        let rows = compose_category_view(&students, &payments, &base.with_range("01", "04"));
        assert_eq!(rows[0].status_label, "Non payé");
    }

    #[test]
    fn test_reversed_range_matches_ascending() {
        let (students, payments) = fixture();
        let forward = ViewConfig::new(Program::Maquillage).with_range("01", "03");
        let reversed = ViewConfig::new(Program::Maquillage).with_range("03", "01");

        assert_eq!(
            compose_category_view(&students, &payments, &forward),
            compose_category_view(&students, &payments, &reversed)
        );
    }

    #[test]
    fn test_cosmetologie_category_membership() {
        let (students, payments) = fixture();
        for (program, expected) in [
            (Program::Cosmetologie, true),
            (Program::Maquillage, false),
            (Program::Decoration, false),
        ] {
            let rows = compose_category_view(&students, &payments, &ViewConfig::new(program));
            assert_eq!(rows.iter().any(|r| r.student_id == "c"), expected, "{program:?}");
        }
    }

    #[test]
    fn test_missing_program_is_in_no_category() {
        let (students, payments) = fixture();
        for program in Program::ALL {
            let rows = compose_category_view(&students, &payments, &ViewConfig::new(program));
            assert!(rows.iter().all(|r| r.student_id != "d"));
        }
    }

    #[test]
    fn test_status_filter() {
        let (students, payments) = fixture();
        let paid_only = ViewConfig::new(Program::Maquillage)
            .with_range("01", "03")
            .with_status(StatusFilter::Paid);
        let rows = compose_category_view(&students, &payments, &paid_only);
        assert_eq!(rows.len(), 1);
        assert!(rows.iter().all(|r| r.status_label == "Payé"));

        let unpaid_only = paid_only.with_status(StatusFilter::Unpaid);
        let rows = compose_category_view(&students, &payments, &unpaid_only);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].student_id, "b");
    }

    #[test]
    fn test_empty_range_rows_hidden_by_paid_and_unpaid_filters() {
        let (students, payments) = fixture();
        let invalid = ViewConfig::new(Program::Maquillage).with_range("xx", "03");

        let all = compose_category_view(&students, &payments, &invalid);
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|r| r.status == RangeStatus::NoData && r.paid_months == "-"));

        for filter in [StatusFilter::Paid, StatusFilter::Unpaid] {
            let config = invalid.clone().with_status(filter);
            let rows = compose_category_view(&students, &payments, &config);
            assert!(rows.is_empty(), "{filter:?} must hide rows without data");
        }
    }

    #[test]
    fn test_focus_on_unknown_student_is_empty_not_error() {
        let (students, payments) = fixture();
        let config = ViewConfig::new(Program::Decoration).focused_on(Some("zzz".to_string()));
        assert!(compose_category_view(&students, &payments, &config).is_empty());

        // Blank focus is ignored
        let config = ViewConfig::new(Program::Maquillage).focused_on(Some("  ".to_string()));
        assert_eq!(compose_category_view(&students, &payments, &config).len(), 2);
    }

    #[test]
    fn test_csv_export() {
        let (mut students, payments) = fixture();
        students[0].name = Some("Anne, Marie".to_string());
        let config = ViewConfig::new(Program::Maquillage).with_range("01", "02");
        let rows = compose_category_view(&students, &payments, &config);

        let mut out = Vec::new();
        write_category_csv(&rows, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Nom,Groupe,Mois payés,Status");
        assert_eq!(lines[1], "Anne  Marie,Semaine,Jan - Fév,Payé");
        assert_eq!(lines[2], "Berthe,Semaine,Jan,Non payé");
        assert_eq!(config.export_file_name(), "paiements_maquillage_01-02.csv");
    }

    #[test]
    fn test_export_file_name_uses_normalized_codes() {
        let config = ViewConfig::new(Program::Decoration).with_range("3", "03");
        assert_eq!(config.export_file_name(), "paiements_decoration_03-03.csv");

        let reversed = ViewConfig::new(Program::Decoration).with_range("11", "2");
        assert_eq!(reversed.export_file_name(), "paiements_decoration_02-11.csv");

        for bad in ["a\"b", "01\r\nX-Injected: 1", ""] {
            let config = ViewConfig::new(Program::Decoration).with_range(bad, "03");
            assert_eq!(config.export_file_name(), "paiements_decoration.csv");
        }
    }

    #[test]
    fn test_nameless_student_exports_blank_name() {
        let (mut students, payments) = fixture();
        students[0].name = None;
        let config = ViewConfig::new(Program::Maquillage).with_range("01", "01");
        let rows = compose_category_view(&students, &payments, &config);

        let nameless = rows.iter().find(|r| r.student_id == "a").unwrap();
        assert_eq!(nameless.name, "");
        assert_eq!(nameless.display_name, "(Sans nom)");

        let mut out = Vec::new();
        write_category_csv(&rows, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.lines().any(|l| l == ",Semaine,Jan,Payé"));
        assert!(!text.contains("Sans nom"));
    }

    #[test]
    fn test_status_filter_parse() {
        assert_eq!(StatusFilter::parse("paye"), Some(StatusFilter::Paid));
        assert_eq!(StatusFilter::parse("non_paye"), Some(StatusFilter::Unpaid));
        assert_eq!(StatusFilter::parse(""), Some(StatusFilter::All));
        assert_eq!(StatusFilter::parse("maybe"), None);
    }
}
