// ⚖️ Payment Reconciliation - one status per student per month range
//
// A student is "Payé" for a range only if EVERY month of the range has at
// least one paid record. A single missing month makes the whole range
// "Non payé". An empty range has no status at all.

use crate::entities::PaymentRecord;
use crate::months::MonthCode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ============================================================================
// RANGE STATUS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeStatus {
    /// Every month of the range is paid
    Paid,

    /// At least one month of the range has no paid record
    Unpaid,

    /// The range is empty (invalid month input); nothing to assert
    NoData,
}

impl RangeStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RangeStatus::Paid => "Payé",
            RangeStatus::Unpaid => "Non payé",
            RangeStatus::NoData => "-",
        }
    }

    pub fn is_paid(&self) -> bool {
        matches!(self, RangeStatus::Paid)
    }
}

impl fmt::Display for RangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// RECONCILER
// ============================================================================

/// Distinct months carrying at least one paid record.
///
/// Conflicting duplicates for the same month resolve to paid.
pub fn paid_month_set<'a, I>(records: I) -> BTreeSet<MonthCode>
where
    I: IntoIterator<Item = &'a PaymentRecord>,
{
    records
        .into_iter()
        .filter(|r| r.is_paid())
        .map(|r| r.month)
        .collect()
}

/// Reconcile one student's records against a month range.
///
/// `records` must already be limited to the student; `range` comes from
/// `expand_month_range`.
pub fn reconcile<'a, I>(records: I, range: &[MonthCode]) -> RangeStatus
where
    I: IntoIterator<Item = &'a PaymentRecord>,
{
    if range.is_empty() {
        return RangeStatus::NoData;
    }

    let paid = paid_month_set(records);

    for month in range {
        if !paid.contains(month) {
            return RangeStatus::Unpaid;
        }
    }

    RangeStatus::Paid
}

/// A student's records whose month lies within `bounds` (inclusive).
///
/// Comparison is numeric on the month number.
pub fn records_in_bounds<'a>(
    records: &'a [PaymentRecord],
    student_id: &'a str,
    bounds: Option<(MonthCode, MonthCode)>,
) -> impl Iterator<Item = &'a PaymentRecord> + 'a {
    records.iter().filter(move |r| {
        r.student_id == student_id
            && match bounds {
                Some((from, to)) => {
                    r.month.number() >= from.number() && r.month.number() <= to.number()
                }
                None => false,
            }
    })
}

// ============================================================================
// TESTS
// ============================================================================
