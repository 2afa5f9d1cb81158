// 💳 Payment Record - one month's payment entry for one student
//
// Records are insert-only. A correction is a new record; the reconciler
// decides by set membership, so any paid record for a month counts.

use crate::months::MonthCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[serde(rename = "paye")]
    Paid,

    #[serde(rename = "non_paye")]
    Unpaid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "paye",
            PaymentStatus::Unpaid => "non_paye",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "Payé",
            PaymentStatus::Unpaid => "Non payé",
        }
    }

    /// Parse a stored status tag. Only "paye" and "non_paye" are valid.
    pub fn parse(tag: &str) -> Option<PaymentStatus> {
        match tag.trim() {
            "paye" => Some(PaymentStatus::Paid),
            "non_paye" => Some(PaymentStatus::Unpaid),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: String,

    #[serde(rename = "etudiant_id")]
    pub student_id: String,

    #[serde(rename = "mois")]
    pub month: MonthCode,

    #[serde(rename = "statut")]
    pub status: PaymentStatus,

    pub created_at: DateTime<Utc>,
}

impl PaymentRecord {
    pub fn new(student_id: &str, month: MonthCode, status: PaymentStatus) -> Self {
        PaymentRecord {
            id: uuid::Uuid::new_v4().to_string(),
            student_id: student_id.to_string(),
            month,
            status,
            created_at: Utc::now(),
        }
    }

    pub fn is_paid(&self) -> bool {
        self.status == PaymentStatus::Paid
    }
}
