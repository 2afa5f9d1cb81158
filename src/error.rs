use crate::schema::ValidationError;
use thiserror::Error;

/// Domain failures the HTTP and CLI layers need to tell apart.
///
/// Library functions return `anyhow::Result`; these travel inside the
/// `anyhow::Error` and are recovered with `downcast_ref`.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("conflict: {0}")]
    Conflict(String),
}

impl AdminError {
    pub fn not_found(entity: &'static str, id: &str) -> Self {
        AdminError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_lists_every_field() {
        let err = AdminError::Validation(vec![
            ValidationError::new("mois", "not a month code", "Payment"),
            ValidationError::new("statut", "unknown status", "Payment"),
        ]);

        let message = err.to_string();
        assert!(message.contains("[Payment] mois: not a month code"));
        assert!(message.contains("[Payment] statut: unknown status"));
    }

    #[test]
    fn test_not_found_message() {
        let err = AdminError::not_found("student", "abc");
        assert_eq!(err.to_string(), "student not found: abc");
    }
}
