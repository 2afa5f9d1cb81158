// Kisa Admin - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod logging;
pub mod months;
pub mod program;
pub mod reconciliation;
pub mod schema;
pub mod stats;
pub mod view;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use config::AdminConfig;
pub use db::{
    confirm_inscription, delete_inscription, delete_publication, delete_student,
    delete_testimonial, get_all_inscriptions, get_all_payments, get_all_publications,
    get_all_students, get_all_testimonials, get_events_for_entity, get_inscription,
    get_payments_for_student, get_publication, get_publication_by_slug,
    get_published_publications, get_recent_testimonials, get_student, import_payments,
    insert_event, insert_inscription, insert_payment, insert_publication, insert_student,
    insert_testimonial, load_payments_csv, open_database, payment_import_hash,
    set_publication_status, set_student_status, setup_database, update_inscription_notes,
    update_publication, update_student, Event, ImportSummary, ImportedPayment, PaymentCsv,
    RejectedRow,
};
pub use entities::{
    Inscription, PaymentRecord, PaymentStatus, Publication, PublicationStatus, Student,
    StudentFilter, StudentStatus, StudentUpdate, Testimonial,
};
pub use error::AdminError;
pub use logging::init_tracing;
pub use months::{expand_month_range, normalized_bounds, MonthCode};
pub use program::{classify, program_matches, Program, ScheduleGroup};
pub use reconciliation::{paid_month_set, reconcile, records_in_bounds, RangeStatus};
pub use schema::{SchemaValidator, ValidationError, ValidationResult};
pub use stats::{AdminStats, GroupCounts};
pub use view::{
    compose_category_view, write_category_csv, CategoryRow, StatusFilter, ViewConfig,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
