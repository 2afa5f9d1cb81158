// Entity Models
//
// Each entity has a stable UUID identity; field names on the wire follow
// the school's table columns.

pub mod inscription;
pub mod payment;
pub mod publication;
pub mod student;
pub mod testimonial;

pub use inscription::{normalize_specialties, parse_birth_date, Inscription};
pub use payment::{PaymentRecord, PaymentStatus};
pub use publication::{slugify, Publication, PublicationStatus};
pub use student::{Student, StudentFilter, StudentStatus, StudentUpdate};
pub use testimonial::{Testimonial, PUBLIC_TESTIMONIAL_LIMIT};
