pub mod enrollment_service;

pub use enrollment_service::{EnrollmentError, ProgramEnrollmentService};
