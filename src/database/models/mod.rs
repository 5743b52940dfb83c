pub mod course_mode;
pub mod program_enrollment;

pub use course_mode::{CourseMode, CourseModeError};
pub use program_enrollment::{
    ProgramEnrollment, ProgramEnrollmentStatus, WaitingEnrollmentStatus, WaitingProgramEnrollment,
};
