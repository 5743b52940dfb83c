pub mod course_modes;
