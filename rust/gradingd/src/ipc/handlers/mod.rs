pub mod core;
pub mod grading;
