pub mod analytics;
pub mod announcement;
pub mod auth;
pub mod event;
pub mod student;
