pub mod analytics;
pub mod announcement;
pub mod event;
pub mod health;
pub mod student;
