pub mod sqlite_event_repo;
pub mod sqlite_student_repo;
pub mod sqlite_announcement_repo;

pub mod postgres_event_repo;
pub mod postgres_student_repo;
pub mod postgres_announcement_repo;
