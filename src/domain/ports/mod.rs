use crate::domain::models::{
    analytics::RegistrationRecord,
    event::{AppendOutcome, Event, EventSort, Participant},
    student::Student,
    announcement::Announcement,
};
use crate::error::AppError;
use async_trait::async_trait;

#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn create(&self, event: &Event) -> Result<Event, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Event>, AppError>;
    async fn list(&self, sort: EventSort) -> Result<Vec<Event>, AppError>;
    async fn list_by_participant(&self, student_id: &str, email: &str) -> Result<Vec<Event>, AppError>;
    /// Writes the scalar fields. Returns `None` when the event is gone or when
    /// `max_participants` would drop below the stored participant count.
    async fn update(&self, event: &Event) -> Result<Option<Event>, AppError>;
    async fn set_cancelled(&self, id: &str, cancelled: bool) -> Result<Option<Event>, AppError>;
    async fn delete(&self, id: &str) -> Result<bool, AppError>;
    /// Appends `participant` only if the event exists, is not cancelled, has room and
    /// does not already list the same `student_id`, as one atomic operation.
    async fn append_participant(&self, event_id: &str, participant: &Participant) -> Result<AppendOutcome, AppError>;
    async fn remove_participant(&self, event_id: &str, student_id: &str) -> Result<bool, AppError>;
    async fn clear_participants(&self, event_id: &str) -> Result<u64, AppError>;
    /// Newest registrations across all events, by `registered_at`.
    async fn recent_registrations(&self, limit: i64) -> Result<Vec<RegistrationRecord>, AppError>;
}

#[async_trait]
pub trait StudentRepository: Send + Sync {
    async fn create(&self, student: &Student) -> Result<Student, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Student>, AppError>;
    async fn list(&self) -> Result<Vec<Student>, AppError>;
    async fn count(&self) -> Result<i64, AppError>;
    async fn update(&self, student: &Student) -> Result<Student, AppError>;
    async fn delete(&self, id: &str) -> Result<bool, AppError>;
}

#[async_trait]
pub trait AnnouncementRepository: Send + Sync {
    async fn create(&self, announcement: &Announcement) -> Result<Announcement, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Announcement>, AppError>;
    async fn list_active(&self) -> Result<Vec<Announcement>, AppError>;
    async fn count(&self) -> Result<i64, AppError>;
    async fn update(&self, announcement: &Announcement) -> Result<Announcement, AppError>;
    async fn delete(&self, id: &str) -> Result<bool, AppError>;
}

#[async_trait]
pub trait EmailService: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, html_body: &str) -> Result<(), AppError>;
}
