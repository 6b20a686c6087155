use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use crate::domain::models::analytics::RegistrationRecord;
use crate::domain::models::announcement::Announcement;
use crate::domain::models::event::{Event, EventStatus, Participant};
use crate::domain::models::student::Student;

/// An event as clients see it: status is always derived at response time.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub time: Option<String>,
    pub location: String,
    pub max_participants: i32,
    pub registration_deadline: Option<NaiveDate>,
    pub status: EventStatus,
    pub participants: Vec<Participant>,
    pub participant_count: usize,
    pub registration_open: bool,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EventResponse {
    pub fn build(event: Event, now: DateTime<Utc>, tz: Tz) -> Self {
        let status = event.status_at(now, tz);
        let registration_open = event.is_registration_open(now, tz);
        Self {
            participant_count: event.participants.len(),
            id: event.id,
            title: event.title,
            description: event.description,
            date: event.date,
            time: event.time,
            location: event.location,
            max_participants: event.max_participants,
            registration_deadline: event.registration_deadline,
            status,
            participants: event.participants,
            registration_open,
            created_by: event.created_by,
            created_at: event.created_at,
            updated_at: event.updated_at,
        }
    }
}

#[derive(Serialize)]
pub struct EventMessageResponse {
    pub message: String,
    pub event: EventResponse,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize)]
pub struct RegisteredEventSummary {
    pub id: String,
    pub title: String,
    pub date: NaiveDate,
    pub location: String,
    pub status: EventStatus,
}

#[derive(Serialize)]
pub struct RegistrationResponse {
    pub message: String,
    pub event: RegisteredEventSummary,
}

#[derive(Serialize)]
pub struct StudentResponse {
    pub student: Student,
}

#[derive(Serialize)]
pub struct StudentMessageResponse {
    pub message: String,
    pub student: Student,
}

#[derive(Serialize)]
pub struct StudentListResponse {
    pub students: Vec<Student>,
}

#[derive(Serialize)]
pub struct RegistrationsResponse {
    pub events: Vec<EventResponse>,
}

#[derive(Serialize)]
pub struct AnnouncementMessageResponse {
    pub message: String,
    pub announcement: Announcement,
}

#[derive(Serialize)]
pub struct AnnouncementUpdatedResponse {
    pub message: String,
    pub updated: Announcement,
}

#[derive(Serialize)]
pub struct RecentRegistrationsResponse {
    pub count: usize,
    pub registrations: Vec<RegistrationRecord>,
}

/// `{count, events}` for the popular and upcoming event rankings.
#[derive(Serialize)]
pub struct AnalyticsEventsResponse<T: Serialize> {
    pub count: usize,
    pub events: Vec<T>,
}

impl<T: Serialize> From<Vec<T>> for AnalyticsEventsResponse<T> {
    fn from(events: Vec<T>) -> Self {
        Self { count: events.len(), events }
    }
}
