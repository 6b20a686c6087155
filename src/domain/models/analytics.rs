use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::FromRow;
use crate::domain::models::event::EventStatus;

/// One participant row joined with the event it belongs to.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRecord {
    pub event_id: String,
    pub event_title: String,
    pub event_date: NaiveDate,
    pub student_id: String,
    pub student_name: String,
    pub student_email: String,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
pub struct StatusBreakdown {
    pub upcoming: usize,
    pub ongoing: usize,
    pub completed: usize,
    pub cancelled: usize,
}

impl StatusBreakdown {
    pub fn record(&mut self, status: EventStatus) {
        match status {
            EventStatus::Upcoming => self.upcoming += 1,
            EventStatus::Ongoing => self.ongoing += 1,
            EventStatus::Completed => self.completed += 1,
            EventStatus::Cancelled => self.cancelled += 1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_students: i64,
    pub total_events: usize,
    pub total_announcements: i64,
    pub active_announcements: usize,
    pub total_registrations: usize,
    pub events_by_status: StatusBreakdown,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopularEvent {
    pub id: String,
    pub title: String,
    pub date: NaiveDate,
    pub location: String,
    pub status: EventStatus,
    pub max_participants: i32,
    pub participant_count: usize,
    pub registration_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingEventStats {
    pub id: String,
    pub title: String,
    pub date: NaiveDate,
    pub time: Option<String>,
    pub location: String,
    pub registration_deadline: Option<NaiveDate>,
    pub registration_open: bool,
    pub participant_count: usize,
    pub max_participants: i32,
    pub spots_left: i64,
    pub fill_rate: f64,
    pub status: EventStatus,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StudentEngagement {
    pub total_students: i64,
    pub active_students: usize,
    pub inactive_students: i64,
    pub engagement_rate: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MonthlyCount {
    pub month: &'static str,
    pub events: usize,
    pub students: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyStats {
    pub year: i32,
    pub monthly_data: Vec<MonthlyCount>,
}

/// `part / whole` as a percentage rounded to one decimal; zero when `whole` is zero.
pub fn percentage(part: usize, whole: i64) -> f64 {
    if whole <= 0 {
        return 0.0;
    }
    (part as f64 * 1000.0 / whole as f64).round() / 10.0
}
