use std::collections::HashSet;
use std::sync::Arc;
use chrono::{DateTime, Datelike, Utc};
use chrono_tz::Tz;
use tracing::debug;
use crate::domain::models::analytics::{
    percentage, DashboardStats, MonthlyCount, MonthlyStats, PopularEvent, RegistrationRecord, StatusBreakdown,
    StudentEngagement, UpcomingEventStats,
};
use crate::domain::models::event::{Event, EventSort, EventStatus};
use crate::domain::ports::{AnnouncementRepository, EventRepository, StudentRepository};
use crate::error::AppError;

const MONTHS: [&str; 12] = [
    "January", "February", "March", "April", "May", "June",
    "July", "August", "September", "October", "November", "December",
];

/// Read-only aggregates for the admin dashboard. Status is derived per event at `now`, nothing is written.
pub struct AnalyticsService {
    events: Arc<dyn EventRepository>,
    students: Arc<dyn StudentRepository>,
    announcements: Arc<dyn AnnouncementRepository>,
    tz: Tz,
}

impl AnalyticsService {
    pub fn new(
        events: Arc<dyn EventRepository>,
        students: Arc<dyn StudentRepository>,
        announcements: Arc<dyn AnnouncementRepository>,
        tz: Tz,
    ) -> Self {
        Self { events, students, announcements, tz }
    }

    pub async fn dashboard(&self, now: DateTime<Utc>) -> Result<DashboardStats, AppError> {
        let events = self.events.list(EventSort::CreatedDesc).await?;
        let total_students = self.students.count().await?;
        let total_announcements = self.announcements.count().await?;
        let active_announcements = self.announcements.list_active().await?.len();

        let mut events_by_status = StatusBreakdown::default();
        for event in &events {
            events_by_status.record(event.status_at(now, self.tz));
        }

        Ok(DashboardStats {
            total_students,
            total_events: events.len(),
            total_announcements,
            active_announcements,
            total_registrations: events.iter().map(|e| e.participants.len()).sum(),
            events_by_status,
        })
    }

    pub async fn recent_registrations(&self, limit: i64) -> Result<Vec<RegistrationRecord>, AppError> {
        self.events.recent_registrations(limit).await
    }

    pub async fn popular_events(&self, limit: usize, now: DateTime<Utc>) -> Result<Vec<PopularEvent>, AppError> {
        let events = self.events.list(EventSort::CreatedDesc).await?;
        Ok(rank_by_participants(events, limit, now, self.tz))
    }

    pub async fn upcoming_events(&self, now: DateTime<Utc>) -> Result<Vec<UpcomingEventStats>, AppError> {
        let events = self.events.list(EventSort::DateAsc).await?;
        Ok(events
            .into_iter()
            .filter(|e| e.status_at(now, self.tz) == EventStatus::Upcoming)
            .map(|e| upcoming_stats(e, now, self.tz))
            .collect())
    }

    pub async fn student_engagement(&self) -> Result<StudentEngagement, AppError> {
        let events = self.events.list(EventSort::DateAsc).await?;
        let total_students = self.students.count().await?;
        Ok(engagement(&events, total_students))
    }

    pub async fn monthly(&self, year: i32) -> Result<MonthlyStats, AppError> {
        let events = self.events.list(EventSort::CreatedDesc).await?;
        let students = self.students.list().await?;
        debug!(year, events = events.len(), students = students.len(), "Aggregating monthly stats");

        let event_months = months_in_year(events.iter().map(|e| e.created_at), year, self.tz);
        let student_months = months_in_year(students.iter().map(|s| s.created_at), year, self.tz);

        let monthly_data = MONTHS
            .iter()
            .enumerate()
            .map(|(i, month)| MonthlyCount { month: *month, events: event_months[i], students: student_months[i] })
            .collect();
        Ok(MonthlyStats { year, monthly_data })
    }

    pub fn current_year(&self, now: DateTime<Utc>) -> i32 {
        now.with_timezone(&self.tz).year()
    }
}

/// Highest participant count first; ties keep the order of `events`.
fn rank_by_participants(events: Vec<Event>, limit: usize, now: DateTime<Utc>, tz: Tz) -> Vec<PopularEvent> {
    let mut ranked: Vec<PopularEvent> = events
        .into_iter()
        .map(|e| PopularEvent {
            status: e.status_at(now, tz),
            participant_count: e.participants.len(),
            registration_rate: percentage(e.participants.len(), e.max_participants as i64),
            id: e.id,
            title: e.title,
            date: e.date,
            location: e.location,
            max_participants: e.max_participants,
        })
        .collect();
    ranked.sort_by(|a, b| b.participant_count.cmp(&a.participant_count));
    ranked.truncate(limit);
    ranked
}

fn upcoming_stats(event: Event, now: DateTime<Utc>, tz: Tz) -> UpcomingEventStats {
    let participant_count = event.participants.len();
    UpcomingEventStats {
        registration_open: event.is_registration_open(now, tz),
        status: event.status_at(now, tz),
        spots_left: event.max_participants as i64 - participant_count as i64,
        fill_rate: percentage(participant_count, event.max_participants as i64),
        participant_count,
        id: event.id,
        title: event.title,
        date: event.date,
        time: event.time,
        location: event.location,
        registration_deadline: event.registration_deadline,
        max_participants: event.max_participants,
    }
}

/// A student counts as active once their `studentId` appears on any participant list.
fn engagement(events: &[Event], total_students: i64) -> StudentEngagement {
    let active: HashSet<&str> = events
        .iter()
        .flat_map(|e| e.participants.iter().map(|p| p.student_id.as_str()))
        .collect();
    StudentEngagement {
        total_students,
        active_students: active.len(),
        inactive_students: (total_students - active.len() as i64).max(0),
        engagement_rate: percentage(active.len(), total_students),
    }
}

fn months_in_year(stamps: impl Iterator<Item = DateTime<Utc>>, year: i32, tz: Tz) -> [usize; 12] {
    let mut counts = [0usize; 12];
    for local in stamps.map(|at| at.with_timezone(&tz)) {
        if local.year() == year {
            counts[local.month0() as usize] += 1;
        }
    }
    counts
}
