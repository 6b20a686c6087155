use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use sqlx::FromRow;
use uuid::Uuid;
use crate::domain::services::{registration, status};

pub const DEFAULT_MAX_PARTICIPANTS: i32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Upcoming,
    Ongoing,
    Completed,
    Cancelled,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Upcoming => "upcoming",
            EventStatus::Ongoing => "ongoing",
            EventStatus::Completed => "completed",
            EventStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upcoming" => Ok(EventStatus::Upcoming),
            "ongoing" => Ok(EventStatus::Ongoing),
            "completed" => Ok(EventStatus::Completed),
            "cancelled" => Ok(EventStatus::Cancelled),
            other => Err(format!("Unknown event status '{}'", other)),
        }
    }
}

/// Snapshot of a student's identity taken when they registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub student_id: String,
    pub name: String,
    pub email: String,
}

/// The authenticated student as seen by the registration guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentIdentity {
    pub student_id: String,
    pub name: String,
    pub email: String,
}

impl From<&StudentIdentity> for Participant {
    fn from(identity: &StudentIdentity) -> Self {
        Self {
            student_id: identity.student_id.clone(),
            name: identity.name.clone(),
            email: identity.email.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub time: Option<String>,
    pub location: String,
    pub max_participants: i32,
    pub registration_deadline: Option<NaiveDate>,
    pub cancelled: bool,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub participants: Vec<Participant>,
}

#[derive(Debug, Clone)]
pub struct NewEventParams {
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub time: Option<String>,
    pub location: String,
    pub max_participants: i32,
    pub registration_deadline: Option<NaiveDate>,
    pub cancelled: bool,
    pub created_by: Option<String>,
}

impl Event {
    pub fn new(params: NewEventParams) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title: params.title,
            description: params.description,
            date: params.date,
            time: params.time,
            location: params.location,
            max_participants: params.max_participants,
            registration_deadline: params.registration_deadline,
            cancelled: params.cancelled,
            created_by: params.created_by,
            created_at: now,
            updated_at: now,
            participants: Vec::new(),
        }
    }

    /// The only status that is ever persisted is the cancelled override.
    pub fn stored_status(&self) -> EventStatus {
        if self.cancelled { EventStatus::Cancelled } else { EventStatus::Upcoming }
    }

    pub fn status_at(&self, now: DateTime<Utc>, tz: Tz) -> EventStatus {
        status::compute_status(self.stored_status(), self.date, now, tz)
    }

    pub fn is_registration_open(&self, now: DateTime<Utc>, tz: Tz) -> bool {
        status::is_registration_open(self, now, tz)
    }

    pub fn try_register(
        &mut self,
        student: &StudentIdentity,
        now: DateTime<Utc>,
        tz: Tz,
    ) -> Result<Participant, registration::RegistrationError> {
        registration::try_register(self, student, now, tz)
    }

    pub fn is_full(&self) -> bool {
        self.participants.len() as i64 >= self.max_participants as i64
    }

    pub fn has_participant(&self, student_id: &str) -> bool {
        self.participants.iter().any(|p| p.student_id == student_id)
    }
}

/// Admin edit of the scalar fields of an event. `None` leaves a field untouched.
#[derive(Debug, Default)]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<Option<String>>,
    pub location: Option<String>,
    pub max_participants: Option<i32>,
    pub registration_deadline: Option<Option<NaiveDate>>,
    pub cancelled: Option<bool>,
}

impl EventPatch {
    pub fn apply(self, event: &mut Event) {
        if let Some(val) = self.title { event.title = val; }
        if let Some(val) = self.description { event.description = val; }
        if let Some(val) = self.date { event.date = val; }
        if let Some(val) = self.time { event.time = val; }
        if let Some(val) = self.location { event.location = val; }
        if let Some(val) = self.max_participants { event.max_participants = val; }
        if let Some(val) = self.registration_deadline { event.registration_deadline = val; }
        if let Some(val) = self.cancelled { event.cancelled = val; }
        event.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventSort {
    #[default]
    DateAsc,
    DateDesc,
    CreatedDesc,
}

impl EventSort {
    pub fn parse(raw: Option<&str>) -> Result<Self, String> {
        match raw {
            None | Some("date") => Ok(EventSort::DateAsc),
            Some("-date") => Ok(EventSort::DateDesc),
            Some("-createdAt") => Ok(EventSort::CreatedDesc),
            Some(other) => Err(format!("Unsupported sort '{}'", other)),
        }
    }

    pub fn order_by(&self) -> &'static str {
        match self {
            EventSort::DateAsc => "date ASC, created_at ASC",
            EventSort::DateDesc => "date DESC, created_at DESC",
            EventSort::CreatedDesc => "created_at DESC",
        }
    }
}

/// Result of the store's atomic conditional append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Appended,
    EventMissing,
    Cancelled,
    Full,
    AlreadyRegistered,
}
