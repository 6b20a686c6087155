use std::sync::LazyLock;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use validator::{Validate, ValidationError};
use crate::domain::models::event::{EventPatch, EventStatus, NewEventParams, DEFAULT_MAX_PARTICIPANTS};
use crate::domain::models::student::Student;
use crate::error::{field_errors, AppError, FieldError};

static TIME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-1]?[0-9]|2[0-3]):[0-5][0-9]\s?(AM|PM|am|pm)?$").expect("time pattern compiles")
});
static YEAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{4}$").expect("year pattern compiles"));
static STUDENT_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]{3,20}$").expect("student id pattern compiles"));

/// Trims the value; an all-whitespace string stays as `Some("")`.
fn trimmed<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.map(|s| s.trim().to_string()))
}

/// Trims the value and treats an empty string as absent.
fn non_blank<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(trimmed(deserializer)?.filter(|s| !s.is_empty()))
}

/// `Some(None)` for an empty string, so a patch can clear an optional column.
fn clearable<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Option<String>>, D::Error> {
    Ok(trimmed(deserializer)?.map(|s| if s.is_empty() { None } else { Some(s) }))
}

fn known_status(raw: &str) -> Result<(), ValidationError> {
    raw.parse::<EventStatus>().map(|_| ()).map_err(|_| {
        ValidationError::new("status")
            .with_message("Status must be one of upcoming, ongoing, completed, cancelled".into())
    })
}

fn finish<T>(errors: Vec<FieldError>, value: T) -> Result<T, AppError> {
    if errors.is_empty() { Ok(value) } else { Err(AppError::from(errors)) }
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp, the latter read as a local day in `tz`.
pub fn parse_date(raw: &str, tz: Tz) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.with_timezone(&tz).date_naive())
}

/// Accepts an RFC 3339 timestamp or a bare date, the latter meaning midnight UTC.
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[derive(Debug, Deserialize, Default, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateEventRequest {
    #[serde(deserialize_with = "non_blank")]
    #[validate(
        required(message = "Event title is required"),
        length(min = 3, max = 200, message = "Title must be between 3 and 200 characters")
    )]
    pub title: Option<String>,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(max = 1000, message = "Description must not exceed 1000 characters"))]
    pub description: Option<String>,
    #[serde(deserialize_with = "non_blank")]
    #[validate(required(message = "Event date is required"))]
    pub date: Option<String>,
    #[serde(deserialize_with = "non_blank")]
    #[validate(regex(path = *TIME_PATTERN, message = "Please provide valid time format (e.g., 10:00 AM)"))]
    pub time: Option<String>,
    #[serde(deserialize_with = "non_blank")]
    #[validate(
        required(message = "Event location is required"),
        length(min = 3, max = 200, message = "Location must be between 3 and 200 characters")
    )]
    pub location: Option<String>,
    #[validate(range(min = 1, max = 10000, message = "Max participants must be between 1 and 10000"))]
    pub max_participants: Option<i64>,
    #[serde(deserialize_with = "non_blank")]
    pub registration_deadline: Option<String>,
    #[validate(custom(function = "known_status"))]
    pub status: Option<String>,
}

impl CreateEventRequest {
    /// Field rules come from the derive; the date rules need `today` and the zone, so they run here.
    pub fn into_params(self, today: NaiveDate, tz: Tz, created_by: String) -> Result<NewEventParams, AppError> {
        let mut errors = Validate::validate(&self).err().map(|e| field_errors(&e)).unwrap_or_default();

        let date = match self.date.as_deref().map(|raw| parse_date(raw, tz)) {
            Some(None) => {
                errors.push(FieldError::new("date", "Please provide a valid date (YYYY-MM-DD)"));
                None
            }
            Some(Some(date)) if date < today => {
                errors.push(FieldError::new("date", "Event date cannot be in the past"));
                None
            }
            Some(date) => date,
            None => None,
        };

        let registration_deadline = match self.registration_deadline.as_deref().map(|raw| parse_date(raw, tz)) {
            Some(None) => {
                errors.push(FieldError::new(
                    "registrationDeadline",
                    "Please provide a valid registration deadline (YYYY-MM-DD)",
                ));
                None
            }
            Some(Some(deadline)) => {
                if let Some(date) = date
                    && deadline >= date {
                    errors.push(FieldError::new(
                        "registrationDeadline",
                        "Registration deadline must be before event date",
                    ));
                }
                Some(deadline)
            }
            None => None,
        };

        let (Some(date), Some(title), Some(location)) = (date, self.title, self.location) else {
            return Err(AppError::from(errors));
        };

        let cancelled = self.status.as_deref().and_then(|s| s.parse().ok()) == Some(EventStatus::Cancelled);

        finish(errors, NewEventParams {
            title,
            description: self.description.unwrap_or_default(),
            date,
            time: self.time,
            location,
            max_participants: self.max_participants.unwrap_or(DEFAULT_MAX_PARTICIPANTS as i64) as i32,
            registration_deadline,
            cancelled,
            created_by: Some(created_by),
        })
    }
}

/// Absent or `null` fields are left alone. An empty `time` or `registrationDeadline` clears it.
#[derive(Debug, Deserialize, Default, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateEventRequest {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 3, max = 200, message = "Title must be between 3 and 200 characters"))]
    pub title: Option<String>,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(max = 1000, message = "Description must not exceed 1000 characters"))]
    pub description: Option<String>,
    #[serde(deserialize_with = "trimmed")]
    pub date: Option<String>,
    #[serde(deserialize_with = "clearable")]
    #[validate(regex(path = *TIME_PATTERN, message = "Please provide valid time format"))]
    pub time: Option<Option<String>>,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 3, max = 200, message = "Location must be between 3 and 200 characters"))]
    pub location: Option<String>,
    #[validate(range(min = 1, max = 10000, message = "Max participants must be between 1 and 10000"))]
    pub max_participants: Option<i64>,
    #[serde(deserialize_with = "clearable")]
    pub registration_deadline: Option<Option<String>>,
    #[validate(custom(function = "known_status"))]
    pub status: Option<String>,
}

impl UpdateEventRequest {
    /// Rules that depend on the stored event (deadline against the merged date, capacity against the
    /// participant count) are checked by the event service.
    pub fn into_patch(self, tz: Tz) -> Result<EventPatch, AppError> {
        let mut errors = Validate::validate(&self).err().map(|e| field_errors(&e)).unwrap_or_default();
        let mut patch = EventPatch {
            title: self.title,
            description: self.description,
            time: self.time,
            location: self.location,
            max_participants: self.max_participants.map(|max| max as i32),
            cancelled: self.status.as_deref().map(|s| s.parse().ok() == Some(EventStatus::Cancelled)),
            ..Default::default()
        };

        if let Some(raw) = self.date {
            match parse_date(&raw, tz) {
                Some(date) => patch.date = Some(date),
                None => errors.push(FieldError::new("date", "Please provide a valid date (YYYY-MM-DD)")),
            }
        }

        match self.registration_deadline {
            Some(Some(raw)) => match parse_date(&raw, tz) {
                Some(deadline) => patch.registration_deadline = Some(Some(deadline)),
                None => errors.push(FieldError::new(
                    "registrationDeadline",
                    "Please provide a valid registration deadline",
                )),
            },
            Some(None) => patch.registration_deadline = Some(None),
            None => {}
        }

        finish(errors, patch)
    }
}

#[derive(Debug, Deserialize, Default, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 2, max = 50, message = "Name must be between 2 and 50 characters"))]
    pub name: Option<String>,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 2, max = 100, message = "Department must be between 2 and 100 characters"))]
    pub department: Option<String>,
    #[serde(deserialize_with = "trimmed")]
    #[validate(regex(path = *YEAR_PATTERN, message = "Year must be a valid 4-digit number"))]
    pub year: Option<String>,
}

impl UpdateProfileRequest {
    fn merge_into(self, student: &mut Student) {
        if let Some(name) = self.name { student.name = name; }
        if let Some(department) = self.department { student.department = Some(department); }
        if let Some(year) = self.year { student.year = Some(year); }
        student.updated_at = Utc::now();
    }

    /// Applies the edit to a copy of `student`, leaving the original untouched when any field is invalid.
    pub fn apply(self, student: &Student) -> Result<Student, AppError> {
        self.validate()?;
        let mut updated = student.clone();
        self.merge_into(&mut updated);
        Ok(updated)
    }
}

#[derive(Debug, Deserialize, Default, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AdminUpdateStudentRequest {
    #[serde(flatten)]
    #[validate(nested)]
    pub profile: UpdateProfileRequest,
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(email(message = "Please provide a valid email address"))]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(regex(path = *STUDENT_ID_PATTERN, message = "Student ID must be 3-20 alphanumeric characters"))]
    pub student_id: Option<String>,
}

impl AdminUpdateStudentRequest {
    pub fn apply(self, student: &Student) -> Result<Student, AppError> {
        self.validate()?;
        let mut updated = student.clone();
        if let Some(email) = self.email { updated.email = email.to_lowercase(); }
        if let Some(student_id) = self.student_id { updated.student_id = student_id; }
        self.profile.merge_into(&mut updated);
        Ok(updated)
    }
}

/// Validated announcement fields. `related_event` still has to be looked up by the caller.
#[derive(Debug)]
pub struct AnnouncementInput {
    pub title: String,
    pub message: String,
    pub related_event: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Default, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateAnnouncementRequest {
    #[serde(deserialize_with = "non_blank")]
    #[validate(
        required(message = "Announcement title is required"),
        length(min = 3, max = 200, message = "Title must be between 3 and 200 characters")
    )]
    pub title: Option<String>,
    #[serde(deserialize_with = "non_blank")]
    #[validate(
        required(message = "Announcement message is required"),
        length(min = 10, max = 5000, message = "Message must be between 10 and 5000 characters")
    )]
    pub message: Option<String>,
    #[serde(deserialize_with = "non_blank")]
    pub expires_at: Option<String>,
    #[serde(deserialize_with = "non_blank")]
    pub related_event: Option<String>,
}

impl CreateAnnouncementRequest {
    pub fn into_input(self, now: DateTime<Utc>) -> Result<AnnouncementInput, AppError> {
        let mut errors = Validate::validate(&self).err().map(|e| field_errors(&e)).unwrap_or_default();

        let expires_at = match self.expires_at.as_deref().map(parse_instant) {
            Some(None) => {
                errors.push(FieldError::new("expiresAt", "Please provide a valid expiry date"));
                None
            }
            Some(Some(at)) if at <= now => {
                errors.push(FieldError::new("expiresAt", "Expiry date must be in the future"));
                None
            }
            Some(at) => at,
            None => None,
        };

        finish(errors, AnnouncementInput {
            title: self.title.unwrap_or_default(),
            message: self.message.unwrap_or_default(),
            related_event: self.related_event,
            expires_at,
        })
    }
}

#[derive(Debug, Deserialize, Default, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateAnnouncementRequest {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 3, max = 200, message = "Title must be between 3 and 200 characters"))]
    pub title: Option<String>,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 10, max = 5000, message = "Message must be between 10 and 5000 characters"))]
    pub message: Option<String>,
    #[serde(deserialize_with = "clearable")]
    pub expires_at: Option<Option<String>>,
    #[serde(deserialize_with = "clearable")]
    pub related_event: Option<Option<String>>,
}

#[derive(Debug)]
pub struct AnnouncementPatch {
    pub title: Option<String>,
    pub message: Option<String>,
    pub expires_at: Option<Option<DateTime<Utc>>>,
    pub related_event: Option<Option<String>>,
}

impl UpdateAnnouncementRequest {
    pub fn into_patch(self) -> Result<AnnouncementPatch, AppError> {
        let mut errors = Validate::validate(&self).err().map(|e| field_errors(&e)).unwrap_or_default();

        let expires_at = match self.expires_at {
            Some(Some(raw)) => match parse_instant(&raw) {
                Some(at) => Some(Some(at)),
                None => {
                    errors.push(FieldError::new("expiresAt", "Please provide a valid expiry date"));
                    None
                }
            },
            other => other.map(|_| None),
        };

        finish(errors, AnnouncementPatch {
            title: self.title,
            message: self.message,
            expires_at,
            related_event: self.related_event,
        })
    }
}
