use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use thiserror::Error;
use crate::domain::models::event::{Event, EventStatus, Participant, StudentIdentity};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("Cannot register. This event has already ended.")]
    EventEnded,
    #[error("Cannot register. This event has been cancelled.")]
    EventCancelled,
    #[error("Cannot register. This event is currently ongoing.")]
    EventOngoing,
    #[error("Event is full. Registration closed.")]
    EventFull,
    #[error("You are already registered for this event.")]
    AlreadyRegistered,
}

impl RegistrationError {
    pub fn code(&self) -> &'static str {
        match self {
            RegistrationError::EventEnded => "EVENT_ENDED",
            RegistrationError::EventCancelled => "EVENT_CANCELLED",
            RegistrationError::EventOngoing => "EVENT_ONGOING",
            RegistrationError::EventFull => "EVENT_FULL",
            RegistrationError::AlreadyRegistered => "ALREADY_REGISTERED",
        }
    }
}

/// Runs the ordered registration checks against `event` and appends the student's snapshot on success.
///
/// The status is recomputed here from `now`, so a stale stored value can never let a registration through.
/// Checks run in a fixed order and the first failure wins; a full event rejects with `EventFull` even
/// for a student who is already on the list. The registration deadline is not consulted here, it only
/// feeds `is_registration_open`.
pub fn try_register(
    event: &mut Event,
    student: &StudentIdentity,
    now: DateTime<Utc>,
    tz: Tz,
) -> Result<Participant, RegistrationError> {
    match event.status_at(now, tz) {
        EventStatus::Completed => return Err(RegistrationError::EventEnded),
        EventStatus::Cancelled => return Err(RegistrationError::EventCancelled),
        EventStatus::Ongoing => return Err(RegistrationError::EventOngoing),
        EventStatus::Upcoming => {}
    }

    if event.is_full() {
        return Err(RegistrationError::EventFull);
    }

    if event.has_participant(&student.student_id) {
        return Err(RegistrationError::AlreadyRegistered);
    }

    let participant = Participant::from(student);
    event.participants.push(participant.clone());
    Ok(participant)
}
