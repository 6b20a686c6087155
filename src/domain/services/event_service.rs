use std::sync::Arc;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::{info, warn};
use crate::domain::models::event::{
    AppendOutcome, Event, EventPatch, EventSort, NewEventParams, StudentIdentity,
};
use crate::domain::ports::EventRepository;
use crate::domain::services::registration::RegistrationError;
use crate::error::{AppError, FieldError};
use crate::infra::locks::EventLocks;

/// Commits every event state transition. Mutations of a single event run under that event's lock.
pub struct EventService {
    repo: Arc<dyn EventRepository>,
    locks: EventLocks,
    tz: Tz,
}

fn event_not_found() -> AppError {
    AppError::NotFound("Event not found".into())
}

fn check_invariants(event: &Event) -> Result<(), AppError> {
    let mut errors = Vec::new();

    if let Some(deadline) = event.registration_deadline
        && deadline >= event.date {
        errors.push(FieldError::new("registrationDeadline", "Registration deadline must be before event date"));
    }

    if event.max_participants < 1 {
        errors.push(FieldError::new("maxParticipants", "Max participants must be between 1 and 10000"));
    } else if event.participants.len() as i64 > event.max_participants as i64 {
        errors.push(FieldError::new(
            "maxParticipants",
            format!(
                "Max participants cannot be lower than the current number of participants ({})",
                event.participants.len()
            ),
        ));
    }

    if errors.is_empty() { Ok(()) } else { Err(AppError::from(errors)) }
}

impl EventService {
    pub fn new(repo: Arc<dyn EventRepository>, tz: Tz) -> Self {
        Self { repo, locks: EventLocks::new(), tz }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub async fn create(&self, params: NewEventParams) -> Result<Event, AppError> {
        let event = Event::new(params);
        check_invariants(&event)?;

        let created = self.repo.create(&event).await?;
        info!(event_id = %created.id, "Event created: {}", created.title);
        Ok(created)
    }

    pub async fn list(&self, sort: EventSort) -> Result<Vec<Event>, AppError> {
        self.repo.list(sort).await
    }

    pub async fn get(&self, id: &str) -> Result<Event, AppError> {
        self.repo.find_by_id(id).await?.ok_or_else(event_not_found)
    }

    pub async fn update(&self, id: &str, patch: EventPatch) -> Result<Event, AppError> {
        let _guard = self.locks.acquire(id).await;

        let mut event = self.get(id).await?;
        patch.apply(&mut event);
        check_invariants(&event)?;

        match self.repo.update(&event).await? {
            Some(updated) => {
                info!(event_id = %id, "Event updated");
                Ok(updated)
            }
            None => {
                // Either deleted or filled up by another writer since we read it.
                let mut current = self.get(id).await?;
                current.max_participants = event.max_participants;
                check_invariants(&current)?;
                Err(AppError::InternalWithMsg(format!("Event {} could not be updated", id)))
            }
        }
    }

    pub async fn cancel(&self, id: &str) -> Result<Event, AppError> {
        let _guard = self.locks.acquire(id).await;
        let event = self.repo.set_cancelled(id, true).await?.ok_or_else(event_not_found)?;
        info!(event_id = %id, "Event cancelled");
        Ok(event)
    }

    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        let guard = self.locks.acquire(id).await;
        if !self.repo.delete(id).await? {
            return Err(event_not_found());
        }
        drop(guard);
        self.locks.forget(id);
        info!(event_id = %id, "Event deleted");
        Ok(())
    }

    pub async fn register(&self, id: &str, student: &StudentIdentity) -> Result<Event, AppError> {
        self.register_at(id, student, Utc::now()).await
    }

    /// Guard check and store append happen under the event lock; the store re-checks
    /// capacity, duplicates and cancellation atomically for writers in other processes.
    pub async fn register_at(
        &self,
        id: &str,
        student: &StudentIdentity,
        now: DateTime<Utc>,
    ) -> Result<Event, AppError> {
        let _guard = self.locks.acquire(id).await;

        let mut event = self.get(id).await?;
        let participant = event.try_register(student, now, self.tz)?;

        match self.repo.append_participant(&event.id, &participant).await? {
            AppendOutcome::Appended => {
                info!(event_id = %event.id, student_id = %participant.student_id, "Student registered for event");
                Ok(event)
            }
            AppendOutcome::EventMissing => Err(event_not_found()),
            outcome => {
                warn!(event_id = %event.id, ?outcome, "Store rejected registration that passed the guard");
                let err = match outcome {
                    AppendOutcome::Cancelled => RegistrationError::EventCancelled,
                    AppendOutcome::Full => RegistrationError::EventFull,
                    _ => RegistrationError::AlreadyRegistered,
                };
                Err(err.into())
            }
        }
    }

    pub async fn remove_participant(&self, event_id: &str, student_id: &str) -> Result<Event, AppError> {
        let _guard = self.locks.acquire(event_id).await;

        let mut event = self.get(event_id).await?;
        if !self.repo.remove_participant(event_id, student_id).await? {
            return Err(AppError::NotFound("Participant not found".into()));
        }
        event.participants.retain(|p| p.student_id != student_id);
        info!(event_id = %event_id, student_id = %student_id, "Participant removed");
        Ok(event)
    }

    pub async fn clear_participants(&self, event_id: &str) -> Result<Event, AppError> {
        let _guard = self.locks.acquire(event_id).await;

        let mut event = self.get(event_id).await?;
        let removed = self.repo.clear_participants(event_id).await?;
        event.participants.clear();
        info!(event_id = %event_id, removed, "All participants removed");
        Ok(event)
    }

    pub async fn registrations_for(&self, student: &StudentIdentity) -> Result<Vec<Event>, AppError> {
        self.repo.list_by_participant(&student.student_id, &student.email).await
    }
}
