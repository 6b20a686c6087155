use std::collections::HashMap;
use crate::domain::{
    models::{
        analytics::RegistrationRecord,
        event::{AppendOutcome, Event, EventSort, Participant},
    },
    ports::EventRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{FromRow, SqlitePool};

const APPEND_ATTEMPTS: usize = 3;

#[derive(FromRow)]
struct ParticipantRow {
    event_id: String,
    student_id: String,
    name: String,
    email: String,
}

#[derive(FromRow)]
struct AppendState {
    cancelled: bool,
    max_participants: i32,
    participant_count: i64,
    already_registered: i64,
}

pub struct SqliteEventRepo {
    pool: SqlitePool,
}

impl SqliteEventRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn load_participants(&self, event_id: &str) -> Result<Vec<Participant>, AppError> {
        sqlx::query_as::<_, Participant>(
            "SELECT student_id, name, email FROM event_participants WHERE event_id = ? ORDER BY seq ASC",
        )
            .bind(event_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn with_participants(&self, mut event: Event) -> Result<Event, AppError> {
        event.participants = self.load_participants(&event.id).await?;
        Ok(event)
    }

    async fn append_state(&self, event_id: &str, student_id: &str) -> Result<Option<AppendState>, AppError> {
        sqlx::query_as::<_, AppendState>(
            r#"SELECT e.cancelled,
                      e.max_participants,
                      (SELECT COUNT(*) FROM event_participants p WHERE p.event_id = e.id) AS participant_count,
                      (SELECT COUNT(*) FROM event_participants p WHERE p.event_id = e.id AND p.student_id = ?) AS already_registered
               FROM events e WHERE e.id = ?"#,
        )
            .bind(student_id)
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}

#[async_trait]
impl EventRepository for SqliteEventRepo {
    async fn create(&self, event: &Event) -> Result<Event, AppError> {
        let created = sqlx::query_as::<_, Event>(
            r#"INSERT INTO events (
                id, title, description, date, time, location, max_participants,
                registration_deadline, cancelled, created_by, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *"#
        )
            .bind(&event.id)
            .bind(&event.title)
            .bind(&event.description)
            .bind(event.date)
            .bind(&event.time)
            .bind(&event.location)
            .bind(event.max_participants)
            .bind(event.registration_deadline)
            .bind(event.cancelled)
            .bind(&event.created_by)
            .bind(event.created_at)
            .bind(event.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(created)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Event>, AppError> {
        let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?;

        match event {
            Some(event) => Ok(Some(self.with_participants(event).await?)),
            None => Ok(None),
        }
    }

    async fn list(&self, sort: EventSort) -> Result<Vec<Event>, AppError> {
        let sql = format!("SELECT * FROM events ORDER BY {}", sort.order_by());
        let mut events = sqlx::query_as::<_, Event>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        let rows = sqlx::query_as::<_, ParticipantRow>(
            "SELECT event_id, student_id, name, email FROM event_participants ORDER BY seq ASC",
        )
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        let mut by_event: HashMap<String, Vec<Participant>> = HashMap::new();
        for row in rows {
            by_event.entry(row.event_id).or_default().push(Participant {
                student_id: row.student_id,
                name: row.name,
                email: row.email,
            });
        }

        for event in &mut events {
            event.participants = by_event.remove(&event.id).unwrap_or_default();
        }
        Ok(events)
    }

    async fn list_by_participant(&self, student_id: &str, email: &str) -> Result<Vec<Event>, AppError> {
        let events = sqlx::query_as::<_, Event>(
            r#"SELECT * FROM events WHERE id IN (
                SELECT event_id FROM event_participants WHERE student_id = ? OR email = ?
            ) ORDER BY date ASC"#,
        )
            .bind(student_id)
            .bind(email)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        let mut loaded = Vec::with_capacity(events.len());
        for event in events {
            loaded.push(self.with_participants(event).await?);
        }
        Ok(loaded)
    }

    async fn update(&self, event: &Event) -> Result<Option<Event>, AppError> {
        let updated = sqlx::query_as::<_, Event>(
            r#"UPDATE events SET
                title=?, description=?, date=?, time=?, location=?,
                max_participants=?, registration_deadline=?, cancelled=?, updated_at=?
               WHERE id=?
                 AND (SELECT COUNT(*) FROM event_participants WHERE event_id = ?) <= ?
               RETURNING *"#
        )
            .bind(&event.title)
            .bind(&event.description)
            .bind(event.date)
            .bind(&event.time)
            .bind(&event.location)
            .bind(event.max_participants)
            .bind(event.registration_deadline)
            .bind(event.cancelled)
            .bind(event.updated_at)
            .bind(&event.id)
            .bind(&event.id)
            .bind(event.max_participants)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?;

        match updated {
            Some(event) => Ok(Some(self.with_participants(event).await?)),
            None => Ok(None),
        }
    }

    async fn set_cancelled(&self, id: &str, cancelled: bool) -> Result<Option<Event>, AppError> {
        let event = sqlx::query_as::<_, Event>(
            "UPDATE events SET cancelled = ?, updated_at = ? WHERE id = ? RETURNING *",
        )
            .bind(cancelled)
            .bind(Utc::now())
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?;

        match event {
            Some(event) => Ok(Some(self.with_participants(event).await?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        sqlx::query("DELETE FROM event_participants WHERE event_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;
        let result = sqlx::query("DELETE FROM events WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;
        tx.commit().await.map_err(AppError::Database)?;

        Ok(result.rows_affected() > 0)
    }

    async fn append_participant(&self, event_id: &str, participant: &Participant) -> Result<AppendOutcome, AppError> {
        for _ in 0..APPEND_ATTEMPTS {
            // One statement: SQLite holds the write lock from the capacity read to the insert.
            let result = sqlx::query(
                r#"INSERT INTO event_participants (event_id, student_id, name, email, registered_at)
                   SELECT e.id, ?, ?, ?, ?
                   FROM events e
                   WHERE e.id = ?
                     AND e.cancelled = 0
                     AND (SELECT COUNT(*) FROM event_participants p WHERE p.event_id = e.id) < e.max_participants
                     AND NOT EXISTS (
                         SELECT 1 FROM event_participants p WHERE p.event_id = e.id AND p.student_id = ?
                     )"#,
            )
                .bind(&participant.student_id)
                .bind(&participant.name)
                .bind(&participant.email)
                .bind(Utc::now())
                .bind(event_id)
                .bind(&participant.student_id)
                .execute(&self.pool)
                .await
                .map_err(AppError::Database)?;

            if result.rows_affected() == 1 {
                return Ok(AppendOutcome::Appended);
            }

            let Some(state) = self.append_state(event_id, &participant.student_id).await? else {
                return Ok(AppendOutcome::EventMissing);
            };
            if state.cancelled {
                return Ok(AppendOutcome::Cancelled);
            }
            if state.participant_count >= state.max_participants as i64 {
                return Ok(AppendOutcome::Full);
            }
            if state.already_registered > 0 {
                return Ok(AppendOutcome::AlreadyRegistered);
            }
        }

        Err(AppError::InternalWithMsg(format!("Participant append for event {} kept conflicting", event_id)))
    }

    async fn remove_participant(&self, event_id: &str, student_id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM event_participants WHERE event_id = ? AND student_id = ?")
            .bind(event_id)
            .bind(student_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(result.rows_affected() > 0)
    }

    async fn clear_participants(&self, event_id: &str) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM event_participants WHERE event_id = ?")
            .bind(event_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(result.rows_affected())
    }

    async fn recent_registrations(&self, limit: i64) -> Result<Vec<RegistrationRecord>, AppError> {
        sqlx::query_as::<_, RegistrationRecord>(
            r#"SELECT p.event_id,
                      e.title AS event_title,
                      e.date AS event_date,
                      p.student_id,
                      p.name AS student_name,
                      p.email AS student_email,
                      p.registered_at
               FROM event_participants p
               JOIN events e ON e.id = p.event_id
               ORDER BY p.registered_at DESC, p.seq DESC
               LIMIT ?"#,
        )
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
