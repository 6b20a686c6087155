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
use sqlx::{FromRow, PgPool};

#[derive(FromRow)]
struct ParticipantRow {
    event_id: String,
    student_id: String,
    name: String,
    email: String,
}

#[derive(FromRow)]
struct LockedEvent {
    cancelled: bool,
    max_participants: i32,
}

pub struct PostgresEventRepo {
    pool: PgPool,
}

impl PostgresEventRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_participants(&self, event_id: &str) -> Result<Vec<Participant>, AppError> {
        sqlx::query_as::<_, Participant>(
            "SELECT student_id, name, email FROM event_participants WHERE event_id = $1 ORDER BY seq ASC",
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
}

#[async_trait]
impl EventRepository for PostgresEventRepo {
    async fn create(&self, event: &Event) -> Result<Event, AppError> {
        sqlx::query_as::<_, Event>(
            r#"INSERT INTO events (
                id, title, description, date, time, location, max_participants,
                registration_deadline, cancelled, created_by, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
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
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Event>, AppError> {
        let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
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
                SELECT event_id FROM event_participants WHERE student_id = $1 OR email = $2
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
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        // Row lock keeps appends out until the new capacity is committed.
        let locked = sqlx::query_scalar::<_, String>("SELECT id FROM events WHERE id = $1 FOR UPDATE")
            .bind(&event.id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?;
        if locked.is_none() {
            return Ok(None);
        }

        let updated = sqlx::query_as::<_, Event>(
            r#"UPDATE events SET
                title=$1, description=$2, date=$3, time=$4, location=$5,
                max_participants=$6, registration_deadline=$7, cancelled=$8, updated_at=$9
               WHERE id=$10
                 AND (SELECT COUNT(*) FROM event_participants WHERE event_id = $10) <= $6
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
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?;
        tx.commit().await.map_err(AppError::Database)?;

        match updated {
            Some(event) => Ok(Some(self.with_participants(event).await?)),
            None => Ok(None),
        }
    }

    async fn set_cancelled(&self, id: &str, cancelled: bool) -> Result<Option<Event>, AppError> {
        let event = sqlx::query_as::<_, Event>(
            "UPDATE events SET cancelled = $1, updated_at = $2 WHERE id = $3 RETURNING *",
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
        sqlx::query("DELETE FROM event_participants WHERE event_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;
        tx.commit().await.map_err(AppError::Database)?;

        Ok(result.rows_affected() > 0)
    }

    async fn append_participant(&self, event_id: &str, participant: &Participant) -> Result<AppendOutcome, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let locked = sqlx::query_as::<_, LockedEvent>(
            "SELECT cancelled, max_participants FROM events WHERE id = $1 FOR UPDATE",
        )
            .bind(event_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        let Some(locked) = locked else {
            return Ok(AppendOutcome::EventMissing);
        };
        if locked.cancelled {
            return Ok(AppendOutcome::Cancelled);
        }

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM event_participants WHERE event_id = $1")
            .bind(event_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::Database)?;
        if count >= locked.max_participants as i64 {
            return Ok(AppendOutcome::Full);
        }

        let duplicate: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM event_participants WHERE event_id = $1 AND student_id = $2)",
        )
            .bind(event_id)
            .bind(&participant.student_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::Database)?;
        if duplicate {
            return Ok(AppendOutcome::AlreadyRegistered);
        }

        sqlx::query(
            r#"INSERT INTO event_participants (event_id, student_id, name, email, registered_at)
               VALUES ($1, $2, $3, $4, $5)"#,
        )
            .bind(event_id)
            .bind(&participant.student_id)
            .bind(&participant.name)
            .bind(&participant.email)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(AppendOutcome::Appended)
    }

    async fn remove_participant(&self, event_id: &str, student_id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM event_participants WHERE event_id = $1 AND student_id = $2")
            .bind(event_id)
            .bind(student_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(result.rows_affected() > 0)
    }

    async fn clear_participants(&self, event_id: &str) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM event_participants WHERE event_id = $1")
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
               LIMIT $1"#,
        )
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
