use crate::domain::{models::announcement::Announcement, ports::AnnouncementRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

pub struct PostgresAnnouncementRepo {
    pool: PgPool,
}

impl PostgresAnnouncementRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnnouncementRepository for PostgresAnnouncementRepo {
    async fn create(&self, announcement: &Announcement) -> Result<Announcement, AppError> {
        sqlx::query_as::<_, Announcement>(
            r#"INSERT INTO announcements (id, title, message, created_by, related_event, expires_at, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
               RETURNING *"#,
        )
            .bind(&announcement.id)
            .bind(&announcement.title)
            .bind(&announcement.message)
            .bind(&announcement.created_by)
            .bind(&announcement.related_event)
            .bind(announcement.expires_at)
            .bind(announcement.created_at)
            .bind(announcement.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Announcement>, AppError> {
        sqlx::query_as::<_, Announcement>("SELECT * FROM announcements WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_active(&self) -> Result<Vec<Announcement>, AppError> {
        sqlx::query_as::<_, Announcement>(
            "SELECT * FROM announcements WHERE expires_at IS NULL OR expires_at >= $1 ORDER BY created_at DESC",
        )
            .bind(Utc::now())
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn count(&self) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM announcements")
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn update(&self, announcement: &Announcement) -> Result<Announcement, AppError> {
        sqlx::query_as::<_, Announcement>(
            r#"UPDATE announcements SET title=$1, message=$2, related_event=$3, expires_at=$4, updated_at=$5
               WHERE id=$6
               RETURNING *"#,
        )
            .bind(&announcement.title)
            .bind(&announcement.message)
            .bind(&announcement.related_event)
            .bind(announcement.expires_at)
            .bind(announcement.updated_at)
            .bind(&announcement.id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound("Announcement not found".into()))
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM announcements WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(result.rows_affected() > 0)
    }
}
