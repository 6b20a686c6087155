use crate::domain::{models::announcement::Announcement, ports::AnnouncementRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

pub struct SqliteAnnouncementRepo {
    pool: SqlitePool,
}

impl SqliteAnnouncementRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnnouncementRepository for SqliteAnnouncementRepo {
    async fn create(&self, announcement: &Announcement) -> Result<Announcement, AppError> {
        sqlx::query_as::<_, Announcement>(
            r#"INSERT INTO announcements (id, title, message, created_by, related_event, expires_at, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)
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
        sqlx::query_as::<_, Announcement>("SELECT * FROM announcements WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_active(&self) -> Result<Vec<Announcement>, AppError> {
        sqlx::query_as::<_, Announcement>(
            "SELECT * FROM announcements WHERE expires_at IS NULL OR expires_at >= ? ORDER BY created_at DESC",
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
            r#"UPDATE announcements SET title=?, message=?, related_event=?, expires_at=?, updated_at=?
               WHERE id=?
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
        let result = sqlx::query("DELETE FROM announcements WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(result.rows_affected() > 0)
    }
}
