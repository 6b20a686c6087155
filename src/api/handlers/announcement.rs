use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use crate::api::dtos::{
    requests::{CreateAnnouncementRequest, UpdateAnnouncementRequest},
    responses::{AnnouncementMessageResponse, AnnouncementUpdatedResponse, MessageResponse},
};
use crate::api::extractors::{auth::AdminUser, path_id::PathId};
use crate::background::BroadcastJob;
use crate::domain::models::announcement::Announcement;
use crate::error::{AppError, FieldError};
use crate::state::AppState;

fn announcement_not_found() -> AppError {
    AppError::NotFound("Announcement not found".into())
}

async fn ensure_event_exists(state: &AppState, event_id: &str) -> Result<(), AppError> {
    let missing = || AppError::ValidationFailed(vec![FieldError::new("relatedEvent", "Related event not found")]);

    let id = Uuid::parse_str(event_id).map_err(|_| missing())?;
    if state.event_repo.find_by_id(&id.to_string()).await?.is_none() {
        return Err(missing());
    }
    Ok(())
}

pub async fn list_announcements(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let announcements = state.announcement_repo.list_active().await?;
    Ok(Json(announcements))
}

pub async fn get_announcement(
    State(state): State<Arc<AppState>>,
    PathId(id): PathId,
) -> Result<impl IntoResponse, AppError> {
    let announcement = state.announcement_repo.find_by_id(&id).await?.ok_or_else(announcement_not_found)?;
    Ok(Json(announcement))
}

/// Responds once the announcement is stored. Emails go out on the broadcast worker.
pub async fn create_announcement(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    payload: Result<Json<CreateAnnouncementRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    let input = payload.into_input(Utc::now())?;
    if let Some(event_id) = &input.related_event {
        ensure_event_exists(&state, event_id).await?;
    }

    let announcement = Announcement::new(input.title, input.message, admin.sub, input.related_event, input.expires_at);
    let created = state.announcement_repo.create(&announcement).await?;

    state.broadcast_queue.enqueue(BroadcastJob::from(&created));
    info!(announcement_id = %created.id, "Announcement created, broadcast queued");

    Ok((
        StatusCode::CREATED,
        Json(AnnouncementMessageResponse {
            message: "Announcement created successfully. Emails are being sent in background.".into(),
            announcement: created,
        }),
    ))
}

pub async fn update_announcement(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    PathId(id): PathId,
    payload: Result<Json<UpdateAnnouncementRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    let patch = payload.into_patch()?;
    let mut announcement = state.announcement_repo.find_by_id(&id).await?.ok_or_else(announcement_not_found)?;

    if let Some(Some(event_id)) = &patch.related_event {
        ensure_event_exists(&state, event_id).await?;
    }

    if let Some(title) = patch.title { announcement.title = title; }
    if let Some(message) = patch.message { announcement.message = message; }
    if let Some(expires_at) = patch.expires_at { announcement.expires_at = expires_at; }
    if let Some(related_event) = patch.related_event { announcement.related_event = related_event; }
    announcement.updated_at = Utc::now();

    let updated = state.announcement_repo.update(&announcement).await?;
    Ok(Json(AnnouncementUpdatedResponse { message: "Announcement updated successfully".into(), updated }))
}

pub async fn delete_announcement(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    PathId(id): PathId,
) -> Result<impl IntoResponse, AppError> {
    if !state.announcement_repo.delete(&id).await? {
        return Err(announcement_not_found());
    }
    Ok(Json(MessageResponse { message: "Announcement deleted successfully".into() }))
}
