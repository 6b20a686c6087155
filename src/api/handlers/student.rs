use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use crate::api::dtos::{
    requests::{AdminUpdateStudentRequest, UpdateProfileRequest},
    responses::{
        EventResponse, MessageResponse, RegistrationsResponse, StudentListResponse, StudentMessageResponse,
        StudentResponse,
    },
};
use crate::api::extractors::{auth::{AdminUser, StudentUser}, path_id::PathId};
use crate::error::AppError;
use crate::state::AppState;

fn student_not_found() -> AppError {
    AppError::NotFound("Student not found".into())
}

pub async fn get_profile(StudentUser(student): StudentUser) -> Result<impl IntoResponse, AppError> {
    Ok(Json(StudentResponse { student }))
}

/// Participant snapshots already taken for past registrations are not rewritten.
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    StudentUser(student): StudentUser,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    let updated = payload.apply(&student)?;
    let saved = state.student_repo.update(&updated).await?;

    info!(student_id = %saved.student_id, "Profile updated");
    Ok(Json(StudentMessageResponse { message: "Profile updated".into(), student: saved }))
}

pub async fn list_registrations(
    State(state): State<Arc<AppState>>,
    StudentUser(student): StudentUser,
) -> Result<impl IntoResponse, AppError> {
    let events = state.event_service.registrations_for(&student.identity()).await?;

    let now = Utc::now();
    let tz = state.event_service.timezone();
    Ok(Json(RegistrationsResponse {
        events: events.into_iter().map(|event| EventResponse::build(event, now, tz)).collect(),
    }))
}

pub async fn list_students(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Result<impl IntoResponse, AppError> {
    let students = state.student_repo.list().await?;
    Ok(Json(StudentListResponse { students }))
}

pub async fn get_student(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    PathId(id): PathId,
) -> Result<impl IntoResponse, AppError> {
    let student = state.student_repo.find_by_id(&id).await?.ok_or_else(student_not_found)?;
    Ok(Json(StudentResponse { student }))
}

pub async fn update_student(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    PathId(id): PathId,
    payload: Result<Json<AdminUpdateStudentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    let student = state.student_repo.find_by_id(&id).await?.ok_or_else(student_not_found)?;

    let updated = payload.apply(&student)?;
    let saved = state.student_repo.update(&updated).await?;

    info!(student_id = %saved.student_id, "Student updated by admin");
    Ok(Json(StudentMessageResponse { message: "Student updated successfully".into(), student: saved }))
}

pub async fn delete_student(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    PathId(id): PathId,
) -> Result<impl IntoResponse, AppError> {
    if !state.student_repo.delete(&id).await? {
        return Err(student_not_found());
    }
    info!(id = %id, "Student deleted");
    Ok(Json(MessageResponse { message: "Student deleted successfully".into() }))
}
