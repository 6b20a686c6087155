use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use crate::api::dtos::{
    requests::{CreateEventRequest, UpdateEventRequest},
    responses::{
        EventMessageResponse, EventResponse, MessageResponse, RegisteredEventSummary, RegistrationResponse,
    },
};
use crate::api::extractors::{auth::{AdminUser, StudentUser}, path_id::PathId};
use crate::domain::models::event::{Event, EventSort};
use crate::domain::services::status;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ListEventsQuery {
    pub sort: Option<String>,
}

fn respond(state: &AppState, message: impl Into<String>, event: Event) -> Json<EventMessageResponse> {
    Json(EventMessageResponse {
        message: message.into(),
        event: EventResponse::build(event, Utc::now(), state.event_service.timezone()),
    })
}

pub async fn list_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListEventsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let sort = EventSort::parse(query.sort.as_deref()).map_err(AppError::Validation)?;
    let events = state.event_service.list(sort).await?;

    let now = Utc::now();
    let tz = state.event_service.timezone();
    let body: Vec<EventResponse> = events.into_iter()
        .map(|event| EventResponse::build(event, now, tz))
        .collect();
    Ok(Json(body))
}

pub async fn get_event(
    State(state): State<Arc<AppState>>,
    PathId(id): PathId,
) -> Result<impl IntoResponse, AppError> {
    let event = state.event_service.get(&id).await?;
    Ok(Json(EventResponse::build(event, Utc::now(), state.event_service.timezone())))
}

pub async fn create_event(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    payload: Result<Json<CreateEventRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    let tz = state.event_service.timezone();
    let today = status::local_today(Utc::now(), tz);

    let params = payload.into_params(today, tz, admin.sub)?;
    info!("Creating event: {} on {}", params.title, params.date);

    let event = state.event_service.create(params).await?;
    Ok((StatusCode::CREATED, respond(&state, "Event created", event)))
}

pub async fn update_event(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    PathId(id): PathId,
    payload: Result<Json<UpdateEventRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    let patch = payload.into_patch(state.event_service.timezone())?;

    let event = state.event_service.update(&id, patch).await?;
    Ok(respond(&state, "Event updated", event))
}

pub async fn delete_event(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    PathId(id): PathId,
) -> Result<impl IntoResponse, AppError> {
    state.event_service.delete(&id).await?;
    Ok(Json(MessageResponse { message: "Event deleted".into() }))
}

pub async fn register_for_event(
    State(state): State<Arc<AppState>>,
    StudentUser(student): StudentUser,
    PathId(id): PathId,
) -> Result<impl IntoResponse, AppError> {
    let event = state.event_service.register(&id, &student.identity()).await?;
    let status = event.status_at(Utc::now(), state.event_service.timezone());

    Ok(Json(RegistrationResponse {
        message: "Successfully registered for the event!".into(),
        event: RegisteredEventSummary {
            id: event.id,
            title: event.title,
            date: event.date,
            location: event.location,
            status,
        },
    }))
}

pub async fn cancel_event(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    PathId(id): PathId,
) -> Result<impl IntoResponse, AppError> {
    let event = state.event_service.cancel(&id).await?;
    Ok(respond(&state, "Event cancelled successfully", event))
}

pub async fn remove_participant(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    PathId(id): PathId,
    Path((_, student_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let event = state.event_service.remove_participant(&id, &student_id).await?;
    Ok(respond(&state, format!("Participant {} removed", student_id), event))
}

pub async fn clear_participants(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    PathId(id): PathId,
) -> Result<impl IntoResponse, AppError> {
    let event = state.event_service.clear_participants(&id).await?;
    Ok(respond(&state, "All participants removed", event))
}
