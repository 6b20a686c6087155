use axum::{
    body::Body,
    extract::Request,
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{analytics, announcement, event, health, student};
use tower_http::{
    classify::ServerErrorsFailureClass,
    cors::CorsLayer,
    trace::TraceLayer,
};
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Events
        .route("/api/events", get(event::list_events).post(event::create_event))
        .route("/api/events/{id}", get(event::get_event).put(event::update_event).delete(event::delete_event))
        .route("/api/events/{id}/register", post(event::register_for_event))
        .route("/api/events/{id}/cancel", patch(event::cancel_event))
        .route("/api/events/{id}/participants", delete(event::clear_participants))
        .route("/api/events/{id}/participants/{student_id}", delete(event::remove_participant))

        // Students
        .route("/api/students/profile", get(student::get_profile).put(student::update_profile))
        .route("/api/students/registrations", get(student::list_registrations))

        // Admin
        .route("/api/admin/students", get(student::list_students))
        .route("/api/admin/students/{id}", get(student::get_student).put(student::update_student).delete(student::delete_student))

        // Announcements
        .route("/api/announcements", get(announcement::list_announcements).post(announcement::create_announcement))
        .route(
            "/api/announcements/{id}",
            get(announcement::get_announcement)
                .put(announcement::update_announcement)
                .delete(announcement::delete_announcement),
        )

        // Analytics
        .route("/api/analytics/dashboard", get(analytics::dashboard))
        .route("/api/analytics/registrations/recent", get(analytics::recent_registrations))
        .route("/api/analytics/events/popular", get(analytics::popular_events))
        .route("/api/analytics/events/upcoming", get(analytics::upcoming_events))
        .route("/api/analytics/students/engagement", get(analytics::student_engagement))
        .route("/api/analytics/monthly", get(analytics::monthly))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                        user_id = tracing::field::Empty,
                        role = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}
