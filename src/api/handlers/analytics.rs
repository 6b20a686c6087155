use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use crate::api::dtos::responses::{AnalyticsEventsResponse, RecentRegistrationsResponse};
use crate::api::extractors::auth::AdminUser;
use crate::error::AppError;
use crate::state::AppState;

const RECENT_REGISTRATIONS_LIMIT: i64 = 10;
const POPULAR_EVENTS_LIMIT: i64 = 5;
const MAX_LIMIT: i64 = 100;

/// Query strings are read leniently: anything that is not a positive number falls back to the default.
#[derive(Deserialize, Default)]
pub struct AnalyticsQuery {
    pub limit: Option<String>,
    pub year: Option<String>,
}

impl AnalyticsQuery {
    fn limit_or(&self, default: i64) -> i64 {
        self.limit
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|n| *n > 0)
            .map_or(default, |n| n.min(MAX_LIMIT))
    }
}

pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.analytics_service.dashboard(Utc::now()).await?))
}

pub async fn recent_registrations(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(query): Query<AnalyticsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let registrations = state
        .analytics_service
        .recent_registrations(query.limit_or(RECENT_REGISTRATIONS_LIMIT))
        .await?;
    Ok(Json(RecentRegistrationsResponse { count: registrations.len(), registrations }))
}

pub async fn popular_events(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(query): Query<AnalyticsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let limit = query.limit_or(POPULAR_EVENTS_LIMIT) as usize;
    let events = state.analytics_service.popular_events(limit, Utc::now()).await?;
    Ok(Json(AnalyticsEventsResponse::from(events)))
}

pub async fn upcoming_events(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Result<impl IntoResponse, AppError> {
    let events = state.analytics_service.upcoming_events(Utc::now()).await?;
    Ok(Json(AnalyticsEventsResponse::from(events)))
}

pub async fn student_engagement(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.analytics_service.student_engagement().await?))
}

pub async fn monthly(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(query): Query<AnalyticsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let year = query
        .year
        .as_deref()
        .and_then(|raw| raw.trim().parse::<i32>().ok())
        .unwrap_or_else(|| state.analytics_service.current_year(Utc::now()));
    Ok(Json(state.analytics_service.monthly(year).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(limit: &str) -> AnalyticsQuery {
        AnalyticsQuery { limit: Some(limit.to_string()), year: None }
    }

    #[test]
    fn limit_falls_back_and_caps() {
        assert_eq!(AnalyticsQuery::default().limit_or(5), 5);
        assert_eq!(query("abc").limit_or(5), 5);
        assert_eq!(query("0").limit_or(5), 5);
        assert_eq!(query(" 3 ").limit_or(5), 3);
        assert_eq!(query("5000").limit_or(5), MAX_LIMIT);
    }
}
