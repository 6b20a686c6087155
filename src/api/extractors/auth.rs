use axum::{
    extract::{FromRequestParts, FromRef},
    http::{header::AUTHORIZATION, request::Parts},
};
use crate::state::AppState;
use crate::domain::models::auth::{Claims, Role};
use crate::domain::models::student::Student;
use crate::error::AppError;
use std::sync::Arc;
use jsonwebtoken::{decode, DecodingKey, Validation, Algorithm};
use tracing::Span;

/// A request carrying a valid admin token.
pub struct AdminUser(pub Claims);

/// A request carrying a valid student token whose subject still exists.
pub struct StudentUser(pub Student);

fn bearer_claims(parts: &Parts, secret: &str) -> Result<Claims, AppError> {
    let header = parts.headers.get(AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("Authentication required".into()))?
        .to_str()
        .map_err(|_| AppError::Unauthorized("Malformed Authorization header".into()))?;

    let token = header.strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Authentication required".into()))?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
        .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;

    let span = Span::current();
    span.record("user_id", token_data.claims.sub.as_str());
    span.record("role", token_data.claims.role.as_str());

    Ok(token_data.claims)
}

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);
        let claims = bearer_claims(parts, &app_state.config.jwt_secret)?;

        if claims.role != Role::Admin {
            return Err(AppError::Forbidden("Admin access required".into()));
        }
        Ok(AdminUser(claims))
    }
}

impl<S> FromRequestParts<S> for StudentUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);
        let claims = bearer_claims(parts, &app_state.config.jwt_secret)?;

        if claims.role != Role::Student {
            return Err(AppError::Forbidden("Student access required".into()));
        }

        let student = app_state.student_repo.find_by_id(&claims.sub).await?
            .ok_or_else(|| AppError::Unauthorized("Unauthorized".into()))?;
        Ok(StudentUser(student))
    }
}
