use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use std::collections::HashMap;
use uuid::Uuid;
use crate::error::AppError;

/// The `{id}` path segment, rejected unless it is a UUID.
pub struct PathId(pub String);

impl<S> FromRequestParts<S> for PathId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let params: Path<HashMap<String, String>> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::Validation("Invalid ID format".into()))?;

        let raw = params.get("id").ok_or_else(|| AppError::Validation("Invalid ID format".into()))?;

        let id = Uuid::parse_str(raw).map_err(|_| AppError::Validation("Invalid ID format".into()))?;
        Ok(PathId(id.to_string()))
    }
}
