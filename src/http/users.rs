//! User endpoints.
//!
//! Stub handlers: no persistence, fixed identifiers. They exist to exercise
//! the pipeline end to end (validation, error envelope, tracing, metrics).

use axum::{extract::Path, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::http::request::{CorrelationId, FieldError, Rules, Validate, ValidatedJson};
use crate::http::response::ApiError;

/// Identifier assigned to every created user.
pub const STUB_USER_ID: &str = "123e4567-e89b-12d3-a456-426614174000";

/// Body of `POST /api/v1/users`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserPayload {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl Validate for CreateUserPayload {
    fn validate(body: &Value) -> Vec<FieldError> {
        Rules::new(body)
            .string("name", 1)
            .email("email")
            .string("password", 8)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub async fn create_user(
    correlation_id: CorrelationId,
    ValidatedJson(payload): ValidatedJson<CreateUserPayload>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    tracing::debug!(%correlation_id, email = %payload.email, "Creating user");

    let now = Utc::now();
    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            id: STUB_USER_ID.to_owned(),
            name: payload.name,
            email: payload.email,
            created_at: now,
            updated_at: now,
        }),
    ))
}

pub async fn get_user_by_id(Path(id): Path<String>) -> Result<Json<UserResponse>, ApiError> {
    let now = Utc::now();
    Ok(Json(UserResponse {
        id,
        name: "John Doe".to_owned(),
        email: "john.doe@example.com".to_owned(),
        created_at: now,
        updated_at: now,
    }))
}
