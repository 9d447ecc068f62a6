pub mod change_email;
pub mod change_password;
pub mod check_email;
pub mod delete_profile;
pub mod login;
pub mod logout;
pub mod refresh;
pub mod register;

// Re-export handlers for easy access
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
pub use change_email::change_email;
pub use change_password::change_password;
pub use check_email::check_email;
use chrono::DateTime;
use chrono::Utc;
pub use delete_profile::delete_profile;
pub use login::login;
pub use logout::logout;
pub use refresh::refresh;
pub use register::register;
use serde::Serialize;
use thiserror::Error;

use crate::domain::identity::errors::AuthError;
use crate::domain::identity::models::MutationAck;
use crate::domain::identity::models::TokenPair;

/// Standardized API success response
#[derive(Debug, Clone)]
pub struct ApiSuccess<T: Serialize>(StatusCode, Json<T>);

impl<T: Serialize> ApiSuccess<T> {
    pub fn new(status: StatusCode, data: T) -> Self {
        ApiSuccess(status, Json(data))
    }
}

impl<T: Serialize> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::UnprocessableEntity(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(msg) => ApiError::UnprocessableEntity(msg),
            AuthError::InvalidCredentials => {
                ApiError::Unauthorized("Invalid credentials".to_string())
            }
            AuthError::InvalidOrExpiredToken => {
                ApiError::Unauthorized("Invalid or expired refresh token".to_string())
            }
            AuthError::Forbidden(msg) => ApiError::Forbidden(msg),
            AuthError::NotFound(what) => ApiError::NotFound(format!("{} not found", what)),
            AuthError::Conflict(msg) => ApiError::Conflict(msg),
            AuthError::Failure(msg) => ApiError::InternalServerError(msg),
        }
    }
}

/// Response body carrying a freshly issued token pair.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPairData {
    pub access_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_token: String,
    pub refresh_expires_at: DateTime<Utc>,
}

impl From<&TokenPair> for TokenPairData {
    fn from(pair: &TokenPair) -> Self {
        Self {
            access_token: pair.access_token.clone(),
            access_expires_at: pair.access_expires_at,
            refresh_token: pair.refresh_token.to_string(),
            refresh_expires_at: pair.refresh_expires_at,
        }
    }
}

/// Response body for credential and profile mutations.
#[derive(Debug, Clone, Serialize)]
pub struct MutationAckData {
    pub message: String,
    pub sessions_revoked: bool,
}

impl From<&MutationAck> for MutationAckData {
    fn from(ack: &MutationAck) -> Self {
        Self {
            message: ack.message.clone(),
            sessions_revoked: ack.sessions_revoked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_success_carries_its_status_code() {
        let response =
            ApiSuccess::new(StatusCode::CREATED, serde_json::json!({"id": 1})).into_response();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response =
            ApiSuccess::new(StatusCode::OK, serde_json::json!({"id": 1})).into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_auth_error_maps_to_expected_status() {
        let cases = [
            (AuthError::Validation("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (AuthError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AuthError::InvalidOrExpiredToken, StatusCode::UNAUTHORIZED),
            (AuthError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (AuthError::NotFound("User".into()), StatusCode::NOT_FOUND),
            (AuthError::Conflict("x".into()), StatusCode::CONFLICT),
            (AuthError::Failure("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }
}
