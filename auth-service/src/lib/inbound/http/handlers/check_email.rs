use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use crate::domain::identity::ports::IdentityServicePort;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::handlers::ApiSuccess;
use crate::inbound::http::router::AppState;

pub async fn check_email(
    State(state): State<AppState>,
    Json(body): Json<CheckEmailRequestBody>,
) -> Result<ApiSuccess<CheckEmailResponseData>, ApiError> {
    state
        .identity_service
        .check_email(&body.email)
        .await
        .map_err(ApiError::from)
        .map(|exists| ApiSuccess::new(StatusCode::OK, CheckEmailResponseData { exists }))
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckEmailRequestBody {
    email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckEmailResponseData {
    pub exists: bool,
}
