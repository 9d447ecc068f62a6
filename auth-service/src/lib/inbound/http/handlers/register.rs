use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::domain::identity::models::RegisterCommand;
use crate::domain::identity::ports::IdentityServicePort;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::handlers::ApiSuccess;
use crate::inbound::http::handlers::TokenPairData;
use crate::inbound::http::router::AppState;

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequestBody>,
) -> Result<ApiSuccess<TokenPairData>, ApiError> {
    state
        .identity_service
        .register(RegisterCommand {
            email: body.email,
            password: body.password,
            display_name: body.display_name,
        })
        .await
        .map_err(ApiError::from)
        .map(|ref pair| ApiSuccess::new(StatusCode::CREATED, pair.into()))
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequestBody {
    email: String,
    password: String,
    display_name: String,
}
