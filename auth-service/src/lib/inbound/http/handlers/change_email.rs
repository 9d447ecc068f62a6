use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Deserialize;

use crate::domain::identity::models::ChangeEmailCommand;
use crate::domain::identity::models::CurrentUser;
use crate::domain::identity::ports::IdentityServicePort;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::handlers::ApiSuccess;
use crate::inbound::http::handlers::MutationAckData;
use crate::inbound::http::router::AppState;

pub async fn change_email(
    State(state): State<AppState>,
    Extension(caller): Extension<CurrentUser>,
    Json(body): Json<ChangeEmailRequestBody>,
) -> Result<ApiSuccess<MutationAckData>, ApiError> {
    state
        .identity_service
        .change_email(
            ChangeEmailCommand {
                new_email: body.new_email,
                password: body.password,
            },
            &caller,
        )
        .await
        .map_err(ApiError::from)
        .map(|ref ack| ApiSuccess::new(StatusCode::OK, ack.into()))
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangeEmailRequestBody {
    new_email: String,
    password: String,
}
