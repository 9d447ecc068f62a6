use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Deserialize;

use crate::domain::identity::models::ChangePasswordCommand;
use crate::domain::identity::models::CurrentUser;
use crate::domain::identity::ports::IdentityServicePort;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::handlers::ApiSuccess;
use crate::inbound::http::handlers::MutationAckData;
use crate::inbound::http::router::AppState;

pub async fn change_password(
    State(state): State<AppState>,
    Extension(caller): Extension<CurrentUser>,
    Json(body): Json<ChangePasswordRequestBody>,
) -> Result<ApiSuccess<MutationAckData>, ApiError> {
    state
        .identity_service
        .change_password(
            ChangePasswordCommand {
                current_password: body.current_password,
                new_password: body.new_password,
            },
            &caller,
        )
        .await
        .map_err(ApiError::from)
        .map(|ref ack| ApiSuccess::new(StatusCode::OK, ack.into()))
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangePasswordRequestBody {
    current_password: String,
    new_password: String,
}
