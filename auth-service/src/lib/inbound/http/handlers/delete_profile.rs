use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;

use crate::domain::identity::models::CurrentUser;
use crate::domain::identity::ports::IdentityServicePort;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::handlers::ApiSuccess;
use crate::inbound::http::handlers::MutationAckData;
use crate::inbound::http::router::AppState;

pub async fn delete_profile(
    State(state): State<AppState>,
    Extension(caller): Extension<CurrentUser>,
) -> Result<ApiSuccess<MutationAckData>, ApiError> {
    state
        .identity_service
        .delete_profile(&caller)
        .await
        .map_err(ApiError::from)
        .map(|ref ack| ApiSuccess::new(StatusCode::OK, ack.into()))
}
