use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Deserialize;

use crate::domain::identity::models::CurrentUser;
use crate::domain::identity::models::RefreshCommand;
use crate::domain::identity::ports::IdentityServicePort;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::handlers::ApiSuccess;
use crate::inbound::http::handlers::TokenPairData;
use crate::inbound::http::router::AppState;

/// Rotate a token pair.
///
/// The caller extension is present only when the request carried a valid
/// bearer token; the service then enforces session ownership and pairing.
pub async fn refresh(
    State(state): State<AppState>,
    caller: Option<Extension<CurrentUser>>,
    Json(body): Json<RefreshRequestBody>,
) -> Result<ApiSuccess<TokenPairData>, ApiError> {
    state
        .identity_service
        .refresh(RefreshCommand {
            refresh_token: body.refresh_token,
            caller: caller.map(|Extension(caller)| caller),
        })
        .await
        .map_err(ApiError::from)
        .map(|ref pair| ApiSuccess::new(StatusCode::OK, pair.into()))
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshRequestBody {
    refresh_token: String,
}
