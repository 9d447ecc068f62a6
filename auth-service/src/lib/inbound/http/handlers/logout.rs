use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::domain::identity::models::CurrentUser;
use crate::domain::identity::models::LogoutAck;
use crate::domain::identity::models::LogoutCommand;
use crate::domain::identity::models::LogoutScope;
use crate::domain::identity::ports::IdentityServicePort;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::handlers::ApiSuccess;
use crate::inbound::http::router::AppState;

pub async fn logout(
    State(state): State<AppState>,
    Extension(caller): Extension<CurrentUser>,
    Json(body): Json<LogoutRequestBody>,
) -> Result<ApiSuccess<LogoutResponseData>, ApiError> {
    state
        .identity_service
        .logout(
            LogoutCommand {
                refresh_token: body.refresh_token,
                all_devices: body.all_devices,
            },
            &caller,
        )
        .await
        .map_err(ApiError::from)
        .map(|ref ack| ApiSuccess::new(StatusCode::OK, ack.into()))
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogoutRequestBody {
    refresh_token: Option<String>,
    #[serde(default)]
    all_devices: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogoutResponseData {
    pub scope: String,
    pub at: DateTime<Utc>,
}

impl From<&LogoutAck> for LogoutResponseData {
    fn from(ack: &LogoutAck) -> Self {
        Self {
            scope: match ack.scope {
                LogoutScope::Current => "current".to_string(),
                LogoutScope::All => "all".to_string(),
            },
            at: ack.at,
        }
    }
}
