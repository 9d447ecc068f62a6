use auth::AccessClaims;
use axum::extract::Request;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::{self};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use serde_json::json;
use uuid::Uuid;

use crate::domain::identity::models::CurrentUser;
use crate::inbound::http::router::AppState;
use crate::user::models::UserId;

/// Middleware that validates the bearer token and stores the caller identity
/// and raw claims in request extensions.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_token_from_header(&req)?;

    let claims: AccessClaims = state.jwt.decode(token).map_err(|e| {
        tracing::warn!("JWT validation failed: {}", e);
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "Invalid or expired token"
            })),
        )
            .into_response()
    })?;

    let caller = caller_from_claims(&claims).map_err(|e| {
        tracing::error!("Malformed token claims: {}", e);
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "Invalid token format"
            })),
        )
            .into_response()
    })?;

    req.extensions_mut().insert(caller);
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Middleware that attaches the caller identity when a genuine bearer token
/// is present but lets the request through anonymously otherwise.
///
/// Used on the refresh route: the access token that accompanies a rotation is
/// usually already expired, so only the signature is verified before its
/// subject and pairing key are handed to the ownership checks.
pub async fn maybe_authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    if let Ok(token) = extract_token_from_header(&req) {
        if let Ok(claims) = state.jwt.decode_allow_expired::<AccessClaims>(token) {
            if let Ok(caller) = caller_from_claims(&claims) {
                req.extensions_mut().insert(caller);
                req.extensions_mut().insert(claims);
            }
        }
    }

    next.run(req).await
}

/// Middleware that requires a permission code on the already-authenticated
/// caller's claims. Must run after `authenticate`.
pub async fn require_permission(
    State((state, code)): State<(AppState, &'static str)>,
    req: Request,
    next: Next,
) -> Result<Response, Response> {
    let claims = req.extensions().get::<AccessClaims>().ok_or_else(|| {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "Authentication required"
            })),
        )
            .into_response()
    })?;

    state.policies.authorize(claims, code).map_err(|e| {
        (
            StatusCode::FORBIDDEN,
            Json(json!({
                "error": e.to_string()
            })),
        )
            .into_response()
    })?;

    Ok(next.run(req).await)
}

fn caller_from_claims(claims: &AccessClaims) -> Result<CurrentUser, String> {
    let user_id = UserId::from_string(&claims.sub).map_err(|e| e.to_string())?;

    Ok(CurrentUser {
        user_id,
        // A missing or malformed pairing key downgrades the refresh pairing
        // check rather than rejecting the request
        jti: Uuid::parse_str(&claims.jti).ok(),
        display_name: claims.username.clone(),
    })
}

fn extract_token_from_header(req: &Request) -> Result<&str, Response> {
    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "Missing Authorization header"
                })),
            )
                .into_response()
        })?;

    let auth_str = auth_header.to_str().map_err(|_| {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "Invalid Authorization header"
            })),
        )
            .into_response()
    })?;

    if !auth_str.starts_with("Bearer ") {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "Invalid Authorization header format. Expected: Bearer <token>"
            })),
        )
            .into_response());
    }

    Ok(auth_str.trim_start_matches("Bearer "))
}
