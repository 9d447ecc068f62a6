use std::sync::Arc;
use std::time::Duration;

use auth::JwtHandler;
use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::delete;
use axum::routing::post;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::change_email;
use super::handlers::change_password;
use super::handlers::check_email;
use super::handlers::delete_profile;
use super::handlers::login;
use super::handlers::logout;
use super::handlers::refresh;
use super::handlers::register;
use super::middleware as auth_middleware;
use crate::domain::authorize::PolicyResolver;
use crate::domain::identity::service::IdentityService;
use crate::outbound::repositories::permission::PostgresPermissionCatalog;
use crate::outbound::repositories::session::PostgresSessionStore;
use crate::outbound::repositories::user::PostgresUserRepository;

/// Permission gating the logout endpoint; granted to the default role.
pub const LOGOUT_PERMISSION: &str = "auth.service";

/// Unified application state for all HTTP handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub identity_service: Arc<
        IdentityService<PostgresUserRepository, PostgresSessionStore, PostgresPermissionCatalog>,
    >,
    pub jwt: Arc<JwtHandler>,
    pub policies: Arc<PolicyResolver>,
}

pub fn create_router(
    identity_service: Arc<
        IdentityService<PostgresUserRepository, PostgresSessionStore, PostgresPermissionCatalog>,
    >,
    jwt: Arc<JwtHandler>,
    policies: Arc<PolicyResolver>,
) -> Router {
    let state = AppState {
        identity_service,
        jwt,
        policies,
    };

    let public_routes = Router::new()
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/register", post(register))
        .route("/api/v1/auth/check-email", post(check_email));

    // Refresh is reachable without a bearer token, but a presented one binds
    // the rotation to the caller's identity.
    let refresh_routes = Router::new()
        .route("/api/v1/auth/refresh", post(refresh))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::maybe_authenticate,
        ));

    let logout_routes = Router::new()
        .route("/api/v1/auth/logout", post(logout))
        .route_layer(middleware::from_fn_with_state(
            (state.clone(), LOGOUT_PERMISSION),
            auth_middleware::require_permission,
        ));

    let protected_routes = Router::new()
        .merge(logout_routes)
        .route("/api/v1/account/change-password", post(change_password))
        .route("/api/v1/account/change-email", post(change_email))
        .route("/api/v1/account", delete(delete_profile))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::authenticate,
        ));

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
                headers = ?request.headers(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .merge(public_routes)
        .merge(refresh_routes)
        .merge(protected_routes)
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
