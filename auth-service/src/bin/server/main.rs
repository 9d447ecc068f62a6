use std::sync::Arc;

use anyhow::Error;
use auth::JwtHandler;
use auth_service::config::Config;
use auth_service::domain::authorize::PolicyResolver;
use auth_service::domain::identity::service::IdentityService;
use auth_service::domain::identity::token::TokenIssuer;
use auth_service::domain::identity::token::TokenOptions;
use auth_service::inbound::http::create_router;
use auth_service::outbound::repositories::permission::PostgresPermissionCatalog;
use auth_service::outbound::repositories::session::PostgresSessionStore;
use auth_service::outbound::repositories::user::PostgresUserRepository;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "auth_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "auth-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        database_url = %config.database.url,
        http_port = config.server.http_port,
        jwt_issuer = ?config.jwt.issuer,
        jwt_audience = ?config.jwt.audience,
        access_token_lifetime_minutes = config.jwt.access_token_lifetime_minutes,
        refresh_token_lifetime_days = config.jwt.refresh_token_lifetime_days,
        "Configuration loaded"
    );

    let pg_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = 5,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let mut jwt = JwtHandler::new(config.jwt.secret.as_bytes());
    if let Some(issuer) = &config.jwt.issuer {
        jwt = jwt.with_issuer(issuer);
    }
    if let Some(audience) = &config.jwt.audience {
        jwt = jwt.with_audience(audience);
    }
    let jwt = Arc::new(jwt);

    let user_repository = Arc::new(PostgresUserRepository::new(pg_pool.clone()));
    let session_store = Arc::new(PostgresSessionStore::new(pg_pool.clone()));
    let permission_catalog = Arc::new(PostgresPermissionCatalog::new(pg_pool));

    let token_issuer = TokenIssuer::new(
        Arc::clone(&jwt),
        Arc::clone(&session_store),
        permission_catalog,
        TokenOptions {
            issuer: config.jwt.issuer.clone(),
            audience: config.jwt.audience.clone(),
            access_lifetime_minutes: config.jwt.access_token_lifetime_minutes,
            refresh_lifetime_days: config.jwt.refresh_token_lifetime_days,
        },
    );

    let identity_service = Arc::new(IdentityService::new(
        user_repository,
        session_store,
        token_issuer,
    ));
    let policies = Arc::new(PolicyResolver::new());

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocols = "http",
        "Server Listening"
    );

    let application = create_router(identity_service, jwt, policies);

    axum::serve(listener, application).await?;

    Ok(())
}
