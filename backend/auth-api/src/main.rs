use actix_cors::Cors;
use actix_web::{http::header, middleware::Logger, web, App, HttpServer};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::prelude::*;

use auth_api::config::{CorsSettings, Settings};
use auth_api::context::RequestContextBuilder;
use auth_api::db::{self, PgFailedAttemptRepository, PgSessionRepository, PgUserRepository};
use auth_api::http::{self as routes, AppState};
use auth_api::schema::build_schema;
use auth_api::security::{PasswordHasher, TokenService};
use auth_api::services::AuthService;

#[actix_web::main]
async fn main() -> Result<()> {
    let settings = Settings::load().context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| settings.log_level.as_str().into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_target(true),
        )
        .init();

    info!("Starting auth-api...");

    let pool = db::connect(&settings.database).await?;
    db::check_connection(&pool).await?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;
    info!(
        max_connections = settings.database.max_connections,
        "Database ready"
    );

    let tokens = Arc::new(TokenService::new(
        &settings.security.jwt_secret,
        settings.security.jwt_expires_in,
    ));
    let auth = Arc::new(AuthService::new(
        Arc::new(PgUserRepository::new(pool.clone())),
        Arc::new(PgSessionRepository::new(pool.clone())),
        Arc::new(PgFailedAttemptRepository::new(pool)),
        PasswordHasher::new(settings.security.bcrypt_cost),
        Arc::clone(&tokens),
    )?);

    let state = AppState {
        schema: build_schema(auth),
        contexts: RequestContextBuilder::new(tokens),
    };

    let bind_addr = settings.server.bind_addr();
    info!("auth-api listening on http://{}/graphql", bind_addr);

    let cors_settings = settings.cors.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(cors(&cors_settings))
            .app_data(web::Data::new(state.clone()))
            .configure(routes::configure)
    })
    .bind(&bind_addr)
    .with_context(|| format!("Failed to bind {}", bind_addr))?
    .run()
    .await?;

    info!("auth-api stopped");
    Ok(())
}

fn cors(settings: &CorsSettings) -> Cors {
    settings
        .allowed_origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_headers(vec![
            header::HeaderName::from_static("sessionid"),
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
        ])
        .supports_credentials()
        .max_age(3600)
}
