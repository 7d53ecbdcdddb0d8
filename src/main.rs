// src/main.rs
use axum::{extract::Extension, middleware, Router};
use dotenv::dotenv;
use reqwest::Client;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::collections::HashSet;
use std::env;
use std::path::PathBuf;
use std::{net::SocketAddr, str::FromStr, sync::Arc};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// ============================================================================
// MODULE IMPORTS
// ============================================================================

mod admin;
mod applications;
mod auth;
mod common;
mod documents;
mod logging_middleware;
mod mentor;
mod profile;
mod rate_limit_middleware;
mod services;

// ============================================================================
// COMMON IMPORTS
// ============================================================================

use common::dev_mode::{apply_cli_override, print_dev_mode_status, DevModeConfig};
use common::AppState;
use rate_limit_middleware::rate_limit_middleware;
use services::{OpenAIService, RateLimitService, SettingsService};

// ============================================================================
// MAIN APPLICATION ENTRY POINT
// ============================================================================

fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // Sentry wants to initialize before the async runtime starts; the
    // guard must outlive the runtime to flush remaining events
    let _sentry_guard = env::var("SENTRY_DSN")
        .ok()
        .filter(|dsn| !dsn.trim().is_empty())
        .map(|dsn| {
            sentry::init((
                dsn,
                sentry::ClientOptions {
                    release: sentry::release_name!(),
                    ..Default::default()
                },
            ))
        });

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(sentry_tracing::layer())
        .init();

    if _sentry_guard.is_some() {
        info!("Sentry error reporting enabled");
    }

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run())
}

async fn run() -> anyhow::Result<()> {
    // ========================================================================
    // ENVIRONMENT CONFIGURATION
    // ========================================================================

    let database_url =
        env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://careerdesk.db".to_string());
    let documents_dir = env::var("DOCUMENTS_DIR").unwrap_or_else(|_| "./documents".to_string());
    let jwt_secret =
        env::var("JWT_SECRET").unwrap_or_else(|_| "replace_with_strong_secret".to_string());
    let google_client_id = env::var("GOOGLE_CLIENT_ID").ok();
    let invite_only = env::var("INVITE_ONLY")
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false);

    // Parse admin emails from comma-separated env var
    let admin_emails: HashSet<String> = env::var("ADMIN_EMAILS")
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();

    info!(count = admin_emails.len(), "Loaded admin emails");

    // ========================================================================
    // DEV MODE CONFIGURATION
    // ========================================================================

    let dev_mode = apply_cli_override(DevModeConfig::from_env());
    print_dev_mode_status(&dev_mode);

    // ========================================================================
    // DIRECTORY SETUP
    // ========================================================================

    tokio::fs::create_dir_all(&documents_dir).await?;

    // ========================================================================
    // DATABASE SETUP
    // ========================================================================

    if let Some(path_part) = database_url.strip_prefix("sqlite://") {
        let path_without_params = path_part.split('?').next().unwrap_or("");
        if !path_without_params.is_empty() && !path_without_params.starts_with(':') {
            let db_path = PathBuf::from(path_without_params);
            if let Some(parent) = db_path.parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }
        }
    }

    let connect_options = SqliteConnectOptions::from_str(&database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .connect_with(connect_options)
        .await?;

    // Run database migrations
    common::migrations::run_migrations(&pool).await?;

    // ========================================================================
    // SERVICE INITIALIZATION
    // ========================================================================

    let http_client = Client::builder()
        .timeout(std::time::Duration::from_secs(120))
        .build()?;

    let settings_service = Arc::new(SettingsService::new(pool.clone()));
    info!("SettingsService initialized");

    let openai_service = Arc::new(OpenAIService::new(settings_service.clone()));
    info!("OpenAIService initialized");

    let rate_limit_service = Arc::new(RateLimitService::new());
    info!("RateLimitService initialized");

    // Periodically drop stale rate-limit windows so the map stays bounded
    let cleanup_service = rate_limit_service.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(600));
        loop {
            interval.tick().await;
            cleanup_service.cleanup_expired().await;
        }
    });

    // ========================================================================
    // APPLICATION STATE
    // ========================================================================

    let app_state = AppState {
        db: pool,
        documents_dir: PathBuf::from(documents_dir),
        http: http_client,
        jwt_secret,
        google_client_id,
        admin_emails,
        invite_only,
        dev_mode,
        settings_service,
        openai_service,
        rate_limit_service: rate_limit_service.clone(),
    };

    let shared = Arc::new(RwLock::new(app_state));

    // ========================================================================
    // ROUTER COMPOSITION
    // ========================================================================

    let app = Router::new()
        .merge(auth::auth_routes())
        .merge(profile::profile_routes())
        .merge(documents::document_routes())
        .merge(applications::application_routes())
        .merge(mentor::mentor_routes())
        .merge(admin::admin_routes())
        // Add request/response body logging in debug mode
        .layer(middleware::from_fn(logging_middleware::log_request_response))
        .layer(middleware::from_fn(rate_limit_middleware))
        .layer(Extension(rate_limit_service))
        .layer(Extension(shared.clone()))
        .layer({
            // Get CORS origins from environment variable
            let cors_origins = std::env::var("CORS_ORIGINS").unwrap_or_else(|_| {
                "http://localhost:3000,http://localhost:5173".to_string()
            });

            let origins: Vec<axum::http::HeaderValue> = cors_origins
                .split(',')
                .filter_map(|origin| origin.trim().parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::PUT,
                    axum::http::Method::DELETE,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::CONTENT_TYPE,
                    axum::http::header::AUTHORIZATION,
                ])
                .allow_credentials(true)
        })
        .layer(TraceLayer::new_for_http());

    // ========================================================================
    // SERVER STARTUP
    // ========================================================================

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
