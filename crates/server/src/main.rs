//! Summit server - conference registration and community site.
//!
//! This binary serves the public site, member dashboard, admin dashboard,
//! and the `/api` procedure layer on port 3000.
//!
//! # Architecture
//!
//! - Axum web framework with Askama templates for server-rendered pages
//! - External identity provider for sign-in (resolved per request)
//! - `PostgreSQL` for the member mirror, comments, and reports
//! - Moka cache for the interactive session-resolution entry point

#![cfg_attr(not(test), forbid(unsafe_code))]

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Router, routing::get};
use sentry::integrations::tracing as sentry_tracing;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use summit_server::config::ServerConfig;
use summit_server::state::AppState;
use summit_server::{db, routes};

#[tokio::main]
async fn main() {
    let config = ServerConfig::from_env().expect("configuration error");

    // Sentry comes up first; the tracing registry hooks into it below.
    let _sentry_guard = init_sentry(&config);
    init_tracing();

    let pool = db::create_pool(&config.database_url)
        .await
        .expect("database pool error");
    tracing::info!("database pool ready");

    // Migrations are applied out of band: `cargo run -p summit-cli -- migrate`.

    let state = AppState::new(config.clone(), pool);
    let app = router(state);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("bind error");
    tracing::info!(%addr, "summit-server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

/// Initialize Sentry when a DSN is configured.
///
/// The returned guard flushes pending events on drop and must outlive the
/// server loop.
fn init_sentry(config: &ServerConfig) -> Option<sentry::ClientInitGuard> {
    config.sentry_dsn.as_deref().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                environment: config.sentry_environment.clone().map(Into::into),
                sample_rate: config.sentry_sample_rate,
                traces_sample_rate: config.sentry_traces_sample_rate,
                attach_stacktrace: true,
                ..Default::default()
            },
        ))
    })
}

/// Tracing registry: env filter, fmt output, and the Sentry bridge.
///
/// WARN/ERROR events are forwarded to Sentry as events, INFO/DEBUG become
/// breadcrumbs on whatever event follows them.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "summit_server=info,tower_http=debug".into());

    let sentry_layer = sentry_tracing::layer().event_filter(|metadata| match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_layer)
        .init();
}

/// Assemble the application router: probes, pages, procedures.
fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        // Sentry hub + transaction layers sit outside the trace layer.
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness probe; answers without touching dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness probe; verifies the database can be reached.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    if sqlx::query("SELECT 1").fetch_one(state.pool()).await.is_ok() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// Resolve when the process is asked to stop (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut terminate = signal(SignalKind::terminate()).expect("SIGTERM handler error");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = terminate.recv() => {}
        }
    }

    #[cfg(not(unix))]
    tokio::signal::ctrl_c().await.ok();

    tracing::info!("shutdown signal received, draining connections");
}
