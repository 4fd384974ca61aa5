//! Schemaflow server binary.
//!
//! Serves the trigger/callback API over the persistence layer and work
//! queue.

use anyhow::Result;
use axum::routing::{get, post};
use axum::Router;
use schemaflow_engine::{db, DatabaseConfig, QueuePublisher};
use schemaflow_server::{handlers, AppState, ServerConfig};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    tracing::info!("starting schemaflow server");

    let config = ServerConfig::from_env()?;

    let pool = db::create_pool(&DatabaseConfig::with_url(&config.database_url)).await?;
    let publisher =
        QueuePublisher::connect(&config.nats_url, Some(config.nats_stream.as_str()), None).await?;

    let state = AppState::new(pool, publisher, config.continue_token.clone());
    let app = build_router(state);

    let listener = TcpListener::bind(config.bind_address()).await?;
    tracing::info!(address = %config.bind_address(), "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/executions", post(handlers::executions::create))
        .route("/api/executions", get(handlers::executions::list))
        .route("/api/executions/:execution_id", get(handlers::executions::get))
        .route(
            "/api/executions/:execution_id/steps",
            get(handlers::executions::steps),
        )
        .route(
            "/api/executions/:execution_id/:node_id/continue",
            post(handlers::executions::continue_execution),
        )
        .route(
            "/api/executions/:execution_id/stop",
            post(handlers::executions::stop),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install CTRL+C handler");
    tracing::info!("shutdown signal received");
}

fn init_tracing() {
    let default_filter = match std::env::var("LOG_LEVEL").as_deref() {
        Ok(level) => format!("{level},schemaflow_server=debug,tower_http=debug"),
        Err(_) => "info,schemaflow_server=debug,tower_http=debug".to_string(),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
