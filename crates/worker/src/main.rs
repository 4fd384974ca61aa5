//! Schemaflow worker binary.
//!
//! Consumes the work queue and executes one node per message.

use anyhow::Result;
use schemaflow_engine::{db, DatabaseConfig, Engine, QueuePublisher};
use schemaflow_nodes::{default_registry, SleepSettings};
use schemaflow_worker::{Dispatcher, QueueSubscriber, WorkerConfig};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    tracing::info!("starting schemaflow worker");

    let config = WorkerConfig::from_env()?;
    tracing::info!(
        nats_url = %config.nats_url,
        stream = %config.nats_stream,
        consumer = %config.nats_consumer,
        "worker configuration loaded"
    );

    let pool = db::create_pool(&DatabaseConfig::with_url(&config.database_url)).await?;

    let registry = Arc::new(default_registry(SleepSettings {
        scheduler_url: config.at_scheduler_url.clone(),
        execution_base_url: config.url_execution.clone(),
        continue_token: config.continue_token.clone(),
    }));
    let engine = Engine::new(pool, registry, config.max_steps);

    let subscriber =
        QueueSubscriber::connect(&config.nats_url, &config.nats_stream, &config.nats_consumer)
            .await?;
    let publisher =
        QueuePublisher::connect(&config.nats_url, Some(config.nats_stream.as_str()), None).await?;

    let dispatcher = Dispatcher::new(subscriber, publisher, engine);

    let shutdown = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C handler");
        tracing::info!("shutdown signal received");
    };

    tokio::select! {
        result = dispatcher.run() => {
            if let Err(err) = result {
                tracing::error!(error = %err, "dispatcher error");
                return Err(err);
            }
        }
        _ = shutdown => {
            tracing::info!("shutting down worker");
        }
    }

    tracing::info!("worker stopped");
    Ok(())
}

fn init_tracing() {
    let default_filter = match std::env::var("LOG_LEVEL").as_deref() {
        Ok(level) => format!("{level},schemaflow_worker=debug"),
        Err(_) => "info,schemaflow_worker=debug".to_string(),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
