//! Server configuration.

use anyhow::{Context, Result};
use schemaflow_engine::queue;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub nats_url: String,
    pub nats_stream: String,
    pub continue_token: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").context("DATABASE_URL is required")?;

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let nats_url = std::env::var("NATS_URL")
            .unwrap_or_else(|_| "nats://localhost:4222".to_string());
        let nats_stream = std::env::var("NATS_STREAM")
            .unwrap_or_else(|_| queue::DEFAULT_STREAM.to_string());

        let continue_token = std::env::var("CONTINUE_TOKEN").ok().filter(|t| !t.is_empty());

        Ok(Self {
            host,
            port,
            database_url,
            nats_url,
            nats_stream,
            continue_token,
        })
    }

    /// Bind address for the TCP listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_address_joins_host_and_port() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 9000,
            database_url: String::new(),
            nats_url: String::new(),
            nats_stream: String::new(),
            continue_token: None,
        };
        assert_eq!(config.bind_address(), "127.0.0.1:9000");
    }
}
