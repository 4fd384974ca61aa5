//! Database configuration.

use serde::Deserialize;

/// Connection-pool configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres DSN (`DATABASE_URL`).
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Acquire timeout in seconds.
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout: u64,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_acquire_timeout() -> u64 {
    30
}

impl DatabaseConfig {
    /// Build a config from `DATABASE_URL` and the optional
    /// `DB_MAX_CONNECTIONS` / `DB_MIN_CONNECTIONS` / `DB_ACQUIRE_TIMEOUT`
    /// variables.
    pub fn from_env() -> Result<Self, String> {
        let url = std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL is required".to_string())?;

        let read = |name: &str, default: u64| {
            std::env::var(name)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        };

        Ok(Self {
            url,
            max_connections: read("DB_MAX_CONNECTIONS", default_max_connections() as u64) as u32,
            min_connections: read("DB_MIN_CONNECTIONS", default_min_connections() as u64) as u32,
            acquire_timeout: read("DB_ACQUIRE_TIMEOUT", default_acquire_timeout()),
        })
    }

    /// Config with pool defaults for an explicit DSN.
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            acquire_timeout: default_acquire_timeout(),
        }
    }
}
