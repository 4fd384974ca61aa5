//! Schemaflow server library.
//!
//! A thin HTTP surface over the persistence layer and the work queue:
//! trigger new executions, report status and step history, accept the
//! Timer Service's resume callback, and stop runs. Schema CRUD and user
//! management live elsewhere; this server only reads schemas.

pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

pub use config::ServerConfig;
pub use error::{AppError, AppResult};
pub use state::AppState;
