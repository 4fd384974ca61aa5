//! Schemaflow execution engine.
//!
//! This crate owns everything between the queue and the database:
//!
//! - **Persistence**: connection pool, row models and queries for the
//!   `schemaflow` tables (executions, execution_state, execution_steps,
//!   schemas)
//! - **Graph**: the schema-definition shape and the edge resolver
//! - **Queue**: the work-item message and its JetStream publisher
//! - **Executor**: the step-at-a-time interpreter that turns one queue
//!   message into one committed step
//!
//! All state mutations for one step happen inside a single database
//! transaction so the step row, the state upsert and the execution-row
//! update are atomic.

pub mod config;
pub mod db;
pub mod error;
pub mod executor;
pub mod graph;
pub mod queue;

pub use config::DatabaseConfig;
pub use error::EngineError;
pub use executor::{Engine, StepOutcome};
pub use graph::{Edge, SchemaDefinition};
pub use queue::{ExecutionMessage, QueueError, QueuePublisher};
