//! Row models for the `schemaflow` tables.

pub mod execution;
pub mod schema;
pub mod state;
pub mod step;

pub use execution::{Execution, ExecutionGuard, ExecutionStatus, TriggerType};
pub use schema::{Schema, SchemaStatus};
pub use state::ExecutionStateRow;
pub use step::{ExecutionStep, StepStatus};
