//! Schemaflow worker.
//!
//! Subscribes to the durable work queue and drives executions one step at
//! a time:
//!
//! 1. Receive an execution message (one in flight per worker)
//! 2. Invoke the engine, which commits exactly one step
//! 3. Publish the successor message, unless the node slept or terminated
//!
//! Engine errors are classified: transient failures are negatively
//! acknowledged for redelivery, permanent ones are terminated and logged.

pub mod config;
pub mod dispatcher;
pub mod subscriber;

pub use config::WorkerConfig;
pub use dispatcher::Dispatcher;
pub use subscriber::QueueSubscriber;
