//! Shared application state.

use schemaflow_engine::{db::DbPool, QueuePublisher};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub publisher: QueuePublisher,

    /// Shared secret the Timer Service presents on resume callbacks.
    pub continue_token: Option<String>,
}

impl AppState {
    pub fn new(pool: DbPool, publisher: QueuePublisher, continue_token: Option<String>) -> Self {
        Self {
            pool,
            publisher,
            continue_token,
        }
    }
}
