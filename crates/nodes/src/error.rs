//! Error type for node handlers.
//!
//! Handlers have two error channels: returning `Err(NodeError)` or a
//! `NodeResult` with failed status. The engine maps both into the same
//! persisted representation, so handlers pick whichever reads better.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    /// The sleep handler needs the precomputed default successor to build
    /// its resume callback; a sleep node without an outgoing default edge
    /// cannot be resumed.
    #[error("sleep node has no default successor to resume into")]
    MissingSuccessor,

    /// Request or body serialization failed.
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("{0}")]
    Internal(String),
}
