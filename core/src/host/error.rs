//! Error types for host operations

use thiserror::Error;

use super::ActorHandle;

/// Failure reported by (or about) the host simulation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HostError {
    #[error("actor {actor} no longer exists")]
    ActorGone { actor: ActorHandle },

    #[error("host rejected {operation} on actor {actor}: {reason}")]
    Rejected {
        actor: ActorHandle,
        operation: &'static str,
        reason: String,
    },

    #[error("spawn service rejected request: {reason}")]
    SpawnRejected { reason: String },
}
