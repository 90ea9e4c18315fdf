//! Service-layer error taxonomy.
//!
//! Input-validation and state-guard failures keep their specific kinds so
//! the command layer can offer the correct next action; infrastructure
//! failures collapse into the storage variants and are logged rather than
//! detailed to the caller.

use thiserror::Error;

use crate::{
    dao::storage::StorageError, services::draw::DrawError, state::lifecycle::TransitionError,
};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// No storage backend is installed (degraded mode).
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// No game exists under the given code.
    #[error("game `{0}` not found")]
    GameNotFound(String),
    /// Malformed input provided by the caller (name or code shape).
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// A lifecycle guard rejected the operation.
    #[error(transparent)]
    Transition(#[from] TransitionError),
    /// The assignment engine rejected the draw.
    #[error(transparent)]
    Draw(#[from] DrawError),
    /// Code generation kept colliding with existing games. Operational
    /// signal, not expected in practice.
    #[error("failed to allocate a unique game code after {attempts} attempts")]
    CodeSpaceExhausted {
        /// Number of generation attempts made.
        attempts: u32,
    },
    /// A concurrent update won the race for this game.
    #[error("conflicting concurrent update: {0}")]
    Conflict(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Conflict { message } => ServiceError::Conflict(message),
            StorageError::MissingGame { code } => ServiceError::GameNotFound(code),
            unavailable @ StorageError::Unavailable { .. } => {
                ServiceError::Unavailable(unavailable)
            }
        }
    }
}
