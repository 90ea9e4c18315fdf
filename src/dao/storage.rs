use std::error::Error;

use futures::future::BoxFuture;
use thiserror::Error;
use time::OffsetDateTime;

use crate::dao::models::{AssignmentEntity, GameEntity, ParticipantEntity};

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached or failed mid-operation.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// Human-readable description of the failure.
        message: String,
        /// Underlying backend error.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A write lost an optimistic-concurrency race or hit a unique constraint.
    #[error("storage conflict: {message}")]
    Conflict {
        /// Human-readable description of the conflicting write.
        message: String,
    },
    /// The referenced game does not exist (or was deleted concurrently).
    #[error("game `{code}` not found in storage")]
    MissingGame {
        /// Code of the game that could not be found.
        code: String,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Construct a conflict error with the given description.
    pub fn conflict(message: impl Into<String>) -> Self {
        StorageError::Conflict {
            message: message.into(),
        }
    }
}

/// Abstraction over the persistence layer for games, participants, and
/// assignments.
///
/// Every method is atomic at the level it names: `commit_draw` flips the
/// stage to drawn and inserts all assignment rows as one unit, and
/// `delete_game` cascades to participants and assignments. Methods taking
/// an `expected_version` fail with [`StorageError::Conflict`] when the
/// persisted game has moved on, which is how racing lifecycle transitions
/// are prevented from losing updates.
pub trait GameStore: std::fmt::Debug + Send + Sync {
    /// Insert a fresh game. Returns `false` (without writing) when the code
    /// is already taken.
    fn insert_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<bool>>;

    /// Fetch a game by its (already normalised) code.
    fn find_game(&self, code: String) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;

    /// Replace a game record, guarded by its optimistic version counter.
    fn update_game(
        &self,
        game: GameEntity,
        expected_version: u64,
    ) -> BoxFuture<'static, StorageResult<()>>;

    /// Delete a game and everything it owns. Returns `false` when absent.
    fn delete_game(&self, code: String) -> BoxFuture<'static, StorageResult<bool>>;

    /// Append a participant to a game, returning the new participant count.
    /// Duplicate names within the game are rejected with a conflict, as is
    /// any game that is no longer open; the stage check and the append
    /// happen as one atomic operation.
    fn add_participant(
        &self,
        code: String,
        participant: ParticipantEntity,
    ) -> BoxFuture<'static, StorageResult<usize>>;

    /// List a game's participants in join order.
    fn list_participants(
        &self,
        code: String,
    ) -> BoxFuture<'static, StorageResult<Vec<ParticipantEntity>>>;

    /// Atomically replace the game's assignments with the given set and mark
    /// the game as drawn, guarded by the optimistic version counter.
    fn commit_draw(
        &self,
        code: String,
        assignments: Vec<AssignmentEntity>,
        expected_version: u64,
    ) -> BoxFuture<'static, StorageResult<()>>;

    /// List a game's assignment pairs in stored (cycle) order.
    fn list_assignments(
        &self,
        code: String,
    ) -> BoxFuture<'static, StorageResult<Vec<AssignmentEntity>>>;

    /// Range query: all games whose expiration instant is set and `<= cutoff`.
    fn expired_games(
        &self,
        cutoff: OffsetDateTime,
    ) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>>;

    /// Cheap liveness probe against the backend.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}
