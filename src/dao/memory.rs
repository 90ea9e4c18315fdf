use std::sync::Arc;

use dashmap::{DashMap, mapref::entry::Entry};
use futures::future::BoxFuture;
use time::OffsetDateTime;

use crate::{
    dao::{
        models::{AssignmentEntity, GameEntity, ParticipantEntity},
        storage::{GameStore, StorageError, StorageResult},
    },
    state::lifecycle::GameStage,
};

/// Everything a single game owns, kept behind one map entry so that every
/// multi-entity operation on the game is atomic under the entry lock.
#[derive(Debug, Clone)]
struct GameRecord {
    game: GameEntity,
    participants: Vec<ParticipantEntity>,
    assignments: Vec<AssignmentEntity>,
}

/// In-process [`GameStore`] backend keyed by game code.
///
/// Cheap to clone; clones share the same underlying map. Used as the
/// bundled backend and by tests; database-backed stores live behind the
/// same trait.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    games: Arc<DashMap<String, GameRecord>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of games currently held. Mostly useful to tests.
    pub fn game_count(&self) -> usize {
        self.games.len()
    }
}

impl GameStore for MemoryStore {
    fn insert_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<bool>> {
        let games = Arc::clone(&self.games);
        Box::pin(async move {
            match games.entry(game.code.clone()) {
                Entry::Occupied(_) => Ok(false),
                Entry::Vacant(slot) => {
                    slot.insert(GameRecord {
                        game,
                        participants: Vec::new(),
                        assignments: Vec::new(),
                    });
                    Ok(true)
                }
            }
        })
    }

    fn find_game(&self, code: String) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let games = Arc::clone(&self.games);
        Box::pin(async move { Ok(games.get(&code).map(|record| record.game.clone())) })
    }

    fn update_game(
        &self,
        game: GameEntity,
        expected_version: u64,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let games = Arc::clone(&self.games);
        Box::pin(async move {
            let mut record = games
                .get_mut(&game.code)
                .ok_or_else(|| StorageError::MissingGame {
                    code: game.code.clone(),
                })?;

            if record.game.version != expected_version {
                return Err(StorageError::conflict(format!(
                    "game `{}` was modified concurrently (expected version {expected_version}, found {})",
                    game.code, record.game.version
                )));
            }

            record.game = GameEntity {
                version: expected_version + 1,
                ..game
            };
            Ok(())
        })
    }

    fn delete_game(&self, code: String) -> BoxFuture<'static, StorageResult<bool>> {
        let games = Arc::clone(&self.games);
        Box::pin(async move { Ok(games.remove(&code).is_some()) })
    }

    fn add_participant(
        &self,
        code: String,
        participant: ParticipantEntity,
    ) -> BoxFuture<'static, StorageResult<usize>> {
        let games = Arc::clone(&self.games);
        Box::pin(async move {
            let mut record = games
                .get_mut(&code)
                .ok_or_else(|| StorageError::MissingGame { code: code.clone() })?;

            // Checked under the entry lock so a join racing a lock cannot
            // slip a participant into a frozen roster.
            if record.game.stage != GameStage::Open {
                return Err(StorageError::conflict(format!(
                    "game `{code}` is no longer open to new participants"
                )));
            }

            if record
                .participants
                .iter()
                .any(|existing| existing.name == participant.name)
            {
                return Err(StorageError::conflict(format!(
                    "participant `{}` already exists in game `{code}`",
                    participant.name
                )));
            }

            record.participants.push(participant);
            Ok(record.participants.len())
        })
    }

    fn list_participants(
        &self,
        code: String,
    ) -> BoxFuture<'static, StorageResult<Vec<ParticipantEntity>>> {
        let games = Arc::clone(&self.games);
        Box::pin(async move {
            let record = games
                .get(&code)
                .ok_or_else(|| StorageError::MissingGame { code })?;
            Ok(record.participants.clone())
        })
    }

    fn commit_draw(
        &self,
        code: String,
        assignments: Vec<AssignmentEntity>,
        expected_version: u64,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let games = Arc::clone(&self.games);
        Box::pin(async move {
            let mut record = games
                .get_mut(&code)
                .ok_or_else(|| StorageError::MissingGame { code: code.clone() })?;

            if record.game.version != expected_version {
                return Err(StorageError::conflict(format!(
                    "game `{code}` was modified concurrently (expected version {expected_version}, found {})",
                    record.game.version
                )));
            }

            record.assignments = assignments;
            record.game.stage = GameStage::Drawn;
            record.game.version = expected_version + 1;
            Ok(())
        })
    }

    fn list_assignments(
        &self,
        code: String,
    ) -> BoxFuture<'static, StorageResult<Vec<AssignmentEntity>>> {
        let games = Arc::clone(&self.games);
        Box::pin(async move {
            let record = games
                .get(&code)
                .ok_or_else(|| StorageError::MissingGame { code })?;
            Ok(record.assignments.clone())
        })
    }

    fn expired_games(
        &self,
        cutoff: OffsetDateTime,
    ) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let games = Arc::clone(&self.games);
        Box::pin(async move {
            let expired = games
                .iter()
                .filter(|record| {
                    record
                        .game
                        .expires_at
                        .is_some_and(|expires_at| expires_at <= cutoff)
                })
                .map(|record| record.game.clone())
                .collect();
            Ok(expired)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
