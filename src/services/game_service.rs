//! Lifecycle operations on games: create, join, lock, unlock, draw, redraw,
//! export, delete, and the read-only info summary.
//!
//! Every operation reads the persisted game fresh, checks the lifecycle
//! guards, and commits the transition through the repository boundary.
//! Writes that flip lifecycle state carry the game's optimistic version so
//! a racing transition loses cleanly instead of clobbering the other.

use std::sync::Arc;

use serde::Serialize;
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::{
    dao::{
        models::{AssignmentEntity, GameEntity, ParticipantEntity, UserId},
        storage::{GameStore, StorageError},
    },
    error::ServiceError,
    services::{
        codes,
        draw::{self, Assignment},
    },
    state::{
        SharedState,
        lifecycle::{self, GameStage, LifecycleAction, TransitionError},
    },
};

/// Bounds on a participant's display name, in characters.
const MIN_NAME_LENGTH: usize = 2;
const MAX_NAME_LENGTH: usize = 50;

/// Outcome of [`create_game`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedGame {
    /// Freshly allocated unique game code.
    pub code: String,
    /// When the game will be purged automatically, if retention is enabled.
    #[serde(with = "time::serde::rfc3339::option")]
    pub expires_at: Option<OffsetDateTime>,
}

/// Read-only summary of a game, for the info command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameInfo {
    /// Game code.
    pub code: String,
    /// Current lifecycle stage.
    pub stage: GameStage,
    /// Creation instant.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Automatic purge instant, if any.
    #[serde(with = "time::serde::rfc3339::option")]
    pub expires_at: Option<OffsetDateTime>,
    /// Number of registered participants.
    pub participant_count: usize,
    /// Number of stored assignment pairs (zero until drawn).
    pub assignment_count: usize,
}

/// Allocate a fresh unique code and create an open game owned by `creator`.
///
/// The expiration instant is `now + retention window` when auto-purge is
/// enabled, otherwise the game never expires. Uniqueness is enforced by
/// retrying generation against the store up to a bounded attempt count.
pub async fn create_game(state: &SharedState, creator: UserId) -> Result<CreatedGame, ServiceError> {
    let store = state.store().await?;
    let config = state.config();

    let now = OffsetDateTime::now_utc();
    let expires_at = config
        .auto_purge_enabled()
        .then(|| now + config.retention_window());

    for attempt in 1..=codes::MAX_ALLOCATION_ATTEMPTS {
        let code = codes::generate(config.code_prefixes(), config.suffix_length());
        let game = GameEntity::new(code.clone(), creator, now, expires_at);

        if store.insert_game(game).await? {
            info!(%code, creator, attempt, "created game");
            return Ok(CreatedGame { code, expires_at });
        }
        debug!(%code, attempt, "game code collision; retrying");
    }

    Err(ServiceError::CodeSpaceExhausted {
        attempts: codes::MAX_ALLOCATION_ATTEMPTS,
    })
}

/// Register a participant under the game code. Returns the new participant
/// count. Legal only while the game is open; names are sanitised and must
/// be unique within the game.
pub async fn join_game(state: &SharedState, code: &str, name: &str) -> Result<usize, ServiceError> {
    let store = state.store().await?;
    let code = codes::normalize(code);
    let name = validate_name(name)?;

    let game = fetch_game(&store, &code).await?;
    lifecycle::next_stage(game.stage, LifecycleAction::Join)?;

    let participant = ParticipantEntity {
        name: name.clone(),
        joined_at: OffsetDateTime::now_utc(),
    };
    match store.add_participant(code.clone(), participant).await {
        Ok(count) => {
            info!(%code, %name, count, "participant joined");
            Ok(count)
        }
        // The store's checks are authoritative: a conflict is either a
        // duplicate name or a roster frozen since our snapshot. Re-read the
        // game to report the right one.
        Err(StorageError::Conflict { .. }) => {
            let current = fetch_game(&store, &code).await?;
            match lifecycle::next_stage(current.stage, LifecycleAction::Join) {
                Ok(_) => Err(TransitionError::DuplicateName(name).into()),
                Err(guard) => Err(guard.into()),
            }
        }
        Err(other) => Err(other.into()),
    }
}

/// Freeze the participant roster. Creator-only; requires the game to be
/// open with at least the minimum participant count. Returns the frozen
/// roster in join order.
pub async fn lock_game(
    state: &SharedState,
    code: &str,
    caller: UserId,
) -> Result<Vec<String>, ServiceError> {
    let store = state.store().await?;
    let code = codes::normalize(code);

    let game = fetch_game(&store, &code).await?;
    lifecycle::ensure_creator(&game, caller)?;
    let next = lifecycle::next_stage(game.stage, LifecycleAction::Lock)?;

    let participants = store.list_participants(code.clone()).await?;
    lifecycle::ensure_min_participants(participants.len())?;

    let expected_version = game.version;
    store
        .update_game(GameEntity { stage: next, ..game }, expected_version)
        .await?;

    info!(%code, caller, participants = participants.len(), "game locked");
    Ok(participants
        .into_iter()
        .map(|participant| participant.name)
        .collect())
}

/// Reopen registration. Creator-only; legal only while locked and not yet
/// drawn.
pub async fn unlock_game(state: &SharedState, code: &str, caller: UserId) -> Result<(), ServiceError> {
    let store = state.store().await?;
    let code = codes::normalize(code);

    let game = fetch_game(&store, &code).await?;
    lifecycle::ensure_creator(&game, caller)?;
    let next = lifecycle::next_stage(game.stage, LifecycleAction::Unlock)?;

    let expected_version = game.version;
    store
        .update_game(GameEntity { stage: next, ..game }, expected_version)
        .await?;

    info!(%code, caller, "game unlocked");
    Ok(())
}

/// Compute and persist the assignment. Creator-only; requires a locked,
/// not-yet-drawn game. The stage flip and the assignment rows are committed
/// as one atomic store operation, so a rejected draw leaves the game in its
/// pre-draw state.
pub async fn draw_game(
    state: &SharedState,
    code: &str,
    caller: UserId,
) -> Result<Assignment, ServiceError> {
    let store = state.store().await?;
    let code = codes::normalize(code);

    let game = fetch_game(&store, &code).await?;
    lifecycle::ensure_creator(&game, caller)?;
    lifecycle::next_stage(game.stage, LifecycleAction::Draw)?;

    let assignment = perform_draw(&store, game).await?;
    info!(%code, caller, pairs = assignment.len(), "draw performed");
    Ok(assignment)
}

/// Administrative override: discard any existing assignment and recompute a
/// fresh one. Creator-only; legal from the locked or drawn stage.
pub async fn redraw_game(
    state: &SharedState,
    code: &str,
    caller: UserId,
) -> Result<Assignment, ServiceError> {
    let store = state.store().await?;
    let code = codes::normalize(code);

    let game = fetch_game(&store, &code).await?;
    lifecycle::ensure_creator(&game, caller)?;
    lifecycle::next_stage(game.stage, LifecycleAction::Redraw)?;

    let assignment = perform_draw(&store, game).await?;
    info!(%code, caller, pairs = assignment.len(), "redraw performed; previous results discarded");
    Ok(assignment)
}

/// Read the committed assignment, sorted by giver name. Creator-only;
/// requires the drawn stage.
pub async fn export_results(
    state: &SharedState,
    code: &str,
    caller: UserId,
) -> Result<Assignment, ServiceError> {
    let store = state.store().await?;
    let code = codes::normalize(code);

    let game = fetch_game(&store, &code).await?;
    lifecycle::ensure_creator(&game, caller)?;
    lifecycle::ensure_exportable(game.stage)?;

    let rows = store.list_assignments(code).await?;
    let mut assignment: Assignment = rows
        .into_iter()
        .map(|row| (row.giver, row.receiver))
        .collect();
    assignment.sort_keys();
    Ok(assignment)
}

/// Permanently delete a game and everything it owns. Creator-only. Returns
/// whether a game was actually removed.
pub async fn delete_game(
    state: &SharedState,
    code: &str,
    caller: UserId,
) -> Result<bool, ServiceError> {
    let store = state.store().await?;
    let code = codes::normalize(code);

    let game = fetch_game(&store, &code).await?;
    lifecycle::ensure_creator(&game, caller)?;

    let deleted = store.delete_game(code.clone()).await?;
    if deleted {
        info!(%code, caller, "game deleted on request");
    }
    Ok(deleted)
}

/// Read-only summary of a game. No permission required.
pub async fn game_info(state: &SharedState, code: &str) -> Result<GameInfo, ServiceError> {
    let store = state.store().await?;
    let code = codes::normalize(code);

    let game = fetch_game(&store, &code).await?;
    let participants = store.list_participants(code.clone()).await?;
    let assignments = store.list_assignments(code).await?;

    Ok(GameInfo {
        code: game.code,
        stage: game.stage,
        created_at: game.created_at,
        expires_at: game.expires_at,
        participant_count: participants.len(),
        assignment_count: assignments.len(),
    })
}

/// Compute, validate, and atomically commit an assignment for the game's
/// current roster. Shared by draw and redraw.
async fn perform_draw(
    store: &Arc<dyn GameStore>,
    game: GameEntity,
) -> Result<Assignment, ServiceError> {
    let code = game.code.clone();
    let participants = store.list_participants(code.clone()).await?;
    let names: Vec<String> = participants
        .into_iter()
        .map(|participant| participant.name)
        .collect();

    let assignment = draw::compute_assignment(&names)?;

    let rows = assignment
        .iter()
        .map(|(giver, receiver)| AssignmentEntity {
            giver: giver.clone(),
            receiver: receiver.clone(),
        })
        .collect();
    store.commit_draw(code, rows, game.version).await?;

    Ok(assignment)
}

async fn fetch_game(store: &Arc<dyn GameStore>, code: &str) -> Result<GameEntity, ServiceError> {
    store
        .find_game(code.to_string())
        .await?
        .ok_or_else(|| ServiceError::GameNotFound(code.to_string()))
}

/// Sanitise and validate a participant name: collapse whitespace runs, then
/// enforce length bounds and the allowed character set (letters, digits,
/// underscores, spaces, hyphens, dots).
fn validate_name(raw: &str) -> Result<String, ServiceError> {
    let name = raw.split_whitespace().collect::<Vec<_>>().join(" ");

    if name.is_empty() {
        return Err(ServiceError::InvalidInput("name must not be empty".into()));
    }

    let length = name.chars().count();
    if length < MIN_NAME_LENGTH {
        return Err(ServiceError::InvalidInput(format!(
            "name is too short (minimum {MIN_NAME_LENGTH} characters)"
        )));
    }
    if length > MAX_NAME_LENGTH {
        return Err(ServiceError::InvalidInput(format!(
            "name is too long (maximum {MAX_NAME_LENGTH} characters)"
        )));
    }

    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '_' | ' ' | '-' | '.');
    if !name.chars().all(allowed) {
        return Err(ServiceError::InvalidInput(
            "name may only contain letters, digits, spaces, hyphens, underscores, and dots".into(),
        ));
    }

    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_whitespace_sanitised() {
        assert_eq!(validate_name("  Ann   Lee ").unwrap(), "Ann Lee");
    }

    #[test]
    fn unicode_names_are_accepted() {
        assert_eq!(validate_name("Олена").unwrap(), "Олена");
        assert_eq!(validate_name("José-María").unwrap(), "José-María");
    }

    #[test]
    fn empty_and_short_names_are_rejected() {
        assert!(matches!(
            validate_name("   "),
            Err(ServiceError::InvalidInput(_))
        ));
        assert!(matches!(
            validate_name("A"),
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[test]
    fn overlong_names_are_rejected() {
        let long = "x".repeat(MAX_NAME_LENGTH + 1);
        assert!(matches!(
            validate_name(&long),
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[test]
    fn forbidden_characters_are_rejected() {
        for bad in ["Ann<script>", "Bo\u{0};", "Cid@home"] {
            assert!(
                matches!(validate_name(bad), Err(ServiceError::InvalidInput(_))),
                "accepted `{bad}`"
            );
        }
    }
}
