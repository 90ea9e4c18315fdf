use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dao::models::{GameEntity, UserId};

/// Minimum number of participants required before a game can be locked
/// (and therefore drawn): smaller sets cannot form a derangement cycle.
pub const MIN_PARTICIPANTS: usize = 3;

/// Lifecycle stage of a game. Linear: `Open → Locked → Drawn`, with
/// `Locked → Open` allowed only while the draw has not been performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStage {
    /// Accepting participants.
    Open,
    /// Membership frozen; draw not yet performed.
    Locked,
    /// Assignment computed and final.
    Drawn,
}

/// Guarded actions that can be applied to a game's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    /// A participant registers under the game code.
    Join,
    /// The creator freezes membership.
    Lock,
    /// The creator reopens registration (only before the draw).
    Unlock,
    /// The creator triggers the assignment computation.
    Draw,
    /// Administrative override: recompute the assignment in place.
    Redraw,
}

/// Error returned when a lifecycle guard rejects an action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// Joining a game whose membership is already frozen.
    #[error("the game is locked; no new participants can join")]
    GameLocked,
    /// Joining under a name already present in the game.
    #[error("the name `{0}` has already joined this game")]
    DuplicateName(String),
    /// Locking a game that is not open.
    #[error("the game is already locked")]
    AlreadyLocked,
    /// Locking with fewer than [`MIN_PARTICIPANTS`] participants.
    #[error("at least {MIN_PARTICIPANTS} participants are required to lock, got {got}")]
    InsufficientParticipants {
        /// Number of participants currently registered.
        got: usize,
    },
    /// Unlocking a game that is already open.
    #[error("the game is already open")]
    AlreadyOpen,
    /// Unlocking after the draw has been performed.
    #[error("the draw has been performed; the game can no longer be unlocked")]
    CannotUnlockAfterDraw,
    /// Drawing (or redrawing) before the game is locked.
    #[error("the game must be locked before drawing")]
    NotLocked,
    /// Drawing a game whose draw was already performed.
    #[error("the draw has already been performed")]
    AlreadyDrawn,
    /// Reading results before the draw was performed.
    #[error("the draw has not been performed yet")]
    NotDrawnYet,
    /// A guarded action attempted by someone other than the creator.
    #[error("only the game creator may perform this action")]
    PermissionDenied,
}

/// Compute the stage a game moves to when `action` is applied in `stage`,
/// or the guard violation that forbids it.
///
/// Data-dependent guards (participant count, caller identity) are checked
/// separately by [`ensure_min_participants`] and [`ensure_creator`].
pub fn next_stage(stage: GameStage, action: LifecycleAction) -> Result<GameStage, TransitionError> {
    use GameStage::*;
    use LifecycleAction::*;

    match (stage, action) {
        (Open, Join) => Ok(Open),
        (Locked | Drawn, Join) => Err(TransitionError::GameLocked),

        (Open, Lock) => Ok(Locked),
        (Locked | Drawn, Lock) => Err(TransitionError::AlreadyLocked),

        (Locked, Unlock) => Ok(Open),
        (Open, Unlock) => Err(TransitionError::AlreadyOpen),
        (Drawn, Unlock) => Err(TransitionError::CannotUnlockAfterDraw),

        (Locked, Draw) => Ok(Drawn),
        (Open, Draw) => Err(TransitionError::NotLocked),
        (Drawn, Draw) => Err(TransitionError::AlreadyDrawn),

        // Redraw deliberately bypasses the already-drawn guard.
        (Locked | Drawn, Redraw) => Ok(Drawn),
        (Open, Redraw) => Err(TransitionError::NotLocked),
    }
}

/// Guard: results can only be read once the game is drawn.
pub fn ensure_exportable(stage: GameStage) -> Result<(), TransitionError> {
    match stage {
        GameStage::Drawn => Ok(()),
        GameStage::Open | GameStage::Locked => Err(TransitionError::NotDrawnYet),
    }
}

/// Guard: only the game's creator may drive guarded transitions.
pub fn ensure_creator(game: &GameEntity, caller: UserId) -> Result<(), TransitionError> {
    if game.creator == caller {
        Ok(())
    } else {
        Err(TransitionError::PermissionDenied)
    }
}

/// Guard: a lock requires enough participants for a valid draw.
pub fn ensure_min_participants(count: usize) -> Result<(), TransitionError> {
    if count >= MIN_PARTICIPANTS {
        Ok(())
    } else {
        Err(TransitionError::InsufficientParticipants { got: count })
    }
}
