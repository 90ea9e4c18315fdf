use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::state::lifecycle::GameStage;

/// Identity of a chat user, as handed to us by the transport layer.
pub type UserId = i64;

/// Representation of a game stored in persistence and shared across layers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameEntity {
    /// Unique human-readable code identifying the game (e.g. `SANTA42`).
    pub code: String,
    /// Identity of the user who created the game and may drive its lifecycle.
    pub creator: UserId,
    /// Current lifecycle stage.
    pub stage: GameStage,
    /// When the game was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the game becomes eligible for automatic purge; `None` means never.
    #[serde(with = "time::serde::rfc3339::option")]
    pub expires_at: Option<OffsetDateTime>,
    /// Optimistic concurrency counter, bumped on every persisted transition.
    pub version: u64,
}

impl GameEntity {
    /// Build a fresh open game with version zero.
    pub fn new(
        code: String,
        creator: UserId,
        created_at: OffsetDateTime,
        expires_at: Option<OffsetDateTime>,
    ) -> Self {
        Self {
            code,
            creator,
            stage: GameStage::Open,
            created_at,
            expires_at,
            version: 0,
        }
    }
}

/// A participant registered in a game. Owned exclusively by its game:
/// deleting the game deletes its participants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParticipantEntity {
    /// Display name, unique within the owning game (case-sensitive as stored).
    pub name: String,
    /// When the participant joined.
    #[serde(with = "time::serde::rfc3339")]
    pub joined_at: OffsetDateTime,
}

/// One give/receive pair of a completed draw, owned by its game.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssignmentEntity {
    /// Name of the participant who gives a gift.
    pub giver: String,
    /// Name of the participant who receives it.
    pub receiver: String,
}
