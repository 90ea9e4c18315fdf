//! Typed command boundary between the chat transport and the core.
//!
//! The transport parses free-form text into a [`Command`] and renders the
//! resulting [`CommandReply`]; the core only ever sees strongly-typed
//! arguments. One variant per public operation.

use serde::{Deserialize, Serialize};

use crate::{
    dao::models::UserId,
    error::ServiceError,
    services::{
        draw::Assignment,
        game_service::{self, CreatedGame, GameInfo},
        purge_service,
    },
    state::SharedState,
};

/// A fully parsed request from the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    /// Create a new game owned by the caller.
    Create {
        /// Identity of the creator.
        creator: UserId,
    },
    /// Join an open game under a display name.
    Join {
        /// Target game code (case-insensitive).
        code: String,
        /// Display name to register.
        name: String,
    },
    /// Freeze the participant roster.
    Lock {
        /// Target game code.
        code: String,
        /// Identity of the caller.
        caller: UserId,
    },
    /// Reopen registration before the draw.
    Unlock {
        /// Target game code.
        code: String,
        /// Identity of the caller.
        caller: UserId,
    },
    /// Perform the draw.
    Draw {
        /// Target game code.
        code: String,
        /// Identity of the caller.
        caller: UserId,
    },
    /// Discard existing results and draw again.
    Redraw {
        /// Target game code.
        code: String,
        /// Identity of the caller.
        caller: UserId,
    },
    /// Read the committed results.
    Export {
        /// Target game code.
        code: String,
        /// Identity of the caller.
        caller: UserId,
    },
    /// Permanently delete the game.
    Delete {
        /// Target game code.
        code: String,
        /// Identity of the caller.
        caller: UserId,
    },
    /// Read-only game summary.
    Info {
        /// Target game code.
        code: String,
    },
    /// Manually trigger a purge sweep with the current clock.
    PurgeSweep,
}

/// Successful outcome of a [`Command`], ready for the transport to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CommandReply {
    /// Game created.
    Created(CreatedGame),
    /// Participant registered; carries the new roster size.
    Joined {
        /// Participant count after the join.
        count: usize,
    },
    /// Roster frozen; carries the final roster.
    Locked {
        /// Names of the locked-in participants, in join order.
        participants: Vec<String>,
    },
    /// Registration reopened.
    Unlocked,
    /// Draw (or redraw) committed.
    Drawn {
        /// The computed giver → receiver mapping.
        assignment: Assignment,
    },
    /// Results exported.
    Exported {
        /// The stored giver → receiver mapping, sorted by giver.
        assignment: Assignment,
    },
    /// Deletion attempted.
    Deleted {
        /// Whether a game was actually removed.
        deleted: bool,
    },
    /// Game summary.
    Info(GameInfo),
    /// Purge sweep finished.
    Purged {
        /// Number of games removed.
        count: usize,
    },
}

/// Route a command to the corresponding service operation.
pub async fn dispatch(state: &SharedState, command: Command) -> Result<CommandReply, ServiceError> {
    match command {
        Command::Create { creator } => game_service::create_game(state, creator)
            .await
            .map(CommandReply::Created),
        Command::Join { code, name } => game_service::join_game(state, &code, &name)
            .await
            .map(|count| CommandReply::Joined { count }),
        Command::Lock { code, caller } => game_service::lock_game(state, &code, caller)
            .await
            .map(|participants| CommandReply::Locked { participants }),
        Command::Unlock { code, caller } => game_service::unlock_game(state, &code, caller)
            .await
            .map(|()| CommandReply::Unlocked),
        Command::Draw { code, caller } => game_service::draw_game(state, &code, caller)
            .await
            .map(|assignment| CommandReply::Drawn { assignment }),
        Command::Redraw { code, caller } => game_service::redraw_game(state, &code, caller)
            .await
            .map(|assignment| CommandReply::Drawn { assignment }),
        Command::Export { code, caller } => game_service::export_results(state, &code, caller)
            .await
            .map(|assignment| CommandReply::Exported { assignment }),
        Command::Delete { code, caller } => game_service::delete_game(state, &code, caller)
            .await
            .map(|deleted| CommandReply::Deleted { deleted }),
        Command::Info { code } => game_service::game_info(state, &code)
            .await
            .map(CommandReply::Info),
        Command::PurgeSweep => {
            purge_service::run_purge_sweep(state, time::OffsetDateTime::now_utc())
                .await
                .map(|count| CommandReply::Purged { count })
        }
    }
}
