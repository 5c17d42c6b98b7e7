//! Error taxonomy for the game core.
//!
//! Leaf layers keep their own error types ([`DbError`], [`AiError`],
//! [`crate::LlmError`]); this module owns the tagged union the orchestrator
//! surfaces to callers. AI failures never cross the orchestrator boundary:
//! they are masked by the heuristic fallback inside
//! [`crate::GameService::ai_move`].

use derive_more::Display;

use crate::ai::AiError;
use crate::db::DbError;

/// Errors surfaced by the game orchestrator.
#[derive(Debug, Clone, Display)]
pub enum GameError {
    /// Malformed player index or cell index; a caller input problem.
    #[display("Validation error: {message}")]
    Validation {
        /// What was malformed.
        message: String,
    },
    /// Referenced game does not exist.
    #[display("Game not found: game_id={id}")]
    GameNotFound {
        /// The missing game id.
        id: i32,
    },
    /// Referenced matchup does not exist.
    #[display("Matchup not found: matchup_id={id}")]
    MatchupNotFound {
        /// The missing matchup id.
        id: i32,
    },
    /// Move fails rules validation: wrong turn, occupied cell, or an
    /// invalid index that reached the orchestrator.
    #[display("Invalid move: {message}")]
    InvalidMove {
        /// Why the move was rejected.
        message: String,
    },
    /// Move attempted on a terminal game; state unchanged.
    #[display("Game already finished: game_id={id}")]
    GameFinished {
        /// The finished game id.
        id: i32,
    },
    /// Remote move-suggestion failure. Caught inside `ai_move` and replaced
    /// by a fallback move; callers only ever see this if they drive the
    /// AI provider directly.
    #[display("AI service error: {source}")]
    Ai {
        /// The underlying provider failure.
        source: AiError,
    },
    /// A move solver was invoked on a full board. A caller-ordering bug:
    /// the finished-game guard should have prevented this.
    #[display("No legal move: board has no empty cells")]
    NoLegalMove,
    /// Storage collaborator failure.
    #[display("Storage error: {source}")]
    Db {
        /// The underlying database failure.
        source: DbError,
    },
}

impl std::error::Error for GameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GameError::Ai { source } => Some(source),
            GameError::Db { source } => Some(source),
            _ => None,
        }
    }
}

impl From<AiError> for GameError {
    fn from(source: AiError) -> Self {
        GameError::Ai { source }
    }
}

impl From<DbError> for GameError {
    fn from(source: DbError) -> Self {
        GameError::Db { source }
    }
}

impl GameError {
    /// Re-reports a validation failure as an invalid move.
    ///
    /// The orchestrator rejects malformed indices with [`GameError::InvalidMove`]
    /// while the rules layer reports them as [`GameError::Validation`]; other
    /// variants pass through unchanged.
    pub(crate) fn into_invalid_move(self) -> Self {
        match self {
            GameError::Validation { message } => GameError::InvalidMove { message },
            other => other,
        }
    }
}
