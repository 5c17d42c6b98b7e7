//! Tic-tac-toe matchup backend core.
//!
//! Multiplayer/AI tic-tac-toe engine: matchup (session) tracking with
//! cumulative scores, per-game board state, rules enforcement, and an AI
//! opponent that queries a remote language model with a deterministic
//! local fallback.
//!
//! # Architecture
//!
//! - **Rules**: pure functions over the 9-cell board (turn/occupancy
//!   validation, win and draw detection, turn advancement)
//! - **Fallback**: deterministic move solver (win now, block now,
//!   priority cells)
//! - **AI**: remote move suggestion with strict reply validation, behind
//!   the [`MoveSuggester`] seam
//! - **Service**: the orchestrator applying moves, detecting terminal
//!   states, and bumping matchup scores on wins
//! - **Db**: diesel/sqlite repositories implementing the storage contracts
//!
//! # Example
//!
//! ```no_run
//! use tictactoe_backend::{
//!     AiMoveProvider, Db, GameService, GamesRepository, MatchMode, MatchupsRepository,
//! };
//!
//! # fn example() -> Result<(), tictactoe_backend::GameError> {
//! let db = Db::new(tictactoe_backend::database_url());
//! let service = GameService::new(
//!     GamesRepository::new(db.clone()),
//!     MatchupsRepository::new(db),
//!     AiMoveProvider::from_env(),
//! );
//!
//! let outcome = service.create_matchup(1, "Alice", "Computer", MatchMode::Ai, 1)?;
//! let _after_move = service.player_move(*outcome.game().id(), 1, 4)?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod ai;
mod config;
mod db;
mod error;
mod fallback;
mod llm_client;
mod rules;
mod service;
mod store;

// Crate-level exports - AI move provider
pub use ai::{AiError, AiMoveProvider, MoveSuggester};

// Crate-level exports - Configuration
pub use config::{database_url, AiSettings};

// Crate-level exports - Persistence
pub use db::{
    Db, DbError, Game, GamesRepository, MatchMode, Matchup, MatchupsRepository, User,
    UsersRepository,
};

// Crate-level exports - Error taxonomy
pub use error::GameError;

// Crate-level exports - Fallback solver
pub use fallback::{get_fallback_move, get_random_empty_cell};

// Crate-level exports - LLM client
pub use llm_client::{LlmClient, LlmConfig, LlmError, LlmProvider, COMPLETION_TIMEOUT};

// Crate-level exports - Rules engine
pub use rules::{
    check_winner_triplet, ensure_valid_cell_index, ensure_valid_player_index, is_board_full,
    next_turn, validate_player_move, Board, Cell, PlayerIndex, CELL_PRIORITY, WINNING_LINES,
};

// Crate-level exports - Orchestrator
pub use service::{GameService, MoveOutcome};

// Crate-level exports - Storage contracts
pub use store::{GameStore, MatchupStore};
