//! AI move provider: remote move suggestion with strict reply validation.
//!
//! The provider owns request construction and response interpretation; the
//! remote call itself is the black-box [`LlmClient`]. Every failure mode
//! (missing credentials, transport error, timeout, malformed reply,
//! out-of-range or occupied cell) collapses into a single [`AiError`] so
//! the orchestrator has exactly one thing to catch before falling back.

use async_trait::async_trait;
use derive_more::{Display, Error};
use std::sync::OnceLock;
use tracing::{debug, info, instrument, warn};

use crate::config::AiSettings;
use crate::llm_client::{LlmClient, LlmError};
use crate::rules::{Board, PlayerIndex, WINNING_LINES};

/// Produces a legal cell index for an AI-controlled player's turn.
///
/// The orchestrator and tests consume this seam; [`AiMoveProvider`] is the
/// production implementation.
#[async_trait]
pub trait MoveSuggester: Send + Sync {
    /// Suggests a cell for `ai_player` on `board`.
    ///
    /// # Errors
    ///
    /// Returns [`AiError`] when no valid suggestion could be produced;
    /// callers substitute a fallback move.
    async fn suggest(
        &self,
        board: &Board,
        ai_player: PlayerIndex,
        opponent: PlayerIndex,
    ) -> Result<usize, AiError>;
}

/// Move provider backed by a remote LLM.
#[derive(Debug)]
pub struct AiMoveProvider {
    settings: AiSettings,
    client: OnceLock<LlmClient>,
}

impl AiMoveProvider {
    /// Creates a provider from the given settings. The remote client is
    /// constructed lazily on first use.
    #[instrument(skip(settings), fields(provider = ?settings.provider()))]
    pub fn new(settings: AiSettings) -> Self {
        info!("Creating AI move provider");
        Self {
            settings,
            client: OnceLock::new(),
        }
    }

    /// Creates a provider configured from the environment.
    #[instrument]
    pub fn from_env() -> Self {
        Self::new(AiSettings::from_env())
    }

    /// Returns the remote client, constructing it exactly once.
    ///
    /// # Errors
    ///
    /// Returns [`AiError`] when credentials are absent; the caller falls
    /// back immediately without a remote attempt.
    fn client(&self) -> Result<&LlmClient, AiError> {
        if let Some(client) = self.client.get() {
            return Ok(client);
        }
        let config = self.settings.to_llm_config().ok_or_else(|| {
            AiError::new("AI service unavailable: no API key configured".to_string())
        })?;
        Ok(self.client.get_or_init(|| LlmClient::new(config)))
    }

    /// Asks the remote model for a move and validates the reply.
    #[instrument(skip(self), fields(ai_player = %ai_player, opponent = %opponent))]
    pub async fn get_next_move(
        &self,
        board: &Board,
        ai_player: PlayerIndex,
        opponent: PlayerIndex,
    ) -> Result<usize, AiError> {
        let client = self.client()?;
        let prompt = build_move_prompt(board, ai_player, opponent);

        debug!(board = ?board.as_digits(), "Requesting move suggestion");
        let reply = client.generate(&prompt).await?;

        let cell = parse_cell_reply(&reply)?;
        if !board.is_empty_at(cell) {
            warn!(cell, "Model suggested an occupied cell");
            return Err(AiError::new(format!(
                "Model suggested occupied cell {cell}"
            )));
        }

        info!(cell, "Model suggested a legal move");
        Ok(cell)
    }
}

#[async_trait]
impl MoveSuggester for AiMoveProvider {
    async fn suggest(
        &self,
        board: &Board,
        ai_player: PlayerIndex,
        opponent: PlayerIndex,
    ) -> Result<usize, AiError> {
        self.get_next_move(board, ai_player, opponent).await
    }
}

/// Builds the move-suggestion prompt.
///
/// The board travels as its 0/1/2 digit form alongside the fixed winning
/// lines; the model is told to answer with a bare cell index.
#[instrument(skip(board))]
fn build_move_prompt(board: &Board, ai_player: PlayerIndex, opponent: PlayerIndex) -> String {
    format!(
        "You are a Tic-Tac-Toe engine.\n\
         \n\
         Game Goal:\n\
         Win the game by placing 3 of your marks in a horizontal, vertical, or diagonal row.\n\
         This is the list of winning lines: {lines:?}\n\
         \n\
         Board rules:\n\
         - 3x3 grid, which is represented as a 1D array of 9 cells.\n\
         - Each cell is \"X\" which represented by 1, \"O\" which represented by 2, or 0 for empty.\n\
         - You play as {ai}.\n\
         - {opp} is the opponent.\n\
         - It's {ai}'s turn.\n\
         - The game is not finished yet.\n\
         - You are only allowed to return index of the cell that is not occupied, e.g. with 0 value.\n\
         - If {opp} is close to winning, you should block them unless it's a winning move for {ai}.\n\
         - Otherwise, you should choose the cell that is the best for {ai} to win.\n\
         - If there is only one empty cell, you should choose it immediately.\n\
         \n\
         Your task:\n\
         - Choose the BEST next move for {ai}.\n\
         - Return ONLY the cell index.\n\
         \n\
         DO NOT add text, explanation, or code blocks. Only integer number between 0 and 8.\n\
         \n\
         Current board:\n\
         {board:?}",
        lines = WINNING_LINES,
        ai = ai_player,
        opp = opponent,
        board = board.as_digits(),
    )
}

/// Parses a reply that must be exactly one digit in 0..=8 after trimming.
///
/// Anything else is rejected rather than leniently parsed: "I'd pick 4"
/// and "42" are both failures.
fn parse_cell_reply(reply: &str) -> Result<usize, AiError> {
    let trimmed = reply.trim();
    if trimmed.is_empty() {
        return Err(AiError::new("Empty response from model".to_string()));
    }

    let mut chars = trimmed.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if ('0'..='8').contains(&c) => Ok(c as usize - '0' as usize),
        _ => Err(AiError::new(format!(
            "Malformed response from model: expected a single digit 0-8, got '{trimmed}'"
        ))),
    }
}

/// AI service error.
#[derive(Debug, Clone, Display, Error)]
#[display("AI service error: {} at {}:{}", message, file, line)]
pub struct AiError {
    /// Error message.
    pub message: String,
    /// Line number where the error occurred.
    pub line: u32,
    /// Source file where the error occurred.
    pub file: &'static str,
}

impl AiError {
    /// Creates a new AI service error with caller location tracking.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

impl From<LlmError> for AiError {
    #[track_caller]
    fn from(err: LlmError) -> Self {
        Self::new(format!("Remote completion failed: {}", err.message))
    }
}
