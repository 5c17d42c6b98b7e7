//! Game transition orchestrator.
//!
//! Owns the authoritative move-application algorithm: input validation,
//! rules checks, copy-on-write board application, terminal detection, and
//! the score bump on the parent matchup when a move wins. AI turns go
//! through the same path after the move provider (or its fallback) picks a
//! cell.

use derive_getters::Getters;
use tracing::{debug, info, instrument, warn};

use crate::ai::MoveSuggester;
use crate::db::{Game, MatchMode, Matchup};
use crate::error::GameError;
use crate::fallback::get_fallback_move;
use crate::rules::{
    check_winner_triplet, ensure_valid_cell_index, ensure_valid_player_index, is_board_full,
    validate_player_move, Cell,
};
use crate::store::{GameStore, MatchupStore};

/// Result of a state-changing operation: the stored game, and the matchup
/// when the operation touched it (score bump, creation).
#[derive(Debug, Clone, Getters)]
pub struct MoveOutcome {
    /// The game after the operation.
    game: Game,
    /// The matchup, when this operation updated it.
    matchup: Option<Matchup>,
}

/// Orchestrates game state transitions over injected collaborators.
#[derive(Debug, Clone)]
pub struct GameService<G, M, S> {
    games: G,
    matchups: M,
    suggester: S,
}

impl<G, M, S> GameService<G, M, S>
where
    G: GameStore,
    M: MatchupStore,
    S: MoveSuggester,
{
    /// Creates a service over the given stores and move suggester.
    #[instrument(skip(games, matchups, suggester))]
    pub fn new(games: G, matchups: M, suggester: S) -> Self {
        info!("Creating game service");
        Self {
            games,
            matchups,
            suggester,
        }
    }

    /// Creates a game on an existing matchup with an empty board.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidMove`] when `starting_player_raw` is not
    /// 1 or 2, [`GameError::Db`] on storage failure.
    #[instrument(skip(self))]
    pub fn create_game(
        &self,
        matchup_id: i32,
        starting_player_raw: i32,
    ) -> Result<Game, GameError> {
        let starting_player =
            ensure_valid_player_index(starting_player_raw).map_err(GameError::into_invalid_move)?;

        let game = self.games.create(matchup_id, starting_player)?;
        info!(game_id = game.id(), matchup_id, "Game created");
        Ok(game)
    }

    /// Creates a matchup for `user_id` along with its first game.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidMove`] on a bad starting player,
    /// [`GameError::Db`] on storage failure.
    #[instrument(skip(self))]
    pub fn create_matchup(
        &self,
        user_id: i32,
        player1_name: &str,
        player2_name: &str,
        mode: MatchMode,
        starting_player_raw: i32,
    ) -> Result<MoveOutcome, GameError> {
        info!(user_id, player1_name, player2_name, mode = %mode, "Creating matchup");
        let matchup = self
            .matchups
            .create(user_id, player1_name, player2_name, mode)?;
        let game = self.create_game(*matchup.id(), starting_player_raw)?;

        info!(
            matchup_id = matchup.id(),
            game_id = game.id(),
            "Matchup and game created"
        );
        Ok(MoveOutcome {
            game,
            matchup: Some(matchup),
        })
    }

    /// Lists a user's matchups, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Db`] on storage failure.
    #[instrument(skip(self))]
    pub fn list_matchups(&self, user_id: i32) -> Result<Vec<Matchup>, GameError> {
        Ok(self.matchups.list_by_user(user_id)?)
    }

    /// Most recently created game for a matchup, if any.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Db`] on storage failure.
    #[instrument(skip(self))]
    pub fn last_game_for_matchup(&self, matchup_id: i32) -> Result<Option<Game>, GameError> {
        Ok(self.games.find_latest_by_matchup(matchup_id)?)
    }

    /// A matchup together with its addressable game: the active one when a
    /// game is still in progress, otherwise the most recent.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::MatchupNotFound`] when the matchup is absent,
    /// [`GameError::Db`] on storage failure.
    #[instrument(skip(self))]
    pub fn matchup_with_game(
        &self,
        matchup_id: i32,
    ) -> Result<(Matchup, Option<Game>), GameError> {
        let matchup = self
            .matchups
            .get(matchup_id)?
            .ok_or(GameError::MatchupNotFound { id: matchup_id })?;

        let game = match self.games.find_active_by_matchup(matchup_id)? {
            Some(active) => Some(active),
            None => self.games.find_latest_by_matchup(matchup_id)?,
        };

        Ok((matchup, game))
    }

    /// Renames one of a matchup's players.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidMove`] on a bad player index,
    /// [`GameError::MatchupNotFound`] when the matchup is absent,
    /// [`GameError::Db`] on storage failure.
    #[instrument(skip(self))]
    pub fn update_player_name(
        &self,
        matchup_id: i32,
        player_id_raw: i32,
        name: &str,
    ) -> Result<Matchup, GameError> {
        let player =
            ensure_valid_player_index(player_id_raw).map_err(GameError::into_invalid_move)?;

        let updated = self.matchups.update_player_name(matchup_id, player, name)?;
        updated.ok_or_else(|| {
            warn!(matchup_id, "Matchup not found for rename");
            GameError::MatchupNotFound { id: matchup_id }
        })
    }

    /// Applies one move to a game.
    ///
    /// Validates the raw indices and the move against the current state,
    /// writes the mark onto a copied board, detects a win (which takes
    /// precedence over a full board) or a draw, bumps the winner's matchup
    /// score, and persists the result. Validation failures happen before
    /// any mutation.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidMove`] on malformed input or a move the
    /// rules reject, [`GameError::GameNotFound`] /
    /// [`GameError::MatchupNotFound`] on missing documents,
    /// [`GameError::GameFinished`] on a terminal game, [`GameError::Db`] on
    /// storage failure.
    #[instrument(skip(self))]
    pub fn player_move(
        &self,
        game_id: i32,
        player_id_raw: i32,
        cell_index_raw: i32,
    ) -> Result<MoveOutcome, GameError> {
        let player =
            ensure_valid_player_index(player_id_raw).map_err(GameError::into_invalid_move)?;
        let cell_index =
            ensure_valid_cell_index(cell_index_raw).map_err(GameError::into_invalid_move)?;

        let mut game = self
            .games
            .get(game_id)?
            .ok_or(GameError::GameNotFound { id: game_id })?;

        if *game.is_finished() {
            warn!(game_id, "Attempted move on finished game");
            return Err(GameError::GameFinished { id: game_id });
        }

        if !validate_player_move(game.board(), *game.current_turn(), player, cell_index) {
            warn!(game_id, player = %player, cell_index, "Move rejected by rules");
            return Err(GameError::InvalidMove {
                message: format!(
                    "Not player {player}'s turn or cell {cell_index} is occupied"
                ),
            });
        }

        // Copy-on-write: the stored board stays untouched until the whole
        // transition is computed.
        let new_board = game.board().with_cell(cell_index, Cell::Owned(player));

        let mut updated_matchup = None;
        if let Some(triplet) = check_winner_triplet(&new_board, cell_index, player) {
            info!(game_id, winner = %player, ?triplet, "Game finished with winner");
            game.finish_with_winner(player, triplet);
            let matchup_id = *game.matchup_id();
            let updated = self
                .matchups
                .increment_score(matchup_id, player)?
                .ok_or(GameError::MatchupNotFound { id: matchup_id })?;
            info!(
                matchup_id,
                winner_name = updated.name_of(player),
                score = updated.score_of(player),
                "Matchup score updated"
            );
            updated_matchup = Some(updated);
        } else if is_board_full(&new_board) {
            info!(game_id, "Game finished with draw");
            game.finish_drawn();
        } else {
            game.advance_turn();
        }
        game.set_board(new_board);

        let saved = self.games.save(&game)?;
        debug!(game_id, is_finished = saved.is_finished(), "Move applied");
        Ok(MoveOutcome {
            game: saved,
            matchup: updated_matchup,
        })
    }

    /// Applies a move for the AI-controlled player.
    ///
    /// Asks the move suggester for a cell and masks any suggestion failure
    /// with the deterministic fallback, so the AI turn always completes
    /// with a legal move while the board has an empty cell. The chosen cell
    /// then flows through [`GameService::player_move`], so every rule,
    /// scoring, and state invariant applies identically to AI moves.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::GameNotFound`] when the game is absent,
    /// [`GameError::InvalidMove`] on a bad player index,
    /// [`GameError::NoLegalMove`] when invoked on a full board (a
    /// caller-ordering bug; the finished-game guard prevents it),
    /// [`GameError::Db`] on storage failure. Never [`GameError::Ai`].
    #[instrument(skip(self))]
    pub async fn ai_move(
        &self,
        game_id: i32,
        ai_player_id_raw: i32,
    ) -> Result<MoveOutcome, GameError> {
        info!(game_id, ai_player_id_raw, "AI move requested");
        let game = self
            .games
            .get(game_id)?
            .ok_or_else(|| {
                warn!(game_id, "Game not found for AI move");
                GameError::GameNotFound { id: game_id }
            })?;

        let ai_player =
            ensure_valid_player_index(ai_player_id_raw).map_err(GameError::into_invalid_move)?;
        let opponent = ai_player.other();

        let cell = match self
            .suggester
            .suggest(game.board(), ai_player, opponent)
            .await
        {
            Ok(cell) => cell,
            Err(e) => {
                warn!(game_id, error = %e, "AI suggestion failed, using fallback move");
                get_fallback_move(game.board(), ai_player, opponent)?
            }
        };

        self.player_move(game_id, ai_player.as_i32(), cell as i32)
    }
}
