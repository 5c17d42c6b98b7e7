//! Database models and domain documents.

use chrono::NaiveDateTime;
use derive_getters::Getters;
use derive_new::new;
use diesel::prelude::*;
use strum::{Display, EnumString};
use tracing::instrument;

use crate::db::{schema, DbError};
use crate::rules::{next_turn, Board, PlayerIndex};

/// User profile database model. Accounts own matchups; authentication
/// itself happens upstream and only the id reaches this core.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::users)]
pub struct User {
    id: i32,
    display_name: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

/// Insertable user model.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::users)]
pub struct NewUser {
    display_name: String,
}

/// Matchup mode: two humans, or a human against the AI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum MatchMode {
    /// Two named human players.
    Friend,
    /// Player 2 is driven by the AI move provider.
    Ai,
}

/// A persistent pairing of two named players with cumulative scores.
///
/// Score fields are mutated exclusively by the orchestrator's win handling,
/// by exactly +1 to the winning player's counter. The mode is typed; a row
/// with an unknown mode string fails when decoded instead of leaking into
/// the domain.
#[derive(Debug, Clone, Getters)]
pub struct Matchup {
    id: i32,
    user_id: i32,
    player1_name: String,
    player1_score: i32,
    player2_name: String,
    player2_score: i32,
    mode: MatchMode,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl Matchup {
    /// Returns the score counter for the given player.
    pub fn score_of(&self, player: PlayerIndex) -> i32 {
        match player {
            PlayerIndex::One => self.player1_score,
            PlayerIndex::Two => self.player2_score,
        }
    }

    /// Returns the display name for the given player.
    pub fn name_of(&self, player: PlayerIndex) -> &str {
        match player {
            PlayerIndex::One => &self.player1_name,
            PlayerIndex::Two => &self.player2_name,
        }
    }
}

/// Raw matchup row as stored; mode travels as text.
#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable, Getters)]
#[diesel(table_name = schema::matchups)]
#[diesel(belongs_to(User))]
pub struct MatchupRow {
    id: i32,
    user_id: i32,
    player1_name: String,
    player1_score: i32,
    player2_name: String,
    player2_score: i32,
    mode: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl MatchupRow {
    /// Decodes the row into a domain [`Matchup`].
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] when the mode column holds a string
    /// [`MatchMode`] rejects.
    #[instrument(skip(self), fields(matchup_id = self.id))]
    pub fn decode(self) -> Result<Matchup, DbError> {
        let mode = self
            .mode
            .parse()
            .map_err(|_| DbError::new(format!("Corrupt mode column: '{}'", self.mode)))?;

        Ok(Matchup {
            id: self.id,
            user_id: self.user_id,
            player1_name: self.player1_name,
            player1_score: self.player1_score,
            player2_name: self.player2_name,
            player2_score: self.player2_score,
            mode,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Insertable matchup model. Scores start at 0 via column defaults.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::matchups)]
pub struct NewMatchup {
    user_id: i32,
    player1_name: String,
    player2_name: String,
    mode: String,
}

/// One played-out board instance belonging to a matchup.
///
/// Invariants: while `is_finished` is false, `winner` and `winning_triplet`
/// are `None`; once `winner` is set, `winning_triplet` is set and
/// `is_finished` is true. All transitions go through the mutators below,
/// which the orchestrator drives.
#[derive(Debug, Clone, Getters)]
pub struct Game {
    id: i32,
    matchup_id: i32,
    board: Board,
    current_turn: PlayerIndex,
    is_finished: bool,
    winner: Option<PlayerIndex>,
    winning_triplet: Option<[usize; 3]>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl Game {
    /// Replaces the board with the fully-computed next snapshot.
    pub fn set_board(&mut self, board: Board) {
        self.board = board;
    }

    /// Marks the game won: winner, triplet, and the finished flag move
    /// together so the invariant cannot be half-applied.
    pub fn finish_with_winner(&mut self, winner: PlayerIndex, triplet: [usize; 3]) {
        self.winner = Some(winner);
        self.winning_triplet = Some(triplet);
        self.is_finished = true;
    }

    /// Marks the game drawn: finished with no winner.
    pub fn finish_drawn(&mut self) {
        self.is_finished = true;
    }

    /// Advances the turn to the other player.
    pub fn advance_turn(&mut self) {
        self.current_turn = next_turn(self.current_turn);
    }
}

/// Raw game row as stored; board and triplet travel as JSON text.
#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable, Getters)]
#[diesel(table_name = schema::games)]
#[diesel(belongs_to(MatchupRow, foreign_key = matchup_id))]
pub struct GameRow {
    id: i32,
    matchup_id: i32,
    board: String,
    current_turn: i32,
    is_finished: bool,
    winner: Option<i32>,
    winning_triplet: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl GameRow {
    /// Decodes the row into a domain [`Game`].
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] when a column holds a value the domain types
    /// reject (corrupt board JSON, player index outside 1..=2).
    #[instrument(skip(self), fields(game_id = self.id))]
    pub fn decode(self) -> Result<Game, DbError> {
        let board: Board = serde_json::from_str(&self.board)?;

        let current_turn = PlayerIndex::try_from(self.current_turn)
            .map_err(|e| DbError::new(format!("Corrupt current_turn column: {e}")))?;

        let winner = self
            .winner
            .map(PlayerIndex::try_from)
            .transpose()
            .map_err(|e| DbError::new(format!("Corrupt winner column: {e}")))?;

        let winning_triplet = self
            .winning_triplet
            .as_deref()
            .map(|text| {
                let cells: Vec<usize> = serde_json::from_str(text)?;
                <[usize; 3]>::try_from(cells)
                    .map_err(|v| DbError::new(format!("Winning triplet has {} cells", v.len())))
            })
            .transpose()?;

        Ok(Game {
            id: self.id,
            matchup_id: self.matchup_id,
            board,
            current_turn,
            is_finished: self.is_finished,
            winner,
            winning_triplet,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Encodes a board for its JSON text column.
pub(crate) fn encode_board(board: &Board) -> Result<String, DbError> {
    Ok(serde_json::to_string(board)?)
}

/// Encodes a winning triplet for its JSON text column.
pub(crate) fn encode_triplet(triplet: &[usize; 3]) -> Result<String, DbError> {
    Ok(serde_json::to_string(triplet)?)
}
