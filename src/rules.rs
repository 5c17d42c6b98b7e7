//! Pure rules engine for the 3x3 board.
//!
//! Everything here is stateless: functions take a board/turn pair and
//! report facts about it. State transitions live in [`crate::GameService`].

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::instrument;

use crate::error::GameError;

/// The 8 winning lines: 3 rows, 3 columns, 2 diagonals.
///
/// Declaration order is load-bearing: win and block scans return the first
/// matching line, and callers pin behavior to this exact order.
pub const WINNING_LINES: [[usize; 3]; 8] = [
    [0, 1, 2], // Top row
    [3, 4, 5], // Middle row
    [6, 7, 8], // Bottom row
    [0, 3, 6], // Left column
    [1, 4, 7], // Middle column
    [2, 5, 8], // Right column
    [0, 4, 8], // Diagonal TL-BR
    [2, 4, 6], // Diagonal TR-BL
];

/// Cell priority for the heuristic fallback: center, corners, edges.
pub const CELL_PRIORITY: [usize; 9] = [4, 0, 2, 6, 8, 1, 3, 5, 7];

/// One of the two players, 1-based. Never 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerIndex {
    /// Player 1 ("X" on the frontend).
    One,
    /// Player 2 ("O" on the frontend).
    Two,
}

impl PlayerIndex {
    /// Returns the other player.
    pub fn other(self) -> Self {
        match self {
            PlayerIndex::One => PlayerIndex::Two,
            PlayerIndex::Two => PlayerIndex::One,
        }
    }

    /// Numeric form used in documents and prompts (1 or 2).
    pub fn as_u8(self) -> u8 {
        match self {
            PlayerIndex::One => 1,
            PlayerIndex::Two => 2,
        }
    }

    /// Numeric form widened for storage columns.
    pub fn as_i32(self) -> i32 {
        i32::from(self.as_u8())
    }
}

impl std::fmt::Display for PlayerIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

impl TryFrom<i32> for PlayerIndex {
    type Error = GameError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(PlayerIndex::One),
            2 => Ok(PlayerIndex::Two),
            _ => Err(GameError::Validation {
                message: format!("Player index must be 1 or 2, got {value}"),
            }),
        }
    }
}

impl Serialize for PlayerIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for PlayerIndex {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = i32::deserialize(deserializer)?;
        PlayerIndex::try_from(value).map_err(serde::de::Error::custom)
    }
}

/// A single cell on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    /// Nobody has played here yet.
    Empty,
    /// Occupied by the given player.
    Owned(PlayerIndex),
}

impl Cell {
    /// Numeric form used in documents and prompts: 0 empty, 1 or 2 owned.
    pub fn as_u8(self) -> u8 {
        match self {
            Cell::Empty => 0,
            Cell::Owned(p) => p.as_u8(),
        }
    }

    /// True iff the cell is empty.
    pub fn is_empty(self) -> bool {
        self == Cell::Empty
    }
}

impl TryFrom<u8> for Cell {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Cell::Empty),
            1 => Ok(Cell::Owned(PlayerIndex::One)),
            2 => Ok(Cell::Owned(PlayerIndex::Two)),
            _ => Err(format!("Board cell must be 0, 1, or 2, got {value}")),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for Cell {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = u8::deserialize(deserializer)?;
        Cell::try_from(value).map_err(serde::de::Error::custom)
    }
}

/// 3x3 board as 9 cells in row-major order.
///
/// Transitions are copy-on-write: [`Board::with_cell`] returns a new value
/// and never mutates a board a previous state still refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    cells: [Cell; 9],
}

impl Board {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self {
            cells: [Cell::Empty; 9],
        }
    }

    /// Returns the cell at `index`, or `None` when out of bounds.
    pub fn get(&self, index: usize) -> Option<Cell> {
        self.cells.get(index).copied()
    }

    /// True iff the cell at `index` exists and is empty.
    pub fn is_empty_at(&self, index: usize) -> bool {
        matches!(self.get(index), Some(Cell::Empty))
    }

    /// Returns a copy of the board with `cell` written at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds; callers validate indices through
    /// [`ensure_valid_cell_index`] first.
    pub fn with_cell(&self, index: usize, cell: Cell) -> Self {
        let mut next = *self;
        next.cells[index] = cell;
        next
    }

    /// All cells as a slice.
    pub fn cells(&self) -> &[Cell; 9] {
        &self.cells
    }

    /// Indices of all empty cells, in board order.
    pub fn empty_cells(&self) -> Vec<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_empty())
            .map(|(i, _)| i)
            .collect()
    }

    /// Numeric form of the board for documents and prompts.
    pub fn as_digits(&self) -> [u8; 9] {
        let mut digits = [0u8; 9];
        for (slot, cell) in digits.iter_mut().zip(self.cells.iter()) {
            *slot = cell.as_u8();
        }
        digits
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

/// Fails with [`GameError::Validation`] unless `value` is 1 or 2.
#[instrument]
pub fn ensure_valid_player_index(value: i32) -> Result<PlayerIndex, GameError> {
    PlayerIndex::try_from(value)
}

/// Fails with [`GameError::Validation`] unless `value` is in 0..=8.
#[instrument]
pub fn ensure_valid_cell_index(value: i32) -> Result<usize, GameError> {
    if (0..=8).contains(&value) {
        Ok(value as usize)
    } else {
        Err(GameError::Validation {
            message: format!("Cell index must be between 0 and 8, got {value}"),
        })
    }
}

/// True iff it is `player`'s turn and the target cell is empty.
///
/// Any other combination (wrong turn, occupied cell) is `false`; this never
/// panics on indices already checked by [`ensure_valid_cell_index`].
#[instrument]
pub fn validate_player_move(
    board: &Board,
    current_turn: PlayerIndex,
    player: PlayerIndex,
    cell_index: usize,
) -> bool {
    if current_turn != player {
        return false;
    }
    board.is_empty_at(cell_index)
}

/// Scans [`WINNING_LINES`] for a line through the just-played cell fully
/// owned by `player`.
///
/// Only lines containing `cell_index` can match, and the first line in
/// declaration order wins; a single move completes at most one new line
/// through itself, so no multiplicity handling is needed.
#[instrument]
pub fn check_winner_triplet(
    board: &Board,
    cell_index: usize,
    player: PlayerIndex,
) -> Option<[usize; 3]> {
    WINNING_LINES.into_iter().find(|line| {
        line.contains(&cell_index)
            && line
                .iter()
                .all(|&i| board.get(i) == Some(Cell::Owned(player)))
    })
}

/// True iff no cell on the board is empty.
#[instrument]
pub fn is_board_full(board: &Board) -> bool {
    board.cells().iter().all(|c| !c.is_empty())
}

/// Toggles the turn between player 1 and player 2.
#[instrument]
pub fn next_turn(current_turn: PlayerIndex) -> PlayerIndex {
    current_turn.other()
}

/// Builds a board from the 0/1/2 digit form used throughout the tests.
#[cfg(test)]
pub(crate) fn board_from_digits(digits: [u8; 9]) -> Board {
    let mut board = Board::new();
    for (i, d) in digits.into_iter().enumerate() {
        board = board.with_cell(i, Cell::try_from(d).expect("digit in 0..=2"));
    }
    board
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_move_requires_turn_and_empty_cell() {
        let board = board_from_digits([1, 0, 0, 0, 0, 0, 0, 0, 0]);

        // Right turn, empty cell
        assert!(validate_player_move(
            &board,
            PlayerIndex::Two,
            PlayerIndex::Two,
            1
        ));
        // Wrong turn
        assert!(!validate_player_move(
            &board,
            PlayerIndex::Two,
            PlayerIndex::One,
            1
        ));
        // Occupied cell
        assert!(!validate_player_move(
            &board,
            PlayerIndex::One,
            PlayerIndex::One,
            0
        ));
        // Wrong turn and occupied cell
        assert!(!validate_player_move(
            &board,
            PlayerIndex::Two,
            PlayerIndex::One,
            0
        ));
    }

    #[test]
    fn winner_triplet_found_through_last_move() {
        let board = board_from_digits([1, 1, 1, 2, 2, 0, 0, 0, 0]);
        assert_eq!(
            check_winner_triplet(&board, 2, PlayerIndex::One),
            Some([0, 1, 2])
        );
    }

    #[test]
    fn winner_triplet_ignores_lines_not_touching_last_move() {
        // Player 1 owns the top row, but the reported last move is cell 6.
        let board = board_from_digits([1, 1, 1, 2, 2, 0, 1, 0, 0]);
        assert_eq!(check_winner_triplet(&board, 6, PlayerIndex::One), None);
    }

    #[test]
    fn winner_triplet_none_for_non_winning_move() {
        let board = board_from_digits([1, 2, 0, 0, 1, 0, 0, 0, 0]);
        assert_eq!(check_winner_triplet(&board, 4, PlayerIndex::One), None);
    }

    #[test]
    fn winner_triplet_respects_declaration_order() {
        // Cell 4 completes both the middle row and the TL-BR diagonal;
        // the middle row is declared first.
        let board = board_from_digits([1, 0, 0, 1, 1, 1, 0, 0, 1]);
        assert_eq!(
            check_winner_triplet(&board, 4, PlayerIndex::One),
            Some([3, 4, 5])
        );
    }

    #[test]
    fn board_full_detection() {
        assert!(is_board_full(&board_from_digits([1, 2, 1, 2, 1, 2, 2, 1, 2])));
        assert!(!is_board_full(&board_from_digits([0, 2, 1, 2, 1, 2, 2, 1, 2])));
        assert!(!is_board_full(&Board::new()));
    }

    #[test]
    fn turn_toggles_between_players() {
        assert_eq!(next_turn(PlayerIndex::One), PlayerIndex::Two);
        assert_eq!(next_turn(PlayerIndex::Two), PlayerIndex::One);
    }

    #[test]
    fn player_index_validation() {
        assert_eq!(ensure_valid_player_index(1).unwrap(), PlayerIndex::One);
        assert_eq!(ensure_valid_player_index(2).unwrap(), PlayerIndex::Two);
        assert!(ensure_valid_player_index(0).is_err());
        assert!(ensure_valid_player_index(3).is_err());
    }

    #[test]
    fn cell_index_validation() {
        assert_eq!(ensure_valid_cell_index(0).unwrap(), 0);
        assert_eq!(ensure_valid_cell_index(8).unwrap(), 8);
        assert!(ensure_valid_cell_index(-1).is_err());
        assert!(ensure_valid_cell_index(9).is_err());
    }

    #[test]
    fn board_serializes_as_digit_array() {
        let board = board_from_digits([1, 2, 0, 0, 1, 0, 0, 0, 2]);
        let json = serde_json::to_string(&board).expect("serialize");
        assert_eq!(json, r#"{"cells":[1,2,0,0,1,0,0,0,2]}"#);

        let back: Board = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, board);
    }

    #[test]
    fn board_rejects_invalid_digits() {
        let result: Result<Board, _> = serde_json::from_str(r#"{"cells":[3,0,0,0,0,0,0,0,0]}"#);
        assert!(result.is_err());
    }
}
