//! Deterministic move selection used when the remote AI is unavailable.

use rand::Rng;
use tracing::{debug, instrument};

use crate::error::GameError;
use crate::rules::{Board, Cell, PlayerIndex, CELL_PRIORITY, WINNING_LINES};

/// Finds a line where `player` holds two cells and the third is empty,
/// returning the empty cell. Lines are scanned in declaration order and the
/// first qualifying line wins.
fn find_completing_cell(board: &Board, player: PlayerIndex) -> Option<usize> {
    for line in WINNING_LINES {
        let owned = line
            .iter()
            .filter(|&&i| board.get(i) == Some(Cell::Owned(player)))
            .count();
        if owned == 2 {
            if let Some(&empty) = line.iter().find(|&&i| board.is_empty_at(i)) {
                return Some(empty);
            }
        }
    }
    None
}

/// Picks a deterministic move: win now, block now, then the first empty
/// cell in [`CELL_PRIORITY`] order (center, corners, edges).
///
/// # Errors
///
/// Returns [`GameError::NoLegalMove`] when the board is full. Callers must
/// not invoke the solver on a finished board; the finished-game guard in
/// the orchestrator prevents this.
#[instrument]
pub fn get_fallback_move(
    board: &Board,
    ai_player: PlayerIndex,
    opponent: PlayerIndex,
) -> Result<usize, GameError> {
    if let Some(cell) = find_completing_cell(board, ai_player) {
        debug!(cell, "Fallback takes immediate win");
        return Ok(cell);
    }

    if let Some(cell) = find_completing_cell(board, opponent) {
        debug!(cell, "Fallback blocks opponent");
        return Ok(cell);
    }

    for cell in CELL_PRIORITY {
        if board.is_empty_at(cell) {
            debug!(cell, "Fallback takes priority cell");
            return Ok(cell);
        }
    }

    Err(GameError::NoLegalMove)
}

/// Picks uniformly at random among the empty cells.
///
/// The provider's last-resort pick when a caller wants variety instead of
/// the heuristic's fixed order.
///
/// # Errors
///
/// Returns [`GameError::NoLegalMove`] when the board is full.
#[instrument]
pub fn get_random_empty_cell(board: &Board) -> Result<usize, GameError> {
    let empty = board.empty_cells();
    if empty.is_empty() {
        return Err(GameError::NoLegalMove);
    }
    let pick = empty[rand::rng().random_range(0..empty.len())];
    debug!(cell = pick, "Random empty cell chosen");
    Ok(pick)
}
