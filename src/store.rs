//! Storage collaborator contracts consumed by the orchestrator.
//!
//! The diesel repositories in [`crate::db`] are the production
//! implementations; the contracts stay implementation-agnostic so tests
//! and embedders can substitute their own stores.

use crate::db::{DbError, Game, GamesRepository, MatchMode, Matchup, MatchupsRepository};
use crate::rules::PlayerIndex;

/// Storage contract for games.
pub trait GameStore: Send + Sync {
    /// Gets a game by id, or `None` when absent.
    fn get(&self, id: i32) -> Result<Option<Game>, DbError>;

    /// Creates a game with an empty board and the given starting player.
    fn create(&self, matchup_id: i32, starting_player: PlayerIndex) -> Result<Game, DbError>;

    /// Persists a game's state and returns the stored document.
    fn save(&self, game: &Game) -> Result<Game, DbError>;

    /// Most recently created game for a matchup, finished or not.
    fn find_latest_by_matchup(&self, matchup_id: i32) -> Result<Option<Game>, DbError>;

    /// Most recently created unfinished game for a matchup.
    fn find_active_by_matchup(&self, matchup_id: i32) -> Result<Option<Game>, DbError>;
}

/// Storage contract for matchups.
pub trait MatchupStore: Send + Sync {
    /// Gets a matchup by id, or `None` when absent.
    fn get(&self, id: i32) -> Result<Option<Matchup>, DbError>;

    /// Creates a matchup with both scores at zero.
    fn create(
        &self,
        user_id: i32,
        player1_name: &str,
        player2_name: &str,
        mode: MatchMode,
    ) -> Result<Matchup, DbError>;

    /// Atomically adds 1 to the given player's score. `None` when the
    /// matchup vanished.
    fn increment_score(
        &self,
        matchup_id: i32,
        player: PlayerIndex,
    ) -> Result<Option<Matchup>, DbError>;

    /// Renames one of the players. `None` when the matchup vanished.
    fn update_player_name(
        &self,
        matchup_id: i32,
        player: PlayerIndex,
        name: &str,
    ) -> Result<Option<Matchup>, DbError>;

    /// Lists a user's matchups, most recently updated first.
    fn list_by_user(&self, user_id: i32) -> Result<Vec<Matchup>, DbError>;
}

impl GameStore for GamesRepository {
    fn get(&self, id: i32) -> Result<Option<Game>, DbError> {
        GamesRepository::get(self, id)
    }

    fn create(&self, matchup_id: i32, starting_player: PlayerIndex) -> Result<Game, DbError> {
        GamesRepository::create(self, matchup_id, starting_player)
    }

    fn save(&self, game: &Game) -> Result<Game, DbError> {
        GamesRepository::save(self, game)
    }

    fn find_latest_by_matchup(&self, matchup_id: i32) -> Result<Option<Game>, DbError> {
        GamesRepository::find_latest_by_matchup(self, matchup_id)
    }

    fn find_active_by_matchup(&self, matchup_id: i32) -> Result<Option<Game>, DbError> {
        GamesRepository::find_active_by_matchup(self, matchup_id)
    }
}

impl MatchupStore for MatchupsRepository {
    fn get(&self, id: i32) -> Result<Option<Matchup>, DbError> {
        MatchupsRepository::get(self, id)
    }

    fn create(
        &self,
        user_id: i32,
        player1_name: &str,
        player2_name: &str,
        mode: MatchMode,
    ) -> Result<Matchup, DbError> {
        MatchupsRepository::create(self, user_id, player1_name, player2_name, mode)
    }

    fn increment_score(
        &self,
        matchup_id: i32,
        player: PlayerIndex,
    ) -> Result<Option<Matchup>, DbError> {
        MatchupsRepository::increment_score(self, matchup_id, player)
    }

    fn update_player_name(
        &self,
        matchup_id: i32,
        player: PlayerIndex,
        name: &str,
    ) -> Result<Option<Matchup>, DbError> {
        MatchupsRepository::update_player_name(self, matchup_id, player, name)
    }

    fn list_by_user(&self, user_id: i32) -> Result<Vec<Matchup>, DbError> {
        MatchupsRepository::list_by_user(self, user_id)
    }
}
