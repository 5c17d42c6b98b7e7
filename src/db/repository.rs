//! Diesel-backed repositories for users, matchups, and games.
//!
//! Each repository opens a connection per operation against a shared
//! database handle. Cross-document consistency (a game save plus a matchup
//! score bump) is sequenced by the orchestrator, not transacted here.

use diesel::dsl::now;
use diesel::prelude::*;
use tracing::{debug, info, instrument};

use crate::db::models::{encode_board, encode_triplet, GameRow, MatchupRow};
use crate::db::{schema, DbError, Game, MatchMode, Matchup, NewMatchup, NewUser, User};
use crate::rules::{Board, PlayerIndex};

/// Handle to the sqlite database shared by the repositories.
///
/// Use `":memory:"` only for throwaway single-connection work; tests use a
/// temp file so every operation sees the same database.
#[derive(Debug, Clone)]
pub struct Db {
    path: String,
}

impl Db {
    /// Creates a handle for the database at the given path.
    #[instrument(skip(path), fields(path = %path))]
    pub fn new(path: String) -> Self {
        info!("Creating database handle");
        Self { path }
    }

    /// Establishes a database connection.
    fn connection(&self) -> Result<SqliteConnection, DbError> {
        debug!(path = %self.path, "Establishing connection");
        SqliteConnection::establish(&self.path)
            .map_err(|e| DbError::new(format!("Failed to connect to '{}': {}", self.path, e)))
    }
}

/// Repository for user profiles.
#[derive(Debug, Clone)]
pub struct UsersRepository {
    db: Db,
}

impl UsersRepository {
    /// Creates a repository over the given database handle.
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Creates a new user profile.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the display name is taken or a database error
    /// occurs.
    #[instrument(skip(self))]
    pub fn create(&self, display_name: String) -> Result<User, DbError> {
        debug!(display_name = %display_name, "Creating user");
        let mut conn = self.db.connection()?;

        let user = diesel::insert_into(schema::users::table)
            .values(&NewUser::new(display_name))
            .returning(User::as_returning())
            .get_result(&mut conn)?;

        info!(user_id = user.id(), "User created");
        Ok(user)
    }

    /// Gets a user by id. Returns `None` if not found.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn get(&self, id: i32) -> Result<Option<User>, DbError> {
        let mut conn = self.db.connection()?;
        let user = schema::users::table
            .find(id)
            .first::<User>(&mut conn)
            .optional()?;
        Ok(user)
    }

    /// Gets a user by display name. Returns `None` if not found.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn get_by_name(&self, display_name: &str) -> Result<Option<User>, DbError> {
        let mut conn = self.db.connection()?;
        let user = schema::users::table
            .filter(schema::users::display_name.eq(display_name))
            .first::<User>(&mut conn)
            .optional()?;
        Ok(user)
    }
}

/// Repository for matchups.
#[derive(Debug, Clone)]
pub struct MatchupsRepository {
    db: Db,
}

impl MatchupsRepository {
    /// Creates a repository over the given database handle.
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Gets a matchup by id. Returns `None` if not found.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn get(&self, id: i32) -> Result<Option<Matchup>, DbError> {
        debug!(matchup_id = id, "Looking up matchup");
        let mut conn = self.db.connection()?;
        let row = schema::matchups::table
            .find(id)
            .first::<MatchupRow>(&mut conn)
            .optional()?;
        row.map(MatchupRow::decode).transpose()
    }

    /// Creates a matchup with both scores at zero.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn create(
        &self,
        user_id: i32,
        player1_name: &str,
        player2_name: &str,
        mode: MatchMode,
    ) -> Result<Matchup, DbError> {
        debug!(user_id, mode = %mode, "Creating matchup");
        let mut conn = self.db.connection()?;

        let row: MatchupRow = diesel::insert_into(schema::matchups::table)
            .values(&NewMatchup::new(
                user_id,
                player1_name.to_string(),
                player2_name.to_string(),
                mode.to_string(),
            ))
            .returning(MatchupRow::as_returning())
            .get_result(&mut conn)?;

        info!(matchup_id = row.id(), "Matchup created");
        row.decode()
    }

    /// Adds exactly 1 to the given player's score in a single UPDATE.
    ///
    /// Returns `None` if the matchup vanished.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn increment_score(
        &self,
        matchup_id: i32,
        player: PlayerIndex,
    ) -> Result<Option<Matchup>, DbError> {
        use schema::matchups::dsl::*;
        debug!(matchup_id, player = %player, "Incrementing score");
        let mut conn = self.db.connection()?;

        let target = diesel::update(matchups.find(matchup_id));
        let row = match player {
            PlayerIndex::One => target
                .set((player1_score.eq(player1_score + 1), updated_at.eq(now)))
                .returning(MatchupRow::as_returning())
                .get_result(&mut conn)
                .optional()?,
            PlayerIndex::Two => target
                .set((player2_score.eq(player2_score + 1), updated_at.eq(now)))
                .returning(MatchupRow::as_returning())
                .get_result(&mut conn)
                .optional()?,
        };
        let updated = row.map(MatchupRow::decode).transpose()?;

        if let Some(ref m) = updated {
            info!(
                matchup_id,
                player1_score = m.player1_score(),
                player2_score = m.player2_score(),
                "Score incremented"
            );
        }
        Ok(updated)
    }

    /// Renames one of the two players. Returns `None` if the matchup
    /// vanished.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn update_player_name(
        &self,
        matchup_id: i32,
        player: PlayerIndex,
        name: &str,
    ) -> Result<Option<Matchup>, DbError> {
        use schema::matchups::dsl::*;
        debug!(matchup_id, player = %player, name, "Updating player name");
        let mut conn = self.db.connection()?;

        let target = diesel::update(matchups.find(matchup_id));
        let row = match player {
            PlayerIndex::One => target
                .set((player1_name.eq(name), updated_at.eq(now)))
                .returning(MatchupRow::as_returning())
                .get_result(&mut conn)
                .optional()?,
            PlayerIndex::Two => target
                .set((player2_name.eq(name), updated_at.eq(now)))
                .returning(MatchupRow::as_returning())
                .get_result(&mut conn)
                .optional()?,
        };

        row.map(MatchupRow::decode).transpose()
    }

    /// Lists a user's matchups, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn list_by_user(&self, owner: i32) -> Result<Vec<Matchup>, DbError> {
        use schema::matchups::dsl::*;
        debug!(owner, "Listing matchups for user");
        let mut conn = self.db.connection()?;

        let rows = matchups
            .filter(user_id.eq(owner))
            .order(updated_at.desc())
            .then_order_by(id.desc())
            .load::<MatchupRow>(&mut conn)?;

        info!(owner, count = rows.len(), "Matchups loaded");
        rows.into_iter().map(MatchupRow::decode).collect()
    }
}

/// Repository for games.
#[derive(Debug, Clone)]
pub struct GamesRepository {
    db: Db,
}

impl GamesRepository {
    /// Creates a repository over the given database handle.
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Gets a game by id. Returns `None` if not found.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs or the row is
    /// corrupt.
    #[instrument(skip(self))]
    pub fn get(&self, id: i32) -> Result<Option<Game>, DbError> {
        debug!(game_id = id, "Looking up game");
        let mut conn = self.db.connection()?;
        let row = schema::games::table
            .find(id)
            .first::<GameRow>(&mut conn)
            .optional()?;
        row.map(GameRow::decode).transpose()
    }

    /// Creates a game with an empty board and the caller's starting player.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn create(&self, matchup_id: i32, starting_player: PlayerIndex) -> Result<Game, DbError> {
        use schema::games::dsl;
        debug!(matchup_id, starting_player = %starting_player, "Creating game");
        let mut conn = self.db.connection()?;

        let row = diesel::insert_into(dsl::games)
            .values((
                dsl::matchup_id.eq(matchup_id),
                dsl::board.eq(encode_board(&Board::new())?),
                dsl::current_turn.eq(starting_player.as_i32()),
                dsl::is_finished.eq(false),
            ))
            .returning(GameRow::as_returning())
            .get_result(&mut conn)?;

        info!(game_id = row.id(), matchup_id, "Game created");
        row.decode()
    }

    /// Persists a game's mutable state (upsert semantics over the same id).
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs or the game row is
    /// gone.
    #[instrument(skip(self, game), fields(game_id = game.id()))]
    pub fn save(&self, game: &Game) -> Result<Game, DbError> {
        use schema::games::dsl;
        debug!("Saving game state");
        let mut conn = self.db.connection()?;

        let triplet_text = game
            .winning_triplet()
            .as_ref()
            .map(encode_triplet)
            .transpose()?;

        let row = diesel::update(dsl::games.find(game.id()))
            .set((
                dsl::board.eq(encode_board(game.board())?),
                dsl::current_turn.eq(game.current_turn().as_i32()),
                dsl::is_finished.eq(*game.is_finished()),
                dsl::winner.eq(game.winner().map(PlayerIndex::as_i32)),
                dsl::winning_triplet.eq(triplet_text),
                dsl::updated_at.eq(now),
            ))
            .returning(GameRow::as_returning())
            .get_result(&mut conn)?;

        info!(
            game_id = row.id(),
            is_finished = row.is_finished(),
            "Game state saved"
        );
        row.decode()
    }

    /// Finds the most recently created game for a matchup.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn find_latest_by_matchup(&self, matchup: i32) -> Result<Option<Game>, DbError> {
        use schema::games::dsl::*;
        let mut conn = self.db.connection()?;
        let row = games
            .filter(matchup_id.eq(matchup))
            .order(created_at.desc())
            .then_order_by(id.desc())
            .first::<GameRow>(&mut conn)
            .optional()?;
        row.map(GameRow::decode).transpose()
    }

    /// Finds the most recently created unfinished game for a matchup.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn find_active_by_matchup(&self, matchup: i32) -> Result<Option<Game>, DbError> {
        use schema::games::dsl::*;
        let mut conn = self.db.connection()?;
        let row = games
            .filter(matchup_id.eq(matchup))
            .filter(is_finished.eq(false))
            .order(created_at.desc())
            .then_order_by(id.desc())
            .first::<GameRow>(&mut conn)
            .optional()?;
        row.map(GameRow::decode).transpose()
    }
}
