//! Storage contract tests against a real sqlite file.

use diesel::Connection;
use diesel::RunQueryDsl;
use diesel::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tempfile::NamedTempFile;

use tictactoe_backend::{
    Cell, Db, GamesRepository, MatchMode, MatchupsRepository, PlayerIndex, UsersRepository,
};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Creates a temporary database file with schema applied. The file handle
/// must stay in scope to keep the database alive.
fn setup_test_db() -> (NamedTempFile, Db) {
    let db_file = NamedTempFile::new().expect("Failed to create temp file");
    let db_path = db_file.path().to_str().expect("Invalid path").to_string();

    let mut conn = SqliteConnection::establish(&db_path).expect("Failed to connect");
    conn.run_pending_migrations(MIGRATIONS)
        .expect("Migrations failed");

    (db_file, Db::new(db_path))
}

fn seed_user(db: &Db, name: &str) -> i32 {
    *UsersRepository::new(db.clone())
        .create(name.to_string())
        .expect("Create user failed")
        .id()
}

#[test]
fn user_create_and_lookup() {
    let (_db_file, db) = setup_test_db();
    let users = UsersRepository::new(db.clone());

    let created = users.create("ada".to_string()).expect("Create failed");
    assert_eq!(created.display_name(), "ada");

    let by_id = users
        .get(*created.id())
        .expect("Query failed")
        .expect("User exists");
    assert_eq!(by_id.id(), created.id());

    let by_name = users
        .get_by_name("ada")
        .expect("Query failed")
        .expect("User exists");
    assert_eq!(by_name.id(), created.id());

    assert!(users.get_by_name("nobody").expect("Query failed").is_none());
}

#[test]
fn duplicate_display_name_rejected() {
    let (_db_file, db) = setup_test_db();
    let users = UsersRepository::new(db.clone());

    users.create("taken".to_string()).expect("Create failed");
    assert!(users.create("taken".to_string()).is_err());
}

#[test]
fn matchup_create_types_mode_and_defaults_scores() {
    let (_db_file, db) = setup_test_db();
    let user_id = seed_user(&db, "owner");
    let matchups = MatchupsRepository::new(db.clone());

    let matchup = matchups
        .create(user_id, "Alice", "Bob", MatchMode::Ai)
        .expect("Create failed");

    assert_eq!(matchup.player1_name(), "Alice");
    assert_eq!(matchup.player2_name(), "Bob");
    assert_eq!(*matchup.player1_score(), 0);
    assert_eq!(*matchup.player2_score(), 0);
    assert_eq!(*matchup.mode(), MatchMode::Ai);
}

#[test]
fn corrupt_mode_rejected_on_load() {
    let (db_file, db) = setup_test_db();
    let user_id = seed_user(&db, "owner");
    let matchups = MatchupsRepository::new(db.clone());
    let matchup = matchups
        .create(user_id, "A", "B", MatchMode::Friend)
        .expect("Create failed");

    // Corrupt the row behind the repository's back.
    let db_path = db_file.path().to_str().expect("Invalid path");
    let mut conn = SqliteConnection::establish(db_path).expect("Failed to connect");
    diesel::sql_query("UPDATE matchups SET mode = 'banana'")
        .execute(&mut conn)
        .expect("Raw update failed");

    assert!(matchups.get(*matchup.id()).is_err());
}

#[test]
fn increment_score_bumps_only_the_target_player() {
    let (_db_file, db) = setup_test_db();
    let user_id = seed_user(&db, "owner");
    let matchups = MatchupsRepository::new(db.clone());
    let matchup = matchups
        .create(user_id, "A", "B", MatchMode::Friend)
        .expect("Create failed");

    let after = matchups
        .increment_score(*matchup.id(), PlayerIndex::Two)
        .expect("Update failed")
        .expect("Matchup exists");
    assert_eq!(*after.player1_score(), 0);
    assert_eq!(*after.player2_score(), 1);

    let after = matchups
        .increment_score(*matchup.id(), PlayerIndex::Two)
        .expect("Update failed")
        .expect("Matchup exists");
    assert_eq!(*after.player2_score(), 2);

    assert!(matchups
        .increment_score(99999, PlayerIndex::One)
        .expect("Update failed")
        .is_none());
}

#[test]
fn update_player_name_targets_one_column() {
    let (_db_file, db) = setup_test_db();
    let user_id = seed_user(&db, "owner");
    let matchups = MatchupsRepository::new(db.clone());
    let matchup = matchups
        .create(user_id, "A", "B", MatchMode::Friend)
        .expect("Create failed");

    let after = matchups
        .update_player_name(*matchup.id(), PlayerIndex::One, "Renamed")
        .expect("Update failed")
        .expect("Matchup exists");
    assert_eq!(after.player1_name(), "Renamed");
    assert_eq!(after.player2_name(), "B");

    assert!(matchups
        .update_player_name(99999, PlayerIndex::One, "x")
        .expect("Update failed")
        .is_none());
}

#[test]
fn list_by_user_scopes_and_orders() {
    let (_db_file, db) = setup_test_db();
    let owner = seed_user(&db, "owner");
    let other = seed_user(&db, "other");
    let matchups = MatchupsRepository::new(db.clone());

    let first = matchups
        .create(owner, "A", "B", MatchMode::Friend)
        .expect("Create failed");
    let second = matchups
        .create(owner, "C", "D", MatchMode::Ai)
        .expect("Create failed");
    matchups
        .create(other, "E", "F", MatchMode::Friend)
        .expect("Create failed");

    let listed = matchups.list_by_user(owner).expect("List failed");
    assert_eq!(listed.len(), 2);
    // Same-second timestamps fall back to id order, newest first.
    assert_eq!(listed[0].id(), second.id());
    assert_eq!(listed[1].id(), first.id());
}

#[test]
fn game_round_trips_board_and_outcome() {
    let (_db_file, db) = setup_test_db();
    let user_id = seed_user(&db, "owner");
    let matchup = MatchupsRepository::new(db.clone())
        .create(user_id, "A", "B", MatchMode::Friend)
        .expect("Create failed");
    let games = GamesRepository::new(db.clone());

    let mut game = games
        .create(*matchup.id(), PlayerIndex::Two)
        .expect("Create failed");
    assert_eq!(*game.current_turn(), PlayerIndex::Two);
    assert_eq!(game.board().as_digits(), [0; 9]);
    assert!(!*game.is_finished());

    let board = game
        .board()
        .with_cell(0, Cell::Owned(PlayerIndex::One))
        .with_cell(4, Cell::Owned(PlayerIndex::Two));
    game.set_board(board);
    game.finish_with_winner(PlayerIndex::Two, [0, 4, 8]);
    games.save(&game).expect("Save failed");

    let loaded = games
        .get(*game.id())
        .expect("Query failed")
        .expect("Game exists");
    assert_eq!(loaded.board().as_digits(), board.as_digits());
    assert!(*loaded.is_finished());
    assert_eq!(*loaded.winner(), Some(PlayerIndex::Two));
    assert_eq!(*loaded.winning_triplet(), Some([0, 4, 8]));
}

#[test]
fn latest_and_active_game_queries() {
    let (_db_file, db) = setup_test_db();
    let user_id = seed_user(&db, "owner");
    let matchup = MatchupsRepository::new(db.clone())
        .create(user_id, "A", "B", MatchMode::Friend)
        .expect("Create failed");
    let games = GamesRepository::new(db.clone());

    assert!(games
        .find_latest_by_matchup(*matchup.id())
        .expect("Query failed")
        .is_none());

    let mut first = games
        .create(*matchup.id(), PlayerIndex::One)
        .expect("Create failed");
    let second = games
        .create(*matchup.id(), PlayerIndex::One)
        .expect("Create failed");

    let latest = games
        .find_latest_by_matchup(*matchup.id())
        .expect("Query failed")
        .expect("Game exists");
    assert_eq!(latest.id(), second.id());

    first.finish_drawn();
    games.save(&first).expect("Save failed");

    let active = games
        .find_active_by_matchup(*matchup.id())
        .expect("Query failed")
        .expect("Game exists");
    assert_eq!(active.id(), second.id());
}
