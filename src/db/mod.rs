//! Database persistence layer for users, matchups, and games.

mod error;
mod models;
mod repository;
mod schema; // Diesel schema - internal use only

pub use error::DbError;
pub use models::{Game, Matchup, MatchMode, NewMatchup, NewUser, User};
pub use repository::{Db, GamesRepository, MatchupsRepository, UsersRepository};
