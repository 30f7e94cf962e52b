//! Data layer
//!
//! SQLite persistence via sqlx. `models` holds the row structs,
//! `database` holds every query.

mod database;
mod models;


pub use database::Database;
pub use models::*;
