//! Database module: row models, schema and the SQLite-backed store.
//!
//! Layout:
//! - `models.rs`: raw row struct and conversion into [`Book`](crate::types::Book)
//! - `schema.rs`: SQL DDL executed at startup
//! - `sqlite.rs`: pool setup and CRUD queries

pub mod models;
pub mod schema;
pub mod sqlite;

pub use models::BookRow;
pub use schema::SQLITE_INIT;
pub use sqlite::{BooksStorage, DatabaseInfo, SqlitePool};
