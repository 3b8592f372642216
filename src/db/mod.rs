//! Persistence layer: row types, schema and the SQLite-backed identity store.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring the `role` and `user` rows
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `store.rs`: the `IdentityStore` seam the bootstrapper talks to
//! - `sqlite.rs`: `IdentityStore` over an sqlx SQLite pool

pub mod models;
pub mod schema;
pub mod sqlite;
pub mod store;

pub use models::{NewUser, Role, User};
pub use schema::SQLITE_INIT;
pub use sqlite::{SqlitePool, SqliteStore};
pub use store::IdentityStore;
