//! Domain store implementations for Mini-Jira.
//!
//! - `sqlite` — persistent SQLite store (file-backed or in-memory)

pub mod sqlite;

pub use sqlite::SqliteStore;
