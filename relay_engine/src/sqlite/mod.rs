//! SQLite-backed user directory.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
