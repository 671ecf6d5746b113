//! SQLite storage for the fan push engine.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
