//! Helpers for tests that need a real, throwaway database.
pub mod flaky_store;
pub mod prepare_env;

pub use flaky_store::FlakyDatabase;
pub use prepare_env::{prepare_test_env, random_db_path};
