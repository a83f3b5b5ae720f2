use log::*;

use crate::SqliteDatabase;

/// Loads `.env.test`, initialises logging and returns a migrated in-memory user directory.
pub async fn prepare_test_env() -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    // A single connection, since every new connection to `sqlite::memory:` gets its own empty database
    let db = SqliteDatabase::new_with_url("sqlite::memory:", 1).await.expect("Error creating in-memory database");
    db.migrate().await.expect("Error running DB migrations");
    db
}
