//! `SqliteDatabase` is the SQLite implementation of the relay's user directory.
use std::fmt::Debug;

use log::*;
use sqlx::{migrate::MigrateError, SqlitePool};

use super::db::{new_pool, users};
use crate::{
    db_types::Principal,
    traits::{UserDirectoryError, UserManagement},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl UserManagement for SqliteDatabase {
    async fn fetch_user_by_username(&self, username: &str) -> Result<Option<Principal>, UserDirectoryError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_active_user_by_username(username, &mut conn).await?;
        Ok(user.map(Principal::from))
    }
}

impl SqliteDatabase {
    /// Connects to the database at `url`, creating the file if it doesn't exist yet.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date.
    pub async fn migrate(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🪛️ Database migrations complete");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
