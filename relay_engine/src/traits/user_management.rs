use thiserror::Error;

use crate::db_types::Principal;

#[derive(Debug, Clone, Error)]
pub enum UserDirectoryError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for UserDirectoryError {
    fn from(e: sqlx::Error) -> Self {
        UserDirectoryError::DatabaseError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait UserManagement {
    /// Fetches the active user with the given username. Unknown and deactivated users both yield `None`.
    async fn fetch_user_by_username(&self, username: &str) -> Result<Option<Principal>, UserDirectoryError>;
}
