use log::*;
use sqlx::SqliteConnection;

use crate::{db_types::UserRecord, traits::UserDirectoryError};

pub async fn fetch_active_user_by_username(
    username: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<UserRecord>, UserDirectoryError> {
    trace!("🧑️ Fetching user '{username}'");
    let user = sqlx::query_as::<_, UserRecord>(
        r#"
        SELECT id, username, usr, wallet_id, api_key, lnurlp, lnurlw, tpos, is_active
        FROM users
        WHERE username = $1 AND is_active = 1"#,
    )
    .bind(username)
    .fetch_optional(conn)
    .await?;
    Ok(user)
}
