use saas_common::Secret;
use serde_json::{json, Value};
use sqlx::FromRow;

/// The authenticated identity bound to a relay session.
///
/// A `Principal` is resolved exactly once, when the session is established, and never changes afterwards. Besides
/// the stable `id`, it carries the wallet credential (`api_key`) used to call the payment provider on the user's
/// behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: i64,
    pub username: String,
    pub usr: String,
    pub wallet_id: String,
    pub api_key: Secret<String>,
    pub lnurlp: Option<String>,
    pub lnurlw: Option<String>,
    pub tpos: Option<String>,
}

impl Principal {
    /// The user's own account details, as reported to the client by the `user` command.
    pub fn account_details(&self) -> Value {
        json!({
            "username": self.username,
            "usr": self.usr,
            "wallet_id": self.wallet_id,
            "api_key": self.api_key.reveal(),
            "lnurlp": self.lnurlp,
            "lnurlw": self.lnurlw,
            "tpos": self.tpos,
        })
    }
}

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub usr: String,
    pub wallet_id: String,
    pub api_key: String,
    pub lnurlp: Option<String>,
    pub lnurlw: Option<String>,
    pub tpos: Option<String>,
    pub is_active: bool,
}

impl From<UserRecord> for Principal {
    fn from(value: UserRecord) -> Self {
        Self {
            id: value.id,
            username: value.username,
            usr: value.usr,
            wallet_id: value.wallet_id,
            api_key: Secret::new(value.api_key),
            lnurlp: value.lnurlp,
            lnurlw: value.lnurlw,
            tpos: value.tpos,
        }
    }
}
