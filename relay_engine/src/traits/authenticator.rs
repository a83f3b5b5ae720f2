use crate::db_types::Principal;

/// Validates the bearer credential a client presents when it connects.
#[allow(async_fn_in_trait)]
pub trait Authenticator {
    type Error: std::error::Error;

    async fn validate(&self, token: &str) -> Result<Principal, Self::Error>;
}
