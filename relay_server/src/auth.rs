//! Access-token validation for incoming relay connections.
//!
//! Tokens are issued elsewhere. This server only checks them: a valid token is a `Ristretto256`-signed JWT that has not
//! expired, whose `sub` claim names an active user in the directory.
use actix_web::{http::header::AUTHORIZATION, HttpRequest};
use chrono::{Duration, Utc};
use log::*;
use relay_engine::{db_types::Principal, Authenticator, UserManagement};
use serde::{Deserialize, Serialize};
use tari_jwt::{
    jwt_compact::{AlgorithmExt, TimeOptions, Token, UntrustedToken},
    Ristretto256,
    Ristretto256VerifyingKey,
};

use crate::{config::AuthConfig, errors::AuthError};

const CLOCK_LEEWAY_SECS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// The username the token was issued to
    pub sub: String,
}

pub struct JwtAuthenticator<U> {
    verification_key: Ristretto256VerifyingKey,
    users: U,
}

impl<U: UserManagement> JwtAuthenticator<U> {
    pub fn new(config: &AuthConfig, users: U) -> Self {
        Self { verification_key: config.jwt_verification_key.clone(), users }
    }

    pub fn check_token_signature(&self, token: &str) -> Result<AccessClaims, AuthError> {
        let untrusted_token =
            UntrustedToken::new(token).map_err(|e| AuthError::PoorlyFormattedToken(format!("{e}")))?;
        let token: Token<AccessClaims> = Ristretto256
            .validator(&self.verification_key)
            .validate(&untrusted_token)
            .map_err(|e| AuthError::ValidationError(format!("{e}")))?;
        token
            .claims()
            .validate_expiration(&TimeOptions::new(Duration::seconds(CLOCK_LEEWAY_SECS), Utc::now))
            .map_err(|e| AuthError::ValidationError(format!("{e}")))?;
        let (_, claims) = token.into_parts();
        Ok(claims.custom)
    }
}

impl<U: UserManagement> Authenticator for JwtAuthenticator<U> {
    type Error = AuthError;

    async fn validate(&self, token: &str) -> Result<Principal, AuthError> {
        let claims = self.check_token_signature(token)?;
        debug!("🔑️ Access token for '{}' is valid", claims.sub);
        self.users
            .fetch_user_by_username(&claims.sub)
            .await
            .map_err(|e| AuthError::BackendError(e.to_string()))?
            .ok_or_else(|| {
                info!("🔑️ '{}' presented a valid token, but is not an active user", claims.sub);
                AuthError::AccountNotFound
            })
    }
}

/// Finds the access token on a request: an `Authorization: Bearer` header if there is one, else the named cookie.
pub fn access_token(req: &HttpRequest, cookie_name: &str) -> Option<String> {
    let from_header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim().to_string())
        .filter(|t| !t.is_empty());
    from_header.or_else(|| {
        trace!("🔑️ No bearer token in the Authorization header. Checking the '{cookie_name}' cookie");
        req.cookie(cookie_name).map(|c| c.value().to_string()).filter(|t| !t.is_empty())
    })
}
