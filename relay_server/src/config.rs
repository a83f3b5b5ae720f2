use std::{env, io::Write, time::Duration};

use lnbits_tools::LnbitsConfig;
use log::*;
use rand::thread_rng;
use relay_engine::RelayConfig;
use saas_common::env_flag;
use serde_json::json;
use tari_jwt::{
    tari_crypto::{
        keys::PublicKey,
        ristretto::RistrettoPublicKey,
        tari_utilities::hex::Hex,
    },
    Ristretto256VerifyingKey,
};
use tempfile::NamedTempFile;

use crate::errors::ServerError;

const DEFAULT_SAAS_HOST: &str = "127.0.0.1";
const DEFAULT_SAAS_PORT: u16 = 8470;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/saas.db";
const DEFAULT_RETRY_INTERVAL_MS: u64 = 500;
const DEFAULT_ACCESS_TOKEN_COOKIE: &str = "access_token";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    pub lnbits: LnbitsConfig,
    pub relay: RelayConfig,
    /// The cookie that carries the access token for clients that can't set an `Authorization` header (i.e. browsers
    /// opening a WebSocket).
    pub access_token_cookie: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SAAS_HOST.to_string(),
            port: DEFAULT_SAAS_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            auth: AuthConfig::default(),
            lnbits: LnbitsConfig::default(),
            relay: RelayConfig::default(),
            access_token_cookie: DEFAULT_ACCESS_TOKEN_COOKIE.to_string(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("SAAS_HOST").ok().unwrap_or_else(|| DEFAULT_SAAS_HOST.into());
        let port = env::var("SAAS_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for SAAS_PORT. {e} Using the default, {DEFAULT_SAAS_PORT}, instead."
                    );
                    DEFAULT_SAAS_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_SAAS_PORT);
        let database_url = env::var("SAAS_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ SAAS_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        let lnbits = LnbitsConfig::new_from_env_or_default();
        let relay = configure_relay();
        let access_token_cookie =
            env::var("SAAS_ACCESS_TOKEN_COOKIE").ok().unwrap_or_else(|| DEFAULT_ACCESS_TOKEN_COOKIE.into());
        Self { host, port, database_url, auth, lnbits, relay, access_token_cookie }
    }
}

fn configure_relay() -> RelayConfig {
    let retry_ms = env::var("SAAS_SSE_RETRY_INTERVAL_MS")
        .map_err(|_| {
            info!("🪛️ SAAS_SSE_RETRY_INTERVAL_MS is not set. Using the default value of {DEFAULT_RETRY_INTERVAL_MS} ms.")
        })
        .and_then(|s| {
            s.parse::<u64>().map_err(|e| warn!("🪛️ Invalid configuration value for SAAS_SSE_RETRY_INTERVAL_MS. {e}"))
        })
        .ok()
        .unwrap_or(DEFAULT_RETRY_INTERVAL_MS);
    let forward_unhandled_events = env_flag("SAAS_FORWARD_UNHANDLED_EVENTS", true);
    RelayConfig { retry_interval: Duration::from_millis(retry_ms), forward_unhandled_events }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The public key that verifies access tokens. It must be in hex format and be a valid Tari public key.
    pub jwt_verification_key: Ristretto256VerifyingKey,
}

impl Default for AuthConfig {
    fn default() -> Self {
        let mut tmpfile = NamedTempFile::new().ok().and_then(|f| f.keep().ok());
        warn!(
            "🚨️🚨️🚨️ The JWT verification key has not been set. I'm using a random value for this session. No token \
             issued elsewhere will be accepted. 🚨️🚨️🚨️"
        );
        let mut rng = thread_rng();
        let (sk, pk) = RistrettoPublicKey::random_keypair(&mut rng);
        match &mut tmpfile {
            Some((f, p)) => {
                let key_data = json!({
                    "jwt_signing_key": sk.to_hex(),
                    "jwt_verification_key": pk.to_hex(),
                })
                .to_string();
                match writeln!(f, "{key_data}") {
                    Ok(()) => warn!(
                        "🚨️🚨️🚨️ The key pair for this session was written to {}. Use it to sign tokens for local \
                         testing only. Set SAAS_JWT_VERIFICATION_KEY in production. 🚨️🚨️🚨️",
                        p.to_str().unwrap_or("???")
                    ),
                    Err(e) => warn!("🪛️ Could not write the JWT key pair to the temporary file. {e}"),
                }
            },
            None => {
                warn!("🪛️ Could not create a temporary file to store the JWT key pair. ");
            },
        }
        Self { jwt_verification_key: Ristretto256VerifyingKey(pk) }
    }
}

impl AuthConfig {
    pub fn try_from_env() -> Result<Self, ServerError> {
        let jwt_pk_hex = env::var("SAAS_JWT_VERIFICATION_KEY")
            .map_err(|e| ServerError::ConfigurationError(format!("{e} [SAAS_JWT_VERIFICATION_KEY]")))?;
        Self::from_hex(&jwt_pk_hex)
    }

    pub fn from_hex(jwt_pk_hex: &str) -> Result<Self, ServerError> {
        let vk = RistrettoPublicKey::from_hex(jwt_pk_hex.trim()).map_err(|e| {
            ServerError::ConfigurationError(format!("Invalid verification key in SAAS_JWT_VERIFICATION_KEY: {e}"))
        })?;
        Ok(Self { jwt_verification_key: Ristretto256VerifyingKey(vk) })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn verification_key_from_hex() {
        let cfg = AuthConfig::from_hex("b4db54f75421a02b0d0056fb7203df23c742b25e41283976bdaa7fe63de1ad23").unwrap();
        assert_eq!(cfg.jwt_verification_key.0.to_hex(), "b4db54f75421a02b0d0056fb7203df23c742b25e41283976bdaa7fe63de1ad23");
        let err = AuthConfig::from_hex("not-a-key").unwrap_err();
        assert!(matches!(err, ServerError::ConfigurationError(_)));
    }

    #[test]
    fn defaults() {
        let cfg = ServerConfig::new("0.0.0.0", 9000);
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.database_url, "sqlite://data/saas.db");
        assert_eq!(cfg.access_token_cookie, "access_token");
        assert_eq!(cfg.relay.retry_interval, Duration::from_millis(500));
        assert!(cfg.relay.forward_unhandled_events);
    }
}
