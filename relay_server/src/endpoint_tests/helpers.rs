use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web, App};
use chrono::{DateTime, Utc};
use lnbits_tools::{LnbitsApi, LnbitsConfig};
use log::debug;
use relay_engine::{stream::TlsConnector, test_utils::mocks::MockUserDirectory, RelayConfig};
use tari_jwt::{
    jwt_compact::{AlgorithmExt, Claims, Header},
    tari_crypto::{ristretto::RistrettoSecretKey, tari_utilities::hex::Hex},
    Ristretto256,
    Ristretto256SigningKey,
};
use tokio_util::sync::CancellationToken;

use crate::{
    auth::{AccessClaims, JwtAuthenticator},
    config::AuthConfig,
    integrations::lnbits::LnbitsProvider,
    relay_state::RelayState,
    routes::WsRoute,
};

pub const SIGNING_KEY: &str = "925842e11914fdd0c9a2ab8a38dac9de57b3e392372cde1661b1a84b1d8e430e";
pub const VERIFICATION_KEY: &str = "b4db54f75421a02b0d0056fb7203df23c742b25e41283976bdaa7fe63de1ad23";
// Nothing listens on the discard port, so sessions that do start end straight away with the provider unavailable.
pub const UNREACHABLE_LNBITS: &str = "http://127.0.0.1:9";

// Creates a test `AuthConfig` matching `SIGNING_KEY`. DO NOT re-use these keys anywhere.
pub fn get_auth_config() -> AuthConfig {
    AuthConfig::from_hex(VERIFICATION_KEY).unwrap()
}

pub fn issue_token(username: &str, expiry: DateTime<Utc>) -> String {
    issue_token_with_key(username, expiry, SIGNING_KEY)
}

pub fn issue_token_with_key(username: &str, expiry: DateTime<Utc>, key: &str) -> String {
    let signing_key = Ristretto256SigningKey(RistrettoSecretKey::from_hex(key).unwrap());
    let header = Header::empty().with_token_type("JWT");
    let mut claims = Claims::new(AccessClaims { sub: username.to_string() });
    claims.expiration = Some(expiry);
    Ristretto256.token(&header, &claims, &signing_key).expect("Failed to sign token")
}

pub fn relay_state() -> RelayState {
    let api = LnbitsApi::new(LnbitsConfig::new(UNREACHABLE_LNBITS)).unwrap();
    RelayState::new(
        LnbitsProvider::new(api),
        TlsConnector::new().unwrap(),
        RelayConfig::default(),
        CancellationToken::new(),
        "access_token",
    )
}

/// A request that asks for a WebSocket upgrade, as a browser would send it.
pub fn upgrade_request() -> TestRequest {
    TestRequest::get()
        .uri("/ws")
        .insert_header(("Upgrade", "websocket"))
        .insert_header(("Connection", "Upgrade"))
        .insert_header(("Sec-WebSocket-Version", "13"))
        .insert_header(("Sec-WebSocket-Key", "dGhlIHNhbXBsZSBub25jZQ=="))
}

pub async fn ws_request(
    req: TestRequest,
    users: MockUserDirectory,
    relay: RelayState,
) -> Result<(StatusCode, String), String> {
    let authenticator = JwtAuthenticator::new(&get_auth_config(), users);
    let app = App::new()
        .app_data(web::Data::new(authenticator))
        .app_data(web::Data::new(relay))
        .service(WsRoute::<MockUserDirectory>::new());
    let service = test::init_service(app).await;
    debug!("Making request");
    let (_, res) = test::try_call_service(&service, req.to_request()).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    if status == StatusCode::SWITCHING_PROTOCOLS {
        // The body is the live WebSocket stream
        return Ok((status, String::new()));
    }
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok((status, body))
}
