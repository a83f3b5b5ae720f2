use actix_web::{cookie::Cookie, http::StatusCode, test::TestRequest};
use chrono::{Duration, Utc};
use relay_engine::test_utils::{mocks::MockUserDirectory, sample_principal};

use super::helpers::{issue_token, issue_token_with_key, relay_state, upgrade_request, ws_request};

fn no_lookups() -> MockUserDirectory {
    let mut users = MockUserDirectory::new();
    users.expect_fetch_user_by_username().times(0);
    users
}

fn alice_only() -> MockUserDirectory {
    let mut users = MockUserDirectory::new();
    users.expect_fetch_user_by_username().returning(|username| Ok((username == "alice").then(sample_principal)));
    users
}

fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}

#[actix_web::test]
async fn missing_token() {
    let relay = relay_state();
    let (status, body) = ws_request(upgrade_request(), no_lookups(), relay.clone()).await.unwrap();
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("No access token was provided."), "{body}");
    assert_eq!(relay.sessions.count(), 0);
}

#[actix_web::test]
async fn blank_bearer_token() {
    let req = upgrade_request().insert_header(("Authorization", "Bearer   "));
    let (status, _) = ws_request(req, no_lookups(), relay_state()).await.unwrap();
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn malformed_token() {
    let req = upgrade_request().insert_header(bearer("not.a.jwt"));
    let (status, body) = ws_request(req, no_lookups(), relay_state()).await.unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Access token is not in the correct format."), "{body}");
}

#[actix_web::test]
async fn expired_token() {
    let token = issue_token("alice", Utc::now() - Duration::hours(1));
    let req = upgrade_request().insert_header(bearer(&token));
    let (status, _) = ws_request(req, no_lookups(), relay_state()).await.unwrap();
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn token_signed_with_another_key() {
    let other_key = "1dfa3a4b4c22b6d5c2bdd1cf5b9e55a1a6b0bcb1f0e3a4a5b6c7d8e9f0a1b20a";
    let token = issue_token_with_key("alice", Utc::now() + Duration::hours(1), other_key);
    let req = upgrade_request().insert_header(bearer(&token));
    let (status, body) = ws_request(req, no_lookups(), relay_state()).await.unwrap();
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("Access token signature is invalid."), "{body}");
}

#[actix_web::test]
async fn unknown_user() {
    let relay = relay_state();
    let token = issue_token("mallory", Utc::now() + Duration::hours(1));
    let req = upgrade_request().insert_header(bearer(&token));
    let (status, body) = ws_request(req, alice_only(), relay.clone()).await.unwrap();
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("User account not found."), "{body}");
    assert_eq!(relay.sessions.count(), 0);
}

#[actix_web::test]
async fn valid_bearer_token_upgrades() {
    let token = issue_token("alice", Utc::now() + Duration::hours(1));
    let req = upgrade_request().insert_header(bearer(&token));
    let (status, _) = ws_request(req, alice_only(), relay_state()).await.unwrap();
    assert_eq!(status, StatusCode::SWITCHING_PROTOCOLS);
}

#[actix_web::test]
async fn valid_cookie_token_upgrades() {
    let token = issue_token("alice", Utc::now() + Duration::hours(1));
    let req = upgrade_request().cookie(Cookie::new("access_token", token));
    let (status, _) = ws_request(req, alice_only(), relay_state()).await.unwrap();
    assert_eq!(status, StatusCode::SWITCHING_PROTOCOLS);
}

#[actix_web::test]
async fn valid_token_without_upgrade_headers() {
    let token = issue_token("alice", Utc::now() + Duration::hours(1));
    let req = TestRequest::get().uri("/ws").insert_header(bearer(&token));
    let (status, _) = ws_request(req, alice_only(), relay_state()).await.unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
