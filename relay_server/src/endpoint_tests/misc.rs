use actix_web::{body::MessageBody, test, test::TestRequest, web, App};
use serde_json::Value;

use super::helpers::relay_state;
use crate::routes::{health, status};

#[actix_web::test]
async fn health_endpoint() {
    let app = test::init_service(App::new().service(health)).await;
    let req = TestRequest::get().uri("/health").to_request();
    let (_req, res) = test::call_service(&app, req).await.into_parts();
    let status = res.status();
    let body = res.into_body().try_into_bytes().unwrap();
    assert!(status.is_success());
    assert_eq!(body, "👍️\n");
}

#[actix_web::test]
async fn status_endpoint_counts_sessions() {
    let relay = relay_state();
    let _a = relay.sessions.open();
    let _b = relay.sessions.open();
    let app = test::init_service(App::new().app_data(web::Data::new(relay.clone())).service(status)).await;
    let req = TestRequest::get().uri("/status").to_request();
    let (_req, res) = test::call_service(&app, req).await.into_parts();
    assert!(res.status().is_success());
    let body = res.into_body().try_into_bytes().unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "OK");
    assert_eq!(json["sessions"], 2);
}
