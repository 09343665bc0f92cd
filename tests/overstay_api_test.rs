//! Parâmetros de overstay são validados antes de qualquer acesso ao banco.

mod common;

use axum::{body::Body, http::StatusCode};
use common::*;
use pms_backend::models::auth::StaffRole;
use tower::util::ServiceExt;

async fn overstays_with_grace(grace: &str) -> axum::http::Response<Body> {
    let token = token_for(StaffRole::Staff);
    let request = authorized("GET", &format!("/api/reservations/overstays?graceHours={}", grace), &token)
        .body(Body::empty())
        .unwrap();
    test_app().oneshot(request).await.unwrap()
}

#[tokio::test]
async fn huge_grace_is_a_field_error() {
    let response = overstays_with_grace("10000000000").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("graceHours"));
}

#[tokio::test]
async fn max_i64_grace_is_a_field_error() {
    let response = overstays_with_grace(&i64::MAX.to_string()).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn negative_grace_is_a_field_error() {
    let response = overstays_with_grace("-1").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
