//! Cálculo de taxas pela API (taxas explícitas não consultam o banco).

mod common;

use axum::http::StatusCode;
use common::*;
use pms_backend::models::auth::StaffRole;
use serde_json::json;
use tower::util::ServiceExt;

#[tokio::test]
async fn breakdown_with_explicit_rates() {
    let token = token_for(StaffRole::Staff);
    let request = json_request(
        authorized("POST", "/api/billing/breakdown", &token),
        json!({ "baseAmount": "10000", "serviceChargeRate": "10", "vatRate": "7.5" }),
    );

    let response = test_app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["serviceCharge"], "1000.00");
    assert_eq!(body["subtotal"], "11000.00");
    assert_eq!(body["vat"], "825.00");
    assert_eq!(body["total"], "11825.00");
}

#[tokio::test]
async fn breakdown_rounds_only_for_display() {
    let token = token_for(StaffRole::Staff);
    let request = json_request(
        authorized("POST", "/api/billing/breakdown", &token),
        json!({ "baseAmount": "99.99", "serviceChargeRate": "10", "vatRate": "7.5" }),
    );

    let response = test_app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    // 99.99 * 1.1 = 109.989 -> 7.5% = 8.249175 -> total 118.238175
    assert_eq!(body["subtotal"], "109.99");
    assert_eq!(body["total"], "118.24");
}

#[tokio::test]
async fn negative_base_is_a_validation_error() {
    let token = token_for(StaffRole::Staff);
    let request = json_request(
        authorized("POST", "/api/billing/breakdown", &token),
        json!({ "baseAmount": "-1", "serviceChargeRate": "10", "vatRate": "7.5" }),
    );

    let response = test_app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "One or more fields are invalid.");
    assert!(body["details"].is_object());
}

#[tokio::test]
async fn rate_above_hundred_is_rejected() {
    let token = token_for(StaffRole::Staff);
    let request = json_request(
        authorized("POST", "/api/billing/breakdown", &token),
        json!({ "baseAmount": "100", "serviceChargeRate": "150", "vatRate": "7.5" }),
    );

    let response = test_app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn base_beyond_money_range_is_rejected_not_panicked() {
    let token = token_for(StaffRole::Staff);
    let request = json_request(
        authorized("POST", "/api/billing/breakdown", &token),
        json!({
            "baseAmount": "79228162514264337593543950335",
            "serviceChargeRate": "100",
            "vatRate": "7.5"
        }),
    );

    let response = test_app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["details"].is_object());
}

#[tokio::test]
async fn base_with_more_than_four_decimals_is_rejected() {
    let token = token_for(StaffRole::Staff);
    let request = json_request(
        authorized("POST", "/api/billing/breakdown", &token),
        json!({ "baseAmount": "10.00005", "serviceChargeRate": "10", "vatRate": "7.5" }),
    );

    let response = test_app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
