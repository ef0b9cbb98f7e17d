//! Checkout session creation: validation, redirect defaults and metadata.

#[path = "../common/mod.rs"]
mod common;
use common::*;

use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_checkout_returns_gateway_url() {
    let app = TestApp::new();
    let event = create_test_event(&app.conn(), "Library Fund", 10_000);

    let (status, body) = send(
        app.router(),
        json_request(
            "POST",
            "/api/payments/create-checkout-session",
            None,
            Some(json!({ "amount_cents": 2_500, "donation_event_id": event.id })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session_id"], "cs_test_fake1");
    assert!(body["url"].as_str().unwrap().starts_with("https://checkout.stripe.test/"));
    assert_eq!(app.gateway.created_count(), 1);
}

#[tokio::test]
async fn test_checkout_does_not_touch_local_state() {
    let app = TestApp::new();
    let event = create_test_event(&app.conn(), "Library Fund", 10_000);

    let (status, _) = send(
        app.router(),
        json_request(
            "POST",
            "/api/payments/create-checkout-session",
            None,
            Some(json!({ "amount_cents": 9_000, "donation_event_id": event.id })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let conn = app.conn();
    let unchanged = queries::get_donation_event_by_id(&conn, &event.id).unwrap().unwrap();
    assert_eq!(unchanged.raised_cents, 0);
    assert_eq!(queries::count_donations_for_event(&conn, &event.id).unwrap(), 0);
}

#[tokio::test]
async fn test_checkout_defaults_redirects_and_metadata() {
    let app = TestApp::new();
    let (event, donor) = {
        let conn = app.conn();
        (
            create_test_event(&conn, "Library Fund", 10_000),
            create_test_user(&conn, "donor@example.com", Role::Donor),
        )
    };

    let (status, _) = send(
        app.router(),
        json_request(
            "POST",
            "/api/payments/create-checkout-session",
            None,
            Some(json!({
                "amount_cents": 1_000,
                "donation_event_id": event.id,
                "is_anonymous": true,
                "donor_id": donor.id,
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let request = app.gateway.last_request().unwrap();
    assert_eq!(request.amount_cents, 1_000);
    assert_eq!(request.currency, "usd");
    assert_eq!(request.product_name, "Donation to Library Fund");
    assert_eq!(request.customer_email.as_deref(), Some("donor@example.com"));
    assert_eq!(
        request.success_url,
        format!("{}/donation/success?session_id={{CHECKOUT_SESSION_ID}}", TEST_FRONTEND_URL)
    );
    assert_eq!(request.cancel_url, format!("{}/donate/{}", TEST_FRONTEND_URL, event.id));
    assert_eq!(request.metadata.event_id(), Some(event.id.as_str()));
    assert_eq!(request.metadata.donor_id(), Some(donor.id.as_str()));
    assert!(request.metadata.is_anonymous());
}

#[tokio::test]
async fn test_checkout_keeps_client_redirects() {
    let app = TestApp::new();
    let event = create_test_event(&app.conn(), "Library Fund", 10_000);

    let (status, _) = send(
        app.router(),
        json_request(
            "POST",
            "/api/payments/create-checkout-session",
            None,
            Some(json!({
                "amount_cents": 1_000,
                "donation_event_id": event.id,
                "success_url": "https://donate.example.org/thanks?session_id={CHECKOUT_SESSION_ID}",
                "cancel_url": "https://donate.example.org/cancel",
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let request = app.gateway.last_request().unwrap();
    assert_eq!(
        request.success_url,
        "https://donate.example.org/thanks?session_id={CHECKOUT_SESSION_ID}"
    );
    assert_eq!(request.cancel_url, "https://donate.example.org/cancel");
    assert!(!request.metadata.is_anonymous());
    assert_eq!(request.customer_email, None);
}

#[tokio::test]
async fn test_checkout_rejects_invalid_amounts() {
    let app = TestApp::new();
    let event = create_test_event(&app.conn(), "Library Fund", 10_000);

    for amount in [0, -100] {
        let (status, body) = send(
            app.router(),
            json_request(
                "POST",
                "/api/payments/create-checkout-session",
                None,
                Some(json!({ "amount_cents": amount, "donation_event_id": event.id })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "amount {}", amount);
        assert_eq!(body["details"], "Valid amount is required");
    }

    assert_eq!(app.gateway.created_count(), 0);
}

#[tokio::test]
async fn test_checkout_requires_event_id() {
    let app = TestApp::new();

    let (status, _) = send(
        app.router(),
        json_request(
            "POST",
            "/api/payments/create-checkout-session",
            None,
            Some(json!({ "amount_cents": 500, "donation_event_id": "" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        app.router(),
        json_request(
            "POST",
            "/api/payments/create-checkout-session",
            None,
            Some(json!({ "amount_cents": 500 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_checkout_unknown_event_not_found() {
    let app = TestApp::new();

    let (status, body) = send(
        app.router(),
        json_request(
            "POST",
            "/api/payments/create-checkout-session",
            None,
            Some(json!({ "amount_cents": 500, "donation_event_id": "dt_evt_missing" })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["details"], "Donation event not found");
    assert_eq!(app.gateway.created_count(), 0);
}

#[tokio::test]
async fn test_checkout_unknown_donor_rejected() {
    let app = TestApp::new();
    let event = create_test_event(&app.conn(), "Library Fund", 10_000);

    let (status, _) = send(
        app.router(),
        json_request(
            "POST",
            "/api/payments/create-checkout-session",
            None,
            Some(json!({
                "amount_cents": 500,
                "donation_event_id": event.id,
                "donor_id": "dt_usr_missing",
            })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.gateway.created_count(), 0);
}
