//! Session verification: recording, idempotence and refusal of unpaid sessions.

#[path = "../common/mod.rs"]
mod common;
use common::*;

use axum::http::StatusCode;

fn verify_uri(session_id: &str) -> String {
    format!("/api/payments/verify-session/{}", session_id)
}

#[tokio::test]
async fn test_verify_records_donation_and_completes_goal() {
    let app = TestApp::new();
    let (event, donor) = {
        let conn = app.conn();
        (
            create_test_event(&conn, "Scholarship", 10_000),
            create_test_user(&conn, "donor@example.com", Role::Donor),
        )
    };
    app.gateway
        .insert_session(paid_session("cs_test_first", &event.id, 6_000, Some(&donor.id)));
    app.gateway
        .insert_session(paid_session("cs_test_second", &event.id, 4_000, None));

    let (status, body) = send(app.router(), json_request("GET", &verify_uri("cs_test_first"), None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["donation"]["amount_cents"], 6_000);
    assert_eq!(body["donation"]["payment_id"], "cs_test_first");
    assert_eq!(body["donation"]["payment_status"], "succeeded");
    assert_eq!(body["donation"]["donor_id"], donor.id.as_str());
    assert_eq!(body["donation"]["donation_event"]["raised_cents"], 6_000);
    assert_eq!(body["donation"]["donation_event"]["status"], "active");

    let (status, body) = send(app.router(), json_request("GET", &verify_uri("cs_test_second"), None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["donation"]["donor_id"], serde_json::Value::Null);
    assert_eq!(body["donation"]["donation_event"]["raised_cents"], 10_000);
    assert_eq!(body["donation"]["donation_event"]["status"], "completed");
}

#[tokio::test]
async fn test_verify_is_idempotent() {
    let app = TestApp::new();
    let event = create_test_event(&app.conn(), "Scholarship", 10_000);
    app.gateway
        .insert_session(paid_session("cs_test_again", &event.id, 2_500, None));

    let (_, first) = send(app.router(), json_request("GET", &verify_uri("cs_test_again"), None, None)).await;
    for _ in 0..3 {
        let (status, body) = send(app.router(), json_request("GET", &verify_uri("cs_test_again"), None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["donation"]["id"], first["donation"]["id"]);
    }

    let conn = app.conn();
    let stored = queries::get_donation_event_by_id(&conn, &event.id).unwrap().unwrap();
    assert_eq!(stored.raised_cents, 2_500);
    assert_eq!(queries::count_donations_for_event(&conn, &event.id).unwrap(), 1);
}

#[tokio::test]
async fn test_verify_one_cent_short_stays_active() {
    let app = TestApp::new();
    let event = create_test_event(&app.conn(), "Scholarship", 10_000);
    app.gateway
        .insert_session(paid_session("cs_test_short", &event.id, 9_999, None));

    let (status, body) = send(app.router(), json_request("GET", &verify_uri("cs_test_short"), None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["donation"]["donation_event"]["status"], "active");
}

#[tokio::test]
async fn test_verify_unpaid_session_refused_without_side_effects() {
    let app = TestApp::new();
    let event = create_test_event(&app.conn(), "Scholarship", 10_000);
    let mut session = paid_session("cs_test_unpaid", &event.id, 5_000, None);
    session.payment_status = "unpaid".into();
    app.gateway.insert_session(session);

    let (status, body) = send(app.router(), json_request("GET", &verify_uri("cs_test_unpaid"), None, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Payment not completed");

    let conn = app.conn();
    assert!(queries::get_donation_by_payment_id(&conn, "cs_test_unpaid").unwrap().is_none());
    let stored = queries::get_donation_event_by_id(&conn, &event.id).unwrap().unwrap();
    assert_eq!(stored.raised_cents, 0);
}

#[tokio::test]
async fn test_verify_after_checkout_and_payment() {
    let app = TestApp::new();
    let event = create_test_event(&app.conn(), "Scholarship", 10_000);

    let (_, checkout) = send(
        app.router(),
        json_request(
            "POST",
            "/api/payments/create-checkout-session",
            None,
            Some(serde_json::json!({ "amount_cents": 10_000, "donation_event_id": event.id })),
        ),
    )
    .await;
    let session_id = checkout["session_id"].as_str().unwrap().to_string();

    let (status, _) = send(app.router(), json_request("GET", &verify_uri(&session_id), None, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    app.gateway.mark_paid(&session_id);
    let (status, body) = send(app.router(), json_request("GET", &verify_uri(&session_id), None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["donation"]["donation_event"]["status"], "completed");
}

#[tokio::test]
async fn test_verify_unknown_session_not_found() {
    let app = TestApp::new();

    let (status, _) = send(app.router(), json_request("GET", &verify_uri("cs_test_nope"), None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_verify_rejects_malformed_session_id() {
    let app = TestApp::new();

    let (status, _) = send(app.router(), json_request("GET", &verify_uri("cs-test%20x"), None, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.gateway.retrieved_count(), 0);
}

#[tokio::test]
async fn test_verify_session_for_deleted_event_not_found() {
    let app = TestApp::new();
    app.gateway
        .insert_session(paid_session("cs_test_orphan", "dt_evt_gone", 1_000, None));

    let (status, _) = send(app.router(), json_request("GET", &verify_uri("cs_test_orphan"), None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(queries::get_donation_by_payment_id(&app.conn(), "cs_test_orphan").unwrap().is_none());
}

#[tokio::test]
async fn test_verify_unknown_donor_recorded_without_donor() {
    let app = TestApp::new();
    let event = create_test_event(&app.conn(), "Scholarship", 10_000);
    app.gateway.insert_session(paid_session(
        "cs_test_ghost",
        &event.id,
        1_000,
        Some("dt_usr_deleted"),
    ));

    let (status, body) = send(app.router(), json_request("GET", &verify_uri("cs_test_ghost"), None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["donation"]["donor_id"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_zero_amount_session_not_recorded() {
    let app = TestApp::new();
    let event = create_test_event(&app.conn(), "Scholarship", 10_000);
    let session = paid_session("cs_test_zero", &event.id, 0, None);
    app.gateway.insert_session(session.clone());

    let result = donation_tracker::handlers::payments::common::record_paid_session(
        &mut app.conn(),
        &session,
        "usd",
    );
    assert!(matches!(result, Err(AppError::Gateway(_))));

    let (status, _) = send(app.router(), json_request("GET", &verify_uri("cs_test_zero"), None, None)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let conn = app.conn();
    assert!(queries::get_donation_by_payment_id(&conn, "cs_test_zero").unwrap().is_none());
    let stored = queries::get_donation_event_by_id(&conn, &event.id).unwrap().unwrap();
    assert_eq!(stored.raised_cents, 0);
}
