//! Public listings, health and the donor's own history.

#[path = "../common/mod.rs"]
mod common;
use common::*;

use axum::http::StatusCode;

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();

    let (status, body) = send(app.router(), json_request("GET", "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_public_event_listing_and_filter() {
    let app = TestApp::new();
    let (open, done) = {
        let conn = app.conn();
        let open = create_test_event(&conn, "Open", 10_000);
        let done = create_test_event(&conn, "Done", 100);
        queries::apply_payment_to_event(&conn, &done.id, 100).unwrap();
        (open, done)
    };

    let (status, body) = send(
        app.router(),
        json_request("GET", "/api/public/donation-events", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["has_more"], false);

    let (status, body) = send(
        app.router(),
        json_request("GET", "/api/public/donation-events?status=active", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["id"], open.id.as_str());

    let (status, body) = send(
        app.router(),
        json_request("GET", "/api/public/donation-events?limit=1&offset=0", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["has_more"], true);

    let (status, body) = send(
        app.router(),
        json_request("GET", &format!("/api/public/donation-events/{}", done.id), None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");
}

#[tokio::test]
async fn test_public_event_bad_filter_and_missing() {
    let app = TestApp::new();

    let (status, _) = send(
        app.router(),
        json_request("GET", "/api/public/donation-events?status=paused", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        app.router(),
        json_request("GET", "/api/public/donation-events/dt_evt_missing", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_my_donations_requires_auth() {
    let app = TestApp::new();

    let (status, _) = send(
        app.router(),
        json_request("GET", "/api/users/donations", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_my_donations_lists_only_own() {
    let app = TestApp::new();
    let (donor, other, event) = {
        let conn = app.conn();
        (
            create_test_user(&conn, "donor@example.com", Role::Donor),
            create_test_user(&conn, "other@example.com", Role::Donor),
            create_test_event(&conn, "Books", 10_000),
        )
    };
    for (session_id, donor_id) in [("cs_test_mine", &donor.id), ("cs_test_theirs", &other.id)] {
        app.gateway
            .insert_session(paid_session(session_id, &event.id, 1_000, Some(donor_id)));
        let (status, _) = send(
            app.router(),
            json_request("GET", &format!("/api/payments/verify-session/{}", session_id), None, None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let token = app.token_for(&donor);
    let (status, body) = send(
        app.router(),
        json_request("GET", "/api/users/donations", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let donations = body.as_array().unwrap();
    assert_eq!(donations.len(), 1);
    assert_eq!(donations[0]["payment_id"], "cs_test_mine");
    assert_eq!(donations[0]["donation_event"]["title"], "Books");
}
