//! End-to-end tests over the in-memory store
//!
//! Exercise the full request pipeline: event creation with a roster,
//! authentication, session-protected access, cross-event isolation, CSRF
//! enforcement, logout and the duplicate-tolerant check-in transition.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use checkin::{
    AppState,
    routes::create_router,
    session::{SessionConfig, SessionManager},
    store::MemoryStore,
};

fn test_app_with_ttl(ttl_seconds: i64) -> Router {
    let store = Arc::new(MemoryStore::new());
    let sessions = SessionManager::new(store.clone(), SessionConfig { ttl_seconds });
    create_router(AppState {
        store,
        sessions,
    })
}

fn test_app() -> Router {
    test_app_with_ttl(3600)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn get_with_cookie(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Send a request; returns status, parsed JSON body (or Null) and the
/// session cookie pair from Set-Cookie, if any
async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value, Option<String>) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body, cookie)
}

async fn create_event(app: &Router, name: &str, password: &str) -> i64 {
    let (status, body, _) = send(
        app,
        post_json(
            "/api/events",
            json!({
                "name": name,
                "password": password,
                "csvContent": "name,id\nAlice Example,a-1\nBob Sample,b-2\n",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    body["eventId"].as_i64().unwrap()
}

async fn first_attendee_id(app: &Router, event_id: i64) -> i64 {
    let (status, body, _) = send(app, get(&format!("/api/{}/attendees", event_id))).await;
    assert_eq!(status, StatusCode::OK);
    body["attendees"][0]["id"].as_i64().unwrap()
}

/// Authenticate and return the session cookie plus the CSRF token
async fn login(app: &Router, event_id: i64, password: &str) -> (String, String) {
    let (status, body, cookie) = send(
        app,
        post_json(&format!("/api/{}/auth", event_id), json!({ "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let csrf = body["csrfToken"].as_str().unwrap().to_string();
    (cookie.unwrap(), csrf)
}

#[tokio::test]
async fn event_creation_imports_the_roster() {
    let app = test_app();
    let event_id = create_event(&app, "Rust Meetup", "p1").await;

    let (status, body, _) = send(&app, get(&format!("/api/{}", event_id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["event"]["name"], json!("Rust Meetup"));
    assert_eq!(body["attendeeCount"], json!(2));
    assert_eq!(body["checkedInCount"], json!(0));
}

#[tokio::test]
async fn event_creation_rejects_empty_rosters() {
    let app = test_app();
    let (status, body, _) = send(
        &app,
        post_json(
            "/api/events",
            json!({ "name": "e", "password": "p", "csvContent": "name,id\n" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("No valid attendees found in CSV"));
}

#[tokio::test]
async fn unknown_events_are_not_found() {
    let app = test_app();
    let (status, _, _) = send(&app, get("/api/12345")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn wrong_password_yields_no_session() {
    let app = test_app();
    let event_id = create_event(&app, "e", "p1").await;

    let (status, _, cookie) = send(
        &app,
        post_json(&format!("/api/{}/auth", event_id), json!({ "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(cookie.is_none());

    // Missing password and unknown event id produce the same failure, so
    // the auth endpoint cannot be used to probe for events.
    let (status, _, _) = send(
        &app,
        post_json(&format!("/api/{}/auth", event_id), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = send(
        &app,
        post_json("/api/999999/auth", json!({ "password": "p1" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_routes_require_a_live_session() {
    let app = test_app();
    let event_id = create_event(&app, "e", "p1").await;

    let (status, _, _) = send(&app, get(&format!("/api/{}/details", event_id))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = send(
        &app,
        get_with_cookie(&format!("/api/{}/details", event_id), "session=forged-token"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_sessions_no_longer_grant_access() {
    // A zero-second lifetime expires the session the moment it is issued.
    let app = test_app_with_ttl(0);
    let event_id = create_event(&app, "e", "p1").await;
    let (cookie, _) = login(&app, event_id, "p1").await;

    let (status, _, _) =
        send(&app, get_with_cookie(&format!("/api/{}/details", event_id), &cookie)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn sessions_are_bound_to_one_event() {
    let app = test_app();
    let first = create_event(&app, "first", "p1").await;
    let second = create_event(&app, "second", "p2").await;
    let (cookie, _) = login(&app, first, "p1").await;

    let (status, body, _) =
        send(&app, get_with_cookie(&format!("/api/{}/details", first), &cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["event"]["name"], json!("first"));

    let (status, _, _) =
        send(&app, get_with_cookie(&format!("/api/{}/details", second), &cookie)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn check_in_records_every_attempt_and_flags_repeats() {
    let app = test_app();
    let event_id = create_event(&app, "e", "p1").await;
    let attendee_id = first_attendee_id(&app, event_id).await;

    let (status, body, _) = send(
        &app,
        post_json(
            &format!("/api/{}/signin", event_id),
            json!({ "attendeeId": attendee_id }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["alreadySignedIn"], json!(false));
    assert_eq!(body["attendeeName"], json!("Alice Example"));

    let (status, body, _) = send(
        &app,
        post_json(
            &format!("/api/{}/signin", event_id),
            json!({ "attendeeId": attendee_id }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["alreadySignedIn"], json!(true));
    assert!(body["message"].as_str().unwrap().contains("already signed in"));

    // Both attempts were recorded; only one attendee counts as checked in.
    let (cookie, _) = login(&app, event_id, "p1").await;
    let (status, body, _) = send(
        &app,
        get_with_cookie(&format!("/api/{}/analytics", event_id), &cookie),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalCheckedIn"], json!(1));
    assert_eq!(body["recentCheckIns"].as_array().unwrap().len(), 2);
    let recorded: i64 = body["checkInsByDate"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["count"].as_i64().unwrap())
        .sum();
    assert_eq!(recorded, 2);
}

#[tokio::test]
async fn check_in_requires_a_matching_attendee() {
    let app = test_app();
    let event_id = create_event(&app, "e", "p1").await;

    let (status, _, _) = send(
        &app,
        post_json(&format!("/api/{}/signin", event_id), json!({ "attendeeId": 999 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = send(
        &app,
        post_json(&format!("/api/{}/signin", event_id), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn attendees_cannot_check_in_across_events() {
    let app = test_app();
    let first = create_event(&app, "first", "p1").await;
    let second = create_event(&app, "second", "p2").await;
    let attendee_id = first_attendee_id(&app, first).await;

    let (status, _, _) = send(
        &app,
        post_json(
            &format!("/api/{}/signin", second),
            json!({ "attendeeId": attendee_id }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn mutating_routes_enforce_the_csrf_token() {
    let app = test_app();
    let event_id = create_event(&app, "e", "p1").await;
    let (cookie, csrf) = login(&app, event_id, "p1").await;
    let uri = format!("/api/events/{}/attendees", event_id);

    // Valid session, no CSRF header.
    let request = Request::builder()
        .method("POST")
        .uri(&uri)
        .header(header::COOKIE, &cookie)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "name": "Carol" }).to_string()))
        .unwrap();
    let (status, _, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Valid session, wrong CSRF header.
    let request = Request::builder()
        .method("POST")
        .uri(&uri)
        .header(header::COOKIE, &cookie)
        .header("x-csrf-token", "not-the-nonce")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "name": "Carol" }).to_string()))
        .unwrap();
    let (status, _, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Valid session and matching CSRF header.
    let request = Request::builder()
        .method("POST")
        .uri(&uri)
        .header(header::COOKIE, &cookie)
        .header("x-csrf-token", &csrf)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "name": "Carol" }).to_string()))
        .unwrap();
    let (status, body, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["attendee"]["name"], json!("Carol"));

    // Duplicate names are rejected on this path, case-insensitively.
    let request = Request::builder()
        .method("POST")
        .uri(&uri)
        .header(header::COOKIE, &cookie)
        .header("x-csrf-token", &csrf)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "name": "carol" }).to_string()))
        .unwrap();
    let (status, _, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn logout_revokes_the_session_and_is_idempotent() {
    let app = test_app();
    let event_id = create_event(&app, "e", "p1").await;
    let (cookie, _) = login(&app, event_id, "p1").await;

    let request = Request::builder()
        .method("POST")
        .uri(format!("/api/{}/logout", event_id))
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    let (status, body, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));

    // The old cookie no longer grants access.
    let (status, _, _) =
        send(&app, get_with_cookie(&format!("/api/{}/details", event_id), &cookie)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Logging out again with the stale cookie still succeeds.
    let request = Request::builder()
        .method("POST")
        .uri(format!("/api/{}/logout", event_id))
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    let (status, body, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
}

#[tokio::test]
async fn export_streams_csv_with_the_roster() {
    let app = test_app();
    let event_id = create_event(&app, "Rust Meetup", "p1").await;
    let attendee_id = first_attendee_id(&app, event_id).await;
    send(
        &app,
        post_json(
            &format!("/api/{}/signin", event_id),
            json!({ "attendeeId": attendee_id }),
        ),
    )
    .await;

    let (cookie, _) = login(&app, event_id, "p1").await;
    let response = app
        .clone()
        .oneshot(get_with_cookie(&format!("/api/{}/export", event_id), &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/csv"
    );
    assert!(
        response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap()
            .contains("Rust_Meetup_checkins.csv")
    );

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let csv = String::from_utf8(bytes.to_vec()).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "Name,External ID,Checked In,Check-in Time");
    assert!(lines[1].starts_with("\"Alice Example\",\"a-1\",\"Yes\""));
    assert!(lines[2].starts_with("\"Bob Sample\",\"b-2\",\"No\""));
}
