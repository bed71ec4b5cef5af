//! HTTP routes for the check-in service
//!
//! Public routes cover event creation, the attendee-facing sign-in flow and
//! authentication. Protected routes sit behind the session validator and the
//! CSRF guard, and every protected handler re-checks that the session is
//! bound to the event named in the path.

use axum::{
    Json, Router,
    extract::{Extension, Path, State},
    http::{StatusCode, header},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::{
    AppState, export,
    error::{ApiError, ApiResult},
    middleware::{AuthedEvent, SESSION_COOKIE, auth_middleware, csrf_middleware},
    models::{Event, NewAttendee, NewEvent},
    password, roster,
    session::verify_event_access,
    validation,
};

/// Request for event creation
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub name: Option<String>,
    pub password: Option<String>,
    pub location: Option<String>,
    pub csv_content: Option<String>,
}

/// Request for attendee sign-in
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    pub attendee_id: Option<i64>,
}

/// Request for organizer authentication
#[derive(Deserialize)]
pub struct AuthRequest {
    pub password: Option<String>,
}

/// Request for adding a single attendee
#[derive(Deserialize)]
pub struct AddAttendeeRequest {
    pub name: Option<String>,
    pub external_id: Option<String>,
}

/// Create the router for the check-in service
pub fn create_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(health_check))
        .route("/api/events", post(create_event))
        .route("/api/:event_id", get(event_info))
        .route("/api/:event_id/attendees", get(list_attendees))
        .route("/api/:event_id/signin", post(sign_in))
        .route("/api/:event_id/auth", post(auth))
        .route("/api/:event_id/logout", post(logout));

    let protected = Router::new()
        .route("/api/:event_id/details", get(event_details))
        .route("/api/:event_id/analytics", get(analytics))
        .route("/api/:event_id/export", get(export_csv))
        .route("/api/events/:event_id/attendees", post(add_attendee))
        .layer(middleware::from_fn(csrf_middleware))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new().merge(public).merge(protected).with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "checkin-service"
    }))
}

/// Create a new event from a name, a shared password and a pasted roster
pub async fn create_event(
    State(state): State<AppState>,
    Json(payload): Json<CreateEventRequest>,
) -> ApiResult<Response> {
    info!("New event creation request");

    let (Some(name), Some(password), Some(csv_content)) =
        (payload.name, payload.password, payload.csv_content)
    else {
        return Err(ApiError::BadRequest(
            "Missing required fields: name, password, csvContent".to_string(),
        ));
    };

    validation::validate_event_name(&name).map_err(ApiError::BadRequest)?;
    validation::validate_password(&password).map_err(ApiError::BadRequest)?;

    let (entries, csv_errors) = roster::parse(&csv_content);
    if entries.is_empty() {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "No valid attendees found in CSV",
                "csvErrors": csv_errors,
            })),
        )
            .into_response());
    }

    let password_hash = password::hash(&password)?;
    let event = state
        .store
        .create_event(NewEvent {
            name: name.trim().to_string(),
            password_hash,
            location: payload.location,
        })
        .await?;

    for entry in &entries {
        state
            .store
            .add_attendee(NewAttendee {
                event_id: event.id,
                name: entry.name.clone(),
                external_id: entry.external_id.clone(),
            })
            .await?;
    }

    info!("Created event {} with {} attendees", event.id, entries.len());

    Ok(Json(json!({
        "success": true,
        "eventId": event.id,
        "attendeeCount": entries.len(),
        "csvErrors": csv_errors,
    }))
    .into_response())
}

/// Basic event info with counts, no auth required
pub async fn event_info(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let event = state
        .store
        .event(event_id)
        .await?
        .ok_or(ApiError::EventNotFound)?;

    event_summary(&state, &event).await
}

/// Attendee list for the sign-in page: names and check-in flags only
pub async fn list_attendees(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    state
        .store
        .event(event_id)
        .await?
        .ok_or(ApiError::EventNotFound)?;

    let attendees = state.store.attendees_with_status(event_id).await?;

    Ok(Json(json!({ "attendees": attendees })))
}

/// The check-in transition: record every attempt, flag repeats
///
/// Re-entry is not rejected. A second swipe records a second row and tells
/// the caller it was a repeat; the audit trail keeps one row per attempt.
pub async fn sign_in(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
    Json(payload): Json<SignInRequest>,
) -> ApiResult<impl IntoResponse> {
    let attendee_id = payload
        .attendee_id
        .ok_or_else(|| ApiError::BadRequest("Attendee ID required".to_string()))?;

    let attendee = state
        .store
        .attendee(event_id, attendee_id)
        .await?
        .ok_or(ApiError::AttendeeNotFound)?;

    let already_signed_in = state.store.has_check_in(event_id, attendee_id).await?;
    state.store.record_check_in(event_id, attendee_id).await?;

    if already_signed_in {
        warn!(
            "Attendee {} already signed in to event {}, recorded repeat",
            attendee.name, event_id
        );
        Ok(Json(json!({
            "success": true,
            "attendeeName": attendee.name,
            "alreadySignedIn": true,
            "message": "You were already signed in, but we've recorded this additional check-in.",
        })))
    } else {
        info!("{} signed in to event {}", attendee.name, event_id);
        Ok(Json(json!({
            "success": true,
            "attendeeName": attendee.name,
            "alreadySignedIn": false,
        })))
    }
}

/// Organizer authentication: verify the shared password, set the session
/// cookie, hand the CSRF nonce to the UI
///
/// Unknown event and wrong password are deliberately indistinguishable, so
/// the auth endpoint cannot be used to enumerate event ids.
pub async fn auth(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
    jar: CookieJar,
    Json(payload): Json<AuthRequest>,
) -> ApiResult<(CookieJar, Json<serde_json::Value>)> {
    let password = payload.password.ok_or(ApiError::InvalidCredentials)?;

    let event = state
        .store
        .event(event_id)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    if !password::verify(&password, &event.password_hash) {
        warn!("Failed authentication attempt for event {}", event_id);
        return Err(ApiError::InvalidCredentials);
    }

    let session = state.sessions.issue(event_id).await?;

    let cookie = Cookie::build((SESSION_COOKIE, session.token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    Ok((
        jar.add(cookie),
        Json(json!({
            "success": true,
            "csrfToken": session.csrf_token,
        })),
    ))
}

/// Logout: revoke the session and clear the cookie
///
/// Idempotent by design; logging out without a session, or with a stale
/// token, still succeeds.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Json<serde_json::Value>)> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.sessions.revoke(cookie.value()).await?;
    }

    let jar = jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/").build());

    Ok((jar, Json(json!({ "success": true }))))
}

/// Event details for the management page (session protected)
pub async fn event_details(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
    Extension(authed): Extension<AuthedEvent>,
) -> ApiResult<impl IntoResponse> {
    if !verify_event_access(authed.event_id, event_id) {
        return Err(ApiError::Forbidden);
    }

    let event = state
        .store
        .event(event_id)
        .await?
        .ok_or(ApiError::EventNotFound)?;

    event_summary(&state, &event).await
}

/// Check-in analytics (session protected)
pub async fn analytics(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
    Extension(authed): Extension<AuthedEvent>,
) -> ApiResult<impl IntoResponse> {
    if !verify_event_access(authed.event_id, event_id) {
        return Err(ApiError::Forbidden);
    }

    let total_attendees = state.store.attendee_count(event_id).await?;
    let total_checked_in = state.store.checked_in_count(event_id).await?;
    let check_ins_by_date = state.store.check_ins_by_date(event_id).await?;
    let recent_check_ins = state.store.recent_check_ins(event_id, 10).await?;

    Ok(Json(json!({
        "totalAttendees": total_attendees,
        "totalCheckedIn": total_checked_in,
        "checkInsByDate": check_ins_by_date,
        "recentCheckIns": recent_check_ins,
    })))
}

/// CSV export of the roster with check-in times (session protected)
pub async fn export_csv(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
    Extension(authed): Extension<AuthedEvent>,
) -> ApiResult<Response> {
    if !verify_event_access(authed.event_id, event_id) {
        return Err(ApiError::Forbidden);
    }

    let event = state
        .store
        .event(event_id)
        .await?
        .ok_or(ApiError::EventNotFound)?;

    let rows = state.store.export_rows(event_id).await?;
    let (filename, csv) = export::render(&event.name, &rows);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        csv,
    )
        .into_response())
}

/// Add a single attendee to the roster (session protected, CSRF guarded)
///
/// Unlike bulk import, this path rejects duplicate names within the event.
pub async fn add_attendee(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
    Extension(authed): Extension<AuthedEvent>,
    Json(payload): Json<AddAttendeeRequest>,
) -> ApiResult<impl IntoResponse> {
    if !verify_event_access(authed.event_id, event_id) {
        return Err(ApiError::Forbidden);
    }

    let name = payload.name.as_deref().map(str::trim).unwrap_or("");
    validation::validate_attendee_name(name).map_err(ApiError::BadRequest)?;

    state
        .store
        .event(event_id)
        .await?
        .ok_or(ApiError::EventNotFound)?;

    if state.store.attendee_name_exists(event_id, name).await? {
        return Err(ApiError::Conflict(
            "An attendee with this name already exists".to_string(),
        ));
    }

    let external_id = payload
        .external_id
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from);

    let attendee = state
        .store
        .add_attendee(NewAttendee {
            event_id,
            name: name.to_string(),
            external_id,
        })
        .await?;

    info!("Added attendee {} to event {}", attendee.name, event_id);

    Ok(Json(json!({
        "success": true,
        "attendee": attendee,
    })))
}

async fn event_summary(state: &AppState, event: &Event) -> ApiResult<Json<serde_json::Value>> {
    let attendee_count = state.store.attendee_count(event.id).await?;
    let checked_in_count = state.store.checked_in_count(event.id).await?;

    Ok(Json(json!({
        "event": {
            "id": event.id,
            "name": event.name,
            "location": event.location,
            "created_at": event.created_at,
        },
        "attendeeCount": attendee_count,
        "checkedInCount": checked_in_count,
    })))
}
