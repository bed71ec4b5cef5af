//! Request guards: session validation and CSRF protection

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::debug;

use crate::{AppState, error::ApiError};

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "session";

/// Header carrying the anti-forgery token on mutating requests
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Identity attached to a request once its session resolves
#[derive(Debug, Clone)]
pub struct AuthedEvent {
    pub event_id: i64,
    pub csrf_token: String,
}

/// Resolve the session cookie before any protected handler runs
///
/// Missing cookie, unknown token and expired session all short-circuit with
/// `Unauthenticated`; the guarded handler never executes. On success the
/// session's event identity lands in the request extensions for downstream
/// access checks.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let jar = CookieJar::from_headers(req.headers());
    let token = jar
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .ok_or(ApiError::Unauthenticated)?;

    let session = state
        .sessions
        .resolve(&token)
        .await?
        .ok_or(ApiError::Unauthenticated)?;

    debug!("Session resolved for event {}", session.event_id);
    req.extensions_mut().insert(AuthedEvent {
        event_id: session.event_id,
        csrf_token: session.csrf_token,
    });

    Ok(next.run(req).await)
}

/// Reject state-changing requests without a matching anti-forgery token
///
/// Runs after `auth_middleware`. Safe methods pass through untouched; a
/// valid session with a missing or wrong token is still rejected.
pub async fn csrf_middleware(req: Request<Body>, next: Next) -> Result<Response, ApiError> {
    if matches!(*req.method(), Method::GET | Method::HEAD | Method::OPTIONS) {
        return Ok(next.run(req).await);
    }

    let authed = req
        .extensions()
        .get::<AuthedEvent>()
        .ok_or(ApiError::Unauthenticated)?;

    let presented = req
        .headers()
        .get(CSRF_HEADER)
        .and_then(|value| value.to_str().ok());

    match presented {
        Some(token) if token == authed.csrf_token => Ok(next.run(req).await),
        _ => Err(ApiError::CsrfRejected),
    }
}
