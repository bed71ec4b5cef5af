//! Multi-tenant event check-in service
//!
//! Organizers create an event with a roster of attendees and a shared
//! password; attendees check themselves in without authenticating; organizers
//! authenticate with the shared password to view analytics and export
//! results. Sessions are opaque cookie tokens bound to a single event, so an
//! organizer of one event can never read another event's data.

use std::sync::Arc;

pub mod error;
pub mod export;
pub mod middleware;
pub mod models;
pub mod password;
pub mod roster;
pub mod routes;
pub mod session;
pub mod store;
pub mod validation;

use crate::session::SessionManager;
use crate::store::EventStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EventStore>,
    pub sessions: SessionManager,
}
