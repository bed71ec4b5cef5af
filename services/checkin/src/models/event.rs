//! Event model and related payloads

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Event entity
///
/// The id is a coarse unix-timestamp-derived value assigned by the store;
/// the store bumps colliding candidates so ids stay unique.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Event {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// New event creation payload
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub name: String,
    pub password_hash: String,
    pub location: Option<String>,
}
