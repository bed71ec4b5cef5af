//! Attendee model and related payloads

use serde::Serialize;
use sqlx::FromRow;

/// Attendee entity, owned by exactly one event
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Attendee {
    pub id: i64,
    pub event_id: i64,
    pub name: String,
    pub external_id: Option<String>,
}

/// New attendee creation payload
#[derive(Debug, Clone)]
pub struct NewAttendee {
    pub event_id: i64,
    pub name: String,
    pub external_id: Option<String>,
}

/// Attendee row for the public sign-in listing
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AttendeeStatus {
    pub id: i64,
    pub name: String,
    pub checked_in: bool,
}
