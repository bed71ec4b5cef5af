//! Storage abstraction for events, attendees, check-ins and sessions
//!
//! The rest of the service never touches a database directly; handlers and
//! the session manager go through these traits. Only point lookups,
//! event-scoped scans and single-row inserts are required, so both the
//! PostgreSQL store and the in-memory store satisfy them.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    Attendee, AttendeeStatus, CheckIn, DailyCount, Event, ExportRow, NewAttendee, NewEvent,
    RecentCheckIn, Session,
};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors raised by a store implementation
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Type alias for store results
pub type StoreResult<T> = Result<T, StoreError>;

/// Key-value session storage keyed by the opaque token
///
/// Exclusively owned by the authentication subsystem; nothing else mutates
/// sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist a freshly minted session
    async fn put(&self, session: Session) -> StoreResult<()>;

    /// Resolve a token to a live session; expired sessions resolve to `None`
    async fn get_if_live(&self, token: &str) -> StoreResult<Option<Session>>;

    /// Remove a session; deleting an unknown token is not an error
    async fn delete(&self, token: &str) -> StoreResult<()>;
}

/// Persistence for events, their rosters and their check-ins
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Create an event, assigning a unique timestamp-derived id
    async fn create_event(&self, new: NewEvent) -> StoreResult<Event>;

    /// Point lookup by event id
    async fn event(&self, event_id: i64) -> StoreResult<Option<Event>>;

    /// Insert one attendee into an event's roster
    async fn add_attendee(&self, new: NewAttendee) -> StoreResult<Attendee>;

    /// Fetch an attendee only if it belongs to the given event
    async fn attendee(&self, event_id: i64, attendee_id: i64) -> StoreResult<Option<Attendee>>;

    /// Case-insensitive name lookup within one event's roster
    async fn attendee_name_exists(&self, event_id: i64, name: &str) -> StoreResult<bool>;

    /// Roster ordered by name, with a checked-in flag per attendee
    async fn attendees_with_status(&self, event_id: i64) -> StoreResult<Vec<AttendeeStatus>>;

    /// Number of attendees on the roster
    async fn attendee_count(&self, event_id: i64) -> StoreResult<i64>;

    /// Number of distinct attendees with at least one check-in
    async fn checked_in_count(&self, event_id: i64) -> StoreResult<i64>;

    /// Whether any check-in exists for this (event, attendee) pair
    async fn has_check_in(&self, event_id: i64, attendee_id: i64) -> StoreResult<bool>;

    /// Insert a check-in row. Always inserts; repeat attempts are the
    /// caller's business to flag, never this layer's business to reject.
    async fn record_check_in(&self, event_id: i64, attendee_id: i64) -> StoreResult<CheckIn>;

    /// Check-in rows grouped by calendar day, ordered by date
    async fn check_ins_by_date(&self, event_id: i64) -> StoreResult<Vec<DailyCount>>;

    /// Most recent check-ins with attendee names, newest first
    async fn recent_check_ins(&self, event_id: i64, limit: i64) -> StoreResult<Vec<RecentCheckIn>>;

    /// Roster ordered by name with each attendee's first check-in time
    async fn export_rows(&self, event_id: i64) -> StoreResult<Vec<ExportRow>>;
}
