//! Session model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// A server-issued credential proving "this client authenticated as
/// organizer of event `event_id`"
///
/// The token is the primary key; no two sessions ever share one. The CSRF
/// token is a per-session nonce echoed back by the UI on mutating requests.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub token: String,
    pub event_id: i64,
    pub csrf_token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Expiry is evaluated lazily at validation time
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
