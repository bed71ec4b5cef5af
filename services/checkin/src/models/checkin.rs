//! Check-in model and analytics projections

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// A single recorded check-in
///
/// Multiple rows per attendee are allowed by design: every physical badge
/// swipe becomes its own ground-truth record.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CheckIn {
    pub id: i64,
    pub event_id: i64,
    pub attendee_id: i64,
    pub checked_in_at: DateTime<Utc>,
}

/// Check-in volume for one calendar day
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DailyCount {
    pub date: String,
    pub count: i64,
}

/// A recent check-in, joined with the attendee name
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RecentCheckIn {
    pub attendee_name: String,
    pub checked_in_at: DateTime<Utc>,
}

/// One attendee line of the CSV export; `checked_in_at` holds the first
/// recorded check-in, if any
#[derive(Debug, Clone, FromRow)]
pub struct ExportRow {
    pub name: String,
    pub external_id: Option<String>,
    pub checked_in_at: Option<DateTime<Utc>>,
}
