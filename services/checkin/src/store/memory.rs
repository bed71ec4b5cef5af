//! In-memory store
//!
//! Backs the test suite and standalone runs without a `DATABASE_URL`. Safe
//! under concurrent requests; every operation takes one short write or read
//! lock and holds it across no other await point.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{EventStore, SessionStore, StoreResult};
use crate::models::{
    Attendee, AttendeeStatus, CheckIn, DailyCount, Event, ExportRow, NewAttendee, NewEvent,
    RecentCheckIn, Session,
};

#[derive(Default)]
struct Tables {
    events: HashMap<i64, Event>,
    attendees: HashMap<i64, Attendee>,
    check_ins: Vec<CheckIn>,
    next_attendee_id: i64,
    next_check_in_id: i64,
}

/// Thread-safe in-memory storage
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn put(&self, session: Session) -> StoreResult<()> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.token.clone(), session);
        Ok(())
    }

    async fn get_if_live(&self, token: &str) -> StoreResult<Option<Session>> {
        let mut sessions = self.sessions.write().await;
        match sessions.get(token) {
            Some(session) if session.is_expired(Utc::now()) => {
                // Lazy expiry: drop the dead entry on the way out.
                sessions.remove(token);
                Ok(None)
            }
            Some(session) => Ok(Some(session.clone())),
            None => Ok(None),
        }
    }

    async fn delete(&self, token: &str) -> StoreResult<()> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(token);
        Ok(())
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn create_event(&self, new: NewEvent) -> StoreResult<Event> {
        let mut tables = self.tables.write().await;

        // Coarse timestamp-derived id; bump past collisions so two events
        // created in the same second stay distinct.
        let mut id = Utc::now().timestamp();
        while tables.events.contains_key(&id) {
            id += 1;
        }

        let event = Event {
            id,
            name: new.name,
            password_hash: new.password_hash,
            location: new.location,
            created_at: Utc::now(),
        };
        tables.events.insert(id, event.clone());
        Ok(event)
    }

    async fn event(&self, event_id: i64) -> StoreResult<Option<Event>> {
        let tables = self.tables.read().await;
        Ok(tables.events.get(&event_id).cloned())
    }

    async fn add_attendee(&self, new: NewAttendee) -> StoreResult<Attendee> {
        let mut tables = self.tables.write().await;
        tables.next_attendee_id += 1;
        let attendee = Attendee {
            id: tables.next_attendee_id,
            event_id: new.event_id,
            name: new.name,
            external_id: new.external_id,
        };
        tables.attendees.insert(attendee.id, attendee.clone());
        Ok(attendee)
    }

    async fn attendee(&self, event_id: i64, attendee_id: i64) -> StoreResult<Option<Attendee>> {
        let tables = self.tables.read().await;
        Ok(tables
            .attendees
            .get(&attendee_id)
            .filter(|a| a.event_id == event_id)
            .cloned())
    }

    async fn attendee_name_exists(&self, event_id: i64, name: &str) -> StoreResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables
            .attendees
            .values()
            .any(|a| a.event_id == event_id && a.name.eq_ignore_ascii_case(name)))
    }

    async fn attendees_with_status(&self, event_id: i64) -> StoreResult<Vec<AttendeeStatus>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<AttendeeStatus> = tables
            .attendees
            .values()
            .filter(|a| a.event_id == event_id)
            .map(|a| AttendeeStatus {
                id: a.id,
                name: a.name.clone(),
                checked_in: tables.check_ins.iter().any(|c| c.attendee_id == a.id),
            })
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn attendee_count(&self, event_id: i64) -> StoreResult<i64> {
        let tables = self.tables.read().await;
        Ok(tables
            .attendees
            .values()
            .filter(|a| a.event_id == event_id)
            .count() as i64)
    }

    async fn checked_in_count(&self, event_id: i64) -> StoreResult<i64> {
        let tables = self.tables.read().await;
        let mut seen: Vec<i64> = tables
            .check_ins
            .iter()
            .filter(|c| c.event_id == event_id)
            .map(|c| c.attendee_id)
            .collect();
        seen.sort_unstable();
        seen.dedup();
        Ok(seen.len() as i64)
    }

    async fn has_check_in(&self, event_id: i64, attendee_id: i64) -> StoreResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables
            .check_ins
            .iter()
            .any(|c| c.event_id == event_id && c.attendee_id == attendee_id))
    }

    async fn record_check_in(&self, event_id: i64, attendee_id: i64) -> StoreResult<CheckIn> {
        let mut tables = self.tables.write().await;
        tables.next_check_in_id += 1;
        let check_in = CheckIn {
            id: tables.next_check_in_id,
            event_id,
            attendee_id,
            checked_in_at: Utc::now(),
        };
        tables.check_ins.push(check_in.clone());
        Ok(check_in)
    }

    async fn check_ins_by_date(&self, event_id: i64) -> StoreResult<Vec<DailyCount>> {
        let tables = self.tables.read().await;
        let mut by_date: BTreeMap<String, i64> = BTreeMap::new();
        for check_in in tables.check_ins.iter().filter(|c| c.event_id == event_id) {
            *by_date
                .entry(check_in.checked_in_at.format("%Y-%m-%d").to_string())
                .or_insert(0) += 1;
        }
        Ok(by_date
            .into_iter()
            .map(|(date, count)| DailyCount { date, count })
            .collect())
    }

    async fn recent_check_ins(&self, event_id: i64, limit: i64) -> StoreResult<Vec<RecentCheckIn>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<&CheckIn> = tables
            .check_ins
            .iter()
            .filter(|c| c.event_id == event_id)
            .collect();
        rows.sort_by(|a, b| (b.checked_in_at, b.id).cmp(&(a.checked_in_at, a.id)));
        Ok(rows
            .into_iter()
            .take(limit.max(0) as usize)
            .filter_map(|c| {
                tables.attendees.get(&c.attendee_id).map(|a| RecentCheckIn {
                    attendee_name: a.name.clone(),
                    checked_in_at: c.checked_in_at,
                })
            })
            .collect())
    }

    async fn export_rows(&self, event_id: i64) -> StoreResult<Vec<ExportRow>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<ExportRow> = tables
            .attendees
            .values()
            .filter(|a| a.event_id == event_id)
            .map(|a| ExportRow {
                name: a.name.clone(),
                external_id: a.external_id.clone(),
                checked_in_at: tables
                    .check_ins
                    .iter()
                    .filter(|c| c.attendee_id == a.id)
                    .map(|c| c.checked_in_at)
                    .min(),
            })
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }
}
