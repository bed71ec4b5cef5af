//! PostgreSQL store
//!
//! Queries go through the shared connection pool from `common::database`.
//! Every mutation is a single-row insert, so no transactions are needed.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use tracing::info;

use super::{EventStore, SessionStore, StoreResult};
use crate::models::{
    Attendee, AttendeeStatus, CheckIn, DailyCount, Event, ExportRow, NewAttendee, NewEvent,
    RecentCheckIn, Session,
};

/// PostgreSQL-backed storage
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an initialized connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the tables if they do not exist yet
    pub async fn init_schema(&self) -> StoreResult<()> {
        info!("Ensuring database schema");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS events (
                id BIGINT PRIMARY KEY,
                name TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                location TEXT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS attendees (
                id BIGSERIAL PRIMARY KEY,
                event_id BIGINT NOT NULL REFERENCES events(id),
                name TEXT NOT NULL,
                external_id TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS check_ins (
                id BIGSERIAL PRIMARY KEY,
                event_id BIGINT NOT NULL REFERENCES events(id),
                attendee_id BIGINT NOT NULL REFERENCES attendees(id),
                checked_in_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                token TEXT PRIMARY KEY,
                event_id BIGINT NOT NULL REFERENCES events(id),
                csrf_token TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                expires_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl SessionStore for PgStore {
    async fn put(&self, session: Session) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (token, event_id, csrf_token, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&session.token)
        .bind(session.event_id)
        .bind(&session.csrf_token)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_if_live(&self, token: &str) -> StoreResult<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            SELECT token, event_id, csrf_token, created_at, expires_at
            FROM sessions
            WHERE token = $1 AND expires_at > now()
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    async fn delete(&self, token: &str) -> StoreResult<()> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl EventStore for PgStore {
    async fn create_event(&self, new: NewEvent) -> StoreResult<Event> {
        // Timestamp-seconds candidate id; on collision bump and retry until
        // the conditional insert lands.
        let mut candidate = Utc::now().timestamp();
        loop {
            let event = sqlx::query_as::<_, Event>(
                r#"
                INSERT INTO events (id, name, password_hash, location)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (id) DO NOTHING
                RETURNING id, name, password_hash, location, created_at
                "#,
            )
            .bind(candidate)
            .bind(&new.name)
            .bind(&new.password_hash)
            .bind(&new.location)
            .fetch_optional(&self.pool)
            .await?;

            match event {
                Some(event) => {
                    info!("Created event {} ({})", event.id, event.name);
                    return Ok(event);
                }
                None => candidate += 1,
            }
        }
    }

    async fn event(&self, event_id: i64) -> StoreResult<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            SELECT id, name, password_hash, location, created_at
            FROM events
            WHERE id = $1
            "#,
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    async fn add_attendee(&self, new: NewAttendee) -> StoreResult<Attendee> {
        let attendee = sqlx::query_as::<_, Attendee>(
            r#"
            INSERT INTO attendees (event_id, name, external_id)
            VALUES ($1, $2, $3)
            RETURNING id, event_id, name, external_id
            "#,
        )
        .bind(new.event_id)
        .bind(&new.name)
        .bind(&new.external_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(attendee)
    }

    async fn attendee(&self, event_id: i64, attendee_id: i64) -> StoreResult<Option<Attendee>> {
        let attendee = sqlx::query_as::<_, Attendee>(
            r#"
            SELECT id, event_id, name, external_id
            FROM attendees
            WHERE id = $1 AND event_id = $2
            "#,
        )
        .bind(attendee_id)
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(attendee)
    }

    async fn attendee_name_exists(&self, event_id: i64, name: &str) -> StoreResult<bool> {
        let row = sqlx::query(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM attendees
                WHERE event_id = $1 AND LOWER(name) = LOWER($2)
            ) AS present
            "#,
        )
        .bind(event_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("present"))
    }

    async fn attendees_with_status(&self, event_id: i64) -> StoreResult<Vec<AttendeeStatus>> {
        let rows = sqlx::query_as::<_, AttendeeStatus>(
            r#"
            SELECT a.id, a.name,
                   EXISTS(SELECT 1 FROM check_ins c WHERE c.attendee_id = a.id) AS checked_in
            FROM attendees a
            WHERE a.event_id = $1
            ORDER BY a.name
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn attendee_count(&self, event_id: i64) -> StoreResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM attendees WHERE event_id = $1")
            .bind(event_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get("count"))
    }

    async fn checked_in_count(&self, event_id: i64) -> StoreResult<i64> {
        let row = sqlx::query(
            "SELECT COUNT(DISTINCT attendee_id) AS count FROM check_ins WHERE event_id = $1",
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("count"))
    }

    async fn has_check_in(&self, event_id: i64, attendee_id: i64) -> StoreResult<bool> {
        let row = sqlx::query(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM check_ins WHERE event_id = $1 AND attendee_id = $2
            ) AS present
            "#,
        )
        .bind(event_id)
        .bind(attendee_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("present"))
    }

    async fn record_check_in(&self, event_id: i64, attendee_id: i64) -> StoreResult<CheckIn> {
        let check_in = sqlx::query_as::<_, CheckIn>(
            r#"
            INSERT INTO check_ins (event_id, attendee_id)
            VALUES ($1, $2)
            RETURNING id, event_id, attendee_id, checked_in_at
            "#,
        )
        .bind(event_id)
        .bind(attendee_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(check_in)
    }

    async fn check_ins_by_date(&self, event_id: i64) -> StoreResult<Vec<DailyCount>> {
        let rows = sqlx::query_as::<_, DailyCount>(
            r#"
            SELECT to_char(checked_in_at, 'YYYY-MM-DD') AS date, COUNT(*) AS count
            FROM check_ins
            WHERE event_id = $1
            GROUP BY 1
            ORDER BY 1
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn recent_check_ins(&self, event_id: i64, limit: i64) -> StoreResult<Vec<RecentCheckIn>> {
        let rows = sqlx::query_as::<_, RecentCheckIn>(
            r#"
            SELECT a.name AS attendee_name, c.checked_in_at
            FROM check_ins c
            JOIN attendees a ON c.attendee_id = a.id
            WHERE c.event_id = $1
            ORDER BY c.checked_in_at DESC, c.id DESC
            LIMIT $2
            "#,
        )
        .bind(event_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn export_rows(&self, event_id: i64) -> StoreResult<Vec<ExportRow>> {
        let rows = sqlx::query_as::<_, ExportRow>(
            r#"
            SELECT a.name, a.external_id, MIN(c.checked_in_at) AS checked_in_at
            FROM attendees a
            LEFT JOIN check_ins c ON c.attendee_id = a.id
            WHERE a.event_id = $1
            GROUP BY a.id, a.name, a.external_id
            ORDER BY a.name
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
