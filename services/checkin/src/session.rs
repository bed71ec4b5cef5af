//! Session lifecycle: minting, resolution, revocation
//!
//! A session binds one opaque token to one event. There is no cross-event
//! single sign-on: authenticating for event X grants nothing for event Y.

use std::sync::Arc;

use chrono::{Duration, Utc};
use rand::{Rng, distributions::Alphanumeric};
use tracing::info;
use uuid::Uuid;

use crate::models::Session;
use crate::store::{SessionStore, StoreResult};

/// Length of the opaque session token
const TOKEN_LEN: usize = 48;

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Fixed session lifetime in seconds
    pub ttl_seconds: i64,
}

impl SessionConfig {
    /// Build a configuration from environment variables
    ///
    /// # Environment Variables
    /// - `SESSION_TTL_SECONDS`: session lifetime (default: 86400, one day)
    pub fn from_env() -> Self {
        let ttl_seconds = std::env::var("SESSION_TTL_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(86_400);

        SessionConfig { ttl_seconds }
    }
}

/// Issues, resolves and revokes sessions through the injected store
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    ttl_seconds: i64,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(store: Arc<dyn SessionStore>, config: SessionConfig) -> Self {
        Self {
            store,
            ttl_seconds: config.ttl_seconds,
        }
    }

    /// Mint and persist a session bound to one event
    ///
    /// The token comes from the thread-local CSPRNG and is not derivable
    /// from the event id, the clock, or anything else public. The CSRF
    /// nonce travels back to the UI in the auth response body, never in
    /// the cookie.
    pub async fn issue(&self, event_id: i64) -> StoreResult<Session> {
        let now = Utc::now();
        let session = Session {
            token: generate_token(),
            event_id,
            csrf_token: Uuid::new_v4().to_string(),
            created_at: now,
            expires_at: now + Duration::seconds(self.ttl_seconds),
        };
        self.store.put(session.clone()).await?;
        info!("Issued session for event {}", event_id);
        Ok(session)
    }

    /// Resolve a cookie token to a live session
    ///
    /// Expiry is applied lazily by the store; resolution never renews or
    /// otherwise mutates the session.
    pub async fn resolve(&self, token: &str) -> StoreResult<Option<Session>> {
        self.store.get_if_live(token).await
    }

    /// Invalidate a session. Idempotent: unknown or already-expired tokens
    /// succeed silently.
    pub async fn revoke(&self, token: &str) -> StoreResult<()> {
        self.store.delete(token).await
    }
}

fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// The isolation boundary: a session bound to event X authorizes event X
/// and nothing else
pub fn verify_event_access(session_event_id: i64, requested_event_id: i64) -> bool {
    session_event_id == requested_event_id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serial_test::serial;

    fn manager(ttl_seconds: i64) -> SessionManager {
        SessionManager::new(Arc::new(MemoryStore::new()), SessionConfig { ttl_seconds })
    }

    #[test]
    #[serial]
    fn config_defaults_to_one_day() {
        unsafe {
            std::env::remove_var("SESSION_TTL_SECONDS");
        }
        assert_eq!(SessionConfig::from_env().ttl_seconds, 86_400);

        unsafe {
            std::env::set_var("SESSION_TTL_SECONDS", "7200");
        }
        assert_eq!(SessionConfig::from_env().ttl_seconds, 7200);

        unsafe {
            std::env::remove_var("SESSION_TTL_SECONDS");
        }
    }

    #[test]
    fn tokens_are_long_random_and_distinct() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), TOKEN_LEN);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn access_requires_exact_event_match() {
        assert!(verify_event_access(1700000000, 1700000000));
        assert!(!verify_event_access(1700000000, 1700000001));
        assert!(!verify_event_access(1700000001, 1700000000));
    }

    #[tokio::test]
    async fn issued_sessions_resolve_until_revoked() {
        let sessions = manager(3600);
        let session = sessions.issue(42).await.unwrap();
        assert_eq!(session.event_id, 42);
        assert!(!session.csrf_token.is_empty());
        assert_ne!(session.csrf_token, session.token);

        let resolved = sessions.resolve(&session.token).await.unwrap().unwrap();
        assert_eq!(resolved.event_id, 42);

        sessions.revoke(&session.token).await.unwrap();
        assert!(sessions.resolve(&session.token).await.unwrap().is_none());

        // Revoking again is not an error.
        sessions.revoke(&session.token).await.unwrap();
    }

    #[tokio::test]
    async fn zero_ttl_sessions_are_born_expired() {
        let sessions = manager(0);
        let session = sessions.issue(42).await.unwrap();
        assert!(sessions.resolve(&session.token).await.unwrap().is_none());
    }
}
