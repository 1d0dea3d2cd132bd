//! Session store: opaque tokens with sliding expiration.
//!
//! Tokens are 256 bits from the thread-local CSPRNG, URL-safe base64
//! encoded. Each successful [`SessionStore::touch`] pushes the expiry out
//! by the full TTL again. Expired entries are never honoured; they are
//! dropped lazily by [`SessionStore::purge_expired`].

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

/// Default sliding session lifetime.
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24;

/// Number of random bytes in a token.
const TOKEN_BYTES: usize = 32;

/// Thread-safe mapping from token to expiry instant.
///
/// Uses `std::sync::RwLock` (non-async, held briefly, never across `.await`).
pub struct SessionStore {
    ttl: Duration,
    sessions: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("ttl", &self.ttl)
            .field("sessions", &self.len())
            .finish()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Create a store with the default 24 hour TTL.
    pub fn new() -> Self {
        Self::with_ttl(Duration::hours(DEFAULT_SESSION_TTL_HOURS))
    }

    /// Create a store with a custom sliding TTL.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// The sliding lifetime applied on create and touch.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a new token valid for one TTL.
    pub fn create(&self) -> String {
        self.purge_expired();

        let mut bytes = [0u8; TOKEN_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        let token = URL_SAFE_NO_PAD.encode(bytes);

        let expires_at = Utc::now() + self.ttl;
        self.sessions
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(token.clone(), expires_at);

        debug!(%expires_at, "Session created");
        token
    }

    /// Refresh a live session. Returns `false` for unknown or expired tokens,
    /// leaving the store unchanged.
    pub fn touch(&self, token: &str) -> bool {
        let now = Utc::now();
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());

        match sessions.get_mut(token) {
            Some(expires_at) if now < *expires_at => {
                *expires_at = now + self.ttl;
                true
            }
            _ => false,
        }
    }

    /// Check a token without refreshing it.
    pub fn is_valid(&self, token: &str) -> bool {
        let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());
        sessions
            .get(token)
            .is_some_and(|expires_at| Utc::now() < *expires_at)
    }

    /// Expiry of a live session, if any.
    pub fn expires_at(&self, token: &str) -> Option<DateTime<Utc>> {
        let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());
        sessions
            .get(token)
            .copied()
            .filter(|expires_at| Utc::now() < *expires_at)
    }

    /// Remove a session. No-op if absent.
    pub fn revoke(&self, token: &str) {
        let removed = self
            .sessions
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(token)
            .is_some();
        if removed {
            debug!("Session revoked");
        }
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        let before = sessions.len();
        sessions.retain(|_, expires_at| now < *expires_at);
        before - sessions.len()
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Overwrite a session's expiry.
    #[cfg(test)]
    pub(crate) fn set_expiry(&self, token: &str, expires_at: DateTime<Utc>) {
        if let Some(slot) = self
            .sessions
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .get_mut(token)
        {
            *slot = expires_at;
        }
    }
}
