//! Auth gate: PIN login and per-request admission.
//!
//! Wraps a [`SessionStore`] with the shared-PIN check. When no PIN is
//! configured the gate admits everything.

use std::sync::Arc;

use shoplist_core::AuthError;
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

use crate::session::SessionStore;

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Admit,
    Deny,
}

impl Decision {
    pub fn is_admit(self) -> bool {
        matches!(self, Decision::Admit)
    }
}

pub struct AuthGate {
    pin: Option<String>,
    sessions: Arc<SessionStore>,
}

impl std::fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGate")
            .field("enabled", &self.is_enabled())
            .field("sessions", &self.sessions)
            .finish()
    }
}

impl AuthGate {
    /// Build a gate. An empty PIN counts as no PIN.
    pub fn new(pin: Option<String>, sessions: Arc<SessionStore>) -> Self {
        Self {
            pin: pin.filter(|p| !p.is_empty()),
            sessions,
        }
    }

    /// A gate with authentication disabled.
    pub fn open(sessions: Arc<SessionStore>) -> Self {
        Self::new(None, sessions)
    }

    pub fn is_enabled(&self) -> bool {
        self.pin.is_some()
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Verify the PIN and open a session.
    pub fn authenticate(&self, pin: &str) -> Result<String, AuthError> {
        if let Some(expected) = &self.pin
            && !bool::from(expected.as_bytes().ct_eq(pin.as_bytes()))
        {
            warn!("Login rejected: incorrect PIN");
            return Err(AuthError::InvalidPin);
        }

        let token = self.sessions.create();
        debug!("Login accepted");
        Ok(token)
    }

    /// Decide whether a request carrying `token` may proceed.
    ///
    /// Admitting refreshes the session's expiry.
    pub fn authorize(&self, token: Option<&str>) -> Decision {
        if !self.is_enabled() {
            return Decision::Admit;
        }

        match token {
            Some(token) if self.sessions.touch(token) => Decision::Admit,
            _ => Decision::Deny,
        }
    }

    /// Like [`AuthGate::authorize`], as a `Result` for `?` propagation.
    pub fn require(&self, token: Option<&str>) -> Result<(), AuthError> {
        match self.authorize(token) {
            Decision::Admit => Ok(()),
            Decision::Deny => Err(AuthError::Unauthorized),
        }
    }

    /// End a session.
    pub fn logout(&self, token: &str) {
        self.sessions.revoke(token);
    }
}
