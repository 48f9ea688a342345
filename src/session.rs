use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::auth::EngineStatus;
use crate::environment::Environment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Unauthenticated,
    AuthenticatedUninitialized,
    Ready,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub is_authenticated: bool,
    pub is_expired: bool,
    pub is_initialized: bool,
    pub api_key: String,
    pub environment: Environment,
}

impl SessionSnapshot {
    pub fn phase(&self) -> SessionPhase {
        phase_of(self.is_authenticated, self.is_initialized)
    }
}

fn phase_of(authenticated: bool, initialized: bool) -> SessionPhase {
    match (authenticated, initialized) {
        (false, _) => SessionPhase::Unauthenticated,
        (true, false) => SessionPhase::AuthenticatedUninitialized,
        (true, true) => SessionPhase::Ready,
    }
}

/// Session state mirrored by the facade.
///
/// Readers never wait on engine calls. Writers are not serialized against each other; when
/// mutating calls race, whichever finishes last determines the state.
#[derive(Debug)]
pub struct SessionState {
    authenticated: AtomicBool,
    expired: AtomicBool,
    initialized: AtomicBool,
    api_key: RwLock<String>,
    environment: Environment,
}

impl SessionState {
    pub fn new(environment: Environment) -> Self {
        Self {
            authenticated: AtomicBool::new(false),
            expired: AtomicBool::new(false),
            initialized: AtomicBool::new(false),
            api_key: RwLock::new(String::new()),
            environment,
        }
    }

    pub fn is_authenticated(&self) -> bool { self.authenticated.load(Ordering::Acquire) }
    pub fn is_expired(&self) -> bool { self.expired.load(Ordering::Acquire) }
    pub fn is_initialized(&self) -> bool { self.initialized.load(Ordering::Acquire) }
    pub fn api_key(&self) -> String { self.api_key.read().clone() }
    pub fn environment(&self) -> Environment { self.environment }

    pub fn phase(&self) -> SessionPhase {
        phase_of(self.is_authenticated(), self.is_initialized())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            is_authenticated: self.is_authenticated(),
            is_expired: self.is_expired(),
            is_initialized: self.is_initialized(),
            api_key: self.api_key(),
            environment: self.environment,
        }
    }

    /// Adopt what the engine reports. The api key is kept only while authenticated.
    pub(crate) fn apply(&self, status: &EngineStatus) {
        let authenticated = status.is_authenticated && !status.api_key.is_empty();
        *self.api_key.write() = if authenticated { status.api_key.clone() } else { String::new() };
        self.expired.store(authenticated && status.is_authentication_expired, Ordering::Release);
        self.initialized.store(authenticated && status.is_initialized, Ordering::Release);
        self.authenticated.store(authenticated, Ordering::Release);
    }

    pub(crate) fn mark_expired(&self) {
        self.expired.store(true, Ordering::Release);
        self.initialized.store(false, Ordering::Release);
    }

    pub(crate) fn reset(&self) {
        self.authenticated.store(false, Ordering::Release);
        self.initialized.store(false, Ordering::Release);
        self.expired.store(false, Ordering::Release);
        self.api_key.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(auth: bool, expired: bool, init: bool, key: &str) -> EngineStatus {
        EngineStatus {
            is_authenticated: auth,
            is_authentication_expired: expired,
            is_initialized: init,
            api_key: key.to_string(),
        }
    }

    #[test]
    fn starts_unauthenticated() {
        let s = SessionState::new(Environment::Dev);
        assert_eq!(s.phase(), SessionPhase::Unauthenticated);
        assert_eq!(s.api_key(), "");
        assert_eq!(s.environment(), Environment::Dev);
    }

    #[test]
    fn apply_tracks_engine_phases() {
        let s = SessionState::new(Environment::Prod);
        s.apply(&status(true, false, false, "KEY1"));
        assert_eq!(s.phase(), SessionPhase::AuthenticatedUninitialized);
        assert_eq!(s.api_key(), "KEY1");
        s.apply(&status(true, false, true, "KEY1"));
        assert_eq!(s.phase(), SessionPhase::Ready);
        assert_eq!(s.snapshot().phase(), SessionPhase::Ready);
    }

    #[test]
    fn api_key_only_while_authenticated() {
        let s = SessionState::new(Environment::Prod);
        s.apply(&status(false, false, true, "LEFTOVER"));
        assert!(!s.is_authenticated());
        assert!(!s.is_initialized());
        assert_eq!(s.api_key(), "");
    }

    #[test]
    fn expiry_demotes_ready() {
        let s = SessionState::new(Environment::Prod);
        s.apply(&status(true, false, true, "KEY1"));
        s.mark_expired();
        assert!(s.is_expired());
        assert_eq!(s.phase(), SessionPhase::AuthenticatedUninitialized);
    }

    #[test]
    fn reset_returns_to_baseline() {
        let s = SessionState::new(Environment::Beta);
        s.apply(&status(true, true, true, "KEY1"));
        s.reset();
        let snap = s.snapshot();
        assert!(!snap.is_authenticated && !snap.is_expired && !snap.is_initialized);
        assert_eq!(snap.api_key, "");
        assert_eq!(snap.environment, Environment::Beta);
    }
}
