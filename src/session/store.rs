//! In-memory session table. Not durable: a restart drops every session.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{Session, SessionError};

#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, session: Session) {
        self.write().insert(session.id.clone(), session);
    }

    /// Look up `id` as of `now`. An expired session is removed under the same
    /// write lock that observed it, so concurrent checks evict it exactly once.
    pub fn check(&self, id: &str, now: DateTime<Utc>) -> Result<Session, SessionError> {
        let mut sessions = self.write();
        match sessions.get(id) {
            None => Err(SessionError::NotFound),
            Some(session) if session.is_valid_at(now) => Ok(session.clone()),
            Some(_) => {
                sessions.remove(id);
                Err(SessionError::Expired)
            }
        }
    }

    /// Remove a session; removing an absent id is a no-op.
    pub fn remove(&self, id: &str) -> Option<Session> {
        self.write().remove(id)
    }

    /// Stored sessions, including expired ones nobody has asked about yet.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Session>> {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Session>> {
        self.sessions.write().unwrap_or_else(PoisonError::into_inner)
    }
}
