//! Sessions - time-boxed access handles issued after payment.
//!
//! A session id is a bearer capability: whoever holds it may use the session
//! until `expires_at`. There is no logout; expired sessions are evicted the
//! first time they are looked up.
//!
//! ```text
//! token? ──→ SessionService::start
//!              │
//!              ├── token given → WalletGateway::redeem ──→ failed / underpaid → SessionError
//!              │
//!              └── Session::new (256-bit id, now + 24h) ──→ SessionStore::insert
//!
//! id ──→ SessionService::check ──→ SessionStore::check(id, now)
//!                                    ├── missing          → NotFound
//!                                    ├── now > expires_at → evict, Expired
//!                                    └── ok               → SessionStatus
//! ```

mod service;
mod store;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::Serialize;
use thiserror::Error;

pub use service::{SessionService, SESSION_COST_SATS, SESSION_DURATION_HOURS};
pub use store::SessionStore;

const SESSION_ID_BYTES: usize = 32;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Payment failed: {0}")]
    PaymentFailed(String),

    #[error("Insufficient payment. Required: {required} sat, received: {received} sats")]
    InsufficientPayment { required: u64, received: u64 },

    #[error("Session not found")]
    NotFound,

    #[error("Session expired")]
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub id: String,
    /// Client-supplied public key. Stored, never checked.
    pub owner_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(owner_key: Option<String>, ttl: Duration, now: DateTime<Utc>) -> Self {
        Self { id: generate_session_id(), owner_key, created_at: now, expires_at: now + ttl }
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now <= self.expires_at
    }

    /// Leading characters of the id, safe to log.
    pub fn short_id(&self) -> &str {
        self.id.get(..8).unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionStatus {
    pub valid: bool,
    pub expires_at: DateTime<Utc>,
}

/// 32 random bytes, base64url without padding (43 chars).
pub fn generate_session_id() -> String {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_session_id_shape() {
        let id = generate_session_id();
        assert_eq!(id.len(), 43);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));

        let ids: HashSet<String> = (0..1000).map(|_| generate_session_id()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_validity_boundary() {
        let now = Utc::now();
        let session = Session::new(None, Duration::hours(24), now);
        assert_eq!(session.expires_at - session.created_at, Duration::hours(24));
        assert!(session.is_valid_at(now));
        assert!(session.is_valid_at(session.expires_at));
        assert!(!session.is_valid_at(session.expires_at + Duration::milliseconds(1)));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            SessionError::InsufficientPayment { required: 1, received: 0 }.to_string(),
            "Insufficient payment. Required: 1 sat, received: 0 sats"
        );
        assert_eq!(
            SessionError::PaymentFailed("Malformed token: base64".into()).to_string(),
            "Payment failed: Malformed token: base64"
        );
    }
}
