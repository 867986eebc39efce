//! SessionService - pay, then get a session.

use chrono::{Duration, Utc};
use std::sync::Arc;

use super::{Session, SessionError, SessionStatus, SessionStore};
use crate::wallet::WalletGateway;

pub const SESSION_DURATION_HOURS: i64 = 24;
pub const SESSION_COST_SATS: u64 = 1;

pub struct SessionService {
    wallet: Arc<dyn WalletGateway>,
    store: Arc<SessionStore>,
    ttl: Duration,
    cost: u64,
}

impl SessionService {
    pub fn new(wallet: Arc<dyn WalletGateway>, store: Arc<SessionStore>) -> Self {
        Self { wallet, store, ttl: Duration::hours(SESSION_DURATION_HOURS), cost: SESSION_COST_SATS }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self { self.ttl = ttl; self }
    pub fn with_cost(mut self, sats: u64) -> Self { self.cost = sats; self }

    pub fn wallet(&self) -> &Arc<dyn WalletGateway> { &self.wallet }
    pub fn store(&self) -> &Arc<SessionStore> { &self.store }
    pub fn cost(&self) -> u64 { self.cost }

    /// Redeem `token` if one is given, then issue a session.
    ///
    /// Without a token (`None` or `""`) the session is free. Any other string,
    /// whitespace included, is redeemed. With one, the redeemed amount
    /// must cover the session cost. An underpaid token is not refunded: its
    /// proofs already belong to the service wallet.
    pub async fn start(&self, token: Option<&str>, owner_key: Option<String>) -> Result<Session, SessionError> {
        match token.filter(|t| !t.is_empty()) {
            Some(token) => {
                let outcome = self.wallet.redeem(token).await;
                if !outcome.success {
                    return Err(SessionError::PaymentFailed(outcome.message));
                }
                if outcome.amount < self.cost {
                    tracing::warn!(
                        received = outcome.amount,
                        required = self.cost,
                        "underpaid token kept without refund"
                    );
                    return Err(SessionError::InsufficientPayment { required: self.cost, received: outcome.amount });
                }
            }
            None => tracing::debug!("no token supplied, issuing unpaid session"),
        }

        let session = Session::new(owner_key, self.ttl, Utc::now());
        self.store.insert(session.clone());
        tracing::info!(session = %session.short_id(), expires_at = %session.expires_at, "session started");
        Ok(session)
    }

    pub fn check(&self, id: &str) -> Result<SessionStatus, SessionError> {
        let session = self.store.check(id, Utc::now())?;
        Ok(SessionStatus { valid: true, expires_at: session.expires_at })
    }
}
