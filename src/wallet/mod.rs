//! Wallet gateway - turns bearer eCash tokens into owned sats.
//!
//! The gateway is a capability: the session layer only sees [`WalletGateway`].
//! Two implementations ship:
//!
//! ```text
//! WalletGateway (trait)
//!     │
//!     ├── CashuWallet  (feature "cashu")
//!     │     ├── MintClient ──→ https://<mint named in token>/v1/{keysets,keys,swap}
//!     │     ├── dhke        (blind / unblind outputs)
//!     │     └── ProofStore ──→ <wallet_db>/proofs.json
//!     │
//!     └── MemoryWallet (deterministic in-memory ledger, demo + tests)
//! ```
//!
//! | Operation | Result |
//! |-----------|--------|
//! | `redeem(token)` | [`RedemptionOutcome`] `{success, amount, message}` |
//! | `balance()` | owned sats |
//! | `list_proofs()` | `[{amount, keyset_id}]` |
//! | `sweep()` | `{amount, token}` - every owned proof in one outgoing token |

#[cfg(feature = "cashu")]
pub mod cashu;
mod memory;
pub mod token;

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

pub use memory::MemoryWallet;
pub use token::{Proof, Token};

#[cfg(feature = "cashu")]
pub use cashu::CashuWallet;

/// Wallet errors. None of these are retried by the gateway.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    #[error("Mint error: {0}")]
    Mint(String),

    #[error("Mint did not answer within {0:?}")]
    Timeout(Duration),

    #[error("No balance to sweep")]
    NothingToSweep,

    #[error("Wallet storage: {0}")]
    Storage(String),

    #[error("Crypto: {0}")]
    Crypto(String),
}

/// Result of one redemption attempt. Consumed immediately, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedemptionOutcome {
    pub success: bool,
    pub amount: u64,
    pub message: String,
}

impl RedemptionOutcome {
    pub fn redeemed(amount: u64) -> Self {
        Self { success: true, amount, message: format!("Redeemed {} sats", amount) }
    }

    pub fn failed(err: &WalletError) -> Self {
        let message = match err {
            WalletError::MalformedToken(_) => err.to_string(),
            other => format!("Redemption failed: {}", other),
        };
        Self { success: false, amount: 0, message }
    }
}

impl From<Result<u64, WalletError>> for RedemptionOutcome {
    fn from(result: Result<u64, WalletError>) -> Self {
        match result {
            Ok(amount) => Self::redeemed(amount),
            Err(e) => Self::failed(&e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProofInfo {
    pub amount: u64,
    pub keyset_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepResult {
    pub amount: u64,
    pub token: String,
}

#[async_trait]
pub trait WalletGateway: Send + Sync {
    /// Swap every proof in `token` for proofs owned by this wallet and
    /// return the amount now owned. The original proofs are spent at the mint.
    async fn receive(&self, token: &str) -> Result<u64, WalletError>;

    async fn balance(&self) -> Result<u64, WalletError>;

    async fn list_proofs(&self) -> Result<Vec<ProofInfo>, WalletError>;

    /// Serialize every owned proof into one outgoing token and forget them.
    async fn sweep(&self) -> Result<SweepResult, WalletError>;

    /// Mint used when nothing else names one (reported in stats).
    fn default_mint(&self) -> &str;

    /// Where owned proofs live (reported in stats).
    fn storage_location(&self) -> String;

    async fn redeem(&self, token: &str) -> RedemptionOutcome {
        let result = self.receive(token).await;
        match &result {
            Ok(amount) => tracing::info!(amount, "token redeemed"),
            Err(e) => tracing::warn!(error = %e, "token redemption failed"),
        }
        result.into()
    }
}
