//! Spellstr: spelling practice sessions paid for with Cashu eCash.
//!
//! # Architecture
//!
//! ```text
//! HTTP (axum)
//!   │
//!   ├── /api/redeem ─────────┐
//!   ├── /api/session/* ──→ SessionService
//!   │                         ├── WalletGateway (trait)
//!   │                         │     ├── CashuWallet  → mint named in token (swap)
//!   │                         │     └── MemoryWallet → in-process ledger
//!   │                         └── SessionStore (in-memory, lazy expiry)
//!   │
//!   └── /admin/* ──→ AdminGuard (x-npub, constant time) ──→ WalletGateway
//! ```
//!
//! # Flow
//!
//! | Step | Component | Failure |
//! |------|-----------|---------|
//! | parse token | `wallet::Token` | `MalformedToken` |
//! | swap proofs at mint | `WalletGateway::receive` | `Mint` / `Timeout` |
//! | amount ≥ cost | `SessionService::start` | `InsufficientPayment` (not refunded) |
//! | issue 24h session | `SessionStore::insert` | - |
//! | check session | `SessionService::check` | `NotFound` / `Expired` (evicted) |
//!
//! # Features
//!
//! - `cashu` (default) - network-backed wallet: mint HTTP client, secp256k1
//!   blind signatures, proofs persisted under `WALLET_DB`
//!
//! # Usage
//!
//! ```ignore
//! use spellstr::{create_router, AppState, ServerConfig};
//!
//! let config = ServerConfig::from_env()?;
//! let router = create_router(AppState::from_config(&config)?);
//! axum::serve(listener, router).await?;
//! ```

pub mod admin;
pub mod config;
pub mod logging;
pub mod runtime;
pub mod server;
pub mod session;
pub mod wallet;
pub mod words;

pub use admin::AdminAuthority;
pub use config::{ConfigError, ServerConfig, WalletBackend};
pub use runtime::{install_signal_handlers, Shutdown};
pub use server::{create_router, AppState};
pub use session::{Session, SessionError, SessionService, SessionStatus, SessionStore};
pub use wallet::{MemoryWallet, RedemptionOutcome, Token, WalletError, WalletGateway};

#[cfg(feature = "cashu")]
pub use wallet::CashuWallet;
