//! HTTP surface.
//!
//! | Route | Method | Description |
//! |-------|--------|-------------|
//! | `/` | GET | `{status, service}` |
//! | `/api/health` | GET | `{status: "healthy"}` |
//! | `/api/words` | GET | `{words: [{w, s}]}` |
//! | `/api/redeem` | POST | `{token, pubkey?}` → `{success, amount, message}` |
//! | `/api/session/start` | POST | `{token?, pubkey?}` → `{success, session_id, message, expires_at}` |
//! | `/api/session/:id` | GET | `{valid, expires_at}`, 404 unknown, 410 expired |
//! | `/admin/verify` | POST | admin check only |
//! | `/admin/stats` | GET | wallet + session counters |
//! | `/admin/proofs` | GET | `{count, proofs: [{amount, keyset_id}]}` |
//! | `/admin/sweep` | POST | `{success, amount, token}` or `{success: false, error}` |
//!
//! Every `/admin/*` route requires `x-npub` to equal the configured admin
//! identity and answers 403 otherwise.

mod guard;
mod routes;

pub use guard::AdminGuard;
pub use routes::{create_router, ApiError, AppState};
