//! HTTP routes for sessions, redemption and wallet administration

use axum::{extract::{Path, State}, http::StatusCode, response::{IntoResponse, Response}, routing::{get, post}, Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::guard::AdminGuard;
use crate::admin::AdminAuthority;
use crate::config::{ConfigError, ServerConfig};
use crate::session::{SessionError, SessionService, SessionStatus, SessionStore};
use crate::wallet::{ProofInfo, RedemptionOutcome, WalletError};
use crate::words::{load_words, Word};

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionService>,
    pub admin: AdminAuthority,
    pub words: Arc<Vec<Word>>,
    pub app_name: String,
}

impl AppState {
    pub fn new(sessions: SessionService, admin: AdminAuthority, words: Vec<Word>) -> Self {
        Self { sessions: Arc::new(sessions), admin, words: Arc::new(words), app_name: "Spellstr API".into() }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self { self.app_name = name.into(); self }

    /// Open the wallet, load words, and wire a fresh session store.
    pub fn from_config(config: &ServerConfig) -> Result<Self, ConfigError> {
        let wallet = config.open_wallet()?;
        let sessions = SessionService::new(wallet, Arc::new(SessionStore::new()));
        let admin = AdminAuthority::new(config.admin_npub.as_deref());
        if !admin.is_configured() {
            tracing::warn!("ADMIN_NPUB not set, admin routes are disabled");
        }
        Ok(Self::new(sessions, admin, load_words(&config.words_file)).with_name(config.app_name.clone()))
    }
}

/// Error response `{"detail": "..."}` with a status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self { status, detail: detail.into() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({"detail": self.detail}))).into_response()
    }
}

/// Only session lookups map to a status code; start failures travel in the
/// `SessionResponse` body.
impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        let status = match e {
            SessionError::Expired => StatusCode::GONE,
            _ => StatusCode::NOT_FOUND,
        };
        Self::new(status, e.to_string())
    }
}

impl From<WalletError> for ApiError {
    fn from(e: WalletError) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/health", get(health))
        .route("/api/words", get(words))
        .route("/api/redeem", post(redeem))
        .route("/api/session/start", post(start_session))
        .route("/api/session/:session_id", get(get_session))
        .route("/admin/verify", post(admin_verify))
        .route("/admin/stats", get(admin_stats))
        .route("/admin/proofs", get(admin_proofs))
        .route("/admin/sweep", post(admin_sweep))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root(State(s): State<AppState>) -> impl IntoResponse {
    Json(json!({"status": "ok", "service": s.app_name}))
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "healthy"}))
}

async fn words(State(s): State<AppState>) -> impl IntoResponse {
    Json(json!({"words": s.words.as_slice()}))
}

#[derive(Deserialize)]
struct RedeemRequest {
    #[serde(default)]
    token: String,
    #[serde(default)]
    pubkey: Option<String>,
}

async fn redeem(State(s): State<AppState>, Json(req): Json<RedeemRequest>) -> Result<Json<RedemptionOutcome>, ApiError> {
    if req.token.trim().is_empty() {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "Token is required"));
    }
    tracing::debug!(pubkey = ?req.pubkey, "redeem requested");
    Ok(Json(s.sessions.wallet().redeem(req.token.trim()).await))
}

#[derive(Deserialize)]
struct SessionStartRequest {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    pubkey: Option<String>,
}

#[derive(Debug, Serialize)]
struct SessionResponse {
    success: bool,
    session_id: Option<String>,
    message: String,
    expires_at: Option<DateTime<Utc>>,
}

/// Payment and business-rule failures are reported in the body, not the status.
async fn start_session(State(s): State<AppState>, Json(req): Json<SessionStartRequest>) -> Json<SessionResponse> {
    match s.sessions.start(req.token.as_deref(), req.pubkey).await {
        Ok(session) => Json(SessionResponse {
            success: true,
            session_id: Some(session.id),
            message: "Session started successfully".into(),
            expires_at: Some(session.expires_at),
        }),
        Err(e) => Json(SessionResponse { success: false, session_id: None, message: e.to_string(), expires_at: None }),
    }
}

async fn get_session(State(s): State<AppState>, Path(session_id): Path<String>) -> Result<Json<SessionStatus>, ApiError> {
    Ok(Json(s.sessions.check(&session_id)?))
}

async fn admin_verify(_guard: AdminGuard) -> impl IntoResponse {
    Json(json!({"success": true, "admin": true}))
}

#[derive(Serialize)]
struct StatsResponse {
    wallet_balance: u64,
    sessions_count: usize,
    proof_count: usize,
    default_mint: String,
    wallet_db: String,
}

async fn admin_stats(_guard: AdminGuard, State(s): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let wallet = s.sessions.wallet();
    Ok(Json(StatsResponse {
        wallet_balance: wallet.balance().await?,
        sessions_count: s.sessions.store().len(),
        proof_count: wallet.list_proofs().await?.len(),
        default_mint: wallet.default_mint().to_string(),
        wallet_db: wallet.storage_location(),
    }))
}

#[derive(Serialize)]
struct ProofsResponse { count: usize, proofs: Vec<ProofInfo> }

async fn admin_proofs(_guard: AdminGuard, State(s): State<AppState>) -> Result<Json<ProofsResponse>, ApiError> {
    let proofs = s.sessions.wallet().list_proofs().await?;
    Ok(Json(ProofsResponse { count: proofs.len(), proofs }))
}

async fn admin_sweep(_guard: AdminGuard, State(s): State<AppState>) -> impl IntoResponse {
    match s.sessions.wallet().sweep().await {
        Ok(swept) => Json(json!({"success": true, "amount": swept.amount, "token": swept.token})),
        Err(e) => {
            tracing::info!(error = %e, "sweep refused");
            Json(json!({"success": false, "error": e.to_string()}))
        }
    }
}
