//! HTTP API Tests: full router over the in-memory wallet
//!
//! These tests verify:
//! 1. Redemption responses for good, malformed and empty tokens
//! 2. Session start: paid, underpaid, free, failed payment
//! 3. Session checks: valid (idempotent), unknown (404), expired (410 then 404)
//! 4. Admin gate on verify/stats/proofs/sweep
//! 5. Sweep with and without balance

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};
use spellstr::wallet::{Proof, Token};
use spellstr::{
    create_router, AdminAuthority, AppState, MemoryWallet, Session, SessionService, SessionStore, WalletGateway,
};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

const ADMIN: &str = "npub1spellstradmin0000000000000000000000000000000000000000000";
const MINT: &str = "https://mint.example";

struct Harness {
    router: Router,
    wallet: Arc<MemoryWallet>,
    store: Arc<SessionStore>,
}

fn harness(admin: Option<&str>) -> Harness {
    let wallet = Arc::new(MemoryWallet::new(MINT));
    let store = Arc::new(SessionStore::new());
    let service = SessionService::new(wallet.clone(), store.clone());
    let state = AppState::new(service, AdminAuthority::new(admin), spellstr::words::default_words());
    Harness { router: create_router(state), wallet, store }
}

fn block_on<F: Future>(f: F) -> F::Output {
    tokio::runtime::Runtime::new().expect("runtime").block_on(f)
}

static SECRET_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// A token of one proof per amount, with secrets never used before.
fn token(amounts: &[u64]) -> String {
    let proofs = amounts
        .iter()
        .map(|&amount| Proof {
            amount,
            id: "00ad268c4d1f5826".into(),
            secret: format!("secret-{}", SECRET_COUNTER.fetch_add(1, Ordering::SeqCst)),
            c: "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798".into(),
            witness: None,
        })
        .collect();
    Token::new(MINT, proofs).encode().expect("encode")
}

async fn send(router: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = router.clone().oneshot(req).await.expect("response");
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.expect("body");
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn get_as(uri: &str, npub: &str) -> Request<Body> {
    Request::get(uri).header("x-npub", npub).body(Body::empty()).unwrap()
}

fn get_maybe_as(uri: &str, npub: Option<&str>) -> Request<Body> {
    let mut req = Request::get(uri);
    if let Some(npub) = npub {
        req = req.header("x-npub", npub);
    }
    req.body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_as(uri: &str, npub: Option<&str>) -> Request<Body> {
    let mut req = Request::post(uri);
    if let Some(npub) = npub {
        req = req.header("x-npub", npub);
    }
    req.body(Body::empty()).unwrap()
}

fn parse_time(value: &Value) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value.as_str().expect("timestamp string"))
        .expect("rfc3339")
        .with_timezone(&Utc)
}

#[test]
fn service_endpoints() {
    let h = harness(None);
    block_on(async {
        let (status, body) = send(&h.router, get("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok", "service": "Spellstr API"}));

        let (_, body) = send(&h.router, get("/api/health")).await;
        assert_eq!(body["status"], "healthy");

        let (status, body) = send(&h.router, get("/api/words")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["words"][0]["w"], "hamburger");
        assert_eq!(body["words"].as_array().unwrap().len(), 5);
    });
}

#[test]
fn cors_allows_any_origin() {
    let h = harness(None);
    block_on(async {
        let req = Request::get("/api/health").header("origin", "https://spellstr.app").body(Body::empty()).unwrap();
        let res = h.router.clone().oneshot(req).await.unwrap();
        assert_eq!(res.headers()["access-control-allow-origin"], "*");
    });
}

#[test]
fn redeem_valid_token() {
    let h = harness(None);
    block_on(async {
        let (status, body) = send(&h.router, post_json("/api/redeem", json!({"token": token(&[1, 2]), "pubkey": "npub1kid"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true, "amount": 3, "message": "Redeemed 3 sats"}));
    });
}

#[test]
fn redeem_malformed_token_then_no_session() {
    let h = harness(None);
    block_on(async {
        let (status, body) = send(&h.router, post_json("/api/redeem", json!({"token": "cashuAgarbage"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
        assert_eq!(body["amount"], 0);
        assert!(body["message"].as_str().unwrap().starts_with("Malformed token"));

        let (_, body) = send(&h.router, post_json("/api/session/start", json!({"token": "cashuAgarbage"}))).await;
        assert_eq!(body["success"], false);
        assert!(body["message"].as_str().unwrap().starts_with("Payment failed: Malformed token"));
        assert!(body["session_id"].is_null());
        assert!(h.store.is_empty());
    });
}

#[test]
fn redeem_requires_token() {
    let h = harness(None);
    block_on(async {
        let (status, body) = send(&h.router, post_json("/api/redeem", json!({"token": ""}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Token is required");

        let (status, _) = send(&h.router, post_json("/api/redeem", json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    });
}

#[test]
fn paid_session_lifecycle() {
    let h = harness(None);
    block_on(async {
        let before = Utc::now();
        let (status, body) = send(&h.router, post_json("/api/session/start", json!({"token": token(&[1]), "pubkey": "npub1kid"}))).await;
        let after = Utc::now();

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Session started successfully");
        let id = body["session_id"].as_str().expect("session id").to_string();
        assert!(!id.is_empty());
        let expires_at = parse_time(&body["expires_at"]);
        assert!(expires_at >= before + Duration::hours(24));
        assert!(expires_at <= after + Duration::hours(24));

        let (status, first) = send(&h.router, get(&format!("/api/session/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["valid"], true);
        assert_eq!(parse_time(&first["expires_at"]), expires_at);

        let (_, second) = send(&h.router, get(&format!("/api/session/{id}"))).await;
        assert_eq!(first, second);
    });
}

#[test]
fn underpaid_session_is_refused_and_kept() {
    let h = harness(None);
    block_on(async {
        let (_, body) = send(&h.router, post_json("/api/session/start", json!({"token": token(&[0])}))).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Insufficient payment. Required: 1 sat, received: 0 sats");
        assert!(body["session_id"].is_null());
        assert!(body["expires_at"].is_null());
        assert!(h.store.is_empty());
        assert_eq!(h.wallet.list_proofs().await.unwrap().len(), 1);
    });
}

#[test]
fn failed_redemption_creates_no_session() {
    let h = harness(None);
    h.wallet.set_offline(Some("mint unreachable"));
    block_on(async {
        let (_, body) = send(&h.router, post_json("/api/session/start", json!({"token": token(&[5])}))).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Payment failed: Redemption failed: Mint error: mint unreachable");
        assert!(h.store.is_empty());
    });
}

#[test]
fn double_spend_is_payment_failure() {
    let h = harness(None);
    let t = token(&[1]);
    block_on(async {
        let (_, first) = send(&h.router, post_json("/api/session/start", json!({"token": t}))).await;
        assert_eq!(first["success"], true);
        let (_, second) = send(&h.router, post_json("/api/session/start", json!({"token": t}))).await;
        assert_eq!(second["success"], false);
        assert_eq!(h.store.len(), 1);
    });
}

#[test]
fn free_session_without_token() {
    let h = harness(None);
    block_on(async {
        let (status, body) = send(&h.router, post_json("/api/session/start", json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert!(body["session_id"].as_str().is_some());
        assert_eq!(h.store.len(), 1);
    });
}

#[test]
fn blank_token_is_not_a_free_session() {
    let h = harness(None);
    block_on(async {
        let (status, body) = send(&h.router, post_json("/api/session/start", json!({"token": "   "}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
        assert!(body["message"].as_str().unwrap().starts_with("Payment failed: Malformed token"));
        assert!(h.store.is_empty());
    });
}

#[test]
fn unknown_session_is_404() {
    let h = harness(None);
    block_on(async {
        let (status, body) = send(&h.router, get("/api/session/does-not-exist")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Session not found");
    });
}

#[test]
fn expired_session_is_410_then_404() {
    let h = harness(None);
    let session = Session::new(None, Duration::hours(24), Utc::now() - Duration::hours(25));
    h.store.insert(session.clone());
    block_on(async {
        let uri = format!("/api/session/{}", session.id);
        let (status, body) = send(&h.router, get(&uri)).await;
        assert_eq!(status, StatusCode::GONE);
        assert_eq!(body["detail"], "Session expired");

        for _ in 0..2 {
            let (status, _) = send(&h.router, get(&uri)).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
        }
    });
    assert!(h.store.is_empty());
}

#[test]
fn admin_routes_closed_without_configured_identity() {
    let h = harness(None);
    block_on(async {
        for npub in [ADMIN, ""] {
            let (status, _) = send(&h.router, get_as("/admin/stats", npub)).await;
            assert_eq!(status, StatusCode::FORBIDDEN);
            let (status, _) = send(&h.router, post_as("/admin/sweep", Some(npub))).await;
            assert_eq!(status, StatusCode::FORBIDDEN);
        }
        let (status, _) = send(&h.router, post_as("/admin/verify", None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    });
}

#[test]
fn admin_routes_require_exact_identity() {
    let h = harness(Some(ADMIN));
    block_on(async {
        for npub in [None, Some(""), Some("npub1intruder"), Some(&ADMIN[..ADMIN.len() - 1])] {
            let (status, body) = send(&h.router, post_as("/admin/verify", npub)).await;
            assert_eq!(status, StatusCode::FORBIDDEN, "verify with {npub:?}");
            assert_eq!(body["detail"], "Not authorized");

            let (status, _) = send(&h.router, post_as("/admin/sweep", npub)).await;
            assert_eq!(status, StatusCode::FORBIDDEN, "sweep with {npub:?}");

            let (status, _) = send(&h.router, get_maybe_as("/admin/stats", npub)).await;
            assert_eq!(status, StatusCode::FORBIDDEN, "stats with {npub:?}");
        }
        let (status, _) = send(&h.router, get("/admin/stats")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = send(&h.router, get_as("/admin/proofs", "npub1intruder")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send(&h.router, post_as("/admin/verify", Some(ADMIN))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    });
}

#[test]
fn admin_stats_and_proofs() {
    let h = harness(Some(ADMIN));
    block_on(async {
        send(&h.router, post_json("/api/session/start", json!({"token": token(&[1, 4])}))).await;
        send(&h.router, post_json("/api/session/start", json!({}))).await;

        let (status, stats) = send(&h.router, get_as("/admin/stats", ADMIN)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            stats,
            json!({
                "wallet_balance": 5,
                "sessions_count": 2,
                "proof_count": 2,
                "default_mint": MINT,
                "wallet_db": "memory"
            })
        );

        let (status, proofs) = send(&h.router, get_as("/admin/proofs", ADMIN)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(proofs["count"], 2);
        assert_eq!(proofs["proofs"][1], json!({"amount": 4, "keyset_id": "00ad268c4d1f5826"}));
    });
}

#[test]
fn sweep_empty_wallet() {
    let h = harness(Some(ADMIN));
    block_on(async {
        let (status, body) = send(&h.router, post_as("/admin/sweep", Some(ADMIN))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": false, "error": "No balance to sweep"}));
    });
}

#[test]
fn sweep_moves_everything_once() {
    let h = harness(Some(ADMIN));
    block_on(async {
        send(&h.router, post_json("/api/redeem", json!({"token": token(&[2, 8])}))).await;

        let (_, body) = send(&h.router, post_as("/admin/sweep", Some(ADMIN))).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["amount"], 10);
        let swept = Token::decode(body["token"].as_str().unwrap()).unwrap();
        assert_eq!(swept.amount().unwrap(), 10);

        let (_, again) = send(&h.router, post_as("/admin/sweep", Some(ADMIN))).await;
        assert_eq!(again["success"], false);

        let (_, stats) = send(&h.router, get_as("/admin/stats", ADMIN)).await;
        assert_eq!(stats["wallet_balance"], 0);
    });
}
