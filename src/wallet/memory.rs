//! MemoryWallet - deterministic in-memory ledger.
//!
//! Accepts any well-formed token, keyed by proof secret: a secret redeemed
//! once is spent forever, mirroring what a mint enforces. Nothing touches
//! the network or disk.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use super::token::{normalize_mint_url, sum_amounts, Proof, Token};
use super::{ProofInfo, SweepResult, WalletError, WalletGateway};

#[derive(Default)]
struct Ledger {
    owned: Vec<(String, Proof)>,
    spent: HashSet<String>,
    offline: Option<String>,
}

pub struct MemoryWallet {
    mint_url: String,
    ledger: Mutex<Ledger>,
}

impl MemoryWallet {
    pub fn new(mint_url: impl Into<String>) -> Self {
        Self { mint_url: normalize_mint_url(&mint_url.into()), ledger: Mutex::new(Ledger::default()) }
    }

    /// Make every subsequent redemption fail as if the mint were unreachable.
    pub fn set_offline(&self, reason: Option<&str>) {
        self.ledger().offline = reason.map(str::to_string);
    }

    fn ledger(&self) -> std::sync::MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl WalletGateway for MemoryWallet {
    async fn receive(&self, token: &str) -> Result<u64, WalletError> {
        let (mint, proofs) = Token::decode(token)?.into_single_mint()?;
        let amount = sum_amounts(&proofs)?;

        let mut ledger = self.ledger();
        if let Some(reason) = &ledger.offline {
            return Err(WalletError::Mint(reason.clone()));
        }
        let duplicate = {
            let mut seen = HashSet::new();
            proofs.iter().any(|p| !seen.insert(p.secret.as_str()))
        };
        if duplicate || proofs.iter().any(|p| ledger.spent.contains(&p.secret)) {
            return Err(WalletError::Mint("Token already spent.".into()));
        }
        for proof in proofs {
            ledger.spent.insert(proof.secret.clone());
            ledger.owned.push((mint.clone(), proof));
        }
        Ok(amount)
    }

    async fn balance(&self) -> Result<u64, WalletError> {
        sum_amounts(self.ledger().owned.iter().map(|(_, p)| p))
    }

    async fn list_proofs(&self) -> Result<Vec<ProofInfo>, WalletError> {
        Ok(self
            .ledger()
            .owned
            .iter()
            .map(|(_, p)| ProofInfo { amount: p.amount, keyset_id: p.id.clone() })
            .collect())
    }

    async fn sweep(&self) -> Result<SweepResult, WalletError> {
        let mut ledger = self.ledger();
        let amount = sum_amounts(ledger.owned.iter().map(|(_, p)| p))?;
        if amount < 1 {
            return Err(WalletError::NothingToSweep);
        }
        let token = Token::from_owned(ledger.owned.iter().cloned()).encode()?;
        ledger.owned.clear();
        Ok(SweepResult { amount, token })
    }

    fn default_mint(&self) -> &str {
        &self.mint_url
    }

    fn storage_location(&self) -> String {
        "memory".into()
    }
}
