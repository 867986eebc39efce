//! CashuWallet - network-backed gateway.
//!
//! Redeeming a token swaps its proofs at the mint named *in the token* for
//! freshly blinded outputs of equal value (minus the mint's input fee). The
//! swap spends the originals at the mint, so the mint is what stops a token
//! being redeemed twice. Unblinded outputs are written to the proof store.

mod client;
pub mod dhke;
mod store;

use async_trait::async_trait;
use bitcoin::secp256k1::SecretKey;
use std::path::Path;
use std::time::Duration;
use tokio::sync::Mutex;

use super::token::{normalize_mint_url, sum_amounts, Proof, Token};
use super::{ProofInfo, SweepResult, WalletError, WalletGateway};

pub use client::{BlindSignature, BlindedMessage, KeysetInfo, MintClient};
pub use store::{ProofStore, StoredProof};

pub struct CashuWallet {
    default_mint: String,
    client: MintClient,
    store: Mutex<ProofStore>,
    location: String,
    timeout: Duration,
}

/// An output before the mint has signed it.
struct PreMint {
    amount: u64,
    secret: String,
    r: SecretKey,
    message: BlindedMessage,
}

impl CashuWallet {
    pub fn open(default_mint: &str, wallet_db: &Path, timeout: Duration) -> Result<Self, WalletError> {
        let store = ProofStore::open(wallet_db)?;
        tracing::info!(path = %store.path().display(), proofs = store.proofs().len(), "cashu wallet opened");
        Ok(Self {
            default_mint: normalize_mint_url(default_mint),
            client: MintClient::new(timeout)?,
            location: wallet_db.display().to_string(),
            store: Mutex::new(store),
            timeout,
        })
    }

    async fn swap_into_wallet(&self, mint: &str, inputs: &[Proof]) -> Result<Vec<Proof>, WalletError> {
        let input_total = sum_amounts(inputs)?;
        let keysets = self.client.keysets(mint).await?;
        let fee = input_fee(&keysets, inputs);
        let target = input_total
            .checked_sub(fee)
            .filter(|amount| *amount > 0)
            .ok_or_else(|| WalletError::Mint(format!("token value {input_total} does not cover mint fee {fee}")))?;

        let active = keysets
            .iter()
            .find(|k| k.active && k.unit == "sat")
            .ok_or_else(|| WalletError::Mint("mint has no active sat keyset".into()))?;
        let keyset = self.client.keys(mint, &active.id).await?;
        if let Some(unit) = keyset.unit.as_deref().filter(|unit| *unit != "sat") {
            return Err(WalletError::Mint(format!("keyset {} is denominated in {unit}, not sat", keyset.id)));
        }

        let premints = split_amount(target)
            .into_iter()
            .map(|amount| premint(amount, &keyset.id))
            .collect::<Result<Vec<_>, _>>()?;
        let outputs: Vec<BlindedMessage> = premints.iter().map(|p| p.message.clone()).collect();

        let signatures = self.client.swap(mint, inputs, &outputs).await?;
        if signatures.len() != premints.len() {
            return Err(WalletError::Mint(format!(
                "mint returned {} signatures for {} outputs",
                signatures.len(),
                premints.len()
            )));
        }

        premints
            .into_iter()
            .zip(signatures)
            .map(|(pre, sig)| {
                if sig.amount != pre.amount || sig.id != keyset.id {
                    return Err(WalletError::Mint("signature does not match requested output".into()));
                }
                let mint_key = keyset
                    .keys
                    .get(&sig.amount.to_string())
                    .ok_or_else(|| WalletError::Mint(format!("keyset has no key for amount {}", sig.amount)))?;
                let c = dhke::unblind(&dhke::parse_point(&sig.c_)?, &pre.r, &dhke::parse_point(mint_key)?)?;
                Ok(Proof { amount: pre.amount, id: sig.id, secret: pre.secret, c: dhke::point_hex(&c), witness: None })
            })
            .collect()
    }
}

fn premint(amount: u64, keyset_id: &str) -> Result<PreMint, WalletError> {
    let secret = dhke::random_secret();
    let r = dhke::random_blinding_factor();
    let b_ = dhke::blind(&secret, &r)?;
    Ok(PreMint {
        amount,
        message: BlindedMessage { amount, id: keyset_id.to_string(), b_: dhke::point_hex(&b_) },
        secret,
        r,
    })
}

/// `ceil(sum(input_fee_ppk) / 1000)` over the keysets the inputs were signed with.
fn input_fee(keysets: &[KeysetInfo], inputs: &[Proof]) -> u64 {
    let ppk: u64 = inputs
        .iter()
        .filter_map(|p| keysets.iter().find(|k| k.id == p.id))
        .map(|k| k.input_fee_ppk)
        .sum();
    ppk.div_ceil(1000)
}

/// Power-of-two denominations summing to `amount`, smallest first.
fn split_amount(amount: u64) -> Vec<u64> {
    (0..64).map(|bit| 1u64 << bit).filter(|value| amount & value != 0).collect()
}

#[async_trait]
impl WalletGateway for CashuWallet {
    async fn receive(&self, token: &str) -> Result<u64, WalletError> {
        let (mint, inputs) = Token::decode(token)?.into_single_mint()?;
        let face_value = sum_amounts(&inputs)?;
        tracing::debug!(mint = %mint, proofs = inputs.len(), face_value, "redeeming token");

        let owned = tokio::time::timeout(self.timeout, self.swap_into_wallet(&mint, &inputs))
            .await
            .map_err(|_| WalletError::Timeout(self.timeout))??;
        let amount = if owned.is_empty() { face_value } else { sum_amounts(&owned)? };

        // The mint has spent the inputs; the new proofs are ours even if the file lags.
        if let Err(e) = self.store.lock().await.add(&mint, owned) {
            tracing::error!(error = %e, amount, mint = %mint, "swapped proofs held in memory only");
        }
        tracing::info!(amount, mint = %mint, "proofs swapped into wallet");
        Ok(amount)
    }

    async fn balance(&self) -> Result<u64, WalletError> {
        let store = self.store.lock().await;
        sum_amounts(store.proofs().iter().map(|p| &p.proof))
    }

    async fn list_proofs(&self) -> Result<Vec<ProofInfo>, WalletError> {
        let store = self.store.lock().await;
        Ok(store
            .proofs()
            .iter()
            .map(|p| ProofInfo { amount: p.proof.amount, keyset_id: p.proof.id.clone() })
            .collect())
    }

    async fn sweep(&self) -> Result<SweepResult, WalletError> {
        let mut store = self.store.lock().await;
        let amount = sum_amounts(store.proofs().iter().map(|p| &p.proof))?;
        if amount < 1 {
            return Err(WalletError::NothingToSweep);
        }
        let token = Token::from_owned(store.proofs().iter().map(|p| (p.mint.clone(), p.proof.clone()))).encode()?;
        let swept = store.take_all()?;
        tracing::info!(amount, proofs = swept.len(), "wallet swept");
        Ok(SweepResult { amount, token })
    }

    fn default_mint(&self) -> &str {
        &self.default_mint
    }

    fn storage_location(&self) -> String {
        self.location.clone()
    }
}
