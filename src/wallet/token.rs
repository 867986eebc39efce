//! Cashu V3 bearer tokens: `cashuA` + base64url(JSON).
//!
//! ```text
//! cashuA eyJ0b2tlbiI6W3sibWludCI6Imh0dHBzOi8v...
//!   └── {"token":[{"mint":"https://mint.example","proofs":[{"amount":1,"id":"00ad..","secret":"..","C":"02.."}]}],"unit":"sat"}
//! ```

use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::WalletError;

pub const TOKEN_PREFIX: &str = "cashuA";
const TOKEN_PREFIX_V4: &str = "cashuB";
const URI_SCHEME: &str = "cashu:";

/// One unit of redeemable value, signed by a mint keyset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    pub amount: u64,
    /// Keyset id the signature `C` was made with.
    pub id: String,
    pub secret: String,
    #[serde(rename = "C")]
    pub c: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub witness: Option<String>,
}

/// Proofs issued by a single mint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintProofs {
    pub mint: String,
    pub proofs: Vec<Proof>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub token: Vec<MintProofs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

impl Token {
    pub fn new(mint: impl Into<String>, proofs: Vec<Proof>) -> Self {
        Self {
            token: vec![MintProofs { mint: mint.into(), proofs }],
            unit: Some("sat".into()),
            memo: None,
        }
    }

    /// Group `(mint, proof)` pairs into one token, one entry per mint.
    pub fn from_owned(owned: impl IntoIterator<Item = (String, Proof)>) -> Self {
        let mut token: Vec<MintProofs> = Vec::new();
        for (mint, proof) in owned {
            match token.iter_mut().find(|entry| entry.mint == mint) {
                Some(entry) => entry.proofs.push(proof),
                None => token.push(MintProofs { mint, proofs: vec![proof] }),
            }
        }
        Self { token, unit: Some("sat".into()), memo: None }
    }

    pub fn decode(raw: &str) -> Result<Self, WalletError> {
        let raw = raw.trim();
        let raw = raw.strip_prefix(URI_SCHEME).unwrap_or(raw);

        if raw.starts_with(TOKEN_PREFIX_V4) {
            return Err(WalletError::MalformedToken("cashuB (V4) tokens are not supported".into()));
        }
        let body = raw
            .strip_prefix(TOKEN_PREFIX)
            .ok_or_else(|| WalletError::MalformedToken("missing cashuA prefix".into()))?
            .trim_end_matches('=');

        let json = URL_SAFE_NO_PAD
            .decode(body)
            .or_else(|_| STANDARD_NO_PAD.decode(body))
            .map_err(|e| WalletError::MalformedToken(format!("base64: {e}")))?;
        let token: Token = serde_json::from_slice(&json)
            .map_err(|e| WalletError::MalformedToken(format!("json: {e}")))?;

        if token.proof_count() == 0 {
            return Err(WalletError::MalformedToken("token carries no proofs".into()));
        }
        if token.token.iter().any(|entry| entry.mint.trim().is_empty()) {
            return Err(WalletError::MalformedToken("token names an empty mint url".into()));
        }
        Ok(token)
    }

    pub fn encode(&self) -> Result<String, WalletError> {
        let json = serde_json::to_vec(self).map_err(|e| WalletError::Storage(format!("token json: {e}")))?;
        Ok(format!("{TOKEN_PREFIX}{}", URL_SAFE.encode(json)))
    }

    pub fn proof_count(&self) -> usize {
        self.token.iter().map(|entry| entry.proofs.len()).sum()
    }

    /// Face value of every proof in the token.
    pub fn amount(&self) -> Result<u64, WalletError> {
        sum_amounts(self.token.iter().flat_map(|entry| entry.proofs.iter()))
    }

    /// The single mint this token redeems against, with its proofs.
    pub fn into_single_mint(self) -> Result<(String, Vec<Proof>), WalletError> {
        let mut entries = self.token.into_iter().filter(|entry| !entry.proofs.is_empty());
        let first = entries
            .next()
            .ok_or_else(|| WalletError::MalformedToken("token carries no proofs".into()))?;
        let mut proofs = first.proofs;
        for entry in entries {
            if normalize_mint_url(&entry.mint) != normalize_mint_url(&first.mint) {
                return Err(WalletError::MalformedToken("token spans multiple mints".into()));
            }
            proofs.extend(entry.proofs);
        }
        Ok((normalize_mint_url(&first.mint), proofs))
    }
}

pub fn sum_amounts<'a>(proofs: impl IntoIterator<Item = &'a Proof>) -> Result<u64, WalletError> {
    proofs.into_iter().try_fold(0u64, |acc, p| {
        acc.checked_add(p.amount)
            .ok_or_else(|| WalletError::MalformedToken("proof amounts overflow".into()))
    })
}

pub fn normalize_mint_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
