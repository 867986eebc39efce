//! Mint HTTP client (Cashu v1 API).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::wallet::token::Proof;
use crate::wallet::WalletError;

#[derive(Debug, Clone, Deserialize)]
pub struct KeysetInfo {
    pub id: String,
    pub unit: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub input_fee_ppk: u64,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct KeysetsResponse {
    keysets: Vec<KeysetInfo>,
}

/// Public keys of one keyset, by amount.
#[derive(Debug, Clone, Deserialize)]
pub struct Keyset {
    pub id: String,
    #[serde(default)]
    pub unit: Option<String>,
    pub keys: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct KeysResponse {
    keysets: Vec<Keyset>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlindedMessage {
    pub amount: u64,
    pub id: String,
    #[serde(rename = "B_")]
    pub b_: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlindSignature {
    pub amount: u64,
    pub id: String,
    #[serde(rename = "C_")]
    pub c_: String,
}

#[derive(Serialize)]
struct SwapRequest<'a> {
    inputs: &'a [Proof],
    outputs: &'a [BlindedMessage],
}

#[derive(Debug, Deserialize)]
struct SwapResponse {
    signatures: Vec<BlindSignature>,
}

#[derive(Debug, Deserialize)]
struct MintErrorBody {
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    code: Option<u64>,
}

#[derive(Clone)]
pub struct MintClient {
    http: reqwest::Client,
}

impl MintClient {
    pub fn new(timeout: Duration) -> Result<Self, WalletError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("spellstr/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| WalletError::Mint(format!("http client: {e}")))?;
        Ok(Self { http })
    }

    pub async fn keysets(&self, mint: &str) -> Result<Vec<KeysetInfo>, WalletError> {
        let res: KeysetsResponse = self.get(&format!("{mint}/v1/keysets")).await?;
        Ok(res.keysets)
    }

    pub async fn keys(&self, mint: &str, keyset_id: &str) -> Result<Keyset, WalletError> {
        let res: KeysResponse = self.get(&format!("{mint}/v1/keys/{keyset_id}")).await?;
        res.keysets
            .into_iter()
            .find(|k| k.id == keyset_id)
            .ok_or_else(|| WalletError::Mint(format!("mint returned no keys for keyset {keyset_id}")))
    }

    pub async fn swap(
        &self,
        mint: &str,
        inputs: &[Proof],
        outputs: &[BlindedMessage],
    ) -> Result<Vec<BlindSignature>, WalletError> {
        let res = self
            .http
            .post(format!("{mint}/v1/swap"))
            .json(&SwapRequest { inputs, outputs })
            .send()
            .await
            .map_err(transport_error)?;
        let res: SwapResponse = decode(res).await?;
        Ok(res.signatures)
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, WalletError> {
        let res = self.http.get(url).send().await.map_err(transport_error)?;
        decode(res).await
    }
}

async fn decode<T: serde::de::DeserializeOwned>(res: reqwest::Response) -> Result<T, WalletError> {
    let status = res.status();
    let body = res.text().await.map_err(transport_error)?;
    if !status.is_success() {
        let detail = serde_json::from_str::<MintErrorBody>(&body)
            .ok()
            .and_then(|e| match (e.detail, e.code) {
                (Some(detail), Some(code)) => Some(format!("{detail} (code {code})")),
                (Some(detail), None) => Some(detail),
                _ => None,
            })
            .unwrap_or_else(|| format!("HTTP {status}: {body}"));
        return Err(WalletError::Mint(detail));
    }
    serde_json::from_str(&body).map_err(|e| WalletError::Mint(format!("unexpected mint response: {e}")))
}

fn transport_error(e: reqwest::Error) -> WalletError {
    WalletError::Mint(e.to_string())
}
