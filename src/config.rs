//! Server configuration - built by the CLI from flags, environment and `.env`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::wallet::{MemoryWallet, WalletError, WalletGateway};

pub const DEFAULT_MINT_URL: &str = "https://mint.minibits.cash/Bitcoin";
pub const DEFAULT_PORT: u16 = 8000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },

    #[error("Wallet backend {0:?} is not compiled in (enable the \"cashu\" feature)")]
    BackendUnavailable(&'static str),

    #[error(transparent)]
    Wallet(#[from] WalletError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WalletBackend {
    /// Swap tokens at their mint, keep proofs on disk.
    #[default]
    Cashu,
    /// In-memory ledger, no mint contact (demo mode).
    Memory,
}

impl WalletBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletBackend::Cashu => "cashu",
            WalletBackend::Memory => "memory",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "cashu" | "mint" => Some(WalletBackend::Cashu),
            "memory" | "demo" => Some(WalletBackend::Memory),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub app_name: String,
    pub port: u16,
    /// Mint reported as default; tokens are always redeemed at the mint they name.
    pub mint_url: String,
    pub wallet_db: PathBuf,
    pub admin_npub: Option<String>,
    pub words_file: PathBuf,
    pub wallet_backend: WalletBackend,
    pub mint_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            app_name: "Spellstr API".into(),
            port: DEFAULT_PORT,
            mint_url: DEFAULT_MINT_URL.into(),
            wallet_db: PathBuf::from("./wallet_db"),
            admin_npub: None,
            words_file: PathBuf::from("./words.json"),
            wallet_backend: WalletBackend::default(),
            mint_timeout: Duration::from_secs(30),
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self { Self::default() }
    pub fn with_port(mut self, port: u16) -> Self { self.port = port; self }
    pub fn with_mint_url(mut self, url: impl Into<String>) -> Self { self.mint_url = url.into(); self }
    pub fn with_wallet_db(mut self, path: impl Into<PathBuf>) -> Self { self.wallet_db = path.into(); self }
    pub fn with_admin_npub(mut self, npub: impl Into<String>) -> Self { self.admin_npub = Some(npub.into()); self }
    pub fn with_words_file(mut self, path: impl Into<PathBuf>) -> Self { self.words_file = path.into(); self }
    pub fn with_wallet_backend(mut self, backend: WalletBackend) -> Self { self.wallet_backend = backend; self }
    pub fn with_mint_timeout(mut self, timeout: Duration) -> Self { self.mint_timeout = timeout; self }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(port) = get("SPELLSTR_PORT") {
            config.port = port.parse().map_err(|_| ConfigError::Invalid { var: "SPELLSTR_PORT", value: port })?;
        }
        if let Some(url) = get("MINT_URL") {
            config.mint_url = url;
        }
        if let Some(path) = get("WALLET_DB") {
            config.wallet_db = PathBuf::from(path);
        }
        config.admin_npub = get("ADMIN_NPUB");
        if let Some(path) = get("SPELLSTR_WORDS") {
            config.words_file = PathBuf::from(path);
        }
        if let Some(backend) = get("SPELLSTR_WALLET") {
            config.wallet_backend = WalletBackend::from_str(&backend)
                .ok_or(ConfigError::Invalid { var: "SPELLSTR_WALLET", value: backend })?;
        }
        if let Some(secs) = get("SPELLSTR_MINT_TIMEOUT_SECS") {
            let parsed: u64 = secs
                .parse()
                .ok()
                .filter(|s| *s > 0)
                .ok_or_else(|| ConfigError::Invalid { var: "SPELLSTR_MINT_TIMEOUT_SECS", value: secs.clone() })?;
            config.mint_timeout = Duration::from_secs(parsed);
        }
        Ok(config)
    }

    /// Open the configured wallet backend.
    pub fn open_wallet(&self) -> Result<Arc<dyn WalletGateway>, ConfigError> {
        match self.wallet_backend {
            WalletBackend::Memory => {
                tracing::warn!("using in-memory wallet: tokens are not checked with any mint");
                Ok(Arc::new(MemoryWallet::new(&self.mint_url)))
            }
            #[cfg(feature = "cashu")]
            WalletBackend::Cashu => Ok(Arc::new(crate::wallet::CashuWallet::open(
                &self.mint_url,
                &self.wallet_db,
                self.mint_timeout,
            )?)),
            #[cfg(not(feature = "cashu"))]
            WalletBackend::Cashu => Err(ConfigError::BackendUnavailable("cashu")),
        }
    }
}

/// Load `KEY=value` lines from a dotenv file. Variables already set win.
pub fn load_dotenv(path: &Path) {
    let Ok(contents) = std::fs::read_to_string(path) else {
        return;
    };
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let value = value.trim().trim_matches('"');
            if !value.is_empty() && std::env::var(key.trim()).is_err() {
                std::env::set_var(key.trim(), value);
            }
        }
    }
}
