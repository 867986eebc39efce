//! ProofStore - owned proofs persisted as JSON under the wallet directory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::wallet::token::Proof;
use crate::wallet::WalletError;

const PROOFS_FILE: &str = "proofs.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredProof {
    pub mint: String,
    #[serde(flatten)]
    pub proof: Proof,
}

#[derive(Debug, Default, Deserialize)]
struct ProofFile {
    proofs: Vec<StoredProof>,
}

#[derive(Debug)]
pub struct ProofStore {
    path: PathBuf,
    proofs: Vec<StoredProof>,
}

impl ProofStore {
    /// Load `<dir>/proofs.json`, creating the directory if needed.
    pub fn open(dir: &Path) -> Result<Self, WalletError> {
        std::fs::create_dir_all(dir).map_err(|e| WalletError::Storage(format!("mkdir {}: {e}", dir.display())))?;
        let path = dir.join(PROOFS_FILE);
        let proofs = if path.exists() {
            let raw = std::fs::read_to_string(&path).map_err(|e| WalletError::Storage(format!("read: {e}")))?;
            serde_json::from_str::<ProofFile>(&raw)
                .map_err(|e| WalletError::Storage(format!("{}: {e}", path.display())))?
                .proofs
        } else {
            Vec::new()
        };
        tracing::debug!(proofs = proofs.len(), path = %path.display(), "proof store loaded");
        Ok(Self { path, proofs })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn proofs(&self) -> &[StoredProof] {
        &self.proofs
    }

    /// Add proofs and rewrite the file. The proofs stay in memory even when
    /// the write fails; the next successful write includes them.
    pub fn add(&mut self, mint: &str, proofs: Vec<Proof>) -> Result<(), WalletError> {
        self.proofs.extend(proofs.into_iter().map(|proof| StoredProof { mint: mint.to_string(), proof }));
        self.persist()
    }

    /// Remove and return every proof. On a failed write nothing is removed.
    pub fn take_all(&mut self) -> Result<Vec<StoredProof>, WalletError> {
        let taken = std::mem::take(&mut self.proofs);
        if let Err(e) = self.persist() {
            self.proofs = taken;
            return Err(e);
        }
        Ok(taken)
    }

    fn persist(&self) -> Result<(), WalletError> {
        let body = serde_json::to_string_pretty(&ProofFileRef { proofs: &self.proofs })
            .map_err(|e| WalletError::Storage(format!("json: {e}")))?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, body).map_err(|e| WalletError::Storage(format!("write: {e}")))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| WalletError::Storage(format!("rename: {e}")))
    }
}

#[derive(Serialize)]
struct ProofFileRef<'a> {
    proofs: &'a [StoredProof],
}
