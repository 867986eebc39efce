//! Blind Diffie-Hellman key exchange over secp256k1 (Cashu NUT-00).
//!
//! ```text
//! Y  = hash_to_curve(secret)
//! B_ = Y + r·G          (wallet → mint)
//! C_ = k·B_             (mint → wallet)
//! C  = C_ - r·K = k·Y   (proof signature)
//! ```

use bitcoin::secp256k1::{PublicKey, Scalar, Secp256k1, SecretKey};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::wallet::WalletError;

const DOMAIN_SEPARATOR: &[u8] = b"Secp256k1_HashToCurve_Cashu_";

pub fn hash_to_curve(message: &[u8]) -> Result<PublicKey, WalletError> {
    let msg_hash = Sha256::new().chain_update(DOMAIN_SEPARATOR).chain_update(message).finalize();
    for counter in 0u32..(1 << 16) {
        let hash = Sha256::new().chain_update(msg_hash).chain_update(counter.to_le_bytes()).finalize();
        let mut compressed = [0u8; 33];
        compressed[0] = 0x02;
        compressed[1..].copy_from_slice(&hash);
        if let Ok(point) = PublicKey::from_slice(&compressed) {
            return Ok(point);
        }
    }
    Err(WalletError::Crypto("hash_to_curve: no valid point found".into()))
}

/// Fresh random 32-byte secret, hex encoded.
pub fn random_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub fn random_blinding_factor() -> SecretKey {
    loop {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        if let Ok(key) = SecretKey::from_slice(&bytes) {
            return key;
        }
    }
}

/// `B_ = Y + r·G`
pub fn blind(secret: &str, r: &SecretKey) -> Result<PublicKey, WalletError> {
    let secp = Secp256k1::new();
    let y = hash_to_curve(secret.as_bytes())?;
    y.combine(&r.public_key(&secp)).map_err(|e| WalletError::Crypto(format!("blind: {e}")))
}

/// `C = C_ - r·K`
pub fn unblind(blinded_signature: &PublicKey, r: &SecretKey, mint_key: &PublicKey) -> Result<PublicKey, WalletError> {
    let secp = Secp256k1::new();
    let rk = mint_key
        .mul_tweak(&secp, &Scalar::from(*r))
        .map_err(|e| WalletError::Crypto(format!("unblind: {e}")))?;
    blinded_signature
        .combine(&rk.negate(&secp))
        .map_err(|e| WalletError::Crypto(format!("unblind: {e}")))
}

pub fn parse_point(hex_str: &str) -> Result<PublicKey, WalletError> {
    let bytes = hex::decode(hex_str).map_err(|e| WalletError::Crypto(format!("point hex: {e}")))?;
    PublicKey::from_slice(&bytes).map_err(|e| WalletError::Crypto(format!("point: {e}")))
}

pub fn point_hex(point: &PublicKey) -> String {
    hex::encode(point.serialize())
}
