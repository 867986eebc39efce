//! Admin gate - one configured identity (an npub), compared in constant time.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Header carrying the caller's admin identity.
pub const ADMIN_HEADER: &str = "x-npub";

#[derive(Clone, Default)]
pub struct AdminAuthority {
    /// SHA-256 of the configured identity. `None` disables every admin route.
    expected_hash: Option<[u8; 32]>,
}

impl AdminAuthority {
    pub fn new(admin_identity: Option<&str>) -> Self {
        let expected_hash = admin_identity
            .filter(|id| !id.is_empty())
            .map(|id| Sha256::digest(id.as_bytes()).into());
        Self { expected_hash }
    }

    pub fn is_configured(&self) -> bool {
        self.expected_hash.is_some()
    }

    /// True only when an identity is configured and `presented` equals it.
    /// Both sides are hashed first so the comparison never leaks length.
    pub fn is_admin(&self, presented: Option<&str>) -> bool {
        let (Some(expected), Some(presented)) = (&self.expected_hash, presented) else {
            return false;
        };
        let presented_hash = Sha256::digest(presented.as_bytes());
        presented_hash.as_slice().ct_eq(expected.as_slice()).into()
    }
}

impl std::fmt::Debug for AdminAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminAuthority").field("configured", &self.is_configured()).finish()
    }
}
