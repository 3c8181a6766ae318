//! # Vault custodians
//!
//! A custodian owns vault keypairs: it generates them and seals key material to them.
//! Keeping vault private keys safe at rest (under a per-user key) is also the custodian's
//! business, and out of reach of this crate, which only ever borrows a private key for the
//! duration of an unlock.
//!
//! [`RsaCustodian`] is the default, delegating straight to
//! [`crypto::vault_key`](crate::crypto::wrap_key_for_vault).

use crate::crypto::{
    unwrap_key_for_vault, wrap_key_for_vault, CryptoError, VaultPrivateKey, VaultPublicKey,
    MIN_VAULT_KEY_BITS,
};

pub trait VaultCustodian: Send + Sync + std::fmt::Debug {
    /// Generate a new vault keypair
    fn generate_vault_keypair(&self) -> Result<(VaultPublicKey, VaultPrivateKey), CryptoError>;

    /// Seal key material to a vault
    fn wrap_key_for_vault(
        &self,
        key_material: &[u8],
        vault_public_key: &VaultPublicKey,
    ) -> Result<Vec<u8>, CryptoError> {
        wrap_key_for_vault(key_material, vault_public_key)
    }

    /// Open key material sealed to a vault
    fn unwrap_key_for_vault(
        &self,
        wrapped: &[u8],
        vault_private_key: &VaultPrivateKey,
    ) -> Result<Vec<u8>, CryptoError> {
        unwrap_key_for_vault(wrapped, vault_private_key)
    }
}

/// Custodian generating RSA vault keys of a fixed modulus size
#[derive(Debug, Clone)]
pub struct RsaCustodian {
    bits: usize,
}

impl Default for RsaCustodian {
    fn default() -> Self {
        Self {
            bits: MIN_VAULT_KEY_BITS,
        }
    }
}

impl RsaCustodian {
    pub fn new(bits: usize) -> Self {
        Self { bits }
    }

    pub fn bits(&self) -> usize {
        self.bits
    }
}

impl VaultCustodian for RsaCustodian {
    fn generate_vault_keypair(&self) -> Result<(VaultPublicKey, VaultPrivateKey), CryptoError> {
        let private = VaultPrivateKey::generate(self.bits)?;
        tracing::debug!("generated {}-bit vault keypair", self.bits);
        Ok((private.public(), private))
    }
}
