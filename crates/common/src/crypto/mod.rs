//! Cryptographic primitives for TimeVault
//!
//! A sealed message is protected by two independent domains:
//!
//! - **Time**: the content key can only be unwrapped once a beacon round is public
//! - **Vault ownership** (optional): the content key is additionally sealed to a vault's RSA key
//!
//! # Layering
//!
//! ## Content Encryption
//! Every message gets a fresh random `Secret` and is encrypted with AES-256-GCM under an
//! explicit 16-byte `Iv`. Content is never encrypted with anything but a `Secret`.
//!
//! ## Key Wrapping
//! The content key (or its vault envelope) is wrapped with AES Key Wrap under a
//! `WrappingKey` derived from the target round. Key wrapping uses a fixed IV, so it only
//! ever sees random key material, never content.
//!
//! ## Sealing order
//! 1. Encrypt content under a fresh `Secret`
//! 2. If a vault key is given, RSA-OAEP wrap the secret to the vault
//! 3. Derive the round's `WrappingKey` from the beacon public key
//! 4. AES-KW wrap the result of (1) or (2)
//!
//! Opening mirrors it exactly: time-lock unwrap, then vault unwrap, then decrypt.

mod key_wrap;
mod secret;
mod time_lock;
mod vault_key;

pub use key_wrap::{unwrap, wrap, WrappingKey, WRAPPING_KEY_SIZE};
pub use secret::{decrypt, encrypt, Iv, Secret, IV_SIZE, SECRET_SIZE};
pub use time_lock::{derive_decryption_key, derive_encryption_key, TIME_LOCK_DOMAIN};
pub use vault_key::{
    unwrap_key_for_vault, wrap_key_for_vault, VaultPrivateKey, VaultPublicKey,
    MIN_VAULT_KEY_BITS,
};

/// Errors raised by the cryptographic layers
///
/// Every failure to authenticate (wrong key, tampered bytes, truncated input) collapses into
/// a single variant per layer, so callers cannot tell which one happened.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CryptoError {
    #[error("invalid key length, expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },
    #[error("invalid iv length, expected {expected}, got {actual}")]
    InvalidIvLength { expected: usize, actual: usize },
    #[error("encryption failed")]
    EncryptionFailed,
    #[error("decryption failed")]
    DecryptionFailed,
    #[error("key wrap failed")]
    WrapFailed,
    #[error("key unwrap failed")]
    UnwrapFailed,
    #[error("payload of {len} bytes exceeds vault key capacity of {max} bytes")]
    PayloadTooLarge { len: usize, max: usize },
    #[error("vault key encoding error: {0}")]
    KeyEncoding(String),
    #[error("vault key generation error: {0}")]
    KeyGeneration(String),
    #[error("system rng failure")]
    Rng,
}
