//! Time-lock key derivation
//!
//! Both sides hash `TIME_LOCK_DOMAIN || material || round (u64, big-endian)` with SHA-256.
//! At seal time `material` is the beacon public key, at unlock time it is the round's
//! published signature. The ordering is shared by both paths through [`derive`] and must
//! never diverge.
//!
//! # Trust Note
//!
//! Nothing here binds a round signature to the beacon public key; the two derivations only
//! agree when the beacon's material does. This is a hash-based stand-in with the same shape
//! as identity-based time-lock encryption over the beacon's BLS key, which is what should
//! replace it if the lock has to hold against a party that can see the public key.

use sha2::{Digest, Sha256};

use super::key_wrap::{WrappingKey, WRAPPING_KEY_SIZE};

/// Domain separation tag for time-lock derivations
pub const TIME_LOCK_DOMAIN: &[u8] = b"timevault/tlock/v1";

fn derive(material: &[u8], round: u64) -> WrappingKey {
    let mut hasher = Sha256::new();
    hasher.update(TIME_LOCK_DOMAIN);
    hasher.update(material);
    hasher.update(round.to_be_bytes());
    let digest = hasher.finalize();

    let mut buff = [0; WRAPPING_KEY_SIZE];
    buff.copy_from_slice(&digest);
    WrappingKey::from(buff)
}

/// Derive the key a message for `round` is sealed under
pub fn derive_encryption_key(beacon_public_key: &[u8], round: u64) -> WrappingKey {
    derive(beacon_public_key, round)
}

/// Derive the key to open a message for `round`, once its signature is public
pub fn derive_decryption_key(round: u64, round_signature: &[u8]) -> WrappingKey {
    derive(round_signature, round)
}
