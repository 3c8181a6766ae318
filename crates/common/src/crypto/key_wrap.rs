//! Key wrapping using AES Key Wrap with Padding (RFC 5649)
//!
//! This is *not* a general purpose cipher. AES-KW is deterministic: it runs under a fixed,
//! protocol-defined IV, which is only acceptable because its inputs are always freshly
//! generated key material (a content `Secret`, or the RSA envelope of one). Content must go
//! through [`Secret`](super::Secret) instead.
//!
//! The fixed IV is RFC 5649's alternative initial value (`A65959A6` plus the input length),
//! not an all-zero IV. It doubles as the integrity check: a wrong wrapping key or a tampered
//! blob is detected on unwrap and reported as `UnwrapFailed`.
//!
//! Padding mode is used so that RSA envelopes of any modulus size can be wrapped, not just
//! multiples of the 8-byte semiblock.

use std::ops::Deref;

use aes_kw::KekAes256 as Kek;

use super::CryptoError;

/// Size of a wrapping key in bytes (256 bits)
pub const WRAPPING_KEY_SIZE: usize = 32;

/// A 256-bit key-encryption key
///
/// In practice these only come out of the time-lock derivation, see
/// [`derive_encryption_key`](super::derive_encryption_key).
#[derive(Clone, PartialEq, Eq)]
pub struct WrappingKey([u8; WRAPPING_KEY_SIZE]);

impl std::fmt::Debug for WrappingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("WrappingKey(..)")
    }
}

impl Deref for WrappingKey {
    type Target = [u8; WRAPPING_KEY_SIZE];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<[u8; WRAPPING_KEY_SIZE]> for WrappingKey {
    fn from(bytes: [u8; WRAPPING_KEY_SIZE]) -> Self {
        WrappingKey(bytes)
    }
}

impl TryFrom<&[u8]> for WrappingKey {
    type Error = CryptoError;
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() != WRAPPING_KEY_SIZE {
            return Err(CryptoError::InvalidKeyLength {
                expected: WRAPPING_KEY_SIZE,
                actual: bytes.len(),
            });
        }
        let mut buff = [0; WRAPPING_KEY_SIZE];
        buff.copy_from_slice(bytes);
        Ok(WrappingKey(buff))
    }
}

impl WrappingKey {
    fn kek(&self) -> Kek {
        Kek::from(self.0)
    }
}

/// Wrap key material under `wrapping_key`
///
/// # Errors
///
/// Returns `WrapFailed` if the input is empty or too large for AES-KW.
pub fn wrap(key_material: &[u8], wrapping_key: &WrappingKey) -> Result<Vec<u8>, CryptoError> {
    if key_material.is_empty() {
        return Err(CryptoError::WrapFailed);
    }
    wrapping_key
        .kek()
        .wrap_with_padding_vec(key_material)
        .map_err(|_| CryptoError::WrapFailed)
}

/// Recover key material wrapped by [`wrap`]
///
/// # Errors
///
/// Returns `UnwrapFailed` if the wrapping key is wrong or the blob was altered.
pub fn unwrap(wrapped: &[u8], wrapping_key: &WrappingKey) -> Result<Vec<u8>, CryptoError> {
    wrapping_key
        .kek()
        .unwrap_with_padding_vec(wrapped)
        .map_err(|_| CryptoError::UnwrapFailed)
}
