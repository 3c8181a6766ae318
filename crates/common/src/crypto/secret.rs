//! Content encryption using AES-256-GCM
//!
//! Each sealed message has its own `Secret`, generated at seal time and never reused.
//! The IV travels next to the ciphertext rather than inside it, since the payload stores
//! them as separate fields.

use std::ops::Deref;

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::{AesGcm, Nonce};

use super::CryptoError;

/// Size of the content key in bytes (256 bits)
pub const SECRET_SIZE: usize = 32;
/// Size of the content IV in bytes, one AES block
pub const IV_SIZE: usize = 16;

/// AES-256-GCM parameterized over a full-block IV
type ContentCipher = AesGcm<Aes256, U16>;

/// A 256-bit symmetric key for content encryption
///
/// The output of [`Secret::encrypt`] is `ciphertext || tag (16 bytes)`; the IV is returned
/// separately and must be stored alongside it.
///
/// # Examples
///
/// ```ignore
/// let secret = Secret::generate()?;
/// let (ciphertext, iv) = secret.encrypt(b"sensitive data")?;
/// let recovered = secret.decrypt(&ciphertext, &iv)?;
/// assert_eq!(b"sensitive data", &recovered[..]);
/// ```
#[derive(PartialEq, Eq, Clone)]
pub struct Secret([u8; SECRET_SIZE]);

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(..)")
    }
}

impl Deref for Secret {
    type Target = [u8; SECRET_SIZE];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<[u8; SECRET_SIZE]> for Secret {
    fn from(bytes: [u8; SECRET_SIZE]) -> Self {
        Secret(bytes)
    }
}

impl Secret {
    /// Generate a new random secret using the system RNG
    pub fn generate() -> Result<Self, CryptoError> {
        let mut buff = [0; SECRET_SIZE];
        getrandom::getrandom(&mut buff).map_err(|_| CryptoError::Rng)?;
        Ok(Self(buff))
    }

    /// Create a secret from a byte slice
    ///
    /// # Errors
    ///
    /// Returns `InvalidKeyLength` if the slice is not exactly `SECRET_SIZE` bytes.
    pub fn from_slice(data: &[u8]) -> Result<Self, CryptoError> {
        if data.len() != SECRET_SIZE {
            return Err(CryptoError::InvalidKeyLength {
                expected: SECRET_SIZE,
                actual: data.len(),
            });
        }
        let mut buff = [0; SECRET_SIZE];
        buff.copy_from_slice(data);
        Ok(buff.into())
    }

    /// Get a reference to the secret key bytes
    pub fn bytes(&self) -> &[u8] {
        self.0.as_ref()
    }

    fn cipher(&self) -> Result<ContentCipher, CryptoError> {
        ContentCipher::new_from_slice(self.bytes()).map_err(|_| CryptoError::InvalidKeyLength {
            expected: SECRET_SIZE,
            actual: self.0.len(),
        })
    }

    /// Encrypt data under a freshly generated IV
    ///
    /// Two calls with the same plaintext never produce the same ciphertext.
    pub fn encrypt(&self, data: &[u8]) -> Result<(Vec<u8>, Iv), CryptoError> {
        let iv = Iv::generate()?;
        let ciphertext = self
            .cipher()?
            .encrypt(Nonce::<U16>::from_slice(iv.bytes()), data)
            .map_err(|_| CryptoError::EncryptionFailed)?;
        Ok((ciphertext, iv))
    }

    /// Decrypt data produced by [`Secret::encrypt`]
    ///
    /// # Errors
    ///
    /// Returns `DecryptionFailed` for a wrong key, a wrong IV, or tampered ciphertext alike.
    pub fn decrypt(&self, data: &[u8], iv: &Iv) -> Result<Vec<u8>, CryptoError> {
        self.cipher()?
            .decrypt(Nonce::<U16>::from_slice(iv.bytes()), data)
            .map_err(|_| CryptoError::DecryptionFailed)
    }
}

/// Encrypt `plaintext` under a raw 32-byte key, returning the ciphertext and its IV
pub fn encrypt(plaintext: &[u8], key: &[u8]) -> Result<(Vec<u8>, Iv), CryptoError> {
    Secret::from_slice(key)?.encrypt(plaintext)
}

/// Decrypt `ciphertext` under a raw 32-byte key and the IV it was sealed with
pub fn decrypt(ciphertext: &[u8], key: &[u8], iv: &Iv) -> Result<Vec<u8>, CryptoError> {
    Secret::from_slice(key)?.decrypt(ciphertext, iv)
}

/// Initialization vector for content encryption
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Iv([u8; IV_SIZE]);

impl From<[u8; IV_SIZE]> for Iv {
    fn from(bytes: [u8; IV_SIZE]) -> Self {
        Iv(bytes)
    }
}

impl TryFrom<&[u8]> for Iv {
    type Error = CryptoError;
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() != IV_SIZE {
            return Err(CryptoError::InvalidIvLength {
                expected: IV_SIZE,
                actual: bytes.len(),
            });
        }
        let mut buff = [0; IV_SIZE];
        buff.copy_from_slice(bytes);
        Ok(Iv(buff))
    }
}

impl Iv {
    /// Generate a random IV
    pub fn generate() -> Result<Self, CryptoError> {
        let mut buff = [0; IV_SIZE];
        getrandom::getrandom(&mut buff).map_err(|_| CryptoError::Rng)?;
        Ok(Iv(buff))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.0
    }
}
