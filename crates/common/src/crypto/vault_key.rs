//! Vault envelopes using RSA-OAEP (SHA-256)
//!
//! A vault's public key seals the content key so that, once the time-lock opens, only
//! holders of the vault private key can finish decryption. Only key material goes through
//! RSA; a 32-byte `Secret` fits under any modulus of at least `MIN_VAULT_KEY_BITS`.
//!
//! Public keys are exchanged as hex-encoded SubjectPublicKeyInfo DER (that is what a payload
//! records as `vault_public_key_used`) or as PEM.

use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::rand_core::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;

use super::CryptoError;

/// Smallest modulus we will generate vault keys with
pub const MIN_VAULT_KEY_BITS: usize = 2048;
/// SHA-256 output size, which sets the OAEP overhead
const OAEP_HASH_SIZE: usize = 32;

fn oaep() -> Oaep {
    Oaep::new::<Sha256>()
}

/// Public half of a vault keypair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultPublicKey(RsaPublicKey);

impl From<RsaPublicKey> for VaultPublicKey {
    fn from(key: RsaPublicKey) -> Self {
        VaultPublicKey(key)
    }
}

impl VaultPublicKey {
    /// Parse a public key from hex-encoded SPKI DER
    ///
    /// Accepts both plain hex and "0x"-prefixed hex strings.
    pub fn from_hex(hex: &str) -> Result<Self, CryptoError> {
        let hex = hex.strip_prefix("0x").unwrap_or(hex);
        let der = hex::decode(hex)
            .map_err(|_| CryptoError::KeyEncoding("vault public key hex decode error".into()))?;
        let key = RsaPublicKey::from_public_key_der(&der)
            .map_err(|e| CryptoError::KeyEncoding(e.to_string()))?;
        Ok(VaultPublicKey(key))
    }

    /// Encode as hex SPKI DER
    pub fn to_hex(&self) -> Result<String, CryptoError> {
        let der = self
            .0
            .to_public_key_der()
            .map_err(|e| CryptoError::KeyEncoding(e.to_string()))?;
        Ok(hex::encode(der.as_bytes()))
    }

    pub fn from_pem(pem: &str) -> Result<Self, CryptoError> {
        RsaPublicKey::from_public_key_pem(pem)
            .map(VaultPublicKey)
            .map_err(|e| CryptoError::KeyEncoding(e.to_string()))
    }

    pub fn to_pem(&self) -> Result<String, CryptoError> {
        self.0
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| CryptoError::KeyEncoding(e.to_string()))
    }

    /// Largest payload OAEP can seal under this key
    pub fn max_wrap_len(&self) -> usize {
        self.0.size().saturating_sub(2 * OAEP_HASH_SIZE + 2)
    }

    /// Seal `key_material` to this vault
    pub fn wrap_key(&self, key_material: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let max = self.max_wrap_len();
        if key_material.len() > max {
            return Err(CryptoError::PayloadTooLarge {
                len: key_material.len(),
                max,
            });
        }
        self.0
            .encrypt(&mut OsRng, oaep(), key_material)
            .map_err(|_| CryptoError::WrapFailed)
    }
}

/// Private half of a vault keypair
///
/// Protecting this at rest is the custodian's job; this type only holds it in memory.
#[derive(Clone)]
pub struct VaultPrivateKey(RsaPrivateKey);

impl std::fmt::Debug for VaultPrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("VaultPrivateKey(..)")
    }
}

impl From<RsaPrivateKey> for VaultPrivateKey {
    fn from(key: RsaPrivateKey) -> Self {
        VaultPrivateKey(key)
    }
}

impl VaultPrivateKey {
    /// Generate a new vault keypair with a `bits`-sized modulus
    ///
    /// # Errors
    ///
    /// Returns `KeyGeneration` if `bits` is below `MIN_VAULT_KEY_BITS` or generation fails.
    pub fn generate(bits: usize) -> Result<Self, CryptoError> {
        if bits < MIN_VAULT_KEY_BITS {
            return Err(CryptoError::KeyGeneration(format!(
                "modulus of {} bits is below the minimum of {}",
                bits, MIN_VAULT_KEY_BITS
            )));
        }
        RsaPrivateKey::new(&mut OsRng, bits)
            .map(VaultPrivateKey)
            .map_err(|e| CryptoError::KeyGeneration(e.to_string()))
    }

    pub fn public(&self) -> VaultPublicKey {
        VaultPublicKey(self.0.to_public_key())
    }

    /// Encode as PKCS#8 PEM
    pub fn to_pem(&self) -> Result<String, CryptoError> {
        self.0
            .to_pkcs8_pem(LineEnding::LF)
            .map(|pem| pem.to_string())
            .map_err(|e| CryptoError::KeyEncoding(e.to_string()))
    }

    pub fn from_pem(pem: &str) -> Result<Self, CryptoError> {
        RsaPrivateKey::from_pkcs8_pem(pem)
            .map(VaultPrivateKey)
            .map_err(|e| CryptoError::KeyEncoding(e.to_string()))
    }

    /// Open an envelope produced by [`VaultPublicKey::wrap_key`]
    ///
    /// # Errors
    ///
    /// Returns `UnwrapFailed` if the envelope was sealed to another vault or was altered.
    pub fn unwrap_key(&self, wrapped: &[u8]) -> Result<Vec<u8>, CryptoError> {
        self.0
            .decrypt(oaep(), wrapped)
            .map_err(|_| CryptoError::UnwrapFailed)
    }
}

/// Seal `key_material` to a vault public key
pub fn wrap_key_for_vault(
    key_material: &[u8],
    vault_public_key: &VaultPublicKey,
) -> Result<Vec<u8>, CryptoError> {
    vault_public_key.wrap_key(key_material)
}

/// Open a vault envelope with the vault private key
pub fn unwrap_key_for_vault(
    wrapped: &[u8],
    vault_private_key: &VaultPrivateKey,
) -> Result<Vec<u8>, CryptoError> {
    vault_private_key.unwrap_key(wrapped)
}

#[cfg(test)]
mod test {
    use std::sync::OnceLock;

    use super::*;

    fn alice() -> &'static VaultPrivateKey {
        static KEY: OnceLock<VaultPrivateKey> = OnceLock::new();
        KEY.get_or_init(|| VaultPrivateKey::generate(MIN_VAULT_KEY_BITS).unwrap())
    }

    fn bob() -> &'static VaultPrivateKey {
        static KEY: OnceLock<VaultPrivateKey> = OnceLock::new();
        KEY.get_or_init(|| VaultPrivateKey::generate(MIN_VAULT_KEY_BITS).unwrap())
    }

    #[test]
    fn test_vault_wrap_unwrap() {
        let material = [42u8; 32];
        let wrapped = wrap_key_for_vault(&material, &alice().public()).unwrap();

        assert_eq!(wrapped.len(), MIN_VAULT_KEY_BITS / 8);
        assert_eq!(
            unwrap_key_for_vault(&wrapped, alice()).unwrap(),
            material.to_vec()
        );
    }

    #[test]
    fn test_vault_wrap_is_randomized() {
        let material = [1u8; 32];
        let public = alice().public();

        assert_ne!(
            public.wrap_key(&material).unwrap(),
            public.wrap_key(&material).unwrap()
        );
    }

    #[test]
    fn test_vault_unwrap_with_other_vault_fails() {
        let wrapped = wrap_key_for_vault(&[3u8; 32], &alice().public()).unwrap();

        assert_eq!(
            unwrap_key_for_vault(&wrapped, bob()),
            Err(CryptoError::UnwrapFailed)
        );
    }

    #[test]
    fn test_vault_wrap_capacity() {
        let public = alice().public();
        // 256 - 2 * 32 - 2
        assert_eq!(public.max_wrap_len(), 190);

        assert!(public.wrap_key(&[0u8; 190]).is_ok());
        assert_eq!(
            public.wrap_key(&[0u8; 191]),
            Err(CryptoError::PayloadTooLarge { len: 191, max: 190 })
        );
    }

    #[test]
    fn test_vault_key_hex_roundtrip() {
        let public = alice().public();
        let hex = public.to_hex().unwrap();

        assert_eq!(VaultPublicKey::from_hex(&hex).unwrap(), public);
        assert_eq!(
            VaultPublicKey::from_hex(&format!("0x{}", hex)).unwrap(),
            public
        );
        assert!(VaultPublicKey::from_hex("not hex").is_err());
        assert!(VaultPublicKey::from_hex("deadbeef").is_err());
    }

    #[test]
    fn test_vault_key_pem_roundtrip() {
        let private_pem = alice().to_pem().unwrap();
        let restored = VaultPrivateKey::from_pem(&private_pem).unwrap();
        assert_eq!(restored.public(), alice().public());

        let public_pem = alice().public().to_pem().unwrap();
        assert_eq!(
            VaultPublicKey::from_pem(&public_pem).unwrap(),
            alice().public()
        );
    }

    #[test]
    fn test_small_modulus_rejected() {
        assert!(matches!(
            VaultPrivateKey::generate(1024),
            Err(CryptoError::KeyGeneration(_))
        ));
    }
}
