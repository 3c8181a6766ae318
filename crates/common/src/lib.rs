/**
 * Cryptographic types and operations.
 *  - Per-message content encryption
 *  - Fixed-IV key wrapping
 *  - Time-lock key derivation against a beacon round
 *  - Vault (RSA-OAEP) key envelopes
 */
pub mod crypto;
/**
 * Conversions between wall-clock instants and
 *  beacon rounds, and the availability gate.
 */
pub mod round;
/**
 * The randomness beacon we consume.
 *  Only the interface lives here, the HTTP
 *  client lives in the service crate.
 */
pub mod beacon;
/**
 * The vault key custodian we consume.
 */
pub mod vault;
/**
 * Versioned wire encoding for sealed messages,
 *  including the legacy plaintext shape.
 */
pub mod payload;
/**
 * Sealing and unlocking of time-locked messages.
 */
pub mod unlock;
/**
 * In-process doubles for the beacon, used by
 *  tests here and in downstream crates.
 */
pub mod testkit;

pub mod prelude {
    pub use crate::beacon::{Beacon, BeaconError, BeaconInfo, RoundSignature};
    pub use crate::crypto::{CryptoError, Iv, Secret, VaultPrivateKey, VaultPublicKey};
    pub use crate::payload::{DecodeError, DecodedPayload, Envelope, TlockPayload};
    pub use crate::unlock::{SealedMessage, TimeVault, UnlockError, UnlockFailure, UnlockState};
    pub use crate::vault::{RsaCustodian, VaultCustodian};
}
