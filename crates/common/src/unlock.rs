//! Sealing and unlocking of time-locked messages
//!
//! [`TimeVault`] is the only part of this crate that talks to the beacon. It is stateless
//! between calls: a message's state is owned by the caller as an [`UnlockState`], passed in
//! by reference and answered with a new one. Nothing is mutated in place, so dropping an
//! unlock future half way (a timeout, a cancelled request) leaves the caller's state exactly
//! as it was.
//!
//! # States
//!
//! ```text
//!   Locked ──unlock──► Locked      round not public yet, poll again next period
//!          ──unlock──► Unlocked    plaintext recovered
//!          ──unlock──► Failed      payload corrupt, or it will never open
//!          ──unlock──► Err(..)     beacon unreachable, state unchanged, retry with backoff
//!
//!   Unlocked / Failed ──unlock──► same state, no beacon traffic
//! ```
//!
//! Exclusion between concurrent unlocks of the *same* message is the caller's job, see the
//! service crate's coordinator.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::beacon::{Beacon, BeaconError, BeaconInfo, RoundSignature};
use crate::crypto::{self, CryptoError, Secret, VaultPrivateKey, VaultPublicKey};
use crate::payload::{self, DecodeError, DecodedPayload, EncodeError, Envelope, TlockPayload};
use crate::round::{is_round_available, round_for_unlock_time, time_of_round};
use crate::vault::VaultCustodian;

/// What sealing hands to persistence
///
/// `round` duplicates the payload's round in the clear, so availability can be polled
/// without decoding the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedMessage {
    pub payload: Vec<u8>,
    pub round: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnlockState {
    Locked(SealedMessage),
    Unlocked(Vec<u8>),
    /// Terminal, the message will never open
    Failed(UnlockFailure),
}

impl UnlockState {
    pub fn is_locked(&self) -> bool {
        matches!(self, UnlockState::Locked(_))
    }

    pub fn is_unlocked(&self) -> bool {
        matches!(self, UnlockState::Unlocked(_))
    }

    pub fn plaintext(&self) -> Option<&[u8]> {
        match self {
            UnlockState::Unlocked(plaintext) => Some(plaintext),
            _ => None,
        }
    }

    /// The round a locked message is waiting on
    pub fn pending_round(&self) -> Option<u64> {
        match self {
            UnlockState::Locked(sealed) => Some(sealed.round),
            _ => None,
        }
    }
}

impl From<SealedMessage> for UnlockState {
    fn from(sealed: SealedMessage) -> Self {
        UnlockState::Locked(sealed)
    }
}

/// Why a message moved to [`UnlockState::Failed`]
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UnlockFailure {
    #[error("corrupt payload: {0}")]
    Decode(#[from] DecodeError),
    #[error("cryptographic failure: {0}")]
    Crypto(#[from] CryptoError),
}

/// Retryable unlock errors, the message state is unchanged
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UnlockError {
    #[error(transparent)]
    Beacon(#[from] BeaconError),
    #[error("message is sealed to a vault but no vault key was provided")]
    VaultKeyRequired,
}

#[derive(thiserror::Error, Debug)]
pub enum SealError {
    #[error(transparent)]
    Beacon(#[from] BeaconError),
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Seals messages to future beacon rounds and opens them once the round is public
#[derive(Debug, Clone)]
pub struct TimeVault {
    beacon: Arc<dyn Beacon>,
    custodian: Arc<dyn VaultCustodian>,
}

impl TimeVault {
    pub fn new(beacon: Arc<dyn Beacon>, custodian: Arc<dyn VaultCustodian>) -> Self {
        Self { beacon, custodian }
    }

    pub fn beacon(&self) -> &Arc<dyn Beacon> {
        &self.beacon
    }

    pub fn custodian(&self) -> &Arc<dyn VaultCustodian> {
        &self.custodian
    }

    /// Seal `plaintext` so it stays locked until `unlock_time`
    ///
    /// With a `vault` key the content key is additionally sealed to that vault, and the
    /// vault private key will be needed to unlock.
    pub async fn seal(
        &self,
        plaintext: &[u8],
        unlock_time: DateTime<Utc>,
        vault: Option<&VaultPublicKey>,
    ) -> Result<SealedMessage, SealError> {
        let info = self.beacon.beacon_info().await?;
        let round = round_for_unlock_time(unlock_time, info.round, info.period_seconds);
        tracing::debug!(
            "sealing for {} at round {} (beacon at {}, period {}s)",
            unlock_time,
            round,
            info.round,
            info.period_seconds
        );
        self.seal_for_round(plaintext, round, &info, vault)
    }

    /// Seal `plaintext` to an explicit `round` using an already fetched beacon snapshot
    pub fn seal_for_round(
        &self,
        plaintext: &[u8],
        round: u64,
        info: &BeaconInfo,
        vault: Option<&VaultPublicKey>,
    ) -> Result<SealedMessage, SealError> {
        let payload = self.seal_payload(plaintext, round, info, vault)?;
        let payload = payload::encode(&payload)?;
        tracing::info!(round, vault = vault.is_some(), "sealed message");
        Ok(SealedMessage { payload, round })
    }

    fn seal_payload(
        &self,
        plaintext: &[u8],
        round: u64,
        info: &BeaconInfo,
        vault: Option<&VaultPublicKey>,
    ) -> Result<TlockPayload, CryptoError> {
        let secret = Secret::generate()?;
        let (encrypted_content, iv) = secret.encrypt(plaintext)?;

        let (key_material, envelope) = match vault {
            Some(vault) => (
                self.custodian.wrap_key_for_vault(secret.bytes(), vault)?,
                Envelope::TimeLockAndVault(vault.to_hex()?),
            ),
            None => (secret.bytes().to_vec(), Envelope::TimeLockOnly),
        };

        let wrapping_key = crypto::derive_encryption_key(&info.public_key, round);
        let wrapped_key = crypto::wrap(&key_material, &wrapping_key)?;

        Ok(TlockPayload {
            encrypted_content,
            iv,
            wrapped_key,
            round,
            public_key_used: info.public_key_hex(),
            envelope,
            timestamp: Utc::now(),
        })
    }

    /// Try to move a message forward
    ///
    /// `vault_key` is only consulted for messages sealed to a vault.
    ///
    /// # Returns
    /// * `Ok(UnlockState::Locked)` - The target round is not public yet, `state` unchanged
    /// * `Ok(UnlockState::Unlocked)` - The plaintext, persist it and drop the payload
    /// * `Ok(UnlockState::Failed)` - The payload can never be opened
    /// * `Err(UnlockError)` - Nothing was decided, retry later
    pub async fn unlock(
        &self,
        state: &UnlockState,
        vault_key: Option<&VaultPrivateKey>,
    ) -> Result<UnlockState, UnlockError> {
        let sealed = match state {
            UnlockState::Locked(sealed) => sealed,
            settled => return Ok(settled.clone()),
        };

        let payload = match payload::decode(&sealed.payload) {
            Ok(DecodedPayload::Current(payload)) => payload,
            Ok(DecodedPayload::Legacy(legacy)) => {
                tracing::info!(round = legacy.round, "unlocked legacy message");
                return Ok(UnlockState::Unlocked(legacy.content.into_bytes()));
            }
            Err(e) => {
                tracing::warn!(round = sealed.round, "message payload is corrupt: {}", e);
                return Ok(UnlockState::Failed(e.into()));
            }
        };

        let vault_key = match payload.envelope {
            Envelope::TimeLockOnly => None,
            Envelope::TimeLockAndVault(_) => Some(vault_key.ok_or(UnlockError::VaultKeyRequired)?),
        };

        let current_round = self.beacon.current_round().await?;
        if !is_round_available(payload.round, current_round) {
            tracing::debug!(
                round = payload.round,
                current_round,
                "message still locked"
            );
            return Ok(state.clone());
        }

        let signature = match self.beacon.round_signature(payload.round).await? {
            Some(signature) if !signature.signature.is_empty() => signature,
            _ => {
                tracing::debug!(round = payload.round, "round signature not served yet");
                return Ok(state.clone());
            }
        };
        if signature.round != payload.round {
            return Err(BeaconError::InvalidResponse(format!(
                "asked for round {}, got round {}",
                payload.round, signature.round
            ))
            .into());
        }

        match self.open(&payload, &signature, vault_key) {
            Ok(plaintext) => {
                tracing::info!(round = payload.round, "unlocked message");
                Ok(UnlockState::Unlocked(plaintext))
            }
            Err(e) => {
                tracing::warn!(round = payload.round, "message failed to open: {}", e);
                Ok(UnlockState::Failed(e.into()))
            }
        }
    }

    /// When the beacon is expected to publish `round`
    pub async fn expected_unlock_time(
        &self,
        round: u64,
    ) -> Result<Option<DateTime<Utc>>, BeaconError> {
        let info = self.beacon.beacon_info().await?;
        Ok(time_of_round(round, info.genesis_time, info.period_seconds))
    }

    /// Undo the layers in reverse: time-lock, then vault (if any), then content
    fn open(
        &self,
        payload: &TlockPayload,
        signature: &RoundSignature,
        vault_key: Option<&VaultPrivateKey>,
    ) -> Result<Vec<u8>, CryptoError> {
        let unwrapping_key = crypto::derive_decryption_key(payload.round, &signature.signature);
        let key_material = crypto::unwrap(&payload.wrapped_key, &unwrapping_key)?;

        let Some(vault_key) = vault_key else {
            return open_content(payload, &key_material);
        };

        self.custodian
            .unwrap_key_for_vault(&key_material, vault_key)
            .and_then(|content_key| open_content(payload, &content_key))
            .or_else(|err| {
                // single-layer writers also recorded the vault key they were given
                tracing::warn!(
                    round = payload.round,
                    "vault envelope did not open, trying single-layer fallback"
                );
                open_content(payload, &key_material).map_err(|_| err)
            })
    }
}

fn open_content(payload: &TlockPayload, content_key: &[u8]) -> Result<Vec<u8>, CryptoError> {
    Secret::from_slice(content_key)?.decrypt(&payload.encrypted_content, &payload.iv)
}
