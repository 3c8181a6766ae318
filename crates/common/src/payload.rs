//! Sealed message encoding
//!
//! Payloads are stored as a JSON map carrying a `version` tag. Byte fields are base64.
//!
//! ```text
//! {
//!   "version": 2,
//!   "encrypted_content": "<base64>",
//!   "iv": "<base64, 16 bytes>",
//!   "wrapped_key": "<base64>",
//!   "round": 1003,
//!   "public_key_used": "<hex beacon public key>",
//!   "vault_public_key_used": "<hex SPKI DER>",   // only for vault envelopes
//!   "timestamp": "2024-05-01T12:00:00Z"
//! }
//! ```
//!
//! Messages written before envelopes existed carry no tag and hold their content in the
//! clear: `{"content": "...", "round": 5, "timestamp": "..."}`. Those can still be decoded,
//! but nothing here produces them.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_with::{base64::Base64, serde_as};

use crate::crypto::Iv;

/// Current payload schema version
pub const PAYLOAD_VERSION: u32 = 2;

/// Which layers protect a payload's content key
///
/// The unwrap sequence is fixed by the variant:
/// - `TimeLockOnly`: time-lock unwrap yields the content key
/// - `TimeLockAndVault`: time-lock unwrap, then vault unwrap, yields the content key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    TimeLockOnly,
    /// Hex SPKI DER of the vault public key the content key was sealed to
    TimeLockAndVault(String),
}

impl Envelope {
    pub fn vault_public_key_used(&self) -> Option<&str> {
        match self {
            Envelope::TimeLockOnly => None,
            Envelope::TimeLockAndVault(key) => Some(key),
        }
    }
}

/// A sealed message, as persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlockPayload {
    /// Content encrypted under the message's content key
    pub encrypted_content: Vec<u8>,
    /// IV the content was encrypted with
    pub iv: Iv,
    /// The content key, wrapped per `envelope`
    pub wrapped_key: Vec<u8>,
    /// Beacon round gating the time-lock
    pub round: u64,
    /// Hex beacon public key at seal time, kept for auditing
    pub public_key_used: String,
    pub envelope: Envelope,
    /// When the message was sealed
    pub timestamp: DateTime<Utc>,
}

impl TlockPayload {
    pub fn vault_public_key_used(&self) -> Option<&str> {
        self.envelope.vault_public_key_used()
    }
}

/// A pre-envelope message, content already in the clear
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LegacyPayload {
    pub content: String,
    pub round: u64,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedPayload {
    Current(TlockPayload),
    Legacy(LegacyPayload),
}

impl DecodedPayload {
    pub fn round(&self) -> u64 {
        match self {
            DecodedPayload::Current(payload) => payload.round,
            DecodedPayload::Legacy(payload) => payload.round,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unrecognized payload format")]
    UnrecognizedFormat,
    #[error("unsupported payload version {0}")]
    UnsupportedVersion(u32),
    #[error("invalid payload field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

#[derive(thiserror::Error, Debug)]
#[error("payload encode error: {0}")]
pub struct EncodeError(#[from] serde_json::Error);

#[derive(Deserialize)]
struct VersionTag {
    version: Option<u32>,
}

#[serde_as]
#[derive(Serialize, Deserialize)]
struct PayloadWire {
    version: u32,
    #[serde_as(as = "Base64")]
    encrypted_content: Vec<u8>,
    #[serde_as(as = "Base64")]
    iv: Vec<u8>,
    #[serde_as(as = "Base64")]
    wrapped_key: Vec<u8>,
    round: u64,
    public_key_used: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    vault_public_key_used: Option<String>,
    timestamp: DateTime<Utc>,
}

impl From<&TlockPayload> for PayloadWire {
    fn from(payload: &TlockPayload) -> Self {
        Self {
            version: PAYLOAD_VERSION,
            encrypted_content: payload.encrypted_content.clone(),
            iv: payload.iv.bytes().to_vec(),
            wrapped_key: payload.wrapped_key.clone(),
            round: payload.round,
            public_key_used: payload.public_key_used.clone(),
            vault_public_key_used: payload.vault_public_key_used().map(str::to_string),
            timestamp: payload.timestamp,
        }
    }
}

impl TryFrom<PayloadWire> for TlockPayload {
    type Error = DecodeError;
    fn try_from(wire: PayloadWire) -> Result<Self, Self::Error> {
        let iv = Iv::try_from(wire.iv.as_slice()).map_err(|e| DecodeError::InvalidField {
            field: "iv",
            reason: e.to_string(),
        })?;
        let envelope = match wire.vault_public_key_used {
            None => Envelope::TimeLockOnly,
            Some(key) if key.is_empty() => {
                return Err(DecodeError::InvalidField {
                    field: "vault_public_key_used",
                    reason: "empty vault public key".to_string(),
                })
            }
            Some(key) => Envelope::TimeLockAndVault(key),
        };
        Ok(Self {
            encrypted_content: wire.encrypted_content,
            iv,
            wrapped_key: wire.wrapped_key,
            round: wire.round,
            public_key_used: wire.public_key_used,
            envelope,
            timestamp: wire.timestamp,
        })
    }
}

/// Older writers emitted naive ISO timestamps, read those as UTC
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(serde::de::Error::custom)
}

/// Encode a payload in the current schema
pub fn encode(payload: &TlockPayload) -> Result<Vec<u8>, EncodeError> {
    Ok(serde_json::to_vec(&PayloadWire::from(payload))?)
}

/// Try the current schema
///
/// # Returns
/// * `Ok(Some(payload))` - The bytes are a current payload
/// * `Ok(None)` - The bytes are not in the current schema
/// * `Err(DecodeError)` - The bytes claim a schema we cannot read, or hold a bad field
pub fn try_decode_current(bytes: &[u8]) -> Result<Option<TlockPayload>, DecodeError> {
    let Ok(VersionTag {
        version: Some(version),
    }) = serde_json::from_slice::<VersionTag>(bytes)
    else {
        return Ok(None);
    };
    if version != PAYLOAD_VERSION {
        return Err(DecodeError::UnsupportedVersion(version));
    }

    match serde_json::from_slice::<PayloadWire>(bytes) {
        Ok(wire) => wire.try_into().map(Some),
        Err(e) => {
            tracing::debug!("payload tagged v{} did not match schema: {}", version, e);
            Ok(None)
        }
    }
}

/// Try the legacy plaintext schema
pub fn try_decode_legacy(bytes: &[u8]) -> Option<LegacyPayload> {
    serde_json::from_slice(bytes).ok()
}

/// Decode a stored payload, falling back to the legacy schema
pub fn decode(bytes: &[u8]) -> Result<DecodedPayload, DecodeError> {
    if let Some(payload) = try_decode_current(bytes)? {
        return Ok(DecodedPayload::Current(payload));
    }
    if let Some(legacy) = try_decode_legacy(bytes) {
        tracing::debug!("decoded legacy payload for round {}", legacy.round);
        return Ok(DecodedPayload::Legacy(legacy));
    }
    Err(DecodeError::UnrecognizedFormat)
}
