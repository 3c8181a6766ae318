use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// A snapshot of the beacon, fetched per operation and never persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeaconInfo {
    /// The latest published round
    pub round: u64,
    /// The beacon's public key, which seals messages
    pub public_key: Vec<u8>,
    /// Seconds between rounds
    pub period_seconds: u32,
    /// When round 1 was emitted
    pub genesis_time: DateTime<Utc>,
}

impl BeaconInfo {
    pub fn public_key_hex(&self) -> String {
        hex::encode(&self.public_key)
    }
}

/// A round's published signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundSignature {
    pub round: u64,
    pub signature: Vec<u8>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BeaconError {
    /// The beacon could not be reached, retry with backoff
    #[error("beacon unavailable: {0}")]
    Unavailable(String),
    /// The beacon answered with something we could not use
    #[error("invalid beacon response: {0}")]
    InvalidResponse(String),
    /// The beacon answered with an unexpected status
    #[error("beacon returned status {0}: {1}")]
    Status(u16, String),
}

/// A public randomness beacon
///
/// A round that has not been published yet is not an error: `round_signature`
/// answers `Ok(None)` for it. Callers treat an empty signature the same way.
#[async_trait]
pub trait Beacon: Send + Sync + std::fmt::Debug {
    /// The latest published round
    async fn current_round(&self) -> Result<u64, BeaconError>;

    /// The beacon's public key, period and latest round
    async fn beacon_info(&self) -> Result<BeaconInfo, BeaconError>;

    /// Get the signature published for `round`
    ///
    /// # Returns
    /// * `Ok(Some(signature))` - The round is public
    /// * `Ok(None)` - The round has not been published yet
    /// * `Err(BeaconError)` - The beacon could not answer
    async fn round_signature(&self, round: u64) -> Result<Option<RoundSignature>, BeaconError>;
}
