//! HTTP client for the drand beacon API
//!
//! Three endpoints are used, all relative to `{base}/{chain_hash}/`:
//! - `info` for the chain's public key, period and genesis time
//! - `public/latest` for the latest round
//! - `public/{round}` for a round's signature
//!
//! A chain's parameters never change, so `info` is fetched once and kept. Rounds are
//! always fetched fresh.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use reqwest::{header::HeaderMap, header::HeaderValue, Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use common::beacon::{Beacon, BeaconError, BeaconInfo, RoundSignature};

/// Chain parameters as served by `/{chain}/info`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChainInfo {
    pub public_key: String,
    pub period: u32,
    /// unix seconds
    pub genesis_time: i64,
    #[serde(default)]
    pub hash: Option<String>,
}

/// A round as served by `/{chain}/public/...`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RoundResponse {
    pub round: u64,
    pub signature: String,
    #[serde(default)]
    pub randomness: Option<String>,
}

/// Status drand answers for rounds it has not reached
const TOO_EARLY: u16 = 425;

#[derive(Debug, thiserror::Error)]
pub enum DrandError {
    #[error("HTTP request failed: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
    #[error("HTTP status {0}: {1}")]
    HttpStatus(StatusCode, String),
    #[error("invalid chain info: {0}")]
    InvalidChainInfo(String),
}

impl From<DrandError> for BeaconError {
    fn from(err: DrandError) -> Self {
        match err {
            DrandError::Reqwest(e) if e.is_decode() => BeaconError::InvalidResponse(e.to_string()),
            DrandError::Reqwest(e) => BeaconError::Unavailable(e.to_string()),
            DrandError::UrlParse(e) => BeaconError::InvalidResponse(e.to_string()),
            DrandError::HttpStatus(status, body) => BeaconError::Status(status.as_u16(), body),
            DrandError::InvalidChainInfo(reason) => BeaconError::InvalidResponse(reason),
        }
    }
}

#[derive(Debug)]
pub struct DrandClient {
    /// always ends in `/{chain_hash}/`
    chain_url: Url,
    chain_hash: String,
    client: Client,
    chain_info: Mutex<Option<ChainInfo>>,
}

impl DrandClient {
    pub fn new(
        remote: &Url,
        chain_hash: &str,
        timeout: std::time::Duration,
    ) -> Result<Self, DrandError> {
        let mut remote = remote.clone();
        // a base without a trailing slash would lose its last segment on join
        if !remote.path().ends_with('/') {
            let path = format!("{}/", remote.path());
            remote.set_path(&path);
        }
        let chain_url = remote.join(&format!("{}/", chain_hash))?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert("Accept", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(default_headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            chain_url,
            chain_hash: chain_hash.to_string(),
            client,
            chain_info: Mutex::new(None),
        })
    }

    /// Get the url all requests are made relative to
    pub fn chain_url(&self) -> &Url {
        &self.chain_url
    }

    pub fn chain_hash(&self) -> &str {
        &self.chain_hash
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, DrandError> {
        let url = self.chain_url.join(path)?;
        tracing::debug!(%url, "drand request");
        let response = self.client.get(url).send().await?;

        if response.status().is_success() {
            Ok(response.json::<T>().await?)
        } else {
            let status = response.status();
            tracing::debug!(%status, path, "drand request rejected");
            Err(DrandError::HttpStatus(status, response.text().await?))
        }
    }

    /// Fetch the chain parameters, once
    pub async fn chain_info(&self) -> Result<ChainInfo, DrandError> {
        let cached = self.chain_info.lock().clone();
        if let Some(info) = cached {
            return Ok(info);
        }

        let info: ChainInfo = self.get("info").await?;
        if info.period == 0 {
            return Err(DrandError::InvalidChainInfo("period is zero".to_string()));
        }
        if let Some(hash) = &info.hash {
            if !hash.eq_ignore_ascii_case(&self.chain_hash) {
                return Err(DrandError::InvalidChainInfo(format!(
                    "asked for chain {}, got chain {}",
                    self.chain_hash, hash
                )));
            }
        }
        tracing::info!(
            chain = %self.chain_hash,
            period = info.period,
            genesis_time = info.genesis_time,
            "loaded drand chain info"
        );

        *self.chain_info.lock() = Some(info.clone());
        Ok(info)
    }

    pub async fn latest(&self) -> Result<RoundResponse, DrandError> {
        self.get("public/latest").await
    }

    /// Fetch a round, `None` while the beacon has not reached it
    pub async fn round(&self, round: u64) -> Result<Option<RoundResponse>, DrandError> {
        match self.get(&format!("public/{}", round)).await {
            Ok(response) => Ok(Some(response)),
            // drand answers 425 Too Early for future rounds, older relays 404
            Err(DrandError::HttpStatus(status, _))
                if status == StatusCode::NOT_FOUND || status.as_u16() == TOO_EARLY =>
            {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

fn decode_hex(field: &str, value: &str) -> Result<Vec<u8>, BeaconError> {
    hex::decode(value)
        .map_err(|e| BeaconError::InvalidResponse(format!("{} is not hex: {}", field, e)))
}

#[async_trait]
impl Beacon for DrandClient {
    async fn current_round(&self) -> Result<u64, BeaconError> {
        Ok(self.latest().await?.round)
    }

    async fn beacon_info(&self) -> Result<BeaconInfo, BeaconError> {
        let info = self.chain_info().await?;
        let latest = self.latest().await?;

        let genesis_time = DateTime::<Utc>::from_timestamp(info.genesis_time, 0).ok_or_else(
            || BeaconError::InvalidResponse(format!("genesis time {}", info.genesis_time)),
        )?;

        Ok(BeaconInfo {
            round: latest.round,
            public_key: decode_hex("public_key", &info.public_key)?,
            period_seconds: info.period,
            genesis_time,
        })
    }

    async fn round_signature(&self, round: u64) -> Result<Option<RoundSignature>, BeaconError> {
        let Some(response) = self.round(round).await? else {
            tracing::debug!(round, "round not published yet");
            return Ok(None);
        };

        let signature = decode_hex("signature", &response.signature)?;
        // an empty signature is not a published round yet
        if signature.is_empty() {
            tracing::debug!(round, "round served without a signature");
            return Ok(None);
        }

        Ok(Some(RoundSignature {
            round: response.round,
            signature,
        }))
    }
}
