use std::str::FromStr;
use std::time::Duration;

use url::Url;

use common::crypto::MIN_VAULT_KEY_BITS;

/// League of Entropy mainnet
pub const DEFAULT_DRAND_URL: &str = "https://api.drand.sh";
pub const DEFAULT_CHAIN_HASH: &str =
    "8990e7a9aaed2ffed73dbd7092123d6f289930540d7651336225dc172e51b2ce";

pub const DRAND_URL_ENV: &str = "TIMEVAULT_DRAND_URL";
pub const CHAIN_HASH_ENV: &str = "TIMEVAULT_DRAND_CHAIN_HASH";
pub const REQUEST_TIMEOUT_ENV: &str = "TIMEVAULT_REQUEST_TIMEOUT_SECS";
pub const UNLOCK_TIMEOUT_ENV: &str = "TIMEVAULT_UNLOCK_TIMEOUT_SECS";
pub const VAULT_KEY_BITS_ENV: &str = "TIMEVAULT_VAULT_KEY_BITS";
pub const LOG_LEVEL_ENV: &str = "TIMEVAULT_LOG_LEVEL";

#[derive(Debug, Clone)]
pub struct Config {
    // beacon configuration
    /// base url of the drand http api,
    ///  if not set then https://api.drand.sh will be used
    pub drand_url: Option<Url>,
    /// hash of the drand chain messages are sealed against
    pub chain_hash: String,
    /// timeout for a single request to the beacon
    pub request_timeout: Duration,

    // unlock configuration
    /// bound on a whole unlock attempt, beacon round trips included
    pub unlock_timeout: Duration,
    /// modulus size for newly generated vault keys,
    ///  never below 2048
    pub vault_key_bits: usize,

    // misc
    pub log_level: tracing::Level,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            drand_url: None,
            chain_hash: DEFAULT_CHAIN_HASH.to_string(),
            request_timeout: Duration::from_secs(10),
            unlock_timeout: Duration::from_secs(30),
            vault_key_bits: MIN_VAULT_KEY_BITS,
            log_level: tracing::Level::INFO,
        }
    }
}

impl Config {
    /// Read overrides from `TIMEVAULT_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from the defaults, overridden by whatever `lookup` returns
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(DRAND_URL_ENV) {
            let parsed = Url::parse(&url).map_err(|e| ConfigError::InvalidUrl(url, e))?;
            config.drand_url = Some(parsed);
        }
        if let Some(chain_hash) = lookup(CHAIN_HASH_ENV) {
            if chain_hash.is_empty() || hex::decode(&chain_hash).is_err() {
                return Err(ConfigError::InvalidChainHash(chain_hash));
            }
            config.chain_hash = chain_hash;
        }
        if let Some(secs) = lookup(REQUEST_TIMEOUT_ENV) {
            config.request_timeout = Duration::from_secs(parse_number(REQUEST_TIMEOUT_ENV, &secs)?);
        }
        if let Some(secs) = lookup(UNLOCK_TIMEOUT_ENV) {
            config.unlock_timeout = Duration::from_secs(parse_number(UNLOCK_TIMEOUT_ENV, &secs)?);
        }
        if let Some(bits) = lookup(VAULT_KEY_BITS_ENV) {
            let bits = parse_number(VAULT_KEY_BITS_ENV, &bits)?;
            if bits < MIN_VAULT_KEY_BITS {
                return Err(ConfigError::VaultKeyTooSmall(bits));
            }
            config.vault_key_bits = bits;
        }
        if let Some(level) = lookup(LOG_LEVEL_ENV) {
            config.log_level = tracing::Level::from_str(&level)
                .map_err(|_| ConfigError::InvalidLogLevel(level))?;
        }

        Ok(config)
    }

    /// The drand api base url, falling back to the default
    pub fn drand_url(&self) -> Result<Url, url::ParseError> {
        match &self.drand_url {
            Some(url) => Ok(url.clone()),
            None => Url::parse(DEFAULT_DRAND_URL),
        }
    }
}

fn parse_number<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        key,
        value: value.to_string(),
    })
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid drand url {0}: {1}")]
    InvalidUrl(String, url::ParseError),
    #[error("invalid chain hash: {0}")]
    InvalidChainHash(String),
    #[error("invalid number for {key}: {value}")]
    InvalidNumber { key: &'static str, value: String },
    #[error("vault keys need at least 2048 bits, got {0}")]
    VaultKeyTooSmall(usize),
    #[error("invalid log level: {0}")]
    InvalidLogLevel(String),
}
