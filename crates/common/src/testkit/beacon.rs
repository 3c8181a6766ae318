use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

use crate::beacon::{Beacon, BeaconError, BeaconInfo, RoundSignature};

/// League of Entropy mainnet public key, used as the mock's default
pub const FIXTURE_PUBLIC_KEY: &str = "868f005eb8e6e4ca0a47c8a77ceaa5309a47978a7c71bc5cce96366b5d7a569937c529eeda66c7293784a9402801af31";

/// How many times each beacon method was called
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BeaconCalls {
    pub current_round: usize,
    pub beacon_info: usize,
    pub round_signature: usize,
}

impl BeaconCalls {
    pub fn total(&self) -> usize {
        self.current_round + self.beacon_info + self.round_signature
    }
}

#[derive(Debug, Default)]
struct CallCounters {
    current_round: AtomicUsize,
    beacon_info: AtomicUsize,
    round_signature: AtomicUsize,
}

#[derive(Debug)]
struct MockBeaconState {
    round: u64,
    public_key: Vec<u8>,
    period_seconds: u32,
    genesis_time: DateTime<Utc>,
    offline: bool,
    /// rounds reported as current whose signature is not served
    withheld: HashSet<u64>,
    /// published signatures that differ from the fixture
    signatures: HashMap<u64, Vec<u8>>,
    /// rounds answered with another round's number
    relabeled: HashMap<u64, u64>,
}

/// A beacon whose rounds only advance when told to
///
/// Every published round's signature carries the same bytes as the public key. That is the
/// fixture relationship under which sealing and unlocking derive the same key.
#[derive(Debug)]
pub struct MockBeacon {
    state: Mutex<MockBeaconState>,
    calls: CallCounters,
}

impl MockBeacon {
    /// A beacon at `round`, ticking every `period_seconds`, with the fixture public key
    pub fn new(round: u64, period_seconds: u32) -> Self {
        let public_key = hex::decode(FIXTURE_PUBLIC_KEY).unwrap_or_default();
        Self::with_public_key(round, period_seconds, public_key)
    }

    pub fn with_public_key(round: u64, period_seconds: u32, public_key: Vec<u8>) -> Self {
        // place genesis so that `round` is current right now
        let elapsed = round.saturating_sub(1).saturating_mul(u64::from(period_seconds));
        let genesis_time = i64::try_from(elapsed)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|elapsed| Utc::now().checked_sub_signed(elapsed))
            .unwrap_or_else(Utc::now);

        Self {
            state: Mutex::new(MockBeaconState {
                round,
                public_key,
                period_seconds,
                genesis_time,
                offline: false,
                withheld: HashSet::new(),
                signatures: HashMap::new(),
                relabeled: HashMap::new(),
            }),
            calls: CallCounters::default(),
        }
    }

    pub fn public_key(&self) -> Vec<u8> {
        self.state.lock().public_key.clone()
    }

    pub fn round(&self) -> u64 {
        self.state.lock().round
    }

    pub fn genesis_time(&self) -> DateTime<Utc> {
        self.state.lock().genesis_time
    }

    /// Publish every round up to and including `round`
    pub fn advance_to(&self, round: u64) {
        let mut state = self.state.lock();
        state.round = state.round.max(round);
    }

    pub fn advance(&self, rounds: u64) {
        let mut state = self.state.lock();
        state.round = state.round.saturating_add(rounds);
    }

    /// Make every call fail as if the network were down
    pub fn set_offline(&self, offline: bool) {
        self.state.lock().offline = offline;
    }

    /// Report `round` as reached but keep serving no signature for it
    pub fn withhold_signature(&self, round: u64) {
        self.state.lock().withheld.insert(round);
    }

    /// Publish `signature` for `round` instead of the fixture one
    pub fn set_signature(&self, round: u64, signature: Vec<u8>) {
        self.state.lock().signatures.insert(round, signature);
    }

    /// Answer requests for `round` with a signature labelled `served_round`
    pub fn relabel_round(&self, round: u64, served_round: u64) {
        self.state.lock().relabeled.insert(round, served_round);
    }

    pub fn calls(&self) -> BeaconCalls {
        BeaconCalls {
            current_round: self.calls.current_round.load(Ordering::SeqCst),
            beacon_info: self.calls.beacon_info.load(Ordering::SeqCst),
            round_signature: self.calls.round_signature.load(Ordering::SeqCst),
        }
    }

    fn check_online(state: &MockBeaconState) -> Result<(), BeaconError> {
        if state.offline {
            return Err(BeaconError::Unavailable("mock beacon is offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Beacon for MockBeacon {
    async fn current_round(&self) -> Result<u64, BeaconError> {
        self.calls.current_round.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock();
        Self::check_online(&state)?;
        Ok(state.round)
    }

    async fn beacon_info(&self) -> Result<BeaconInfo, BeaconError> {
        self.calls.beacon_info.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock();
        Self::check_online(&state)?;
        Ok(BeaconInfo {
            round: state.round,
            public_key: state.public_key.clone(),
            period_seconds: state.period_seconds,
            genesis_time: state.genesis_time,
        })
    }

    async fn round_signature(&self, round: u64) -> Result<Option<RoundSignature>, BeaconError> {
        self.calls.round_signature.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock();
        Self::check_online(&state)?;

        if round > state.round || state.withheld.contains(&round) {
            return Ok(None);
        }
        let signature = state
            .signatures
            .get(&round)
            .cloned()
            .unwrap_or_else(|| state.public_key.clone());
        let round = state.relabeled.get(&round).copied().unwrap_or(round);
        Ok(Some(RoundSignature { round, signature }))
    }
}
