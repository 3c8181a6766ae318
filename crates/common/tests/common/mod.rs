//! Shared test utilities for sealing and unlocking
#![allow(dead_code)]

use std::sync::{Arc, OnceLock};

use common::crypto::{VaultPrivateKey, VaultPublicKey};
use common::testkit::MockBeacon;
use common::unlock::TimeVault;
use common::vault::{RsaCustodian, VaultCustodian};

/// Period used throughout, matching the scenario in the docs
pub const PERIOD_SECONDS: u32 = 30;
/// Round the mock beacon starts at
pub const START_ROUND: u64 = 1000;

/// A mock beacon at [`START_ROUND`] and a vault reading from it
pub fn setup_test_vault() -> (TimeVault, Arc<MockBeacon>) {
    let beacon = Arc::new(MockBeacon::new(START_ROUND, PERIOD_SECONDS));
    let vault = TimeVault::new(beacon.clone(), Arc::new(RsaCustodian::default()));
    (vault, beacon)
}

/// A vault keypair shared across tests, generation is slow
pub fn alice() -> &'static (VaultPublicKey, VaultPrivateKey) {
    static KEYS: OnceLock<(VaultPublicKey, VaultPrivateKey)> = OnceLock::new();
    KEYS.get_or_init(|| RsaCustodian::default().generate_vault_keypair().unwrap())
}

/// A second, unrelated vault keypair
pub fn bob() -> &'static (VaultPublicKey, VaultPrivateKey) {
    static KEYS: OnceLock<(VaultPublicKey, VaultPrivateKey)> = OnceLock::new();
    KEYS.get_or_init(|| RsaCustodian::default().generate_vault_keypair().unwrap())
}

/// Opt into log output with `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
