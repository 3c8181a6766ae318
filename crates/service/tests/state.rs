//! Integration tests for wiring the service from config

mod common;

use std::time::Duration;

use ::common::unlock::UnlockState;
use service::{Config, ServiceState};
use uuid::Uuid;

#[tokio::test]
async fn test_state_from_config_unlocks() {
    common::init_tracing();
    let drand = common::spawn_drand(40).await;
    let config = Config {
        drand_url: Some(drand.url.clone()),
        chain_hash: common::CHAIN_HASH.to_string(),
        request_timeout: Duration::from_secs(5),
        unlock_timeout: Duration::from_secs(5),
        ..Default::default()
    };
    let state = ServiceState::from_config(&config).unwrap();
    assert_eq!(state.custodian().bits(), 2048);

    let sealed = state
        .vault()
        .seal(b"wired", chrono::Utc::now() + chrono::Duration::seconds(2), None)
        .await
        .unwrap();
    drand.server.advance_to(sealed.round);

    let id = Uuid::new_v4();
    let next = state
        .coordinator()
        .unlock(id, &UnlockState::from(sealed), None)
        .await
        .unwrap();
    assert_eq!(next.plaintext(), Some(&b"wired"[..]));
}

#[tokio::test]
async fn test_state_rejects_unusable_url() {
    let config = Config {
        drand_url: Some(url::Url::parse("mailto:drand@example.com").unwrap()),
        ..Default::default()
    };
    assert!(ServiceState::from_config(&config).is_err());
}
