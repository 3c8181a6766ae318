//! Integration tests for the drand client against an in-process server

mod common;

use std::sync::Arc;
use std::time::Duration;

use ::common::beacon::{Beacon, BeaconError};
use ::common::testkit::FIXTURE_PUBLIC_KEY;
use ::common::unlock::{TimeVault, UnlockState};
use ::common::vault::RsaCustodian;
use service::DrandClient;
use url::Url;

use self::common::{Mode, CHAIN_HASH, PERIOD_SECONDS};

fn client(url: &Url) -> DrandClient {
    DrandClient::new(url, CHAIN_HASH, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_beacon_info() {
    common::init_tracing();
    let drand = common::spawn_drand(500).await;
    let client = client(&drand.url);

    let info = client.beacon_info().await.unwrap();
    assert_eq!(info.round, 500);
    assert_eq!(info.period_seconds, PERIOD_SECONDS);
    assert_eq!(info.public_key_hex(), FIXTURE_PUBLIC_KEY);
    assert_eq!(info.genesis_time.timestamp(), drand.server.genesis_time());
}

#[tokio::test]
async fn test_chain_info_is_cached() {
    let drand = common::spawn_drand(500).await;
    let client = client(&drand.url);

    client.beacon_info().await.unwrap();
    drand.server.advance_to(501);
    let info = client.beacon_info().await.unwrap();

    assert_eq!(info.round, 501);
    assert_eq!(drand.server.info_requests(), 1);
    assert_eq!(drand.server.round_requests(), 2);
}

#[tokio::test]
async fn test_current_round_follows_server() {
    let drand = common::spawn_drand(7).await;
    let client = client(&drand.url);

    assert_eq!(client.current_round().await.unwrap(), 7);
    drand.server.advance_to(9);
    assert_eq!(client.current_round().await.unwrap(), 9);
}

#[tokio::test]
async fn test_published_round_signature() {
    let drand = common::spawn_drand(500).await;
    let client = client(&drand.url);

    let signature = client.round_signature(499).await.unwrap().unwrap();
    assert_eq!(signature.round, 499);
    assert_eq!(hex::encode(signature.signature), FIXTURE_PUBLIC_KEY);
}

#[tokio::test]
async fn test_future_round_is_not_an_error() {
    let drand = common::spawn_drand(500).await;
    let client = client(&drand.url);

    assert_eq!(client.round_signature(501).await.unwrap(), None);

    drand.server.set_mode(Mode::NotFoundForFuture);
    assert_eq!(client.round_signature(501).await.unwrap(), None);
}

#[tokio::test]
async fn test_empty_signature_is_not_published() {
    let drand = common::spawn_drand(500).await;
    let client = client(&drand.url);
    drand.server.set_mode(Mode::EmptySignature);

    assert_eq!(client.round_signature(499).await.unwrap(), None);

    drand.server.set_mode(Mode::Healthy);
    assert!(client.round_signature(499).await.unwrap().is_some());
}

#[tokio::test]
async fn test_server_error_status() {
    let drand = common::spawn_drand(500).await;
    let client = client(&drand.url);
    drand.server.set_mode(Mode::Status(503));

    assert!(matches!(
        client.current_round().await,
        Err(BeaconError::Status(503, _))
    ));
    assert!(matches!(
        client.round_signature(10).await,
        Err(BeaconError::Status(503, _))
    ));
}

#[tokio::test]
async fn test_malformed_round_response() {
    let drand = common::spawn_drand(500).await;
    let client = client(&drand.url);
    drand.server.set_mode(Mode::Garbage);

    assert!(matches!(
        client.current_round().await,
        Err(BeaconError::InvalidResponse(_))
    ));
}

#[tokio::test]
async fn test_unreachable_beacon() {
    // bind then release a port so nothing is listening on it
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client(&Url::parse(&format!("http://{}", addr)).unwrap());
    assert!(matches!(
        client.current_round().await,
        Err(BeaconError::Unavailable(_))
    ));
}

#[tokio::test]
async fn test_wrong_chain_rejected() {
    let drand = common::spawn_drand(500).await;
    let other_chain = "52db9ba70e0cc0f6eaf7803dd07447a1f5477735fd3f661792ba94600c84e971";
    let client = DrandClient::new(&drand.url, other_chain, Duration::from_secs(5)).unwrap();

    assert!(matches!(
        client.beacon_info().await,
        Err(BeaconError::InvalidResponse(_))
    ));
}

#[tokio::test]
async fn test_seal_and_unlock_over_http() {
    let drand = common::spawn_drand(500).await;
    let vault = TimeVault::new(
        Arc::new(client(&drand.url)),
        Arc::new(RsaCustodian::default()),
    );

    let unlock_time = chrono::Utc::now() + chrono::Duration::seconds(7);
    let sealed = vault.seal(b"over the wire", unlock_time, None).await.unwrap();
    assert_eq!(sealed.round, 503);

    let state = vault.unlock(&sealed.into(), None).await.unwrap();
    assert_eq!(state.pending_round(), Some(503));

    drand.server.advance_to(503);
    let state = vault.unlock(&state, None).await.unwrap();
    assert_eq!(state, UnlockState::Unlocked(b"over the wire".to_vec()));
}
