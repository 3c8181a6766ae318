//! An in-process drand HTTP server for client tests
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use url::Url;

use common::testkit::FIXTURE_PUBLIC_KEY;

pub const CHAIN_HASH: &str = "8990e7a9aaed2ffed73dbd7092123d6f289930540d7651336225dc172e51b2ce";
pub const PERIOD_SECONDS: u32 = 3;

/// How the server answers round requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Healthy,
    /// future rounds answer 404 instead of 425
    NotFoundForFuture,
    /// every request answers with this status
    Status(u16),
    /// every request answers 200 with a body that is not a round
    Garbage,
    /// rounds are served with an empty signature
    EmptySignature,
}

#[derive(Debug)]
pub struct MockDrand {
    round: Mutex<u64>,
    genesis_time: i64,
    mode: Mutex<Mode>,
    info_requests: AtomicUsize,
    round_requests: AtomicUsize,
}

impl MockDrand {
    pub fn round(&self) -> u64 {
        *self.round.lock()
    }

    pub fn advance_to(&self, round: u64) {
        let mut current = self.round.lock();
        *current = (*current).max(round);
    }

    pub fn set_mode(&self, mode: Mode) {
        *self.mode.lock() = mode;
    }

    pub fn info_requests(&self) -> usize {
        self.info_requests.load(Ordering::SeqCst)
    }

    pub fn round_requests(&self) -> usize {
        self.round_requests.load(Ordering::SeqCst)
    }

    pub fn genesis_time(&self) -> i64 {
        self.genesis_time
    }

    fn check_mode(&self) -> Result<(), (StatusCode, String)> {
        match *self.mode.lock() {
            Mode::Status(status) => Err((
                StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                "mock drand failure".to_string(),
            )),
            _ => Ok(()),
        }
    }

    fn round_body(&self, round: u64) -> Value {
        let signature = match *self.mode.lock() {
            Mode::Garbage => return json!({ "unexpected": true }),
            Mode::EmptySignature => "",
            _ => FIXTURE_PUBLIC_KEY,
        };
        json!({
            "round": round,
            "randomness": hex_of(round),
            "signature": signature,
        })
    }
}

fn hex_of(round: u64) -> String {
    format!("{:064x}", round)
}

/// Opt into log output with `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A running mock server and its base url
pub struct TestDrand {
    pub url: Url,
    pub addr: SocketAddr,
    pub server: Arc<MockDrand>,
}

/// Start a mock drand server whose latest round is `round`
pub async fn spawn_drand(round: u64) -> TestDrand {
    let genesis_time = chrono::Utc::now().timestamp()
        - (round.saturating_sub(1) * u64::from(PERIOD_SECONDS)) as i64;
    let server = Arc::new(MockDrand {
        round: Mutex::new(round),
        genesis_time,
        mode: Mutex::new(Mode::Healthy),
        info_requests: AtomicUsize::new(0),
        round_requests: AtomicUsize::new(0),
    });

    let router = Router::new()
        .route("/:chain/info", get(info))
        .route("/:chain/public/:which", get(public))
        .with_state(server.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestDrand {
        url: Url::parse(&format!("http://{}", addr)).unwrap(),
        addr,
        server,
    }
}

async fn info(
    State(server): State<Arc<MockDrand>>,
    Path(_chain): Path<String>,
) -> Result<Json<Value>, (StatusCode, String)> {
    server.info_requests.fetch_add(1, Ordering::SeqCst);
    server.check_mode()?;
    Ok(Json(json!({
        "public_key": FIXTURE_PUBLIC_KEY,
        "period": PERIOD_SECONDS,
        "genesis_time": server.genesis_time,
        "hash": CHAIN_HASH,
        "groupHash": "176f93498eac9ca337150b46d21dd58673ea4e3581185f869672e59fa4cb390a",
        "schemeID": "pedersen-bls-chained",
    })))
}

async fn public(
    State(server): State<Arc<MockDrand>>,
    Path((_chain, which)): Path<(String, String)>,
) -> Result<Json<Value>, (StatusCode, String)> {
    server.round_requests.fetch_add(1, Ordering::SeqCst);
    server.check_mode()?;

    let current = server.round();
    if which == "latest" {
        return Ok(Json(server.round_body(current)));
    }

    let round: u64 = which
        .parse()
        .map_err(|_| (StatusCode::BAD_REQUEST, "bad round".to_string()))?;
    if round > current {
        let status = match *server.mode.lock() {
            Mode::NotFoundForFuture => StatusCode::NOT_FOUND,
            _ => StatusCode::from_u16(425).unwrap(),
        };
        return Err((status, "round is in the future".to_string()));
    }
    Ok(Json(server.round_body(round)))
}
