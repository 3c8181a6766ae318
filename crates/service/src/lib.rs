//! Service edge for TimeVault.
//!
//! This crate provides the components a host embeds around the engine in `common`:
//! - Config (drand endpoint, timeouts, vault key size, read from `TIMEVAULT_*`)
//! - Drand client (HTTP implementation of the `Beacon` trait)
//! - Unlock coordinator (one in-flight unlock per message, bounded by a timeout)
//! - State management (wires the above into a `TimeVault`)

pub mod config;
pub mod coordinator;
pub mod drand;
pub mod state;

// Re-export key types for convenience
pub use config::{Config, ConfigError};
pub use coordinator::{CoordinatorError, UnlockCoordinator};
pub use drand::{ChainInfo, DrandClient, DrandError};
pub use state::{State as ServiceState, StateSetupError};
