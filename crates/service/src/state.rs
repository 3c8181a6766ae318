use std::sync::Arc;

use super::config::Config;
use super::coordinator::UnlockCoordinator;
use super::drand::{DrandClient, DrandError};

use common::unlock::TimeVault;
use common::vault::RsaCustodian;

/// Main service state - wires the beacon client, custodian and coordinator together
#[derive(Debug, Clone)]
pub struct State {
    drand: Arc<DrandClient>,
    custodian: Arc<RsaCustodian>,
    coordinator: UnlockCoordinator,
}

impl State {
    pub fn from_config(config: &Config) -> Result<Self, StateSetupError> {
        // 1. Setup beacon client
        let drand_url = config.drand_url()?;
        let drand = Arc::new(DrandClient::new(
            &drand_url,
            &config.chain_hash,
            config.request_timeout,
        )?);
        tracing::info!("Drand chain URL: {}", drand.chain_url());

        // 2. Setup vault custodian
        let custodian = Arc::new(RsaCustodian::new(config.vault_key_bits));
        tracing::debug!(
            "State::from_config - vault keys use {} bits",
            custodian.bits()
        );

        // 3. Build the vault and put the coordinator in front of it
        let vault = TimeVault::new(drand.clone(), custodian.clone());
        let coordinator = UnlockCoordinator::new(vault, config.unlock_timeout);

        Ok(Self {
            drand,
            custodian,
            coordinator,
        })
    }

    pub fn drand(&self) -> &Arc<DrandClient> {
        &self.drand
    }

    pub fn custodian(&self) -> &Arc<RsaCustodian> {
        &self.custodian
    }

    pub fn vault(&self) -> &TimeVault {
        self.coordinator.vault()
    }

    pub fn coordinator(&self) -> &UnlockCoordinator {
        &self.coordinator
    }
}

impl AsRef<TimeVault> for State {
    fn as_ref(&self) -> &TimeVault {
        self.vault()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("Invalid drand URL: {0}")]
    InvalidDrandUrl(#[from] url::ParseError),
    #[error("Drand client setup error: {0}")]
    DrandSetupError(#[from] DrandError),
}
