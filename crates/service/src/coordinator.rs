use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use uuid::Uuid;

use common::crypto::VaultPrivateKey;
use common::unlock::{TimeVault, UnlockError, UnlockState};

#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    #[error("message {0} is already being unlocked")]
    AlreadyUnlocking(Uuid),
    #[error("unlock timed out after {0:?}")]
    TimedOut(Duration),
    #[error(transparent)]
    Unlock(#[from] UnlockError),
}

/// Runs unlocks on behalf of a host holding many messages
///
/// At most one unlock per message id is in flight at a time, and every attempt is bounded
/// by a timeout. A timed out or rejected attempt leaves the caller's state untouched,
/// the unlock only ever borrows it.
#[derive(Debug, Clone)]
pub struct UnlockCoordinator {
    vault: TimeVault,
    timeout: Duration,
    in_flight: Arc<Mutex<HashSet<Uuid>>>,
}

/// Releases a message id when its unlock finishes, is cancelled, or times out
struct InFlightGuard {
    id: Uuid,
    in_flight: Arc<Mutex<HashSet<Uuid>>>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight.lock().remove(&self.id);
    }
}

impl UnlockCoordinator {
    pub fn new(vault: TimeVault, timeout: Duration) -> Self {
        Self {
            vault,
            timeout,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn vault(&self) -> &TimeVault {
        &self.vault
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn is_unlocking(&self, id: Uuid) -> bool {
        self.in_flight.lock().contains(&id)
    }

    fn claim(&self, id: Uuid) -> Result<InFlightGuard, CoordinatorError> {
        let mut in_flight = self.in_flight.lock();
        if !in_flight.insert(id) {
            return Err(CoordinatorError::AlreadyUnlocking(id));
        }
        Ok(InFlightGuard {
            id,
            in_flight: self.in_flight.clone(),
        })
    }

    /// Attempt to unlock message `id`
    ///
    /// # Returns
    /// * `Ok(UnlockState)` - The next state, persist it if it changed
    /// * `Err(CoordinatorError::AlreadyUnlocking)` - Another attempt for `id` is running
    /// * `Err(CoordinatorError::TimedOut)` - The beacon did not answer in time, retry later
    /// * `Err(CoordinatorError::Unlock)` - See [`UnlockError`]
    pub async fn unlock(
        &self,
        id: Uuid,
        state: &UnlockState,
        vault_key: Option<&VaultPrivateKey>,
    ) -> Result<UnlockState, CoordinatorError> {
        let _guard = self.claim(id)?;

        let next = tokio::time::timeout(self.timeout, self.vault.unlock(state, vault_key))
            .await
            .map_err(|_| {
                tracing::warn!(%id, timeout = ?self.timeout, "unlock timed out");
                CoordinatorError::TimedOut(self.timeout)
            })??;

        if next != *state {
            tracing::info!(
                %id,
                unlocked = next.is_unlocked(),
                "message state changed"
            );
        }
        Ok(next)
    }
}
