//! Ledger persistence

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::warn;

use crate::errors::OrchestratorError;
use crate::filesys::file::File;
use crate::ledger::store::OrderLedger;
use crate::models::deployment::ServiceDeployment;
use crate::models::order::ServiceOrder;

/// Serializable copy of the full ledger contents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    #[serde(default)]
    pub orders: Vec<ServiceOrder>,

    #[serde(default)]
    pub deployments: Vec<ServiceDeployment>,
}

/// Reads and writes ledger snapshots on disk.
///
/// Writes go through a temp file and rename so a crash mid-write never
/// leaves a truncated snapshot behind. Concurrent writers serialize on
/// an internal lock and snapshot the ledger while holding it, so the
/// file always ends up with the newest state.
pub struct LedgerPersister {
    file: File,
    write_lock: Mutex<()>,
}

impl LedgerPersister {
    /// Create a persister for the given snapshot file
    pub fn new(file: File) -> Self {
        Self {
            file,
            write_lock: Mutex::new(()),
        }
    }

    /// Load the snapshot, or `None` when no snapshot exists yet
    pub async fn load(&self) -> Result<Option<LedgerSnapshot>, OrchestratorError> {
        if !self.file.exists().await {
            return Ok(None);
        }
        let snapshot = self.file.read_json().await?;
        Ok(Some(snapshot))
    }

    /// Persist the ledger's current contents, logging on failure.
    ///
    /// Called after every ledger mutation; a failed write must not fail
    /// the mutation that triggered it, the next write will catch up.
    pub async fn persist_best_effort(&self, ledger: &OrderLedger) {
        let _guard = self.write_lock.lock().await;
        let snapshot = ledger.snapshot();
        if let Err(err) = self.write(&snapshot).await {
            warn!("persisting ledger snapshot failed: {}", err);
        }
    }

    /// Snapshots can carry provisioning state and variables, so the file
    /// is restricted to the owning user.
    async fn write(&self, snapshot: &LedgerSnapshot) -> Result<(), OrchestratorError> {
        let contents = serde_json::to_vec_pretty(snapshot)?;
        self.file.write_atomic(&contents).await?;
        self.file.set_permissions_600().await?;
        Ok(())
    }
}
