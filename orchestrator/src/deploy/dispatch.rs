//! Task dispatch

use std::sync::Arc;

use tracing::info;

use crate::deploy::registry::DeployerRegistry;
use crate::errors::OrchestratorError;
use crate::ledger::snapshot::LedgerPersister;
use crate::ledger::store::OrderLedger;
use crate::models::backend::BackendKind;
use crate::models::order::{Scenario, ServiceOrder};
use crate::models::result::ValidationResult;
use crate::models::task::{DeployTask, ServiceDescription};

/// Entry point for submitting deployment work.
///
/// Routes a task to the deployer for its backend kind by scenario;
/// rollback and purge ride the destroy operation. The order id must be
/// assigned by the caller before submission, never derived from ambient
/// context.
pub struct TaskDispatcher {
    registry: Arc<DeployerRegistry>,
    ledger: Arc<OrderLedger>,
    persister: Option<Arc<LedgerPersister>>,
}

impl TaskDispatcher {
    /// Create a dispatcher over the registry and ledger
    pub fn new(
        registry: Arc<DeployerRegistry>,
        ledger: Arc<OrderLedger>,
        persister: Option<Arc<LedgerPersister>>,
    ) -> Self {
        Self {
            registry,
            ledger,
            persister,
        }
    }

    /// Submit a task and return its order id once the backend accepted it
    pub async fn submit(&self, task: &DeployTask) -> Result<String, OrchestratorError> {
        if task.order_id.trim().is_empty() {
            return Err(OrchestratorError::ValidationError(
                "task carries no order id".to_string(),
            ));
        }
        if task.deployment_id.trim().is_empty() {
            return Err(OrchestratorError::ValidationError(
                "task carries no deployment id".to_string(),
            ));
        }

        let deployer = self.registry.resolve(task.backend_kind)?;
        let order_id = match task.scenario {
            Scenario::Deploy => deployer.deploy(task).await?,
            Scenario::Modify => deployer.modify(task).await?,
            Scenario::Destroy | Scenario::Rollback | Scenario::Purge => {
                deployer.destroy(task).await?
            }
        };

        self.persist().await;
        Ok(order_id)
    }

    /// Render the execution plan for a task without dispatching it
    pub async fn plan(&self, task: &DeployTask) -> Result<String, OrchestratorError> {
        let deployer = self.registry.resolve(task.backend_kind)?;
        deployer.plan(task).await
    }

    /// Validate a service description against its backend
    pub async fn validate(
        &self,
        kind: BackendKind,
        description: &ServiceDescription,
    ) -> Result<ValidationResult, OrchestratorError> {
        let deployer = self.registry.resolve(kind)?;
        deployer.validate(description).await
    }

    /// Cancel an open order
    pub async fn cancel(&self, order_id: &str) -> Result<ServiceOrder, OrchestratorError> {
        let cancelled = self.ledger.cancel_order(order_id)?;
        info!("order {} cancelled", order_id);
        self.persist().await;
        Ok(cancelled)
    }

    async fn persist(&self) {
        if let Some(persister) = &self.persister {
            persister.persist_best_effort(&self.ledger).await;
        }
    }
}
