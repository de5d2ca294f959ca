//! Backend-bound deployer implementation

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};

use crate::deploy::deployer::Deployer;
use crate::errors::OrchestratorError;
use crate::executor::api::ExecutorApi;
use crate::ledger::store::OrderLedger;
use crate::models::backend::BackendKind;
use crate::models::order::ServiceOrder;
use crate::models::result::ValidationResult;
use crate::models::task::{DeployTask, ServiceDescription};
use crate::models::webhook::{WebhookAuthMode, WebhookDescriptor};

/// Where backends push their results
#[derive(Debug, Clone)]
pub struct CallbackTarget {
    /// Base URL of this orchestrator as reachable from the backend
    pub base_url: String,

    /// Authentication mode the backend must apply to its push
    pub auth_mode: WebhookAuthMode,
}

impl CallbackTarget {
    /// Webhook descriptor for one order
    pub fn descriptor(&self, kind: BackendKind, order_id: &str) -> WebhookDescriptor {
        WebhookDescriptor {
            url: format!(
                "{}/webhooks/{}/{}",
                self.base_url.trim_end_matches('/'),
                kind.slug(),
                order_id
            ),
            auth_mode: self.auth_mode,
        }
    }
}

/// Deployer for one executor backend.
///
/// Dispatch operations check the source mode and the open-order
/// invariant before any network call, submit through the executor
/// client, and record the order only once the backend accepted the job.
/// A failed submission therefore leaves no order behind.
pub struct BackendDeployer {
    kind: BackendKind,
    client: Arc<dyn ExecutorApi>,
    ledger: Arc<OrderLedger>,
    callback: CallbackTarget,
}

impl BackendDeployer {
    /// Create a deployer over an executor client
    pub fn new(
        client: Arc<dyn ExecutorApi>,
        ledger: Arc<OrderLedger>,
        callback: CallbackTarget,
    ) -> Self {
        Self {
            kind: client.kind(),
            client,
            ledger,
            callback,
        }
    }

    fn record_order(&self, task: &DeployTask) -> Result<(), OrchestratorError> {
        let order = ServiceOrder::new(
            &task.order_id,
            &task.deployment_id,
            task.scenario,
            self.kind,
        );
        if let Err(err) = self.ledger.create_order(order) {
            // The backend holds an accepted job we no longer track; the
            // callback for it will land as an unknown order
            error!(
                "backend {} accepted order {} but recording it failed: {}",
                self.kind, task.order_id, err
            );
            return Err(err);
        }
        info!(
            "order {} dispatched to {} for deployment {} ({:?})",
            task.order_id, self.kind, task.deployment_id, task.scenario
        );
        Ok(())
    }
}

#[async_trait]
impl Deployer for BackendDeployer {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn deploy(&self, task: &DeployTask) -> Result<String, OrchestratorError> {
        task.description.source_mode()?;
        self.ledger
            .ensure_dispatchable(&task.deployment_id, &task.order_id)?;

        let webhook = self.callback.descriptor(self.kind, &task.order_id);
        self.client.deploy(task, &webhook).await?;

        self.record_order(task)?;
        Ok(task.order_id.clone())
    }

    async fn modify(&self, task: &DeployTask) -> Result<String, OrchestratorError> {
        task.description.source_mode()?;
        self.ledger
            .ensure_dispatchable(&task.deployment_id, &task.order_id)?;
        let tool_state = self.ledger.tool_state(&task.deployment_id)?;

        let webhook = self.callback.descriptor(self.kind, &task.order_id);
        self.client
            .modify(task, tool_state.as_deref(), &webhook)
            .await?;

        self.record_order(task)?;
        Ok(task.order_id.clone())
    }

    async fn destroy(&self, task: &DeployTask) -> Result<String, OrchestratorError> {
        task.description.source_mode()?;
        self.ledger
            .ensure_dispatchable(&task.deployment_id, &task.order_id)?;
        let tool_state = self.ledger.tool_state(&task.deployment_id)?;

        let webhook = self.callback.descriptor(self.kind, &task.order_id);
        self.client
            .destroy(task, tool_state.as_deref(), &webhook)
            .await?;

        self.record_order(task)?;
        Ok(task.order_id.clone())
    }

    async fn plan(&self, task: &DeployTask) -> Result<String, OrchestratorError> {
        task.description.source_mode()?;
        self.client.plan(task).await
    }

    async fn validate(
        &self,
        description: &ServiceDescription,
    ) -> Result<ValidationResult, OrchestratorError> {
        description.source_mode()?;
        self.client.validate(description).await
    }
}
