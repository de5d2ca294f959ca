//! Uniform executor client interface

use async_trait::async_trait;
use tracing::warn;
use uuid::Uuid;

use crate::errors::OrchestratorError;
use crate::models::backend::BackendKind;
use crate::models::result::{ExecutorHealth, FetchOutcome, ValidationResult};
use crate::models::task::{DeployTask, ServiceDescription};
use crate::models::webhook::WebhookDescriptor;

/// One executor backend, addressed uniformly.
///
/// Protocol differences between backend families stay inside the
/// adapters implementing this trait; callers never see wire models.
#[async_trait]
pub trait ExecutorApi: Send + Sync {
    /// Backend kind this client speaks to
    fn kind(&self) -> BackendKind;

    /// Submit an async deploy job; 2xx acknowledges acceptance only
    async fn deploy(
        &self,
        task: &DeployTask,
        webhook: &WebhookDescriptor,
    ) -> Result<(), OrchestratorError>;

    /// Submit an async modify job, forwarding the prior state file
    async fn modify(
        &self,
        task: &DeployTask,
        tool_state: Option<&str>,
        webhook: &WebhookDescriptor,
    ) -> Result<(), OrchestratorError>;

    /// Submit an async destroy job, forwarding the prior state file
    async fn destroy(
        &self,
        task: &DeployTask,
        tool_state: Option<&str>,
        webhook: &WebhookDescriptor,
    ) -> Result<(), OrchestratorError>;

    /// Render an execution plan without applying anything
    async fn plan(&self, task: &DeployTask) -> Result<String, OrchestratorError>;

    /// Validate the description's scripts
    async fn validate(
        &self,
        description: &ServiceDescription,
    ) -> Result<ValidationResult, OrchestratorError>;

    /// Fetch the stored result for one order
    async fn fetch_result(&self, order_id: &str) -> Result<FetchOutcome, OrchestratorError>;

    /// Fetch stored results for many orders.
    ///
    /// The default walks the orders one by one; adapters whose protocol
    /// has a batch endpoint override this with one round trip. A failed
    /// lookup for an individual order is logged and skipped so the rest
    /// of the batch still lands.
    async fn fetch_results(
        &self,
        order_ids: &[String],
    ) -> Result<Vec<(String, FetchOutcome)>, OrchestratorError> {
        let mut outcomes = Vec::with_capacity(order_ids.len());
        for order_id in order_ids {
            match self.fetch_result(order_id).await {
                Ok(outcome) => outcomes.push((order_id.clone(), outcome)),
                Err(err) => {
                    warn!("fetching stored result for order {} failed: {}", order_id, err);
                }
            }
        }
        Ok(outcomes)
    }

    /// Probe backend health
    async fn health(&self) -> Result<ExecutorHealth, OrchestratorError>;
}

/// Parse a caller-assigned order id into the wire's request id
pub(crate) fn parse_order_id(order_id: &str) -> Result<Uuid, OrchestratorError> {
    Uuid::parse_str(order_id).map_err(|err| {
        OrchestratorError::ValidationError(format!(
            "order id {} is not a valid UUID: {}",
            order_id, err
        ))
    })
}
