//! Deployer trait

use async_trait::async_trait;

use crate::errors::OrchestratorError;
use crate::models::backend::BackendKind;
use crate::models::result::ValidationResult;
use crate::models::task::{DeployTask, ServiceDescription};

/// Uniform operation set over one execution backend.
///
/// The dispatch operations submit the job, record the order, and return
/// the order id without waiting for the backend to finish; the result
/// arrives later through the webhook or a reconciliation fetch. Plan
/// and validate are synchronous and never create an order.
#[async_trait]
pub trait Deployer: Send + Sync {
    /// Backend kind this deployer drives
    fn kind(&self) -> BackendKind;

    /// Submit a deploy job and open its order
    async fn deploy(&self, task: &DeployTask) -> Result<String, OrchestratorError>;

    /// Submit a modify job and open its order
    async fn modify(&self, task: &DeployTask) -> Result<String, OrchestratorError>;

    /// Submit a destroy-shaped job and open its order
    async fn destroy(&self, task: &DeployTask) -> Result<String, OrchestratorError>;

    /// Render the execution plan for a task
    async fn plan(&self, task: &DeployTask) -> Result<String, OrchestratorError>;

    /// Validate a service description's scripts
    async fn validate(
        &self,
        description: &ServiceDescription,
    ) -> Result<ValidationResult, OrchestratorError>;
}
