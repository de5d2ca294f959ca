//! Terraform executor adapter

use std::collections::HashMap;

use async_trait::async_trait;
use executor_api::models::terraform as wire;
use tracing::warn;

use crate::errors::OrchestratorError;
use crate::executor::api::{parse_order_id, ExecutorApi};
use crate::executor::http::ExecutorHttp;
use crate::executor::retry::RetryingCaller;
use crate::models::backend::BackendKind;
use crate::models::result::{BackendResult, ExecutorHealth, FetchOutcome, ValidationResult};
use crate::models::task::{DeployTask, ServiceDescription, SourceMode};
use crate::models::webhook::{WebhookAuthMode, WebhookDescriptor};

/// Client for the Terraform executor protocol.
///
/// Stored-result lookups come back inside a body-level envelope whose
/// state field carries the disposition; the batch endpoint answers many
/// orders in one round trip.
pub struct TerraformExecutor {
    http: ExecutorHttp,
    retry: RetryingCaller,
}

impl TerraformExecutor {
    /// Create an adapter over the given HTTP client
    pub fn new(http: ExecutorHttp, retry: RetryingCaller) -> Self {
        Self { http, retry }
    }
}

#[async_trait]
impl ExecutorApi for TerraformExecutor {
    fn kind(&self) -> BackendKind {
        BackendKind::Terraform
    }

    async fn deploy(
        &self,
        task: &DeployTask,
        webhook: &WebhookDescriptor,
    ) -> Result<(), OrchestratorError> {
        let request_id = parse_order_id(&task.order_id)?;
        let (source, script_files, git_repo_details) = source_parts(&task.description)?;

        let request = wire::DeployRequest {
            request_id,
            terraform_version: task.description.tool_version.clone(),
            is_plan_only: false,
            script_files,
            git_repo_details,
            variables: task.variables.clone(),
            env_variables: task.env_variables.clone(),
            webhook_config: webhook_config(webhook),
        };

        let path = format!("/terra-boot/{}/deploy/async", source);
        self.retry
            .call("terraform deploy", || self.http.post_accepted(&path, &request))
            .await
    }

    async fn modify(
        &self,
        task: &DeployTask,
        tool_state: Option<&str>,
        webhook: &WebhookDescriptor,
    ) -> Result<(), OrchestratorError> {
        let request_id = parse_order_id(&task.order_id)?;
        let (source, script_files, git_repo_details) = source_parts(&task.description)?;

        let request = wire::ModifyRequest {
            request_id,
            terraform_version: task.description.tool_version.clone(),
            script_files,
            git_repo_details,
            variables: task.variables.clone(),
            env_variables: task.env_variables.clone(),
            tf_state: tool_state.map(str::to_string),
            webhook_config: webhook_config(webhook),
        };

        let path = format!("/terra-boot/{}/modify/async", source);
        self.retry
            .call("terraform modify", || self.http.post_accepted(&path, &request))
            .await
    }

    async fn destroy(
        &self,
        task: &DeployTask,
        tool_state: Option<&str>,
        webhook: &WebhookDescriptor,
    ) -> Result<(), OrchestratorError> {
        let request_id = parse_order_id(&task.order_id)?;
        let (source, script_files, git_repo_details) = source_parts(&task.description)?;

        let request = wire::DestroyRequest {
            request_id,
            terraform_version: task.description.tool_version.clone(),
            script_files,
            git_repo_details,
            variables: task.variables.clone(),
            env_variables: task.env_variables.clone(),
            tf_state: tool_state.map(str::to_string),
            webhook_config: webhook_config(webhook),
        };

        let path = format!("/terra-boot/{}/destroy/async", source);
        self.retry
            .call("terraform destroy", || self.http.post_accepted(&path, &request))
            .await
    }

    async fn plan(&self, task: &DeployTask) -> Result<String, OrchestratorError> {
        let request_id = parse_order_id(&task.order_id)?;
        let (source, script_files, git_repo_details) = source_parts(&task.description)?;

        let request = wire::PlanRequest {
            request_id,
            terraform_version: task.description.tool_version.clone(),
            script_files,
            git_repo_details,
            variables: task.variables.clone(),
            env_variables: task.env_variables.clone(),
        };

        let path = format!("/terra-boot/{}/plan", source);
        let response: wire::PlanResponse = self
            .retry
            .call("terraform plan", || self.http.post_json(&path, &request))
            .await?;
        Ok(response.plan)
    }

    async fn validate(
        &self,
        description: &ServiceDescription,
    ) -> Result<ValidationResult, OrchestratorError> {
        let (source, script_files, git_repo_details) = source_parts(description)?;

        let request = wire::ValidateRequest {
            // Correlation only; validation never creates an order
            request_id: uuid::Uuid::new_v4(),
            terraform_version: description.tool_version.clone(),
            script_files,
            git_repo_details,
        };

        let path = format!("/terra-boot/{}/validate", source);
        let response: wire::ValidationResponse = self
            .retry
            .call("terraform validate", || self.http.post_json(&path, &request))
            .await?;

        Ok(ValidationResult {
            valid: response.valid,
            diagnostics: response.diagnostics.into_iter().map(|d| d.detail).collect(),
        })
    }

    async fn fetch_result(&self, order_id: &str) -> Result<FetchOutcome, OrchestratorError> {
        let request_id = parse_order_id(order_id)?;
        let path = format!("/terra-boot/task/result/{}", request_id);

        let stored: wire::StoredResult = self
            .retry
            .call("terraform result fetch", || self.http.get_json(&path))
            .await?;
        Ok(classify_stored(stored))
    }

    async fn fetch_results(
        &self,
        order_ids: &[String],
    ) -> Result<Vec<(String, FetchOutcome)>, OrchestratorError> {
        let mut request_ids = Vec::with_capacity(order_ids.len());
        for order_id in order_ids {
            match parse_order_id(order_id) {
                Ok(request_id) => request_ids.push(request_id),
                Err(err) => warn!("skipping order in batch fetch: {}", err),
            }
        }
        if request_ids.is_empty() {
            return Ok(Vec::new());
        }

        let stored: Vec<wire::StoredResult> = self
            .retry
            .call("terraform batch result fetch", || {
                self.http.post_json("/terra-boot/task/results/batch", &request_ids)
            })
            .await?;

        Ok(stored
            .into_iter()
            .map(|envelope| (envelope.request_id.to_string(), classify_stored(envelope)))
            .collect())
    }

    async fn health(&self) -> Result<ExecutorHealth, OrchestratorError> {
        let response: wire::HealthCheckResponse = self
            .retry
            .call("terraform health", || self.http.get_json("/terra-boot/health"))
            .await?;

        Ok(match response.health_status {
            wire::HealthStatus::Ok => ExecutorHealth::Healthy,
            wire::HealthStatus::Nok => ExecutorHealth::Unhealthy,
        })
    }
}

fn source_parts(
    description: &ServiceDescription,
) -> Result<
    (
        &'static str,
        Option<HashMap<String, String>>,
        Option<wire::GitRepoDetails>,
    ),
    OrchestratorError,
> {
    match description.source_mode()? {
        SourceMode::InlineScripts => Ok(("scripts", description.script_files.clone(), None)),
        SourceMode::GitRepo => {
            let details = description.git_repo.as_ref().map(|repo| wire::GitRepoDetails {
                repo_url: repo.repo_url.clone(),
                branch: repo.branch.clone(),
                script_path: repo.script_path.clone().unwrap_or_default(),
            });
            Ok(("git", None, details))
        }
    }
}

fn webhook_config(webhook: &WebhookDescriptor) -> wire::WebhookConfig {
    wire::WebhookConfig {
        url: webhook.url.clone(),
        auth_type: match webhook.auth_mode {
            WebhookAuthMode::None => wire::WebhookAuthType::None,
            WebhookAuthMode::Hmac => wire::WebhookAuthType::Hmac,
        },
    }
}

/// Convert a wire task result into the domain result
pub(crate) fn convert_result(result: wire::TaskResult) -> BackendResult {
    let error_message = if result.command_successful {
        None
    } else {
        result.command_std_error
    };

    BackendResult {
        order_id: result.request_id.to_string(),
        success: result.command_successful,
        tool_state: result.terraform_state,
        outputs: result
            .generated_files
            .into_iter()
            .map(|(name, content)| (name, serde_json::Value::String(content)))
            .collect(),
        error_message,
    }
}

fn classify_stored(stored: wire::StoredResult) -> FetchOutcome {
    match stored.state {
        wire::StoredResultState::Ok => match stored.result {
            Some(result) => FetchOutcome::Ready(convert_result(result)),
            None => FetchOutcome::NoContent,
        },
        wire::StoredResultState::InProgress => FetchOutcome::InProgress,
        wire::StoredResultState::ResultAlreadyReturnedOrRequestIdInvalid => {
            FetchOutcome::Unresolvable(stored.error_message.unwrap_or_else(|| {
                "result already returned or request id invalid".to_string()
            }))
        }
    }
}
