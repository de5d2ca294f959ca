//! OpenTofu executor adapter

use std::collections::HashMap;

use async_trait::async_trait;
use executor_api::models::opentofu as wire;
use reqwest::StatusCode;

use crate::errors::OrchestratorError;
use crate::executor::api::{parse_order_id, ExecutorApi};
use crate::executor::http::ExecutorHttp;
use crate::executor::retry::RetryingCaller;
use crate::models::backend::BackendKind;
use crate::models::result::{BackendResult, ExecutorHealth, FetchOutcome, ValidationResult};
use crate::models::task::{DeployTask, ServiceDescription, SourceMode};
use crate::models::webhook::{WebhookAuthMode, WebhookDescriptor};

/// Client for the OpenTofu executor protocol.
///
/// This protocol has no stored-result envelope and no batch endpoint:
/// the disposition of a result lookup rides on the HTTP status, with a
/// bare task result body on 200. Batch fetches fall back to the
/// one-by-one default.
pub struct OpenTofuExecutor {
    http: ExecutorHttp,
    retry: RetryingCaller,
}

impl OpenTofuExecutor {
    /// Create an adapter over the given HTTP client
    pub fn new(http: ExecutorHttp, retry: RetryingCaller) -> Self {
        Self { http, retry }
    }
}

#[async_trait]
impl ExecutorApi for OpenTofuExecutor {
    fn kind(&self) -> BackendKind {
        BackendKind::OpenTofu
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
            open_tofu_version: task.description.tool_version.clone(),
            is_plan_only: false,
            script_files,
            git_repo_details,
            variables: task.variables.clone(),
            env_variables: task.env_variables.clone(),
            webhook_config: webhook_config(webhook),
        };

        let path = format!("/tofu-maker/{}/deploy/async", source);
        self.retry
            .call("opentofu deploy", || self.http.post_accepted(&path, &request))
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
            open_tofu_version: task.description.tool_version.clone(),
            script_files,
            git_repo_details,
            variables: task.variables.clone(),
            env_variables: task.env_variables.clone(),
            tf_state: tool_state.map(str::to_string),
            webhook_config: webhook_config(webhook),
        };

        let path = format!("/tofu-maker/{}/modify/async", source);
        self.retry
            .call("opentofu modify", || self.http.post_accepted(&path, &request))
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
            open_tofu_version: task.description.tool_version.clone(),
            script_files,
            git_repo_details,
            variables: task.variables.clone(),
            env_variables: task.env_variables.clone(),
            tf_state: tool_state.map(str::to_string),
            webhook_config: webhook_config(webhook),
        };

        let path = format!("/tofu-maker/{}/destroy/async", source);
        self.retry
            .call("opentofu destroy", || self.http.post_accepted(&path, &request))
            .await
    }

    async fn plan(&self, task: &DeployTask) -> Result<String, OrchestratorError> {
        let request_id = parse_order_id(&task.order_id)?;
        let (source, script_files, git_repo_details) = source_parts(&task.description)?;

        let request = wire::PlanRequest {
            request_id,
            open_tofu_version: task.description.tool_version.clone(),
            script_files,
            git_repo_details,
            variables: task.variables.clone(),
            env_variables: task.env_variables.clone(),
        };

        let path = format!("/tofu-maker/{}/plan", source);
        let response: wire::PlanResponse = self
            .retry
            .call("opentofu plan", || self.http.post_json(&path, &request))
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
            open_tofu_version: description.tool_version.clone(),
            script_files,
            git_repo_details,
        };

        let path = format!("/tofu-maker/{}/validate", source);
        let response: wire::ValidationResponse = self
            .retry
            .call("opentofu validate", || self.http.post_json(&path, &request))
            .await?;

        Ok(ValidationResult {
            valid: response.valid,
            diagnostics: response.diagnostics,
        })
    }

    async fn fetch_result(&self, order_id: &str) -> Result<FetchOutcome, OrchestratorError> {
        let request_id = parse_order_id(order_id)?;
        let path = format!("/tofu-maker/task/result/{}", request_id);

        let (status, body) = self
            .retry
            .call("opentofu result fetch", || self.http.get_with_status(&path))
            .await?;
        classify_response(status, &body)
    }

    async fn health(&self) -> Result<ExecutorHealth, OrchestratorError> {
        let response: wire::HealthCheckResponse = self
            .retry
            .call("opentofu health", || self.http.get_json("/tofu-maker/health"))
            .await?;

        Ok(if response.health_status.eq_ignore_ascii_case("ok") {
            ExecutorHealth::Healthy
        } else {
            ExecutorHealth::Unhealthy
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
        tool_state: result.tofu_state,
        outputs: result
            .generated_files
            .into_iter()
            .map(|(name, content)| (name, serde_json::Value::String(content)))
            .collect(),
        error_message,
    }
}

/// Map the status-driven result lookup onto fetch outcomes.
///
/// Only the statuses that carry the backend's explicit "this order can
/// never be resolved" answer become Unresolvable; every other failure
/// stays an error so the order is retried on a later sweep.
fn classify_response(status: StatusCode, body: &str) -> Result<FetchOutcome, OrchestratorError> {
    match status {
        StatusCode::OK => {
            let result: wire::TaskResult = serde_json::from_str(body)?;
            Ok(FetchOutcome::Ready(convert_result(result)))
        }
        StatusCode::ACCEPTED => Ok(FetchOutcome::InProgress),
        StatusCode::NO_CONTENT => Ok(FetchOutcome::NoContent),
        StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND | StatusCode::GONE => {
            Ok(FetchOutcome::Unresolvable(error_reason(body)))
        }
        status if status.is_client_error() => Err(OrchestratorError::ExecutorRejected(format!(
            "{}: {}",
            status, body
        ))),
        status => Err(OrchestratorError::ExecutorError(format!(
            "{}: {}",
            status, body
        ))),
    }
}

fn error_reason(body: &str) -> String {
    serde_json::from_str::<wire::ErrorResponse>(body)
        .map(|response| response.message)
        .unwrap_or_else(|_| body.to_string())
}
