//! Terraform-family executor protocol models
//!
//! The Terraform executor speaks camelCase JSON and reports stored task
//! results through a body-level state envelope.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Webhook configuration embedded in async requests
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookConfig {
    pub url: String,
    pub auth_type: WebhookAuthType,
}

/// Authentication mode the executor applies to its result push
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WebhookAuthType {
    None,
    Hmac,
}

/// Git repository coordinates for repo-sourced scripts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitRepoDetails {
    pub repo_url: String,
    pub branch: String,
    pub script_path: String,
}

/// Asynchronous deploy request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployRequest {
    pub request_id: Uuid,
    pub terraform_version: String,
    pub is_plan_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script_files: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_repo_details: Option<GitRepoDetails>,
    pub variables: HashMap<String, serde_json::Value>,
    pub env_variables: HashMap<String, String>,
    pub webhook_config: WebhookConfig,
}

/// Asynchronous modify request; carries the prior state blob
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifyRequest {
    pub request_id: Uuid,
    pub terraform_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script_files: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_repo_details: Option<GitRepoDetails>,
    pub variables: HashMap<String, serde_json::Value>,
    pub env_variables: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tf_state: Option<String>,
    pub webhook_config: WebhookConfig,
}

/// Asynchronous destroy request; carries the prior state blob
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestroyRequest {
    pub request_id: Uuid,
    pub terraform_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script_files: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_repo_details: Option<GitRepoDetails>,
    pub variables: HashMap<String, serde_json::Value>,
    pub env_variables: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tf_state: Option<String>,
    pub webhook_config: WebhookConfig,
}

/// Synchronous plan request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRequest {
    pub request_id: Uuid,
    pub terraform_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script_files: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_repo_details: Option<GitRepoDetails>,
    pub variables: HashMap<String, serde_json::Value>,
    pub env_variables: HashMap<String, String>,
}

/// Plan response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanResponse {
    pub plan: String,
}

/// Synchronous validation request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest {
    pub request_id: Uuid,
    pub terraform_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script_files: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_repo_details: Option<GitRepoDetails>,
}

/// Validation response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResponse {
    pub valid: bool,
    #[serde(default)]
    pub diagnostics: Vec<ValidationDiagnostic>,
}

/// One validation finding
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationDiagnostic {
    pub detail: String,
}

/// Result of one executed task, pushed to the webhook or re-fetched
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResult {
    pub request_id: Uuid,
    pub command_successful: bool,
    #[serde(default)]
    pub command_std_output: Option<String>,
    #[serde(default)]
    pub command_std_error: Option<String>,
    #[serde(default)]
    pub terraform_state: Option<String>,
    #[serde(default)]
    pub generated_files: HashMap<String, String>,
}

/// Envelope returned by the stored-result endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredResult {
    pub request_id: Uuid,
    pub state: StoredResultState,
    #[serde(default)]
    pub result: Option<TaskResult>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Disposition of a stored-result lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StoredResultState {
    Ok,
    InProgress,
    ResultAlreadyReturnedOrRequestIdInvalid,
}

/// Executor health probe response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckResponse {
    pub health_status: HealthStatus,
}

/// Executor health states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    Ok,
    Nok,
}
