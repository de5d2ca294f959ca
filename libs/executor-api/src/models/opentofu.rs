//! OpenTofu-family executor protocol models
//!
//! Close cousin of the Terraform protocol with diverging field names. This
//! executor has no stored-result envelope: lookup disposition rides on the
//! HTTP status instead, and there is no batch retrieval endpoint.

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
    pub open_tofu_version: String,
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
    pub open_tofu_version: String,
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
    pub open_tofu_version: String,
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
    pub open_tofu_version: String,
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
    pub open_tofu_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script_files: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_repo_details: Option<GitRepoDetails>,
}

/// Validation response; diagnostics are plain strings in this protocol
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResponse {
    pub valid: bool,
    #[serde(default)]
    pub diagnostics: Vec<String>,
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
    pub tofu_state: Option<String>,
    #[serde(default)]
    pub generated_files: HashMap<String, String>,
}

/// Error body returned with 4xx stored-result responses
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    #[serde(default)]
    pub error_type: Option<String>,
    pub message: String,
}

/// Executor health probe response; a bare status string in this protocol
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckResponse {
    pub health_status: String,
}
