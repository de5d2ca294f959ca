//! Deploy task models

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::OrchestratorError;
use crate::models::backend::BackendKind;
use crate::models::order::Scenario;

/// Where a task's provisioning scripts come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceMode {
    /// Script contents are carried inline in the description
    InlineScripts,

    /// Scripts are fetched from a git repository by the backend
    GitRepo,
}

/// Git repository coordinates for script retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitRepoSource {
    /// Clone URL of the repository
    pub repo_url: String,

    /// Branch, tag or commit to check out
    pub branch: String,

    /// Directory inside the repository holding the scripts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script_path: Option<String>,
}

/// The provisioning scripts and tool version for a service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceDescription {
    /// Required provisioning tool version, e.g. "1.6.0"
    pub tool_version: String,

    /// Inline script files, keyed by file name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script_files: Option<HashMap<String, String>>,

    /// Git repository holding the scripts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_repo: Option<GitRepoSource>,
}

impl ServiceDescription {
    /// Resolve the source mode, rejecting ambiguous or empty descriptions.
    ///
    /// Exactly one of `script_files` and `git_repo` must be set. An inline
    /// map with no files counts as unset.
    pub fn source_mode(&self) -> Result<SourceMode, OrchestratorError> {
        let has_scripts = self
            .script_files
            .as_ref()
            .map(|files| !files.is_empty())
            .unwrap_or(false);
        let has_repo = self.git_repo.is_some();

        match (has_scripts, has_repo) {
            (true, false) => Ok(SourceMode::InlineScripts),
            (false, true) => Ok(SourceMode::GitRepo),
            (true, true) => Err(OrchestratorError::ConfigError(
                "service description carries both inline scripts and a git repository".to_string(),
            )),
            (false, false) => Err(OrchestratorError::ConfigError(
                "service description carries neither inline scripts nor a git repository"
                    .to_string(),
            )),
        }
    }
}

/// Everything a deployer needs to dispatch one operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployTask {
    /// Target deployment ID
    pub deployment_id: String,

    /// Order ID assigned by the caller at task creation time
    pub order_id: String,

    /// Selected backend kind
    pub backend_kind: BackendKind,

    /// Scripts or git coordinates plus tool version pin
    pub description: ServiceDescription,

    /// Input variables passed to the provisioning scripts
    #[serde(default)]
    pub variables: HashMap<String, serde_json::Value>,

    /// Environment variables for the provisioning process
    #[serde(default)]
    pub env_variables: HashMap<String, String>,

    /// Deployment scenario
    pub scenario: Scenario,
}
