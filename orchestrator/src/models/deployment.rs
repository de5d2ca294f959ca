//! Service deployment models

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a service deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeploymentState {
    /// Initial state, nothing provisioned yet
    NotDeployed,

    /// Deploy order dispatched, waiting for the backend
    Deploying,

    /// Last deploy completed successfully
    DeploySuccess,

    /// Last deploy failed
    DeployFailed,

    /// Modify order dispatched, waiting for the backend
    Modifying,

    /// Last modify completed successfully
    ModifySuccess,

    /// Last modify failed
    ModifyFailed,

    /// Destroy order dispatched, waiting for the backend
    Destroying,

    /// Last destroy completed successfully
    DestroySuccess,

    /// Last destroy failed
    DestroyFailed,
}

impl DeploymentState {
    /// Whether an order is currently being executed against the deployment
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            DeploymentState::Deploying | DeploymentState::Modifying | DeploymentState::Destroying
        )
    }
}

/// A long-lived provisioning target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceDeployment {
    /// Unique deployment ID
    pub id: String,

    /// Current lifecycle state
    pub state: DeploymentState,

    /// The provisioning tool's own state file, carried opaquely
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_state: Option<String>,

    /// Resource/property outputs from the last successful operation
    #[serde(default)]
    pub outputs: HashMap<String, serde_json::Value>,

    /// Creation time
    pub created_at: DateTime<Utc>,

    /// Last update time
    pub updated_at: DateTime<Utc>,
}

impl ServiceDeployment {
    /// Create a new deployment record in the initial state
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            state: DeploymentState::NotDeployed,
            tool_state: None,
            outputs: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }
}
