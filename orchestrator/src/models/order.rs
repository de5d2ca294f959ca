//! Service order models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::backend::BackendKind;
use crate::models::deployment::DeploymentState;

/// Status of a service order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Dispatched to the backend, result not yet applied
    InProgress,

    /// Backend reported success
    Success,

    /// Backend reported failure, or the order became unresolvable
    Failed,

    /// Cancelled before a result was applied
    Cancelled,
}

impl OrderStatus {
    /// Terminal statuses are never overwritten once reached
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::InProgress)
    }
}

/// The operation an order performs against its deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Scenario {
    /// Provision the service for the first time
    Deploy,

    /// Re-apply scripts with updated variables against an existing service
    Modify,

    /// Tear down provisioned resources
    Destroy,

    /// Tear down resources left behind by a failed deploy
    Rollback,

    /// Force-clean a deployment stuck in a failed destroy
    Purge,
}

impl Scenario {
    /// Deployment state while an order of this scenario is open
    pub fn in_flight_state(&self) -> DeploymentState {
        match self {
            Scenario::Deploy => DeploymentState::Deploying,
            Scenario::Modify => DeploymentState::Modifying,
            // Rollback and purge are destroy-shaped operations
            Scenario::Destroy | Scenario::Rollback | Scenario::Purge => DeploymentState::Destroying,
        }
    }

    /// Deployment state once a result with the given success flag is applied.
    ///
    /// A successful rollback leaves the deployment in DEPLOY_FAILED: the
    /// resources of the failed deploy are gone, but the deploy itself never
    /// succeeded. A successful purge counts as a completed destroy.
    pub fn settled_state(&self, success: bool) -> DeploymentState {
        match self {
            Scenario::Deploy => {
                if success {
                    DeploymentState::DeploySuccess
                } else {
                    DeploymentState::DeployFailed
                }
            }
            Scenario::Modify => {
                if success {
                    DeploymentState::ModifySuccess
                } else {
                    DeploymentState::ModifyFailed
                }
            }
            Scenario::Destroy | Scenario::Purge => {
                if success {
                    DeploymentState::DestroySuccess
                } else {
                    DeploymentState::DestroyFailed
                }
            }
            Scenario::Rollback => DeploymentState::DeployFailed,
        }
    }

    /// Whether the backend needs the deployment's prior state file
    pub fn uses_prior_state(&self) -> bool {
        !matches!(self, Scenario::Deploy)
    }
}

/// One dispatched operation against a service deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceOrder {
    /// Order ID, the idempotency key shared with the backend
    pub id: String,

    /// The deployment this order acts on
    pub deployment_id: String,

    /// Operation kind
    pub scenario: Scenario,

    /// Backend the order was dispatched to
    pub backend_kind: BackendKind,

    /// Current status
    pub status: OrderStatus,

    /// Free-form error detail for failed orders
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,

    /// Creation time
    pub created_at: DateTime<Utc>,

    /// Last update time
    pub updated_at: DateTime<Utc>,
}

impl ServiceOrder {
    /// Create a new order in IN_PROGRESS status
    pub fn new(
        id: impl Into<String>,
        deployment_id: impl Into<String>,
        scenario: Scenario,
        backend_kind: BackendKind,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            deployment_id: deployment_id.into(),
            scenario,
            backend_kind,
            status: OrderStatus::InProgress,
            error_detail: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the order has reached a terminal status
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
