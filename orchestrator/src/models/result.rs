//! Backend result models

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A result produced by a backend, via callback or re-fetch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendResult {
    /// Order ID the result belongs to
    pub order_id: String,

    /// Whether the provisioning command succeeded
    pub success: bool,

    /// The provisioning tool's state file after the run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_state: Option<String>,

    /// Resource/property outputs produced by the run
    #[serde(default)]
    pub outputs: HashMap<String, serde_json::Value>,

    /// Error message for failed runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Outcome of re-fetching a stored result from a backend.
///
/// Transport failures are not an outcome; they surface as errors so the
/// caller can leave the order untouched for the next sweep.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// A terminal result is available and should be applied
    Ready(BackendResult),

    /// The backend is still executing the order
    InProgress,

    /// The backend has nothing for this order id
    NoContent,

    /// The backend states the result was already returned or the
    /// order id is invalid; it will never hand back this result again
    Unresolvable(String),
}

/// Outcome of validating a service description
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether the scripts are valid
    pub valid: bool,

    /// Human-readable diagnostics for invalid scripts
    #[serde(default)]
    pub diagnostics: Vec<String>,
}

/// Health of an execution backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutorHealth {
    /// Backend answered its health probe
    Healthy,

    /// Backend is unreachable or reported a failure
    Unhealthy,
}
