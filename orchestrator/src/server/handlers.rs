//! HTTP request handlers

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use executor_api::models::opentofu as tofu_wire;
use executor_api::models::terraform as terraform_wire;

use crate::errors::OrchestratorError;
use crate::executor::terraform::convert_result as convert_terraform_result;
use crate::executor::tofu::convert_result as convert_tofu_result;
use crate::models::backend::BackendKind;
use crate::models::result::{BackendResult, ExecutorHealth, ValidationResult};
use crate::models::task::{DeployTask, ServiceDescription};
use crate::server::state::ServerState;
use crate::utils::version_info;

/// Error payload returned by failing API handlers
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// An API failure carrying the HTTP status it maps to
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<OrchestratorError> for ApiError {
    fn from(err: OrchestratorError) -> Self {
        let status = match &err {
            OrchestratorError::ValidationError(_)
            | OrchestratorError::ConfigError(_)
            | OrchestratorError::UnsupportedBackend(_) => StatusCode::BAD_REQUEST,
            OrchestratorError::NotFound(_) => StatusCode::NOT_FOUND,
            OrchestratorError::OrderConflict(_) => StatusCode::CONFLICT,
            OrchestratorError::ExecutorUnavailable(_)
            | OrchestratorError::ExecutorRejected(_)
            | OrchestratorError::ExecutorError(_)
            | OrchestratorError::HttpError(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub open_orders: usize,
}

/// Health check handler
pub async fn health_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let version = version_info();
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "provost".to_string(),
        version: version.version,
        open_orders: state.ledger.open_order_count(),
    })
}

/// Version response
#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
}

/// Version handler
pub async fn version_handler() -> impl IntoResponse {
    let version = version_info();
    Json(VersionResponse {
        version: version.version,
        git_hash: version.git_hash,
        build_time: version.build_time,
    })
}

/// Backend health response
#[derive(Debug, Serialize)]
pub struct BackendsResponse {
    pub backends: Vec<BackendHealth>,
}

#[derive(Debug, Serialize)]
pub struct BackendHealth {
    pub backend: String,
    pub healthy: bool,
}

/// Probe every registered backend executor, concurrently
pub async fn backends_handler(
    State(state): State<Arc<ServerState>>,
) -> Result<impl IntoResponse, ApiError> {
    let mut clients = Vec::new();
    for kind in state.registry.kinds() {
        clients.push((kind, state.registry.client(kind)?));
    }

    let probes = clients.iter().map(|(kind, client)| async move {
        let healthy = match client.health().await {
            Ok(ExecutorHealth::Healthy) => true,
            Ok(ExecutorHealth::Unhealthy) => false,
            Err(err) => {
                warn!("health probe for backend {} failed: {}", kind, err);
                false
            }
        };
        BackendHealth {
            backend: kind.slug().to_string(),
            healthy,
        }
    });
    let backends = futures::future::join_all(probes).await;

    Ok(Json(BackendsResponse { backends }))
}

/// Task submission response
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub order_id: String,
}

/// Dispatch a deployment task to its backend
pub async fn submit_task_handler(
    State(state): State<Arc<ServerState>>,
    Json(task): Json<DeployTask>,
) -> Result<impl IntoResponse, ApiError> {
    let order_id = state.dispatcher.submit(&task).await?;
    Ok(Json(SubmitResponse { order_id }))
}

/// Plan response
#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub plan: String,
}

/// Render the execution plan for a task without dispatching it
pub async fn plan_task_handler(
    State(state): State<Arc<ServerState>>,
    Json(task): Json<DeployTask>,
) -> Result<impl IntoResponse, ApiError> {
    let plan = state.dispatcher.plan(&task).await?;
    Ok(Json(PlanResponse { plan }))
}

/// Validation request
#[derive(Debug, Deserialize)]
pub struct ValidateTaskRequest {
    pub backend_kind: BackendKind,
    pub description: ServiceDescription,
}

/// Validate a service description against its backend
pub async fn validate_task_handler(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<ValidateTaskRequest>,
) -> Result<Json<ValidationResult>, ApiError> {
    let result = state
        .dispatcher
        .validate(request.backend_kind, &request.description)
        .await?;
    Ok(Json(result))
}

/// Order list response
#[derive(Debug, Serialize)]
pub struct OrdersResponse {
    pub orders: Vec<crate::models::order::ServiceOrder>,
    pub total: usize,
}

/// List orders, newest first
pub async fn orders_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let orders = state.ledger.orders();
    let total = orders.len();
    Json(OrdersResponse { orders, total })
}

/// Fetch one order
pub async fn order_handler(
    State(state): State<Arc<ServerState>>,
    Path(order_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .ledger
        .order(&order_id)
        .ok_or_else(|| OrchestratorError::NotFound(format!("order {} does not exist", order_id)))?;
    Ok(Json(order))
}

/// Re-fetch the stored result for one order immediately
pub async fn refetch_order_handler(
    State(state): State<Arc<ServerState>>,
    Path(order_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state.reconciler.refetch_order(&order_id).await?;
    Ok(Json(order))
}

/// Cancel an open order
pub async fn cancel_order_handler(
    State(state): State<Arc<ServerState>>,
    Path(order_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state.dispatcher.cancel(&order_id).await?;
    Ok(Json(order))
}

/// Deployment list response
#[derive(Debug, Serialize)]
pub struct DeploymentsResponse {
    pub deployments: Vec<crate::models::deployment::ServiceDeployment>,
    pub total: usize,
}

/// List deployments, newest first
pub async fn deployments_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let deployments = state.ledger.deployments();
    let total = deployments.len();
    Json(DeploymentsResponse { deployments, total })
}

/// Fetch one deployment
pub async fn deployment_handler(
    State(state): State<Arc<ServerState>>,
    Path(deployment_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let deployment = state.ledger.deployment(&deployment_id).ok_or_else(|| {
        OrchestratorError::NotFound(format!("deployment {} does not exist", deployment_id))
    })?;
    Ok(Json(deployment))
}

/// Receive a backend-pushed result.
///
/// The order id in the path is authoritative. Responds 204 for every
/// recognized push, applied or not, so backends stop retrying once the
/// orchestrator has the answer; 400 only for bodies that do not parse,
/// 401 for pushes failing signature verification.
pub async fn webhook_handler(
    State(state): State<Arc<ServerState>>,
    Path((kind, order_id)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(kind) = BackendKind::from_slug(&kind) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    if !state.webhook_verifier.verify(&headers, &body) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let result = match parse_pushed_result(kind, &body) {
        Ok(result) => result,
        Err(err) => {
            warn!(
                "malformed {} result push for order {}: {}",
                kind, order_id, err
            );
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    if result.order_id != order_id {
        warn!(
            "pushed result names order {} but was delivered for order {}, keeping the path id",
            result.order_id, order_id
        );
    }

    state.applier.apply(&order_id, &result).await;
    StatusCode::NO_CONTENT.into_response()
}

/// Decode a pushed result body with the protocol of its backend kind
pub(crate) fn parse_pushed_result(
    kind: BackendKind,
    body: &[u8],
) -> Result<BackendResult, OrchestratorError> {
    match kind {
        BackendKind::Terraform => {
            let result: terraform_wire::TaskResult = serde_json::from_slice(body)?;
            Ok(convert_terraform_result(result))
        }
        BackendKind::OpenTofu => {
            let result: tofu_wire::TaskResult = serde_json::from_slice(body)?;
            Ok(convert_tofu_result(result))
        }
    }
}
