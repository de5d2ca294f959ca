//! HTTP server setup

use std::future::Future;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::app::options::ServerOptions;
use crate::errors::OrchestratorError;
use crate::server::handlers::{
    backends_handler, cancel_order_handler, deployment_handler, deployments_handler,
    health_handler, order_handler, orders_handler, plan_task_handler, refetch_order_handler,
    submit_task_handler, validate_task_handler, version_handler, webhook_handler,
};
use crate::server::state::ServerState;

/// Build the API router over the shared state
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        // Health and version
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        // Backend executors
        .route("/v1/backends", get(backends_handler))
        // Task dispatch
        .route("/v1/tasks", post(submit_task_handler))
        .route("/v1/tasks/plan", post(plan_task_handler))
        .route("/v1/tasks/validate", post(validate_task_handler))
        // Orders
        .route("/v1/orders", get(orders_handler))
        .route("/v1/orders/{order_id}", get(order_handler))
        .route("/v1/orders/{order_id}/refetch", post(refetch_order_handler))
        .route("/v1/orders/{order_id}/cancel", post(cancel_order_handler))
        // Deployments
        .route("/v1/deployments", get(deployments_handler))
        .route("/v1/deployments/{deployment_id}", get(deployment_handler))
        // Backend result pushes
        .route("/webhooks/{kind}/{order_id}", post(webhook_handler))
        // State and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP server
pub async fn serve(
    options: &ServerOptions,
    state: Arc<ServerState>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<JoinHandle<Result<(), OrchestratorError>>, OrchestratorError> {
    let app = router(state);

    let addr = format!("{}:{}", options.host, options.port);
    info!("Starting HTTP server on {}", addr);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| OrchestratorError::ServerError(e.to_string()))?;

    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| OrchestratorError::ServerError(e.to_string()))
    });

    Ok(handle)
}
