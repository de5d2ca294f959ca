//! HTTP API tests

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use tower::ServiceExt;

use provost::models::backend::BackendKind;
use provost::models::order::Scenario;
use provost::models::result::FetchOutcome;
use provost::models::webhook::WebhookAuthMode;
use provost::server::auth::WebhookVerifier;
use provost::server::serve::router;
use provost::server::state::ServerState;
use provost::utils::generate_uuid;

use crate::support::{harness, inline_task, server_state, success_result, Harness, SubmitFailure};

fn state_over(h: &Harness) -> Arc<ServerState> {
    server_state(h, WebhookVerifier::new(WebhookAuthMode::None, None))
}

async fn request(
    state: Arc<ServerState>,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    let body = match body {
        Some(v) => Body::from(serde_json::to_vec(&v).unwrap()),
        None => Body::empty(),
    };

    let response = router(state)
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn test_health_reports_open_orders() {
    let h = harness(BackendKind::Terraform);
    let state = state_over(&h);
    h.dispatcher
        .submit(&inline_task(
            &generate_uuid(),
            "d-1",
            Scenario::Deploy,
            BackendKind::Terraform,
        ))
        .await
        .unwrap();

    let (status, body) = request(state, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "provost");
    assert_eq!(body["open_orders"], 1);
}

#[tokio::test]
async fn test_version_endpoint() {
    let h = harness(BackendKind::Terraform);

    let (status, body) = request(state_over(&h), Method::GET, "/version", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body["version"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_backends_endpoint_probes_executors() {
    let h = harness(BackendKind::Terraform);

    let (status, body) = request(state_over(&h), Method::GET, "/v1/backends", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["backends"][0]["backend"], "terraform");
    assert_eq!(body["backends"][0]["healthy"], true);
}

#[tokio::test]
async fn test_submit_task_flow() {
    let h = harness(BackendKind::Terraform);
    let state = state_over(&h);
    let order_id = generate_uuid();
    let task = inline_task(&order_id, "d-1", Scenario::Deploy, BackendKind::Terraform);

    let (status, body) = request(
        state.clone(),
        Method::POST,
        "/v1/tasks",
        Some(serde_json::to_value(&task).unwrap()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order_id"], order_id.as_str());

    let (status, body) = request(
        state.clone(),
        Method::GET,
        &format!("/v1/orders/{order_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "IN_PROGRESS");
    assert_eq!(body["deployment_id"], "d-1");

    // A second task against the busy deployment conflicts
    let again = inline_task(
        &generate_uuid(),
        "d-1",
        Scenario::Deploy,
        BackendKind::Terraform,
    );
    let (status, body) = request(
        state,
        Method::POST,
        "/v1/tasks",
        Some(serde_json::to_value(&again).unwrap()),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("open order"));
}

#[tokio::test]
async fn test_unavailable_backend_maps_to_502() {
    let h = harness(BackendKind::Terraform);
    h.executor.fail_submissions(SubmitFailure::Unavailable);

    let task = inline_task(
        &generate_uuid(),
        "d-1",
        Scenario::Deploy,
        BackendKind::Terraform,
    );
    let (status, body) = request(
        state_over(&h),
        Method::POST,
        "/v1/tasks",
        Some(serde_json::to_value(&task).unwrap()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("unavailable"));
}

#[tokio::test]
async fn test_plan_endpoint() {
    let h = harness(BackendKind::Terraform);
    let task = inline_task(
        &generate_uuid(),
        "d-1",
        Scenario::Deploy,
        BackendKind::Terraform,
    );

    let (status, body) = request(
        state_over(&h),
        Method::POST,
        "/v1/tasks/plan",
        Some(serde_json::to_value(&task).unwrap()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["plan"].as_str().unwrap().contains("Plan:"));
    assert!(h.ledger.orders().is_empty());
}

#[tokio::test]
async fn test_validate_endpoint() {
    let h = harness(BackendKind::Terraform);
    let task = inline_task(
        &generate_uuid(),
        "d-1",
        Scenario::Deploy,
        BackendKind::Terraform,
    );

    let (status, body) = request(
        state_over(&h),
        Method::POST,
        "/v1/tasks/validate",
        Some(serde_json::json!({
            "backend_kind": "terraform",
            "description": serde_json::to_value(&task.description).unwrap(),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);
}

#[tokio::test]
async fn test_unknown_resources_are_404() {
    let h = harness(BackendKind::Terraform);
    let state = state_over(&h);

    let (status, body) = request(state.clone(), Method::GET, "/v1/orders/ghost", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("ghost"));

    let (status, _) = request(state, Method::GET, "/v1/deployments/ghost", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cancel_endpoint() {
    let h = harness(BackendKind::Terraform);
    let state = state_over(&h);
    let order_id = generate_uuid();
    h.dispatcher
        .submit(&inline_task(
            &order_id,
            "d-1",
            Scenario::Deploy,
            BackendKind::Terraform,
        ))
        .await
        .unwrap();

    let uri = format!("/v1/orders/{order_id}/cancel");
    let (status, body) = request(state.clone(), Method::POST, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "CANCELLED");

    let (status, _) = request(state, Method::POST, &uri, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_refetch_endpoint_applies_stored_result() {
    let h = harness(BackendKind::Terraform);
    let state = state_over(&h);
    let order_id = generate_uuid();
    h.dispatcher
        .submit(&inline_task(
            &order_id,
            "d-1",
            Scenario::Deploy,
            BackendKind::Terraform,
        ))
        .await
        .unwrap();
    h.executor
        .set_outcome(&order_id, FetchOutcome::Ready(success_result(&order_id)));

    let (status, body) = request(
        state,
        Method::POST,
        &format!("/v1/orders/{order_id}/refetch"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "SUCCESS");
}

#[tokio::test]
async fn test_orders_and_deployments_lists() {
    let h = harness(BackendKind::Terraform);
    let state = state_over(&h);
    for deployment in ["d-1", "d-2"] {
        h.dispatcher
            .submit(&inline_task(
                &generate_uuid(),
                deployment,
                Scenario::Deploy,
                BackendKind::Terraform,
            ))
            .await
            .unwrap();
    }

    let (status, body) = request(state.clone(), Method::GET, "/v1/orders", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["orders"].as_array().unwrap().len(), 2);

    let (status, body) = request(state, Method::GET, "/v1/deployments", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
}
