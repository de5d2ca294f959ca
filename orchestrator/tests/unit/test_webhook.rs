//! Webhook push handling tests

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use secrecy::SecretString;
use tower::ServiceExt;

use provost::models::backend::BackendKind;
use provost::models::deployment::DeploymentState;
use provost::models::order::{OrderStatus, Scenario};
use provost::models::webhook::WebhookAuthMode;
use provost::server::auth::{WebhookVerifier, SIGNATURE_HEADER};
use provost::server::serve::router;
use provost::server::state::ServerState;
use provost::utils::{generate_uuid, hmac_sha256_hex};

use crate::support::{harness, inline_task, server_state, Harness};

fn push_body(order_id: &str, success: bool) -> Vec<u8> {
    let mut result = serde_json::json!({
        "requestId": order_id,
        "commandSuccessful": success,
        "terraformState": "{\"version\":4,\"resources\":[]}",
    });
    if !success {
        result["commandStdError"] = serde_json::Value::String("apply failed".to_string());
    }
    serde_json::to_vec(&result).unwrap()
}

async fn push(
    state: Arc<ServerState>,
    uri: &str,
    body: Vec<u8>,
    signature: Option<String>,
) -> StatusCode {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(signature) = signature {
        builder = builder.header(SIGNATURE_HEADER, signature);
    }
    let request = builder.body(Body::from(body)).unwrap();
    router(state).oneshot(request).await.unwrap().status()
}

async fn submit_deploy(h: &Harness) -> String {
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
    order_id
}

#[tokio::test]
async fn test_push_lands_the_result() {
    let h = harness(BackendKind::Terraform);
    let state = server_state(&h, WebhookVerifier::new(WebhookAuthMode::None, None));
    let order_id = submit_deploy(&h).await;

    let status = push(
        state,
        &format!("/webhooks/terraform/{order_id}"),
        push_body(&order_id, true),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    assert_eq!(h.ledger.order(&order_id).unwrap().status, OrderStatus::Success);
    let deployment = h.ledger.deployment("d-1").unwrap();
    assert_eq!(deployment.state, DeploymentState::DeploySuccess);
    assert_eq!(
        deployment.tool_state.as_deref(),
        Some("{\"version\":4,\"resources\":[]}")
    );
}

#[tokio::test]
async fn test_duplicate_push_stays_204() {
    let h = harness(BackendKind::Terraform);
    let state = server_state(&h, WebhookVerifier::new(WebhookAuthMode::None, None));
    let order_id = submit_deploy(&h).await;
    let uri = format!("/webhooks/terraform/{order_id}");

    let status = push(state.clone(), &uri, push_body(&order_id, true), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // A retried push with a conflicting answer is acknowledged and dropped
    let status = push(state, &uri, push_body(&order_id, false), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(h.ledger.order(&order_id).unwrap().status, OrderStatus::Success);
}

#[tokio::test]
async fn test_unknown_backend_kind_is_404() {
    let h = harness(BackendKind::Terraform);
    let state = server_state(&h, WebhookVerifier::new(WebhookAuthMode::None, None));
    let order_id = submit_deploy(&h).await;

    let status = push(
        state,
        &format!("/webhooks/pulumi/{order_id}"),
        push_body(&order_id, true),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        h.ledger.order(&order_id).unwrap().status,
        OrderStatus::InProgress
    );
}

#[tokio::test]
async fn test_malformed_push_is_400() {
    let h = harness(BackendKind::Terraform);
    let state = server_state(&h, WebhookVerifier::new(WebhookAuthMode::None, None));
    let order_id = submit_deploy(&h).await;

    let status = push(
        state,
        &format!("/webhooks/terraform/{order_id}"),
        b"not json".to_vec(),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        h.ledger.order(&order_id).unwrap().status,
        OrderStatus::InProgress
    );
}

#[tokio::test]
async fn test_push_for_unknown_order_is_acknowledged() {
    let h = harness(BackendKind::Terraform);
    let state = server_state(&h, WebhookVerifier::new(WebhookAuthMode::None, None));

    // Recognized and dropped; no state appears for the ghost order
    let ghost = generate_uuid();
    let status = push(
        state,
        &format!("/webhooks/terraform/{ghost}"),
        push_body(&ghost, true),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(h.ledger.order(&ghost).is_none());
    assert!(h.ledger.deployments().is_empty());
}

#[tokio::test]
async fn test_hmac_signature_is_enforced() {
    let secret = "shared-secret";
    let h = harness(BackendKind::Terraform);
    let state = server_state(
        &h,
        WebhookVerifier::new(WebhookAuthMode::Hmac, Some(SecretString::from(secret))),
    );
    let order_id = submit_deploy(&h).await;
    let uri = format!("/webhooks/terraform/{order_id}");
    let body = push_body(&order_id, true);

    // Unsigned pushes bounce without touching the order
    let status = push(state.clone(), &uri, body.clone(), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        h.ledger.order(&order_id).unwrap().status,
        OrderStatus::InProgress
    );

    // A wrong secret bounces too
    let bad = format!("sha256={}", hmac_sha256_hex(b"other-secret", &body));
    let status = push(state.clone(), &uri, body.clone(), Some(bad)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // A correctly signed push lands
    let good = format!("sha256={}", hmac_sha256_hex(secret.as_bytes(), &body));
    let status = push(state, &uri, body, Some(good)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(h.ledger.order(&order_id).unwrap().status, OrderStatus::Success);
}

#[tokio::test]
async fn test_path_order_id_is_authoritative() {
    let h = harness(BackendKind::Terraform);
    let state = server_state(&h, WebhookVerifier::new(WebhookAuthMode::None, None));
    let order_id = submit_deploy(&h).await;

    // The body names a different order; the path id wins
    let stranger = generate_uuid();
    let status = push(
        state,
        &format!("/webhooks/terraform/{order_id}"),
        push_body(&stranger, true),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(h.ledger.order(&order_id).unwrap().status, OrderStatus::Success);
    assert!(h.ledger.order(&stranger).is_none());
}
