//! Reconciliation tests

use std::sync::Arc;
use std::time::Duration;

use provost::errors::OrchestratorError;
use provost::models::backend::BackendKind;
use provost::models::deployment::DeploymentState;
use provost::models::order::{OrderStatus, Scenario};
use provost::models::result::FetchOutcome;
use provost::reconcile::manager::ReconciliationManager;
use provost::utils::generate_uuid;

use crate::support::{failure_result, harness, inline_task, success_result, Harness};

fn manager(h: &Harness, grace: chrono::Duration) -> ReconciliationManager {
    ReconciliationManager::new(
        h.registry.clone(),
        h.ledger.clone(),
        h.applier.clone(),
        grace,
    )
}

async fn open_order(h: &Harness, deployment_id: &str) -> String {
    let order_id = generate_uuid();
    h.dispatcher
        .submit(&inline_task(
            &order_id,
            deployment_id,
            Scenario::Deploy,
            BackendKind::Terraform,
        ))
        .await
        .unwrap();
    order_id
}

#[tokio::test]
async fn test_sweep_recovers_lost_callbacks() {
    let h = harness(BackendKind::Terraform);
    let m = manager(&h, chrono::Duration::zero());

    let won = open_order(&h, "d-1").await;
    let lost = open_order(&h, "d-2").await;
    h.executor
        .set_outcome(&won, FetchOutcome::Ready(success_result(&won)));
    h.executor
        .set_outcome(&lost, FetchOutcome::Ready(failure_result(&lost, "apply failed")));

    assert_eq!(m.sweep().await, 2);

    assert_eq!(h.ledger.order(&won).unwrap().status, OrderStatus::Success);
    assert_eq!(h.ledger.order(&lost).unwrap().status, OrderStatus::Failed);
    assert_eq!(
        h.ledger.deployment("d-1").unwrap().state,
        DeploymentState::DeploySuccess
    );
    assert_eq!(
        h.ledger.deployment("d-2").unwrap().state,
        DeploymentState::DeployFailed
    );

    // The next sweep finds nothing left to do
    assert_eq!(m.sweep().await, 0);
}

#[tokio::test]
async fn test_sweep_leaves_running_and_absent_orders_open() {
    let h = harness(BackendKind::Terraform);
    let m = manager(&h, chrono::Duration::zero());

    let running = open_order(&h, "d-1").await;
    let absent = open_order(&h, "d-2").await;
    h.executor.set_outcome(&running, FetchOutcome::InProgress);
    // No canned outcome for `absent`: the stub answers NoContent

    assert_eq!(m.sweep().await, 0);
    assert_eq!(
        h.ledger.order(&running).unwrap().status,
        OrderStatus::InProgress
    );
    assert_eq!(
        h.ledger.order(&absent).unwrap().status,
        OrderStatus::InProgress
    );
}

#[tokio::test]
async fn test_sweep_fails_unresolvable_orders() {
    let h = harness(BackendKind::Terraform);
    let m = manager(&h, chrono::Duration::zero());

    let order_id = open_order(&h, "d-1").await;
    let reason = "result already returned or request id invalid";
    h.executor
        .set_outcome(&order_id, FetchOutcome::Unresolvable(reason.to_string()));

    assert_eq!(m.sweep().await, 1);

    let order = h.ledger.order(&order_id).unwrap();
    assert_eq!(order.status, OrderStatus::Failed);
    assert_eq!(order.error_detail.as_deref(), Some(reason));
    assert_eq!(
        h.ledger.deployment("d-1").unwrap().state,
        DeploymentState::DeployFailed
    );
}

#[tokio::test]
async fn test_sweep_respects_the_grace_period() {
    let h = harness(BackendKind::Terraform);
    let m = manager(&h, chrono::Duration::hours(1));

    let order_id = open_order(&h, "d-1").await;
    h.executor
        .set_outcome(&order_id, FetchOutcome::Ready(success_result(&order_id)));

    // The order is younger than the grace period, so nothing is fetched
    assert_eq!(m.sweep().await, 0);
    assert!(h.executor.fetched_order_ids().is_empty());
    assert_eq!(
        h.ledger.order(&order_id).unwrap().status,
        OrderStatus::InProgress
    );
}

#[tokio::test]
async fn test_transport_failure_mutates_nothing() {
    let h = harness(BackendKind::Terraform);
    let m = manager(&h, chrono::Duration::zero());

    let order_id = open_order(&h, "d-1").await;
    h.executor.fail_fetches(true);

    assert_eq!(m.sweep().await, 0);
    assert_eq!(
        h.ledger.order(&order_id).unwrap().status,
        OrderStatus::InProgress
    );

    // Once the backend answers again the next sweep lands the result
    h.executor.fail_fetches(false);
    h.executor
        .set_outcome(&order_id, FetchOutcome::Ready(success_result(&order_id)));
    assert_eq!(m.sweep().await, 1);
    assert_eq!(h.ledger.order(&order_id).unwrap().status, OrderStatus::Success);
}

#[tokio::test]
async fn test_concurrent_sweeps_do_not_overlap() {
    let h = harness(BackendKind::Terraform);
    let m = Arc::new(manager(&h, chrono::Duration::zero()));

    let order_id = open_order(&h, "d-1").await;
    h.executor
        .set_outcome(&order_id, FetchOutcome::Ready(success_result(&order_id)));
    h.executor.delay_fetches(Duration::from_millis(50));

    // One sweep does the work; the tick landing mid-sweep is dropped
    let (first, second) = tokio::join!(m.sweep(), m.sweep());
    assert_eq!(first + second, 1);
    assert_eq!(h.ledger.order(&order_id).unwrap().status, OrderStatus::Success);
}

#[tokio::test]
async fn test_refetch_order_ignores_grace_and_applies() {
    let h = harness(BackendKind::Terraform);
    let m = manager(&h, chrono::Duration::hours(1));

    let order_id = open_order(&h, "d-1").await;
    h.executor
        .set_outcome(&order_id, FetchOutcome::Ready(success_result(&order_id)));

    // On-demand refetch bypasses the sweep's age filter
    let order = m.refetch_order(&order_id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Success);
    assert_eq!(
        h.ledger.deployment("d-1").unwrap().state,
        DeploymentState::DeploySuccess
    );
}

#[tokio::test]
async fn test_refetch_terminal_order_skips_the_backend() {
    let h = harness(BackendKind::Terraform);
    let m = manager(&h, chrono::Duration::zero());

    let order_id = open_order(&h, "d-1").await;
    h.applier.apply(&order_id, &success_result(&order_id)).await;

    let order = m.refetch_order(&order_id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Success);
    assert!(h.executor.fetched_order_ids().is_empty());
}

#[tokio::test]
async fn test_refetch_unknown_order_not_found() {
    let h = harness(BackendKind::Terraform);
    let m = manager(&h, chrono::Duration::zero());

    let err = m.refetch_order("ghost").await.unwrap_err();
    assert!(matches!(err, OrchestratorError::NotFound(_)));
}

#[tokio::test]
async fn test_refetch_surfaces_transport_failures() {
    let h = harness(BackendKind::Terraform);
    let m = manager(&h, chrono::Duration::zero());

    let order_id = open_order(&h, "d-1").await;
    h.executor.fail_fetches(true);

    assert!(m.refetch_order(&order_id).await.is_err());
    assert_eq!(
        h.ledger.order(&order_id).unwrap().status,
        OrderStatus::InProgress
    );
}
