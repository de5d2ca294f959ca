//! Result applier tests

use std::sync::Arc;

use provost::deploy::applier::DeployResultApplier;
use provost::filesys::file::File;
use provost::ledger::snapshot::LedgerPersister;
use provost::ledger::store::OrderLedger;
use provost::models::backend::BackendKind;
use provost::models::deployment::DeploymentState;
use provost::models::order::{OrderStatus, Scenario, ServiceOrder};
use provost::utils::generate_uuid;

use crate::support::{failure_result, success_result};

fn open_order(ledger: &OrderLedger, order_id: &str, deployment_id: &str) {
    ledger
        .create_order(ServiceOrder::new(
            order_id,
            deployment_id,
            Scenario::Deploy,
            BackendKind::Terraform,
        ))
        .unwrap();
}

#[tokio::test]
async fn test_apply_settles_order_and_deployment() {
    let ledger = Arc::new(OrderLedger::new());
    let applier = DeployResultApplier::new(ledger.clone(), None);
    open_order(&ledger, "o-1", "d-1");

    assert!(applier.apply("o-1", &success_result("o-1")).await);

    assert_eq!(ledger.order("o-1").unwrap().status, OrderStatus::Success);
    assert_eq!(
        ledger.deployment("d-1").unwrap().state,
        DeploymentState::DeploySuccess
    );
}

#[tokio::test]
async fn test_duplicate_delivery_is_ignored() {
    let ledger = Arc::new(OrderLedger::new());
    let applier = DeployResultApplier::new(ledger.clone(), None);
    open_order(&ledger, "o-1", "d-1");

    assert!(applier.apply("o-1", &success_result("o-1")).await);
    assert!(
        !applier
            .apply("o-1", &failure_result("o-1", "late duplicate"))
            .await
    );

    // The first result won; the late failure changed nothing
    assert_eq!(ledger.order("o-1").unwrap().status, OrderStatus::Success);
    assert_eq!(
        ledger.deployment("d-1").unwrap().state,
        DeploymentState::DeploySuccess
    );
}

#[tokio::test]
async fn test_unknown_order_creates_no_state() {
    let ledger = Arc::new(OrderLedger::new());
    let applier = DeployResultApplier::new(ledger.clone(), None);

    assert!(!applier.apply("ghost", &success_result("ghost")).await);
    assert!(ledger.order("ghost").is_none());
    assert!(ledger.deployments().is_empty());
}

#[tokio::test]
async fn test_mark_failed_is_terminal_once() {
    let ledger = Arc::new(OrderLedger::new());
    let applier = DeployResultApplier::new(ledger.clone(), None);
    open_order(&ledger, "o-1", "d-1");

    let reason = "result already returned or request id invalid";
    assert!(applier.mark_failed("o-1", reason).await);

    let order = ledger.order("o-1").unwrap();
    assert_eq!(order.status, OrderStatus::Failed);
    assert_eq!(order.error_detail.as_deref(), Some(reason));
    assert_eq!(
        ledger.deployment("d-1").unwrap().state,
        DeploymentState::DeployFailed
    );

    assert!(!applier.mark_failed("o-1", "again").await);
    assert!(!applier.mark_failed("ghost", "never existed").await);
}

#[tokio::test]
async fn test_racing_deliveries_apply_exactly_once() {
    let ledger = Arc::new(OrderLedger::new());
    let applier = Arc::new(DeployResultApplier::new(ledger.clone(), None));
    open_order(&ledger, "o-1", "d-1");

    let mut handles = Vec::new();
    for n in 0..8 {
        let applier = applier.clone();
        handles.push(tokio::spawn(async move {
            let result = if n % 2 == 0 {
                success_result("o-1")
            } else {
                failure_result("o-1", "raced")
            };
            applier.apply("o-1", &result).await
        }));
    }

    let mut applied = 0;
    for handle in handles {
        if handle.await.unwrap() {
            applied += 1;
        }
    }

    assert_eq!(applied, 1);
    assert!(ledger.order("o-1").unwrap().is_terminal());
}

#[tokio::test]
async fn test_apply_writes_a_snapshot() {
    let dir = std::env::temp_dir().join(format!("provost-test-{}", generate_uuid()));
    let persister = Arc::new(LedgerPersister::new(File::new(dir.join("ledger.json"))));

    let ledger = Arc::new(OrderLedger::new());
    let applier = DeployResultApplier::new(ledger.clone(), Some(persister.clone()));
    open_order(&ledger, "o-1", "d-1");
    applier.apply("o-1", &success_result("o-1")).await;

    let snapshot = persister.load().await.unwrap().expect("snapshot written");
    assert_eq!(snapshot.orders.len(), 1);
    assert_eq!(snapshot.orders[0].status, OrderStatus::Success);

    let _ = tokio::fs::remove_dir_all(&dir).await;
}
