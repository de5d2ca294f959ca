//! Task dispatch tests

use provost::errors::OrchestratorError;
use provost::models::backend::BackendKind;
use provost::models::deployment::DeploymentState;
use provost::models::order::{OrderStatus, Scenario};
use provost::models::task::GitRepoSource;
use provost::utils::generate_uuid;

use crate::support::{failure_result, harness, inline_task, success_result, SubmitFailure};

#[tokio::test]
async fn test_submit_dispatches_and_opens_order() {
    let h = harness(BackendKind::Terraform);
    let order_id = generate_uuid();
    let task = inline_task(&order_id, "d-1", Scenario::Deploy, BackendKind::Terraform);

    let returned = h.dispatcher.submit(&task).await.unwrap();
    assert_eq!(returned, order_id);

    let order = h.ledger.order(&order_id).unwrap();
    assert_eq!(order.status, OrderStatus::InProgress);
    assert_eq!(order.deployment_id, "d-1");
    assert_eq!(
        h.ledger.deployment("d-1").unwrap().state,
        DeploymentState::Deploying
    );

    // The webhook handed to the backend routes straight back to this order
    let calls = h.executor.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].operation, "deploy");
    assert_eq!(
        calls[0].webhook_url,
        format!("http://provost.test:8080/webhooks/terraform/{order_id}")
    );
}

#[tokio::test]
async fn test_ambiguous_source_never_reaches_the_backend() {
    let h = harness(BackendKind::Terraform);
    let mut task = inline_task(
        &generate_uuid(),
        "d-1",
        Scenario::Deploy,
        BackendKind::Terraform,
    );
    task.description.git_repo = Some(GitRepoSource {
        repo_url: "https://github.com/acme/scripts.git".to_string(),
        branch: "main".to_string(),
        script_path: None,
    });

    let err = h.dispatcher.submit(&task).await.unwrap_err();
    assert!(matches!(err, OrchestratorError::ConfigError(_)));
    assert!(h.executor.calls().is_empty());
    assert_eq!(h.ledger.open_order_count(), 0);
}

#[tokio::test]
async fn test_second_order_on_busy_deployment_conflicts() {
    let h = harness(BackendKind::Terraform);
    h.dispatcher
        .submit(&inline_task(
            &generate_uuid(),
            "d-1",
            Scenario::Deploy,
            BackendKind::Terraform,
        ))
        .await
        .unwrap();

    let err = h
        .dispatcher
        .submit(&inline_task(
            &generate_uuid(),
            "d-1",
            Scenario::Modify,
            BackendKind::Terraform,
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestratorError::OrderConflict(_)));

    // The conflicting task never went out
    assert_eq!(h.executor.calls().len(), 1);
}

#[tokio::test]
async fn test_failed_submission_leaves_no_order() {
    let h = harness(BackendKind::Terraform);
    h.executor.fail_submissions(SubmitFailure::Unavailable);

    let order_id = generate_uuid();
    let err = h
        .dispatcher
        .submit(&inline_task(
            &order_id,
            "d-1",
            Scenario::Deploy,
            BackendKind::Terraform,
        ))
        .await
        .unwrap_err();

    assert!(matches!(err, OrchestratorError::ExecutorUnavailable(_)));
    assert!(h.ledger.order(&order_id).is_none());
    assert!(h.ledger.deployment("d-1").is_none());
}

#[tokio::test]
async fn test_rejected_submission_surfaces_without_an_order() {
    let h = harness(BackendKind::Terraform);
    h.executor.fail_submissions(SubmitFailure::Rejected);

    let order_id = generate_uuid();
    let err = h
        .dispatcher
        .submit(&inline_task(
            &order_id,
            "d-1",
            Scenario::Deploy,
            BackendKind::Terraform,
        ))
        .await
        .unwrap_err();

    assert!(matches!(err, OrchestratorError::ExecutorRejected(_)));
    assert!(h.ledger.order(&order_id).is_none());
}

#[tokio::test]
async fn test_rollback_and_purge_ride_destroy() {
    let h = harness(BackendKind::Terraform);

    // Seed a deployment whose deploy failed but left resources behind
    let deploy_id = generate_uuid();
    h.dispatcher
        .submit(&inline_task(
            &deploy_id,
            "d-1",
            Scenario::Deploy,
            BackendKind::Terraform,
        ))
        .await
        .unwrap();
    h.applier
        .apply(&deploy_id, &failure_result(&deploy_id, "quota exceeded"))
        .await;

    let rollback_id = generate_uuid();
    h.dispatcher
        .submit(&inline_task(
            &rollback_id,
            "d-1",
            Scenario::Rollback,
            BackendKind::Terraform,
        ))
        .await
        .unwrap();

    assert_eq!(h.executor.calls().last().unwrap().operation, "destroy");
    assert_eq!(
        h.ledger.deployment("d-1").unwrap().state,
        DeploymentState::Destroying
    );

    // A successful rollback leaves the deploy failed, not succeeded
    h.applier
        .apply(&rollback_id, &success_result(&rollback_id))
        .await;
    assert_eq!(
        h.ledger.deployment("d-1").unwrap().state,
        DeploymentState::DeployFailed
    );

    let purge_id = generate_uuid();
    h.dispatcher
        .submit(&inline_task(
            &purge_id,
            "d-1",
            Scenario::Purge,
            BackendKind::Terraform,
        ))
        .await
        .unwrap();
    assert_eq!(h.executor.calls().last().unwrap().operation, "destroy");
}

#[tokio::test]
async fn test_unregistered_backend_is_rejected() {
    let h = harness(BackendKind::Terraform);

    let err = h
        .dispatcher
        .submit(&inline_task(
            &generate_uuid(),
            "d-1",
            Scenario::Deploy,
            BackendKind::OpenTofu,
        ))
        .await
        .unwrap_err();

    assert!(matches!(err, OrchestratorError::UnsupportedBackend(_)));
    assert!(h.executor.calls().is_empty());
}

#[tokio::test]
async fn test_task_without_order_id_is_invalid() {
    let h = harness(BackendKind::Terraform);

    let err = h
        .dispatcher
        .submit(&inline_task("", "d-1", Scenario::Deploy, BackendKind::Terraform))
        .await
        .unwrap_err();

    assert!(matches!(err, OrchestratorError::ValidationError(_)));
    assert!(h.executor.calls().is_empty());
}

#[tokio::test]
async fn test_modify_requires_an_existing_deployment() {
    let h = harness(BackendKind::Terraform);

    let err = h
        .dispatcher
        .submit(&inline_task(
            &generate_uuid(),
            "ghost",
            Scenario::Modify,
            BackendKind::Terraform,
        ))
        .await
        .unwrap_err();

    assert!(matches!(err, OrchestratorError::NotFound(_)));
    assert!(h.executor.calls().is_empty());
}

#[tokio::test]
async fn test_destroy_forwards_the_stored_tool_state() {
    let h = harness(BackendKind::Terraform);

    let deploy_id = generate_uuid();
    h.dispatcher
        .submit(&inline_task(
            &deploy_id,
            "d-1",
            Scenario::Deploy,
            BackendKind::Terraform,
        ))
        .await
        .unwrap();
    h.applier
        .apply(&deploy_id, &success_result(&deploy_id))
        .await;

    h.dispatcher
        .submit(&inline_task(
            &generate_uuid(),
            "d-1",
            Scenario::Destroy,
            BackendKind::Terraform,
        ))
        .await
        .unwrap();

    let calls = h.executor.calls();
    assert_eq!(calls[0].tool_state, None);
    assert_eq!(
        calls[1].tool_state.as_deref(),
        Some("{\"version\":4,\"resources\":[]}")
    );
}

#[tokio::test]
async fn test_plan_and_validate_open_no_orders() {
    let h = harness(BackendKind::Terraform);
    let task = inline_task(
        &generate_uuid(),
        "d-1",
        Scenario::Deploy,
        BackendKind::Terraform,
    );

    let plan = h.dispatcher.plan(&task).await.unwrap();
    assert!(plan.contains("Plan:"));

    let validation = h
        .dispatcher
        .validate(BackendKind::Terraform, &task.description)
        .await
        .unwrap();
    assert!(validation.valid);

    assert!(h.ledger.orders().is_empty());
}

#[tokio::test]
async fn test_cancel_open_order() {
    let h = harness(BackendKind::Terraform);
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

    let cancelled = h.dispatcher.cancel(&order_id).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);

    // Cancelling twice conflicts; the order is already terminal
    let err = h.dispatcher.cancel(&order_id).await.unwrap_err();
    assert!(matches!(err, OrchestratorError::OrderConflict(_)));

    // The deployment is free for new work again
    h.dispatcher
        .submit(&inline_task(
            &generate_uuid(),
            "d-1",
            Scenario::Deploy,
            BackendKind::Terraform,
        ))
        .await
        .unwrap();
}
