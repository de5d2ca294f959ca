//! In-memory order ledger

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;
use tracing::warn;

use crate::errors::OrchestratorError;
use crate::ledger::snapshot::LedgerSnapshot;
use crate::models::deployment::ServiceDeployment;
use crate::models::order::{OrderStatus, ServiceOrder};
use crate::models::result::BackendResult;

/// Outcome of attempting to apply a result to an order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The order and its deployment were updated
    Applied,

    /// The order was already terminal; nothing changed
    Duplicate,

    /// No order with this id exists; nothing changed
    UnknownOrder,
}

struct LedgerInner {
    orders: HashMap<String, ServiceOrder>,
    deployments: HashMap<String, ServiceDeployment>,
}

/// Record of every in-flight and completed order with its deployment.
///
/// Orders and deployments live under one lock so that a result lands on
/// both as a single critical section. Concurrent result deliveries for
/// the same order id serialize on the write lock and exactly one of them
/// observes the order as still open.
pub struct OrderLedger {
    inner: RwLock<LedgerInner>,
}

impl OrderLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(LedgerInner {
                orders: HashMap::new(),
                deployments: HashMap::new(),
            }),
        }
    }

    /// Rebuild a ledger from a persisted snapshot
    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Self {
        let ledger = Self::new();
        {
            let mut inner = ledger.inner.write().unwrap_or_else(|e| e.into_inner());
            for deployment in snapshot.deployments {
                inner.deployments.insert(deployment.id.clone(), deployment);
            }
            for order in snapshot.orders {
                inner.orders.insert(order.id.clone(), order);
            }
        }
        ledger
    }

    /// Check that a new order may be dispatched for a deployment.
    ///
    /// Rejects reused order ids and deployments that already have an
    /// open order. Called before the backend submission; the same checks
    /// run again when the order is inserted.
    pub fn ensure_dispatchable(
        &self,
        deployment_id: &str,
        order_id: &str,
    ) -> Result<(), OrchestratorError> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        check_dispatchable(&inner, deployment_id, order_id)
    }

    /// Insert a new IN_PROGRESS order, creating its deployment if needed.
    ///
    /// The deployment moves to the scenario's in-flight state in the same
    /// critical section.
    pub fn create_order(&self, order: ServiceOrder) -> Result<(), OrchestratorError> {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        check_dispatchable(&inner, &order.deployment_id, &order.id)?;

        let deployment = inner
            .deployments
            .entry(order.deployment_id.clone())
            .or_insert_with(|| ServiceDeployment::new(&order.deployment_id));
        deployment.state = order.scenario.in_flight_state();
        deployment.updated_at = Utc::now();

        inner.orders.insert(order.id.clone(), order);
        Ok(())
    }

    /// Apply a backend result to its order and deployment.
    ///
    /// Terminal orders are never overwritten; a result for one reports
    /// `Duplicate` and leaves all state untouched.
    pub fn apply_result(&self, order_id: &str, result: &BackendResult) -> ApplyOutcome {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());

        let Some(order) = inner.orders.get_mut(order_id) else {
            return ApplyOutcome::UnknownOrder;
        };
        if order.status.is_terminal() {
            return ApplyOutcome::Duplicate;
        }

        let now = Utc::now();
        order.status = if result.success {
            OrderStatus::Success
        } else {
            OrderStatus::Failed
        };
        order.error_detail = result.error_message.clone();
        order.updated_at = now;

        let scenario = order.scenario;
        let success = result.success;
        let deployment_id = order.deployment_id.clone();

        let deployment = inner
            .deployments
            .entry(deployment_id.clone())
            .or_insert_with(|| {
                warn!(deployment_id = %deployment_id, "order referenced a missing deployment");
                ServiceDeployment::new(&deployment_id)
            });

        let settled = scenario.settled_state(success);
        deployment.state = settled;
        deployment.updated_at = now;

        if settled == crate::models::deployment::DeploymentState::DestroySuccess {
            // Resources are gone; drop the state file and outputs
            deployment.tool_state = result.tool_state.clone();
            deployment.outputs.clear();
        } else {
            // Keep the state file even for failed runs so partially
            // created resources stay tracked
            if result.tool_state.is_some() {
                deployment.tool_state = result.tool_state.clone();
            }
            if success {
                deployment.outputs = result.outputs.clone();
            }
        }

        ApplyOutcome::Applied
    }

    /// Force an open order into FAILED with the given reason.
    ///
    /// Used when the backend declares the order unresolvable. Follows the
    /// same terminal-once rule as `apply_result`.
    pub fn mark_order_failed(&self, order_id: &str, reason: &str) -> ApplyOutcome {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());

        let Some(order) = inner.orders.get_mut(order_id) else {
            return ApplyOutcome::UnknownOrder;
        };
        if order.status.is_terminal() {
            return ApplyOutcome::Duplicate;
        }

        let now = Utc::now();
        order.status = OrderStatus::Failed;
        order.error_detail = Some(reason.to_string());
        order.updated_at = now;

        let scenario = order.scenario;
        let deployment_id = order.deployment_id.clone();

        if let Some(deployment) = inner.deployments.get_mut(&deployment_id) {
            deployment.state = scenario.settled_state(false);
            deployment.updated_at = now;
        }

        ApplyOutcome::Applied
    }

    /// Cancel an open order. The deployment falls to the scenario's
    /// failed state since the backend may still have executed the job.
    pub fn cancel_order(&self, order_id: &str) -> Result<ServiceOrder, OrchestratorError> {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());

        let Some(order) = inner.orders.get_mut(order_id) else {
            return Err(OrchestratorError::NotFound(format!(
                "order {} does not exist",
                order_id
            )));
        };
        if order.status.is_terminal() {
            return Err(OrchestratorError::OrderConflict(format!(
                "order {} is already {:?}",
                order_id, order.status
            )));
        }

        let now = Utc::now();
        order.status = OrderStatus::Cancelled;
        order.error_detail = Some("cancelled by operator".to_string());
        order.updated_at = now;
        let cancelled = order.clone();

        let scenario = cancelled.scenario;
        if let Some(deployment) = inner.deployments.get_mut(&cancelled.deployment_id) {
            deployment.state = scenario.settled_state(false);
            deployment.updated_at = now;
        }

        Ok(cancelled)
    }

    /// Look up an order by id
    pub fn order(&self, order_id: &str) -> Option<ServiceOrder> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.orders.get(order_id).cloned()
    }

    /// Look up a deployment by id
    pub fn deployment(&self, deployment_id: &str) -> Option<ServiceDeployment> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.deployments.get(deployment_id).cloned()
    }

    /// The deployment's current tool state file, for destroy/modify requests
    pub fn tool_state(&self, deployment_id: &str) -> Result<Option<String>, OrchestratorError> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner
            .deployments
            .get(deployment_id)
            .map(|d| d.tool_state.clone())
            .ok_or_else(|| {
                OrchestratorError::NotFound(format!(
                    "deployment {} does not exist",
                    deployment_id
                ))
            })
    }

    /// All orders, newest first
    pub fn orders(&self) -> Vec<ServiceOrder> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        let mut orders: Vec<_> = inner.orders.values().cloned().collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders
    }

    /// All deployments, newest first
    pub fn deployments(&self) -> Vec<ServiceDeployment> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        let mut deployments: Vec<_> = inner.deployments.values().cloned().collect();
        deployments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        deployments
    }

    /// Open orders created at least `grace` ago, oldest first.
    ///
    /// These are the reconciliation sweep candidates; younger orders are
    /// left alone to give the callback a chance to arrive.
    pub fn open_orders_older_than(&self, grace: chrono::Duration) -> Vec<ServiceOrder> {
        let cutoff = Utc::now() - grace;
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        let mut candidates: Vec<_> = inner
            .orders
            .values()
            .filter(|o| o.status == OrderStatus::InProgress && o.created_at <= cutoff)
            .cloned()
            .collect();
        candidates.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        candidates
    }

    /// Number of open orders
    pub fn open_order_count(&self) -> usize {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner
            .orders
            .values()
            .filter(|o| o.status == OrderStatus::InProgress)
            .count()
    }

    /// Copy the full ledger contents for persistence
    pub fn snapshot(&self) -> LedgerSnapshot {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        LedgerSnapshot {
            orders: inner.orders.values().cloned().collect(),
            deployments: inner.deployments.values().cloned().collect(),
        }
    }
}

impl Default for OrderLedger {
    fn default() -> Self {
        Self::new()
    }
}

fn check_dispatchable(
    inner: &LedgerInner,
    deployment_id: &str,
    order_id: &str,
) -> Result<(), OrchestratorError> {
    if inner.orders.contains_key(order_id) {
        return Err(OrchestratorError::OrderConflict(format!(
            "order {} already exists",
            order_id
        )));
    }

    if let Some(open) = inner
        .orders
        .values()
        .find(|o| o.deployment_id == deployment_id && o.status == OrderStatus::InProgress)
    {
        return Err(OrchestratorError::OrderConflict(format!(
            "deployment {} already has open order {}",
            deployment_id, open.id
        )));
    }

    Ok(())
}
