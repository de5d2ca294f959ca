//! Result reconciliation

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::deploy::applier::DeployResultApplier;
use crate::deploy::registry::DeployerRegistry;
use crate::errors::OrchestratorError;
use crate::ledger::store::OrderLedger;
use crate::models::backend::BackendKind;
use crate::models::order::ServiceOrder;
use crate::models::result::FetchOutcome;

/// Recovers results whose callback was lost, duplicated or delayed.
///
/// The periodic sweep pulls stored results for open orders older than
/// the grace period and pushes them through the same applier as the
/// webhook path. Orders the backend is still working on, and orders it
/// cannot currently answer for, are left for the next sweep; only the
/// backend's explicit "result already returned or request id invalid"
/// answer licenses a terminal failure without a result.
pub struct ReconciliationManager {
    registry: Arc<DeployerRegistry>,
    ledger: Arc<OrderLedger>,
    applier: Arc<DeployResultApplier>,
    grace_period: chrono::Duration,
    sweeping: AtomicBool,
}

impl ReconciliationManager {
    /// Create a manager sweeping orders older than `grace_period`
    pub fn new(
        registry: Arc<DeployerRegistry>,
        ledger: Arc<OrderLedger>,
        applier: Arc<DeployResultApplier>,
        grace_period: chrono::Duration,
    ) -> Self {
        Self {
            registry,
            ledger,
            applier,
            grace_period,
            sweeping: AtomicBool::new(false),
        }
    }

    /// Run one reconciliation sweep.
    ///
    /// Returns the number of orders whose state changed. At most one
    /// sweep runs at a time; a tick arriving mid-sweep is dropped.
    pub async fn sweep(&self) -> usize {
        if self.sweeping.swap(true, Ordering::SeqCst) {
            debug!("reconciliation sweep already running, skipping tick");
            return 0;
        }

        let applied = self.sweep_stale_orders().await;
        self.sweeping.store(false, Ordering::SeqCst);
        applied
    }

    async fn sweep_stale_orders(&self) -> usize {
        let candidates = self.ledger.open_orders_older_than(self.grace_period);
        if candidates.is_empty() {
            return 0;
        }
        info!("reconciling {} stale orders", candidates.len());

        // One batched round trip per backend kind
        let mut by_kind: HashMap<BackendKind, Vec<String>> = HashMap::new();
        for order in candidates {
            by_kind.entry(order.backend_kind).or_default().push(order.id);
        }

        let mut applied = 0;
        for (kind, order_ids) in by_kind {
            let client = match self.registry.client(kind) {
                Ok(client) => client,
                Err(err) => {
                    warn!("skipping {} orders on {}: {}", order_ids.len(), kind, err);
                    continue;
                }
            };

            match client.fetch_results(&order_ids).await {
                Ok(outcomes) => {
                    for (order_id, outcome) in outcomes {
                        if self.handle_outcome(&order_id, outcome).await {
                            applied += 1;
                        }
                    }
                }
                Err(err) => {
                    // Transient by assumption; the orders stay open for
                    // the next sweep
                    warn!("result fetch from {} failed: {}", kind, err);
                }
            }
        }

        if applied > 0 {
            info!("reconciliation applied {} results", applied);
        }
        applied
    }

    /// Re-fetch one order on demand, regardless of its age.
    ///
    /// Used when a caller needs a synchronous answer shortly after
    /// dispatch. Returns the freshest view of the order; transport
    /// failures surface to the caller with no state change.
    pub async fn refetch_order(&self, order_id: &str) -> Result<ServiceOrder, OrchestratorError> {
        let order = self.ledger.order(order_id).ok_or_else(|| {
            OrchestratorError::NotFound(format!("order {} does not exist", order_id))
        })?;
        if order.is_terminal() {
            return Ok(order);
        }

        let client = self.registry.client(order.backend_kind)?;
        let outcome = client.fetch_result(order_id).await?;
        self.handle_outcome(order_id, outcome).await;

        self.ledger.order(order_id).ok_or_else(|| {
            OrchestratorError::NotFound(format!("order {} does not exist", order_id))
        })
    }

    async fn handle_outcome(&self, order_id: &str, outcome: FetchOutcome) -> bool {
        match outcome {
            FetchOutcome::Ready(result) => self.applier.apply(order_id, &result).await,
            FetchOutcome::InProgress => {
                debug!("order {} still in progress at the backend", order_id);
                false
            }
            FetchOutcome::NoContent => {
                info!("backend has no stored result for order {}", order_id);
                false
            }
            FetchOutcome::Unresolvable(reason) => {
                self.applier.mark_failed(order_id, &reason).await
            }
        }
    }
}
