//! Deploy result application

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::ledger::snapshot::LedgerPersister;
use crate::ledger::store::{ApplyOutcome, OrderLedger};
use crate::models::result::BackendResult;

/// The single chokepoint that lands backend results on the ledger.
///
/// Both the webhook path and the reconciliation path go through here,
/// so every state transition follows one set of rules: unknown orders
/// never create state, terminal orders never change again, and of two
/// racing deliveries exactly one applies.
pub struct DeployResultApplier {
    ledger: Arc<OrderLedger>,
    persister: Option<Arc<LedgerPersister>>,
}

impl DeployResultApplier {
    /// Create an applier over the ledger
    pub fn new(ledger: Arc<OrderLedger>, persister: Option<Arc<LedgerPersister>>) -> Self {
        Self { ledger, persister }
    }

    /// Apply a backend result to its order.
    ///
    /// Returns whether this call changed state. Duplicates and unknown
    /// orders report `false` and are not errors.
    pub async fn apply(&self, order_id: &str, result: &BackendResult) -> bool {
        match self.ledger.apply_result(order_id, result) {
            ApplyOutcome::Applied => {
                info!(
                    "result applied for order {} (success: {})",
                    order_id, result.success
                );
                self.persist().await;
                true
            }
            ApplyOutcome::Duplicate => {
                debug!("duplicate result for order {} ignored", order_id);
                false
            }
            ApplyOutcome::UnknownOrder => {
                warn!("result for unknown order {} discarded", order_id);
                false
            }
        }
    }

    /// Force an open order into FAILED with the given reason.
    ///
    /// Used when the backend declares the order unresolvable and no
    /// result will ever be handed back.
    pub async fn mark_failed(&self, order_id: &str, reason: &str) -> bool {
        match self.ledger.mark_order_failed(order_id, reason) {
            ApplyOutcome::Applied => {
                info!("order {} marked failed: {}", order_id, reason);
                self.persist().await;
                true
            }
            ApplyOutcome::Duplicate => {
                debug!("order {} already terminal, not marking failed", order_id);
                false
            }
            ApplyOutcome::UnknownOrder => {
                warn!("cannot mark unknown order {} failed", order_id);
                false
            }
        }
    }

    async fn persist(&self) {
        if let Some(persister) = &self.persister {
            persister.persist_best_effort(&self.ledger).await;
        }
    }
}
