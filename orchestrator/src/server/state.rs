//! Server state

use std::sync::Arc;

use crate::deploy::applier::DeployResultApplier;
use crate::deploy::dispatch::TaskDispatcher;
use crate::deploy::registry::DeployerRegistry;
use crate::ledger::store::OrderLedger;
use crate::reconcile::manager::ReconciliationManager;
use crate::server::auth::WebhookVerifier;

/// Server state shared across handlers
pub struct ServerState {
    pub dispatcher: Arc<TaskDispatcher>,
    pub reconciler: Arc<ReconciliationManager>,
    pub applier: Arc<DeployResultApplier>,
    pub ledger: Arc<OrderLedger>,
    pub registry: Arc<DeployerRegistry>,
    pub webhook_verifier: Arc<WebhookVerifier>,
}

impl ServerState {
    pub fn new(
        dispatcher: Arc<TaskDispatcher>,
        reconciler: Arc<ReconciliationManager>,
        applier: Arc<DeployResultApplier>,
        ledger: Arc<OrderLedger>,
        registry: Arc<DeployerRegistry>,
        webhook_verifier: Arc<WebhookVerifier>,
    ) -> Self {
        Self {
            dispatcher,
            reconciler,
            applier,
            ledger,
            registry,
            webhook_verifier,
        }
    }
}
