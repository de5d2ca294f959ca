//! Application state management

use std::sync::Arc;

use tracing::{info, warn};

use crate::app::options::{AppOptions, ExecutorOptions};
use crate::deploy::applier::DeployResultApplier;
use crate::deploy::backend::{BackendDeployer, CallbackTarget};
use crate::deploy::dispatch::TaskDispatcher;
use crate::deploy::registry::DeployerRegistry;
use crate::errors::OrchestratorError;
use crate::executor::api::ExecutorApi;
use crate::executor::http::ExecutorHttp;
use crate::executor::retry::{RetryOptions, RetryingCaller};
use crate::executor::terraform::TerraformExecutor;
use crate::executor::tofu::OpenTofuExecutor;
use crate::ledger::snapshot::LedgerPersister;
use crate::ledger::store::OrderLedger;
use crate::models::result::ExecutorHealth;
use crate::models::webhook::WebhookAuthMode;
use crate::reconcile::manager::ReconciliationManager;
use crate::server::auth::WebhookVerifier;

/// Main application state
pub struct AppState {
    /// Authoritative order and deployment store
    pub ledger: Arc<OrderLedger>,

    /// Ledger snapshot writer
    pub persister: Arc<LedgerPersister>,

    /// Configured backend deployers
    pub registry: Arc<DeployerRegistry>,

    /// Task submission entry point
    pub dispatcher: Arc<TaskDispatcher>,

    /// Single chokepoint for landing backend results
    pub applier: Arc<DeployResultApplier>,

    /// Stale-order recovery
    pub reconciler: Arc<ReconciliationManager>,

    /// Result push authentication
    pub webhook_verifier: Arc<WebhookVerifier>,
}

impl AppState {
    /// Initialize application state
    pub async fn init(options: &AppOptions) -> Result<Self, OrchestratorError> {
        info!("Initializing application state...");

        // Reload the ledger snapshot so open orders survive restarts;
        // the reconciliation sweep picks them back up
        let persister = Arc::new(LedgerPersister::new(options.storage.ledger_file()));
        let ledger = match persister.load().await? {
            Some(snapshot) => {
                let ledger = OrderLedger::from_snapshot(snapshot);
                info!(
                    "ledger snapshot restored with {} open orders",
                    ledger.open_order_count()
                );
                Arc::new(ledger)
            }
            None => Arc::new(OrderLedger::new()),
        };

        let callback = CallbackTarget {
            base_url: options.webhook.callback_base_url.clone(),
            auth_mode: options.webhook.auth_mode,
        };

        let mut registry = DeployerRegistry::new();
        if let Some(executor_options) = &options.backends.terraform {
            let client = terraform_client(executor_options, &options.retry)?;
            register(&mut registry, client, &ledger, &callback);
        }
        if let Some(executor_options) = &options.backends.opentofu {
            let client = opentofu_client(executor_options, &options.retry)?;
            register(&mut registry, client, &ledger, &callback);
        }
        if registry.kinds().is_empty() {
            warn!("no backend executors configured, every dispatch will be rejected");
        }
        let registry = Arc::new(registry);

        let applier = Arc::new(DeployResultApplier::new(
            ledger.clone(),
            Some(persister.clone()),
        ));
        let dispatcher = Arc::new(TaskDispatcher::new(
            registry.clone(),
            ledger.clone(),
            Some(persister.clone()),
        ));

        let grace_period =
            chrono::Duration::from_std(options.reconcile_grace_period).map_err(|e| {
                OrchestratorError::ConfigError(format!("grace period out of range: {}", e))
            })?;
        let reconciler = Arc::new(ReconciliationManager::new(
            registry.clone(),
            ledger.clone(),
            applier.clone(),
            grace_period,
        ));

        if options.webhook.auth_mode == WebhookAuthMode::Hmac && options.webhook.secret.is_none() {
            warn!("webhook HMAC auth enabled without a secret, every result push will be rejected");
        }
        let webhook_verifier = Arc::new(WebhookVerifier::new(
            options.webhook.auth_mode,
            options.webhook.secret.clone(),
        ));

        let state = Self {
            ledger,
            persister,
            registry,
            dispatcher,
            applier,
            reconciler,
            webhook_verifier,
        };
        state.probe_backends().await;

        Ok(state)
    }

    /// Probe each configured backend once; startup proceeds either way
    async fn probe_backends(&self) {
        for kind in self.registry.kinds() {
            let Ok(client) = self.registry.client(kind) else {
                continue;
            };
            match client.health().await {
                Ok(ExecutorHealth::Healthy) => info!("backend {} is healthy", kind),
                Ok(ExecutorHealth::Unhealthy) => warn!("backend {} reports unhealthy", kind),
                Err(err) => warn!("backend {} is unreachable: {}", kind, err),
            }
        }
    }

    /// Shutdown application state
    pub async fn shutdown(&self) -> Result<(), OrchestratorError> {
        info!("Shutting down application state...");

        // Final snapshot so nothing applied in the last moments is lost
        self.persister.persist_best_effort(&self.ledger).await;
        Ok(())
    }
}

fn terraform_client(
    options: &ExecutorOptions,
    retry: &RetryOptions,
) -> Result<Arc<dyn ExecutorApi>, OrchestratorError> {
    let http = ExecutorHttp::new(
        &options.base_url,
        options.request_timeout,
        options.bearer_token.clone(),
    )?;
    Ok(Arc::new(TerraformExecutor::new(
        http,
        RetryingCaller::new(retry.clone()),
    )))
}

fn opentofu_client(
    options: &ExecutorOptions,
    retry: &RetryOptions,
) -> Result<Arc<dyn ExecutorApi>, OrchestratorError> {
    let http = ExecutorHttp::new(
        &options.base_url,
        options.request_timeout,
        options.bearer_token.clone(),
    )?;
    Ok(Arc::new(OpenTofuExecutor::new(
        http,
        RetryingCaller::new(retry.clone()),
    )))
}

fn register(
    registry: &mut DeployerRegistry,
    client: Arc<dyn ExecutorApi>,
    ledger: &Arc<OrderLedger>,
    callback: &CallbackTarget,
) {
    let deployer = Arc::new(BackendDeployer::new(
        client.clone(),
        ledger.clone(),
        callback.clone(),
    ));
    registry.register(deployer, client);
}
