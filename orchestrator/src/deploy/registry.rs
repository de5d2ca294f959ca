//! Deployer registry

use std::collections::HashMap;
use std::sync::Arc;

use crate::deploy::deployer::Deployer;
use crate::errors::OrchestratorError;
use crate::executor::api::ExecutorApi;
use crate::models::backend::BackendKind;

struct Registration {
    deployer: Arc<dyn Deployer>,
    client: Arc<dyn ExecutorApi>,
}

/// Resolves the deployer and the raw executor client for a backend kind.
///
/// Populated once at startup from configuration; callers never talk to
/// a concrete backend directly.
#[derive(Default)]
pub struct DeployerRegistry {
    registrations: HashMap<BackendKind, Registration>,
}

impl DeployerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            registrations: HashMap::new(),
        }
    }

    /// Register a deployer and its executor client
    pub fn register(&mut self, deployer: Arc<dyn Deployer>, client: Arc<dyn ExecutorApi>) {
        self.registrations
            .insert(deployer.kind(), Registration { deployer, client });
    }

    /// Resolve the deployer for a backend kind
    pub fn resolve(&self, kind: BackendKind) -> Result<Arc<dyn Deployer>, OrchestratorError> {
        self.registrations
            .get(&kind)
            .map(|r| r.deployer.clone())
            .ok_or_else(|| unsupported(kind))
    }

    /// Resolve the raw executor client for a backend kind.
    ///
    /// Used by reconciliation and health probes, which talk to the
    /// backend without dispatching new work.
    pub fn client(&self, kind: BackendKind) -> Result<Arc<dyn ExecutorApi>, OrchestratorError> {
        self.registrations
            .get(&kind)
            .map(|r| r.client.clone())
            .ok_or_else(|| unsupported(kind))
    }

    /// Kinds with a registered deployer
    pub fn kinds(&self) -> Vec<BackendKind> {
        let mut kinds: Vec<_> = self.registrations.keys().copied().collect();
        kinds.sort_by_key(|k| k.slug());
        kinds
    }
}

fn unsupported(kind: BackendKind) -> OrchestratorError {
    OrchestratorError::UnsupportedBackend(format!(
        "no deployer registered for backend {}",
        kind
    ))
}
