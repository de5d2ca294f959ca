//! Application configuration options

use std::time::Duration;

use secrecy::SecretString;

use crate::executor::retry::RetryOptions;
use crate::models::webhook::WebhookAuthMode;
use crate::storage::layout::StorageLayout;
use crate::storage::settings::Settings;
use crate::utils::CooldownOptions;
use crate::workers::reconciler;

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Lifecycle configuration
    pub lifecycle: LifecycleOptions,

    /// Storage layout paths
    pub storage: StorageLayout,

    /// Server configuration
    pub server: ServerOptions,

    /// Webhook push configuration
    pub webhook: WebhookOptions,

    /// Backend executor connections
    pub backends: BackendsOptions,

    /// Retry policy for executor calls
    pub retry: RetryOptions,

    /// Enable the reconciliation sweep worker
    pub enable_reconciler: bool,

    /// Reconciler worker options
    pub reconciler: reconciler::Options,

    /// Age an open order must reach before it is re-fetched
    pub reconcile_grace_period: Duration,
}

impl AppOptions {
    /// Assemble runtime options from loaded settings
    pub fn from_settings(settings: Settings, storage: StorageLayout) -> Self {
        Self {
            lifecycle: LifecycleOptions::default(),
            storage,
            server: ServerOptions {
                host: settings.server.host,
                port: settings.server.port,
            },
            webhook: WebhookOptions {
                callback_base_url: settings.callback_base_url,
                auth_mode: settings.webhook.auth_mode,
                secret: settings.webhook.secret,
            },
            backends: BackendsOptions {
                terraform: settings.backends.terraform.map(ExecutorOptions::from),
                opentofu: settings.backends.opentofu.map(ExecutorOptions::from),
            },
            retry: RetryOptions {
                max_attempts: settings.retry.max_attempts,
                cooldown: CooldownOptions {
                    base_delay: Duration::from_secs(settings.retry.base_delay_secs),
                    max_delay: Duration::from_secs(settings.retry.max_delay_secs),
                    multiplier: settings.retry.multiplier,
                },
            },
            enable_reconciler: settings.reconcile.enable_sweeper,
            reconciler: reconciler::Options {
                interval: Duration::from_secs(settings.reconcile.sweep_interval_secs),
                initial_delay: Duration::from_secs(settings.reconcile.initial_delay_secs),
            },
            reconcile_grace_period: Duration::from_secs(settings.reconcile.grace_period_secs),
        }
    }
}

impl Default for AppOptions {
    fn default() -> Self {
        Self::from_settings(Settings::default(), StorageLayout::default())
    }
}

/// Lifecycle options
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// Maximum delay for graceful shutdown
    pub max_shutdown_delay: Duration,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            max_shutdown_delay: Duration::from_secs(30),
        }
    }
}

/// HTTP server options
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Webhook push options
#[derive(Debug, Clone)]
pub struct WebhookOptions {
    /// URL base the backends push results to
    pub callback_base_url: String,

    /// Signature mode required on incoming pushes
    pub auth_mode: WebhookAuthMode,

    /// Shared HMAC secret
    pub secret: Option<SecretString>,
}

/// Backend executor connections, one per configured kind
#[derive(Debug, Clone, Default)]
pub struct BackendsOptions {
    pub terraform: Option<ExecutorOptions>,
    pub opentofu: Option<ExecutorOptions>,
}

/// Connection options for one backend executor
#[derive(Debug, Clone)]
pub struct ExecutorOptions {
    /// Base URL of the executor API
    pub base_url: String,

    /// Bearer token attached to every executor request
    pub bearer_token: Option<SecretString>,

    /// Per-request timeout
    pub request_timeout: Duration,
}

impl From<crate::storage::settings::ExecutorSettings> for ExecutorOptions {
    fn from(settings: crate::storage::settings::ExecutorSettings) -> Self {
        Self {
            base_url: settings.base_url,
            bearer_token: settings.bearer_token,
            request_timeout: Duration::from_secs(settings.request_timeout_secs),
        }
    }
}
