//! Settings file management

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::logs::LogLevel;
use crate::models::webhook::WebhookAuthMode;

/// Orchestrator settings.
///
/// Deserialize-only: the webhook secret and backend bearer tokens are
/// `SecretString`s, which never serialize back out.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerSettings,

    /// URL base the backends push results to, e.g. "http://provost:8080"
    #[serde(default = "default_callback_base_url")]
    pub callback_base_url: String,

    /// Result push authentication
    #[serde(default)]
    pub webhook: WebhookSettings,

    /// Backend executors; a kind is registered iff configured here
    #[serde(default)]
    pub backends: BackendsSettings,

    /// Retry policy for executor submissions
    #[serde(default)]
    pub retry: RetrySettings,

    /// Result reconciliation
    #[serde(default)]
    pub reconcile: ReconcileSettings,
}

fn default_callback_base_url() -> String {
    "http://localhost:8080".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            server: ServerSettings::default(),
            callback_base_url: default_callback_base_url(),
            webhook: WebhookSettings::default(),
            backends: BackendsSettings::default(),
            retry: RetrySettings::default(),
            reconcile: ReconcileSettings::default(),
        }
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Bind host
    #[serde(default = "default_server_host")]
    pub host: String,

    /// Bind port
    #[serde(default = "default_server_port")]
    pub port: u16,
}

fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    8080
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
        }
    }
}

/// Webhook authentication settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookSettings {
    /// Signature mode required on incoming result pushes
    #[serde(default)]
    pub auth_mode: WebhookAuthMode,

    /// Shared HMAC secret; required when auth_mode is hmac
    #[serde(default)]
    pub secret: Option<SecretString>,
}

/// Per-kind backend executor settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackendsSettings {
    /// Terraform executor
    #[serde(default)]
    pub terraform: Option<ExecutorSettings>,

    /// OpenTofu executor
    #[serde(default)]
    pub opentofu: Option<ExecutorSettings>,
}

/// Connection settings for one backend executor
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutorSettings {
    /// Base URL of the executor API
    pub base_url: String,

    /// Bearer token attached to every executor request
    #[serde(default)]
    pub bearer_token: Option<SecretString>,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    30
}

/// Retry policy settings for executor submissions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Attempts before an operation counts as failed
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry, in seconds
    #[serde(default = "default_base_delay")]
    pub base_delay_secs: u64,

    /// Upper bound on the backoff delay, in seconds
    #[serde(default = "default_max_delay")]
    pub max_delay_secs: u64,

    /// Backoff growth factor between attempts
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay() -> u64 {
    1
}

fn default_max_delay() -> u64 {
    300
}

fn default_multiplier() -> f64 {
    2.0
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_secs: default_base_delay(),
            max_delay_secs: default_max_delay(),
            multiplier: default_multiplier(),
        }
    }
}

/// Result reconciliation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileSettings {
    /// Enable the periodic sweep worker
    #[serde(default = "default_true")]
    pub enable_sweeper: bool,

    /// Seconds between sweeps
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// Seconds an order stays exempt from re-fetching after dispatch
    #[serde(default = "default_grace_period")]
    pub grace_period_secs: u64,

    /// Seconds before the first sweep after startup
    #[serde(default = "default_initial_delay")]
    pub initial_delay_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_sweep_interval() -> u64 {
    60
}

fn default_grace_period() -> u64 {
    300
}

fn default_initial_delay() -> u64 {
    10
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        Self {
            enable_sweeper: true,
            sweep_interval_secs: default_sweep_interval(),
            grace_period_secs: default_grace_period(),
            initial_delay_secs: default_initial_delay(),
        }
    }
}
