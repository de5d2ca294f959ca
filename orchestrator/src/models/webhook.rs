//! Webhook descriptor models

use serde::{Deserialize, Serialize};

/// How the backend authenticates its result callback
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookAuthMode {
    /// No authentication on the callback
    #[default]
    None,

    /// HMAC-SHA256 signature over the callback body
    Hmac,
}

/// Callback target embedded in outgoing deploy/modify/destroy requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookDescriptor {
    /// Full URL the backend pushes the result to
    pub url: String,

    /// Authentication mode the backend must use
    pub auth_mode: WebhookAuthMode,
}
