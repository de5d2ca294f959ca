//! Webhook push authentication

use axum::http::HeaderMap;
use secrecy::{ExposeSecret, SecretString};
use tracing::warn;

use crate::models::webhook::WebhookAuthMode;
use crate::utils::hmac_sha256_hex;

/// Header carrying the signature of the pushed body
pub const SIGNATURE_HEADER: &str = "x-signature";

const SIGNATURE_PREFIX: &str = "sha256=";

/// Checks backend result pushes against the configured auth mode.
///
/// The mode here is the same one advertised to backends inside outgoing
/// webhook descriptors, so a backend always knows whether to sign.
pub struct WebhookVerifier {
    mode: WebhookAuthMode,
    secret: Option<SecretString>,
}

impl WebhookVerifier {
    pub fn new(mode: WebhookAuthMode, secret: Option<SecretString>) -> Self {
        Self { mode, secret }
    }

    /// Auth mode to embed in outgoing webhook descriptors
    pub fn mode(&self) -> WebhookAuthMode {
        self.mode
    }

    /// Check one push against the raw request body.
    ///
    /// With auth disabled every push passes. With HMAC enabled the push
    /// must carry `X-Signature: sha256=<hex>` computed over the body
    /// with the shared secret; an absent secret fails closed.
    pub fn verify(&self, headers: &HeaderMap, body: &[u8]) -> bool {
        match self.mode {
            WebhookAuthMode::None => true,
            WebhookAuthMode::Hmac => self.verify_hmac(headers, body),
        }
    }

    fn verify_hmac(&self, headers: &HeaderMap, body: &[u8]) -> bool {
        let Some(secret) = &self.secret else {
            warn!("webhook HMAC auth enabled without a secret, rejecting push");
            return false;
        };
        let Some(provided) = headers
            .get(SIGNATURE_HEADER)
            .and_then(|value| value.to_str().ok())
        else {
            return false;
        };
        let Some(provided_hex) = provided.strip_prefix(SIGNATURE_PREFIX) else {
            return false;
        };

        let expected = hmac_sha256_hex(secret.expose_secret().as_bytes(), body);
        constant_time_eq(
            expected.as_bytes(),
            provided_hex.to_ascii_lowercase().as_bytes(),
        )
    }
}

/// Byte equality without an early exit on the first mismatch
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
