//! HTTP client for executor backends

use std::time::Duration;

use reqwest::{header, Client, Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error};
use url::Url;

use crate::errors::OrchestratorError;

/// HTTP client bound to one executor backend.
///
/// Non-2xx responses split into two error classes: client errors mean
/// the backend rejected the request and a retry cannot help, everything
/// else counts as a transport-class failure the caller may retry.
#[derive(Debug)]
pub struct ExecutorHttp {
    client: Client,
    base_url: String,
    bearer_token: Option<SecretString>,
}

impl ExecutorHttp {
    /// Create a new executor HTTP client.
    ///
    /// Rejects base URLs that do not parse, so a bad executor address in
    /// the settings fails at startup instead of on the first dispatch.
    pub fn new(
        base_url: &str,
        timeout: Duration,
        bearer_token: Option<SecretString>,
    ) -> Result<Self, OrchestratorError> {
        let base = Url::parse(base_url).map_err(|e| {
            OrchestratorError::ConfigError(format!("invalid executor URL {}: {}", base_url, e))
        })?;
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base.as_str().trim_end_matches('/').to_string(),
            bearer_token,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        let mut request = self.client.request(method, url);
        if let Some(token) = &self.bearer_token {
            request = request.header(
                header::AUTHORIZATION,
                format!("Bearer {}", token.expose_secret()),
            );
        }
        request
    }

    /// POST where any 2xx means the backend accepted the job
    pub async fn post_accepted<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), OrchestratorError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);

        let response = self.request(Method::POST, &url).json(body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("executor POST {} failed: {} - {}", path, status, body);
            return Err(classify_status(status, &body));
        }

        Ok(())
    }

    /// POST returning a JSON body
    pub async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, OrchestratorError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);

        let response = self.request(Method::POST, &url).json(body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("executor POST {} failed: {} - {}", path, status, body);
            return Err(classify_status(status, &body));
        }

        let body = response.json().await?;
        Ok(body)
    }

    /// GET returning a JSON body
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, OrchestratorError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let response = self.request(Method::GET, &url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("executor GET {} failed: {} - {}", path, status, body);
            return Err(classify_status(status, &body));
        }

        let body = response.json().await?;
        Ok(body)
    }

    /// GET returning the raw status and body.
    ///
    /// For backends that encode result availability in the HTTP status;
    /// the caller interprets non-2xx itself. Transport failures still
    /// surface as errors.
    pub async fn get_with_status(
        &self,
        path: &str,
    ) -> Result<(StatusCode, String), OrchestratorError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let response = self.request(Method::GET, &url).send().await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Ok((status, body))
    }
}

fn classify_status(status: StatusCode, body: &str) -> OrchestratorError {
    if status.is_client_error() {
        OrchestratorError::ExecutorRejected(format!("{}: {}", status, body))
    } else {
        OrchestratorError::ExecutorError(format!("{}: {}", status, body))
    }
}
