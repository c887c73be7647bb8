//! Native platform implementations
//!
//! Implements core platform traits using native Rust libraries:
//! - HttpClient: reqwest
//! - Clock: std::time::SystemTime
//! - Environment: process environment variables

use async_trait::async_trait;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use oidc_claims_core::error::{ApiError, Result};
use oidc_claims_core::platform::{Clock, Environment, HttpClient, HttpResponse};

const USER_AGENT: &str = concat!("oidc-claims/", env!("CARGO_PKG_VERSION"));

/// reqwest-based HTTP client
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Client whose requests (connect through body) are bounded by `timeout`
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::internal(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(client))
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

fn map_reqwest_error(context: &str, e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::UpstreamTimeout
    } else {
        ApiError::internal(format!("{}: {}", context, e))
    }
}

#[async_trait(?Send)]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse> {
        let mut builder = self.client.get(url).header("User-Agent", USER_AGENT);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| map_reqwest_error("HTTP GET failed", e))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| map_reqwest_error("failed to read response", e))?
            .to_vec();

        tracing::debug!(url, status, bytes = body.len(), "HTTP GET completed");
        Ok(HttpResponse { status, body })
    }
}

/// System clock using std::time
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_secs()
    }
}

/// Environment backed by process variables; secrets are injected as variables
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn get_var(&self, name: &str) -> Result<String> {
        std::env::var(name)
            .map_err(|_| ApiError::internal(format!("environment variable '{}' not set", name)))
    }

    fn get_secret(&self, name: &str) -> Result<String> {
        std::env::var(name)
            .map_err(|_| ApiError::internal(format!("secret '{}' not found in environment", name)))
    }
}
