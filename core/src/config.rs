//! Configuration and secrets management

use std::path::PathBuf;
use std::time::Duration;

use serde_json::Value;
use url::Url;

use crate::claims::{coerce, names};
use crate::error::{ApiError, Result};
use crate::platform::Environment;

/// Default upper bound on a profile endpoint request
pub const DEFAULT_PROFILE_TIMEOUT_SECS: u64 = 10;

pub const DEFAULT_PROVIDER_NAME: &str = "OpenID Connect";

/// OIDC provider settings loaded from the environment
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub provider_name: String,
    pub client_id: String,
    /// Literal client secret; takes precedence over `client_secret_file`
    pub client_secret: Option<String>,
    pub client_secret_file: Option<PathBuf>,
    pub email_claim: String,
    pub groups_claim: String,
    pub allow_unverified_email: bool,
    pub profile_url: Option<Url>,
    pub allowed_groups: Vec<String>,
    pub profile_timeout: Duration,
}

impl ProviderConfig {
    /// Load configuration from platform environment
    pub fn from_env(env: &dyn Environment) -> Result<Self> {
        let profile_url = match optional_var(env, "OIDC_PROFILE_URL") {
            Some(raw) => Some(
                Url::parse(&raw)
                    .map_err(|e| ApiError::internal(format!("OIDC_PROFILE_URL is invalid: {}", e)))?,
            ),
            None => None,
        };

        let profile_timeout = match optional_var(env, "OIDC_PROFILE_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().map(Duration::from_secs).map_err(|_| {
                ApiError::internal("OIDC_PROFILE_TIMEOUT_SECS must be a whole number of seconds")
            })?,
            None => Duration::from_secs(DEFAULT_PROFILE_TIMEOUT_SECS),
        };

        Ok(Self {
            provider_name: optional_var(env, "OIDC_PROVIDER_NAME")
                .unwrap_or_else(|| DEFAULT_PROVIDER_NAME.to_string()),
            client_id: env
                .get_var("OIDC_CLIENT_ID")
                .map_err(|_| ApiError::internal("OIDC_CLIENT_ID not configured"))?,
            client_secret: env.get_secret("OIDC_CLIENT_SECRET").ok().filter(|s| !s.is_empty()),
            client_secret_file: optional_var(env, "OIDC_CLIENT_SECRET_FILE").map(PathBuf::from),
            email_claim: optional_var(env, "OIDC_EMAIL_CLAIM")
                .unwrap_or_else(|| names::EMAIL.to_string()),
            groups_claim: optional_var(env, "OIDC_GROUPS_CLAIM")
                .unwrap_or_else(|| names::GROUPS.to_string()),
            allow_unverified_email: optional_var(env, "OIDC_ALLOW_UNVERIFIED_EMAIL")
                .map(|v| coerce::to_bool(&Value::String(v)))
                .unwrap_or(false),
            profile_url,
            allowed_groups: optional_var(env, "OIDC_ALLOWED_GROUPS")
                .map(|v| split_list(&v))
                .unwrap_or_default(),
            profile_timeout,
        })
    }
}

/// A variable that is set and not blank
fn optional_var(env: &dyn Environment, name: &str) -> Option<String> {
    env.get_var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
