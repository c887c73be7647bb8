//! Claim lookup across the id_token and the provider's profile endpoint
//!
//! Token claims always win. The profile document is consulted only after a
//! token-claim miss and is requested at most once per extractor, whether that
//! request succeeds, fails, or is skipped because no endpoint or credentials
//! are available.

use std::time::Duration;

use serde_json::{Map, Value};
use tracing::{debug, warn};
use url::Url;

use super::coerce::{coerce, ClaimTarget, ClaimValue};
use crate::error::{ApiError, Result};
use crate::oidc::IdToken;
use crate::platform::HttpClient;

/// Upstream body characters kept in a profile error message
const ERROR_BODY_LIMIT: usize = 256;

/// Header name/value pairs sent with the profile request
pub type RequestHeaders = Vec<(String, String)>;

/// Resolution state of the profile document
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileClaims {
    Unfetched,
    /// Fetched, or skipped and memoised as empty
    Fetched(Map<String, Value>),
    /// Fetch attempted and failed; the error is replayed without refetching
    Failed(ApiError),
}

/// Claims available to one authentication event
pub struct ClaimExtractor<'a> {
    token_claims: Map<String, Value>,
    profile_url: Option<Url>,
    request_headers: Option<RequestHeaders>,
    timeout: Option<Duration>,
    http: &'a dyn HttpClient,
    profile: ProfileClaims,
}

impl<'a> ClaimExtractor<'a> {
    /// Build an extractor over the claims of an already-verified id_token.
    ///
    /// `request_headers` of `None` means no authenticated profile request can
    /// be made, so the profile is treated as empty.
    pub fn new(
        id_token: &dyn IdToken,
        profile_url: Option<Url>,
        request_headers: Option<RequestHeaders>,
        http: &'a dyn HttpClient,
    ) -> Result<Self> {
        let token_claims = id_token.claims().map_err(|e| {
            ApiError::invalid_token(format!("failed to extract claims from ID Token: {}", e))
        })?;

        Ok(Self {
            token_claims,
            profile_url,
            request_headers,
            timeout: None,
            http,
            profile: ProfileClaims::Unfetched,
        })
    }

    /// Bound the profile request; expiry surfaces as [`ApiError::UpstreamTimeout`]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn profile_state(&self) -> &ProfileClaims {
        &self.profile
    }

    /// Look up the raw value of a claim.
    ///
    /// Returns `Ok(None)` for an empty claim name or a claim present in neither
    /// source. Errors only when the profile request fails.
    pub async fn get_claim(&mut self, claim: &str) -> Result<Option<Value>> {
        if claim.is_empty() {
            return Ok(None);
        }

        if let Some(value) = self.token_claims.get(claim) {
            return Ok(Some(value.clone()));
        }

        if matches!(self.profile, ProfileClaims::Unfetched) {
            self.profile = match self.fetch_profile_claims().await {
                Ok(claims) => ProfileClaims::Fetched(claims),
                Err(e) => {
                    warn!(claim = %claim, error = %e, "profile claim lookup failed");
                    ProfileClaims::Failed(e)
                }
            };
        }

        match &self.profile {
            ProfileClaims::Fetched(claims) => Ok(claims.get(claim).cloned()),
            ProfileClaims::Failed(e) => Err(e.clone()),
            ProfileClaims::Unfetched => Ok(None),
        }
    }

    /// Look up a claim and coerce it into the requested shape.
    ///
    /// Profile failures are reported against `claim`.
    pub async fn get_claim_into(
        &mut self,
        claim: &str,
        target: ClaimTarget,
    ) -> Result<Option<ClaimValue>> {
        let Some(value) = self.get_claim(claim).await.map_err(|e| e.for_claim(claim))? else {
            return Ok(None);
        };

        coerce(&value, target)
            .map(Some)
            .map_err(|e| ApiError::coercion(claim, e))
    }

    pub async fn get_string(&mut self, claim: &str) -> Result<Option<String>> {
        self.get_claim_into(claim, ClaimTarget::String)
            .await?
            .map(|v| v.into_string().map_err(|e| ApiError::coercion(claim, e)))
            .transpose()
    }

    pub async fn get_string_list(&mut self, claim: &str) -> Result<Option<Vec<String>>> {
        self.get_claim_into(claim, ClaimTarget::StringList)
            .await?
            .map(|v| v.into_string_list().map_err(|e| ApiError::coercion(claim, e)))
            .transpose()
    }

    pub async fn get_bool(&mut self, claim: &str) -> Result<Option<bool>> {
        self.get_claim_into(claim, ClaimTarget::Bool)
            .await?
            .map(|v| v.into_bool().map_err(|e| ApiError::coercion(claim, e)))
            .transpose()
    }

    async fn fetch_profile_claims(&self) -> Result<Map<String, Value>> {
        let (url, headers) = match (&self.profile_url, &self.request_headers) {
            (Some(url), Some(headers)) => (url, headers),
            _ => {
                debug!("no profile URL or request headers, skipping profile claims");
                return Ok(Map::new());
            }
        };

        let mut request_headers: Vec<(&str, &str)> = vec![("Accept", "application/json")];
        request_headers.extend(headers.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        debug!(url = %url, "fetching profile claims");
        let request = self.http.get(url.as_str(), &request_headers);
        let response = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, request)
                .await
                .map_err(|_| ApiError::UpstreamTimeout)?,
            None => request.await,
        }
        .map_err(|e| match e {
            ApiError::UpstreamTimeout => e,
            other => ApiError::profile_fetch(format!(
                "error making request to profile URL: {}",
                other
            )),
        })?;

        if response.status != 200 {
            let body = response.text().unwrap_or_default();
            debug!(status = response.status, body = %body, "profile endpoint rejected request");
            return Err(ApiError::profile_fetch(format!(
                "unexpected status \"{}\": {}",
                response.status,
                truncate(&body, ERROR_BODY_LIMIT)
            )));
        }

        response
            .json::<Map<String, Value>>()
            .map_err(|e| ApiError::profile_fetch(format!("invalid profile document: {}", e)))
    }
}

fn truncate(body: &str, limit: usize) -> String {
    match body.char_indices().nth(limit) {
        Some((end, _)) => format!("{}...", &body[..end]),
        None => body.to_string(),
    }
}
