//! OIDC provider settings shared by every provider implementation
//!
//! Holds the claim-name policy, the optional id_token verifier, the profile
//! endpoint and how to authenticate against it, and the allowed-groups set
//! consumed by authorization checks.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use tracing::error;
use url::Url;

use crate::claims::{names, ClaimExtractor, RequestHeaders};
use crate::config::ProviderConfig;
use crate::error::{ApiError, Result};
use crate::oidc::{IdToken, IdTokenVerifier, Tokens};
use crate::platform::HttpClient;
use crate::session::Session;

/// Maps an access token to the headers that authenticate a profile request
pub type AuthorizationHeaderFn = Box<dyn Fn(&str) -> RequestHeaders>;

/// Values a concrete provider supplies for settings left unset
#[derive(Debug, Clone, Default)]
pub struct ProviderDefaults {
    pub name: String,
    pub profile_url: Option<Url>,
}

pub struct ProviderData {
    pub provider_name: String,
    pub profile_url: Option<Url>,
    pub client_id: String,
    pub client_secret: String,
    pub client_secret_file: Option<PathBuf>,

    pub allow_unverified_email: bool,
    pub email_claim: String,
    pub groups_claim: String,
    pub verifier: Option<Box<dyn IdTokenVerifier>>,
    /// Upper bound on each profile request
    pub profile_timeout: Option<Duration>,

    /// Empty means every authenticated user is allowed
    pub allowed_groups: HashSet<String>,

    /// Unset means profile requests are never authenticated, so skipped
    pub authorization_header_fn: Option<AuthorizationHeaderFn>,
}

impl Default for ProviderData {
    fn default() -> Self {
        Self {
            provider_name: String::new(),
            profile_url: None,
            client_id: String::new(),
            client_secret: String::new(),
            client_secret_file: None,
            allow_unverified_email: false,
            email_claim: names::EMAIL.to_string(),
            groups_claim: names::GROUPS.to_string(),
            verifier: None,
            profile_timeout: None,
            allowed_groups: HashSet::new(),
            authorization_header_fn: None,
        }
    }
}

impl ProviderData {
    /// Provider settings from loaded configuration; profile requests use a
    /// bearer `Authorization` header.
    pub fn from_config(config: ProviderConfig) -> Self {
        let mut provider = Self {
            provider_name: config.provider_name,
            profile_url: config.profile_url,
            client_id: config.client_id,
            client_secret: config.client_secret.unwrap_or_default(),
            client_secret_file: config.client_secret_file,
            allow_unverified_email: config.allow_unverified_email,
            email_claim: config.email_claim,
            groups_claim: config.groups_claim,
            profile_timeout: Some(config.profile_timeout),
            ..Default::default()
        };
        provider.set_allowed_groups(config.allowed_groups);
        provider.set_authorization_header_fn(Box::new(bearer_authorization));
        provider
    }

    pub fn with_verifier(mut self, verifier: Box<dyn IdTokenVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// Resolve the client secret, reading `client_secret_file` when no literal
    /// secret is configured.
    ///
    /// Read failures are logged with the path; the returned error never names
    /// the file.
    pub fn client_secret(&self) -> Result<String> {
        let path = match &self.client_secret_file {
            Some(path) if self.client_secret.is_empty() => path,
            _ => return Ok(self.client_secret.clone()),
        };

        std::fs::read_to_string(path).map_err(|e| {
            error!(path = %path.display(), error = %e, "error reading client secret file");
            ApiError::internal("could not read client secret file")
        })
    }

    pub fn set_allowed_groups<I, S>(&mut self, groups: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_groups = groups.into_iter().map(Into::into).collect();
    }

    /// Group authorization: allowed when no groups are configured or the
    /// session shares at least one of them.
    pub fn authorize(&self, session: &Session) -> bool {
        self.allowed_groups.is_empty()
            || session
                .groups
                .iter()
                .any(|group| self.allowed_groups.contains(group))
    }

    /// Apply provider defaults; an already configured profile URL is kept
    pub fn set_provider_defaults(&mut self, defaults: ProviderDefaults) {
        self.provider_name = defaults.name;
        self.profile_url = self.profile_url.take().or(defaults.profile_url);
    }

    pub fn with_authorization_header_fn(mut self, f: AuthorizationHeaderFn) -> Self {
        self.authorization_header_fn = Some(f);
        self
    }

    pub fn set_authorization_header_fn(&mut self, f: AuthorizationHeaderFn) {
        self.authorization_header_fn = Some(f);
    }

    /// Headers for an authenticated profile request, if one can be made
    pub fn authorization_headers(&self, access_token: &str) -> Option<RequestHeaders> {
        match &self.authorization_header_fn {
            Some(f) if !access_token.is_empty() => Some(f(access_token)),
            _ => None,
        }
    }

    /// Verify the id_token carried in `tokens`
    pub async fn verify_id_token(&self, tokens: &Tokens) -> Result<Box<dyn IdToken>> {
        let raw = tokens.id_token().unwrap_or_default();
        if raw.trim().is_empty() {
            return Err(ApiError::MissingIdToken);
        }
        let verifier = self.verifier.as_ref().ok_or(ApiError::MissingVerifier)?;
        verifier.verify(raw).await
    }

    /// Claim extractor for one authentication event
    pub fn claim_extractor<'a>(
        &self,
        id_token: &dyn IdToken,
        access_token: &str,
        http: &'a dyn HttpClient,
    ) -> Result<ClaimExtractor<'a>> {
        let extractor = ClaimExtractor::new(
            id_token,
            self.profile_url.clone(),
            self.authorization_headers(access_token),
            http,
        )?;

        Ok(match self.profile_timeout {
            Some(limit) => extractor.with_timeout(limit),
            None => extractor,
        })
    }
}

/// `Authorization: Bearer <token>`
pub fn bearer_authorization(access_token: &str) -> RequestHeaders {
    vec![(
        "Authorization".to_string(),
        format!("Bearer {}", access_token),
    )]
}
