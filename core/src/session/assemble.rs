//! Session assembly from id_token claims

use tracing::{debug, warn};

use super::Session;
use crate::claims::names;
use crate::error::{ApiError, Result};
use crate::oidc::{IdToken, Tokens};
use crate::platform::{Clock, HttpClient};
use crate::provider::ProviderData;

/// Builds sessions for one provider
pub struct SessionAssembler<'a> {
    provider: &'a ProviderData,
    http: &'a dyn HttpClient,
}

impl<'a> SessionAssembler<'a> {
    pub fn new(provider: &'a ProviderData, http: &'a dyn HttpClient) -> Self {
        Self { provider, http }
    }

    /// Populate a fresh session with the user attributes found in the
    /// id_token, falling back to the profile endpoint for missing claims.
    ///
    /// Without an id_token the session is empty. When the provider's standard
    /// email claim is in use and unverified emails are not allowed, an
    /// explicit `email_verified: false` rejects the session; an absent
    /// `email_verified` does not.
    pub async fn build_session_from_claims(
        &self,
        id_token: Option<&dyn IdToken>,
        access_token: &str,
    ) -> Result<Session> {
        let Some(id_token) = id_token else {
            return Ok(Session::default());
        };

        let mut extractor = self
            .provider
            .claim_extractor(id_token, access_token, self.http)?;

        let mut session = Session {
            user: extractor.get_string(names::SUB).await?.unwrap_or_default(),
            email: extractor
                .get_string(&self.provider.email_claim)
                .await?
                .unwrap_or_default(),
            groups: extractor
                .get_string_list(&self.provider.groups_claim)
                .await?
                .unwrap_or_default(),
            ..Default::default()
        };
        session.preferred_username = extractor
            .get_string(names::PREFERRED_USERNAME)
            .await?
            .unwrap_or_default();

        let verify_email =
            self.provider.email_claim == names::EMAIL && !self.provider.allow_unverified_email;

        if verify_email {
            if let Some(false) = extractor.get_bool(names::EMAIL_VERIFIED).await? {
                warn!(user = %session.user, email = %session.email, "rejecting unverified email");
                return Err(ApiError::unverified_email(session.email));
            }
        }

        debug!(
            user = %session.user,
            groups = session.groups.len(),
            "built session from id_token claims"
        );
        Ok(session)
    }

    /// Compare the id_token's `nonce` claim against the session's stored nonce
    pub async fn check_nonce(&self, session: &Session, id_token: &dyn IdToken) -> Result<()> {
        let mut extractor = self.provider.claim_extractor(id_token, "", self.http)?;
        let nonce = extractor.get_string(names::NONCE).await?.unwrap_or_default();

        if !session.check_nonce(&nonce) {
            warn!(user = %session.user, "id_token nonce mismatch");
            return Err(ApiError::NonceMismatch);
        }
        Ok(())
    }

    /// Verify the exchanged id_token and build a session carrying the tokens
    pub async fn create_session(&self, tokens: &Tokens, clock: &dyn Clock) -> Result<Session> {
        let id_token = self.provider.verify_id_token(tokens).await?;
        let mut session = self
            .build_session_from_claims(Some(id_token.as_ref()), &tokens.access_token)
            .await?;
        session.apply_tokens(tokens, clock);
        Ok(session)
    }
}
