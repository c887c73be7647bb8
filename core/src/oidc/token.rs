//! Verified identity token capability
//!
//! Signature and expiry checks belong to an external verifier. Once a token has
//! been accepted, claim resolution only needs its payload as a generic map.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::{ApiError, Result};

/// An identity token that an [`IdTokenVerifier`] has already accepted
pub trait IdToken {
    /// Decode the claim payload into a generic key/value mapping
    fn claims(&self) -> Result<Map<String, Value>>;
}

/// External signature/expiry verifier for raw identity tokens
#[async_trait(?Send)]
pub trait IdTokenVerifier {
    async fn verify(&self, raw_id_token: &str) -> Result<Box<dyn IdToken>>;
}

/// Tokens returned by the provider's token endpoint
#[derive(Debug, Clone, Default)]
pub struct Tokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub id_token: Option<String>,
    pub expires_in: Option<u64>,
}

impl Tokens {
    /// Raw id_token, if the provider returned one
    pub fn id_token(&self) -> Option<&str> {
        self.id_token.as_deref()
    }
}

/// Compact JWT whose signature was checked by the caller's verifier
#[derive(Debug, Clone)]
pub struct JwtIdToken {
    raw: String,
}

impl JwtIdToken {
    pub fn from_verified(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }
}

impl IdToken for JwtIdToken {
    fn claims(&self) -> Result<Map<String, Value>> {
        let parts: Vec<&str> = self.raw.split('.').collect();
        if parts.len() != 3 {
            return Err(ApiError::invalid_token("invalid JWT format"));
        }

        let payload = base64_url_decode(parts[1])?;
        serde_json::from_slice(&payload)
            .map_err(|e| ApiError::invalid_token(format!("invalid JWT claims: {}", e)))
    }
}

/// Base64 URL decode, tolerating padded input
fn base64_url_decode(input: &str) -> Result<Vec<u8>> {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    URL_SAFE_NO_PAD
        .decode(input)
        .or_else(|_| {
            use base64::engine::general_purpose::URL_SAFE;
            URL_SAFE.decode(input)
        })
        .map_err(|e| ApiError::invalid_token(format!("invalid base64: {}", e)))
}
