//! Error types and HTTP response mapping

use serde::Serialize;
use thiserror::Error;

/// Result type alias for claim and session operations
pub type Result<T> = std::result::Result<T, ApiError>;

/// Classified failure for claim extraction and session assembly
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// `claim` names the lookup that surfaced the failure, when known
    #[error("{}", profile_fetch_message(.claim.as_deref(), .message))]
    ProfileFetch {
        claim: Option<String>,
        message: String,
    },

    #[error("could not coerce claim '{claim}': {message}")]
    Coercion { claim: String, message: String },

    #[error("email in id_token ({email}) isn't verified")]
    UnverifiedEmail { email: String },

    #[error("id_token nonce claim does not match the session nonce")]
    NonceMismatch,

    #[error("id_token verifier is not configured")]
    MissingVerifier,

    #[error("missing id_token")]
    MissingIdToken,

    #[error("invalid token: {message}")]
    InvalidToken { message: String },

    #[error("internal error: {message}")]
    Internal { message: String },

    #[error("upstream timeout")]
    UpstreamTimeout,
}

impl ApiError {
    pub fn profile_fetch(message: impl Into<String>) -> Self {
        Self::ProfileFetch {
            claim: None,
            message: message.into(),
        }
    }

    /// Attach the claim name to a profile failure; other errors pass through
    pub fn for_claim(self, claim: &str) -> Self {
        match self {
            Self::ProfileFetch { message, .. } => Self::ProfileFetch {
                claim: Some(claim.to_string()),
                message,
            },
            other => other,
        }
    }

    pub fn coercion(claim: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Coercion {
            claim: claim.into(),
            message: message.into(),
        }
    }

    pub fn unverified_email(email: impl Into<String>) -> Self {
        Self::UnverifiedEmail {
            email: email.into(),
        }
    }

    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::ProfileFetch { .. } => 502,
            Self::Coercion { .. } => 500,
            Self::UnverifiedEmail { .. } => 403,
            Self::NonceMismatch => 401,
            Self::MissingVerifier => 500,
            Self::MissingIdToken => 401,
            Self::InvalidToken { .. } => 401,
            Self::Internal { .. } => 500,
            Self::UpstreamTimeout => 504,
        }
    }

    /// Get the error key for this error
    pub fn error_key(&self) -> &'static str {
        match self {
            Self::ProfileFetch { .. } => "profile_fetch_failed",
            Self::Coercion { .. } => "claim_coercion_failed",
            Self::UnverifiedEmail { .. } => "unverified_email",
            Self::NonceMismatch => "nonce_mismatch",
            Self::MissingVerifier => "missing_verifier",
            Self::MissingIdToken => "missing_id_token",
            Self::InvalidToken { .. } => "invalid_token",
            Self::Internal { .. } => "internal_error",
            Self::UpstreamTimeout => "upstream_timeout",
        }
    }

    /// Build the body a caller renders for this error
    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.error_key().to_string(),
            message: self.to_string(),
        }
    }
}

fn profile_fetch_message(claim: Option<&str>, message: &str) -> String {
    match claim {
        Some(claim) => format!(
            "could not get claim \"{}\": failed to fetch claims from profile URL: {}",
            claim, message
        ),
        None => format!("failed to fetch claims from profile URL: {}", message),
    }
}

/// Error response body
#[derive(Serialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
