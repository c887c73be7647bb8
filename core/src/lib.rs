//! oidc-claims-core: Platform-agnostic OIDC claim resolution and session assembly
//!
//! Resolves user attributes from a verified id_token, falling back at most once
//! to the provider's profile endpoint, coerces loosely-typed claim values into
//! typed session fields, and enforces email-verification and nonce policy. It
//! depends only on abstract platform traits (HttpClient, Clock, Environment)
//! and never imports platform-specific code.

pub mod claims;
pub mod config;
pub mod error;
pub mod oidc;
pub mod platform;
pub mod provider;
pub mod session;

pub use claims::{ClaimExtractor, ClaimTarget, ClaimValue};
pub use error::{ApiError, Result};
pub use provider::ProviderData;
pub use session::{Session, SessionAssembler};

#[cfg(test)]
pub mod test_support;
