//! Claim resolution
//!
//! Typed and untyped lookup of id_token claims with a lazy fallback to the
//! provider's profile endpoint.

pub mod coerce;
mod extractor;
pub mod names;

pub use coerce::{ClaimTarget, ClaimValue};
pub use extractor::{ClaimExtractor, ProfileClaims, RequestHeaders};
