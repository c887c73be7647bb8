//! OIDC (OpenID Connect) module
//!
//! Interface to the external id_token verifier and the verified-token
//! capability that claim resolution consumes.

mod token;

pub use token::{IdToken, IdTokenVerifier, JwtIdToken, Tokens};
