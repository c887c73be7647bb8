//! oidc-claims-native: native platform adapters for oidc-claims-core
//!
//! Provides a reqwest-backed profile client, the system clock, process
//! environment access, and tracing setup for services running on tokio.

pub mod observability;
pub mod platform;

pub use observability::init_tracing;
pub use platform::{ProcessEnv, ReqwestHttpClient, SystemClock};
