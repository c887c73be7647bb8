//! Session construction
//!
//! Turns a verified id_token (and optionally an access token for the profile
//! endpoint) into the application's session, enforcing email verification and
//! nonce consistency.

mod assemble;
mod state;

pub use assemble::SessionAssembler;
pub use state::Session;
