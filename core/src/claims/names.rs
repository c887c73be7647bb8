//! Standard claim names consumed by session assembly

/// Subject identifier
pub const SUB: &str = "sub";

/// Provider's standard email claim; email verification is only enforced for it
pub const EMAIL: &str = "email";

pub const EMAIL_VERIFIED: &str = "email_verified";

pub const GROUPS: &str = "groups";

pub const PREFERRED_USERNAME: &str = "preferred_username";

/// Per-login replay-protection value
pub const NONCE: &str = "nonce";
