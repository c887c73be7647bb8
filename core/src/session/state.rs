//! Session record derived from one authentication event

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use subtle::ConstantTimeEq;

use crate::oidc::Tokens;
use crate::platform::Clock;

/// Authenticated user attributes plus the tokens they were derived from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Subject identifier (`sub`)
    pub user: String,
    pub email: String,
    pub groups: Vec<String>,
    pub preferred_username: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub access_token: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id_token: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub refresh_token: String,
    /// Nonce issued with the login request
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub nonce: String,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expires_on: Option<DateTime<Utc>>,
}

impl Session {
    /// Exact match of a token's nonce against the stored one.
    ///
    /// A session without a stored nonce never matches.
    pub fn check_nonce(&self, nonce: &str) -> bool {
        !self.nonce.is_empty() && bool::from(self.nonce.as_bytes().ct_eq(nonce.as_bytes()))
    }

    /// Copy token material onto the session and stamp its lifetime
    pub fn apply_tokens(&mut self, tokens: &Tokens, clock: &dyn Clock) {
        self.access_token = tokens.access_token.clone();
        self.id_token = tokens.id_token.clone().unwrap_or_default();
        self.refresh_token = tokens.refresh_token.clone().unwrap_or_default();

        let now = clock.now_secs();
        self.created_at = timestamp(now);
        self.expires_on = tokens
            .expires_in
            .and_then(|secs| timestamp(now.saturating_add(secs)));
    }

    pub fn is_expired(&self, clock: &dyn Clock) -> bool {
        match self.expires_on {
            Some(expires_on) => expires_on.timestamp() <= clock.now_secs() as i64,
            None => false,
        }
    }

    /// Time since the session was created, if known
    pub fn age(&self, clock: &dyn Clock) -> Option<Duration> {
        let created = self.created_at?.timestamp();
        let elapsed = (clock.now_secs() as i64).checked_sub(created)?;
        u64::try_from(elapsed).ok().map(Duration::from_secs)
    }
}

fn timestamp(secs: u64) -> Option<DateTime<Utc>> {
    let secs = i64::try_from(secs).ok()?;
    Utc.timestamp_opt(secs, 0).single()
}
