use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use claimdesk_auth::{decode_claims, validate_claims};

/// A persisted login session.
///
/// Field names match the keys of the local store (`token`, `refreshToken`,
/// `tokenExpiration`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "token")]
    pub access_token: String,

    #[serde(rename = "refreshToken", default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    #[serde(rename = "tokenExpiration", default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: Some(refresh_token.into()),
            expires_at: Some(expires_at),
        }
    }

    /// Stored expiry, falling back to the access token's `exp` claim.
    pub fn effective_expiry(&self) -> Option<DateTime<Utc>> {
        self.expires_at
            .or_else(|| claimdesk_auth::token_expiry(&self.access_token))
    }

    /// Expired when the expiry is at or before `now`, or cannot be determined.
    ///
    /// Without a stored expiry the token's own claims decide; a token whose
    /// `exp` is not after its `iat` counts as expired.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(exp) => exp <= now,
            None => match decode_claims(&self.access_token) {
                Ok(claims) => validate_claims(&claims, now).is_err(),
                Err(_) => true,
            },
        }
    }
}
