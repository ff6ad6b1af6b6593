//! Access-token claims (decode-only).
//!
//! The API issues JWT access tokens. Signature verification is the server's
//! job; the client only reads the payload to learn when the token expires.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The subset of JWT registered claims the client cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Expiration (seconds since the epoch).
    pub exp: i64,

    /// Issued-at (seconds since the epoch).
    #[serde(default)]
    pub iat: Option<i64>,

    #[serde(default)]
    pub sub: Option<String>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token is not a three-part JWT")]
    Malformed,

    #[error("token payload is not valid base64url: {0}")]
    Encoding(String),

    #[error("token payload is not valid JSON claims: {0}")]
    Payload(String),

    #[error("token has expired")]
    Expired,

    #[error("invalid token time window (exp <= iat)")]
    InvalidTimeWindow,
}

impl AccessTokenClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }
}

/// Decode the payload segment of a JWT without verifying its signature.
pub fn decode_claims(token: &str) -> Result<AccessTokenClaims, TokenValidationError> {
    let mut parts = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(TokenValidationError::Malformed);
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| TokenValidationError::Encoding(e.to_string()))?;

    serde_json::from_slice(&bytes).map_err(|e| TokenValidationError::Payload(e.to_string()))
}

/// Expiry of a token, if it can be read from its payload.
pub fn token_expiry(token: &str) -> Option<DateTime<Utc>> {
    decode_claims(token).ok().and_then(|c| c.expires_at())
}

/// Deterministically validate the time window of decoded claims.
///
/// A token whose `exp` is at or before `now` is expired.
pub fn validate_claims(claims: &AccessTokenClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if let Some(iat) = claims.iat {
        if claims.exp <= iat {
            return Err(TokenValidationError::InvalidTimeWindow);
        }
    }
    if claims.exp <= now.timestamp() {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}
