//! Exchange of a refresh token for a new access token, and remote logout.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Credential returned by a successful refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshedToken {
    pub access_token: String,

    /// Present when the auth service rotates refresh tokens.
    #[serde(default)]
    pub refresh_token: Option<String>,

    #[serde(default, alias = "expiresAt")]
    pub expiration: Option<DateTime<Utc>>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RefreshError {
    /// The auth service refused the refresh token (expired, revoked, unknown).
    #[error("refresh rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid refresh response: {0}")]
    InvalidResponse(String),
}

/// Seam to the remote auth service.
#[async_trait::async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedToken, RefreshError>;

    /// End the server-side session that issued `access_token`.
    async fn revoke(&self, access_token: &str) -> Result<(), RefreshError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// `POST {api_url}/auth/refresh-token` over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTokenRefresher {
    client: reqwest::Client,
    api_url: String,
}

impl HttpTokenRefresher {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Build with a client-level request timeout.
    pub fn with_timeout(api_url: impl Into<String>, timeout: Duration) -> Result<Self, RefreshError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RefreshError::Network(e.to_string()))?;
        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/auth/refresh-token", self.api_url)
    }

    fn logout_endpoint(&self) -> String {
        format!("{}/auth/logout", self.api_url)
    }
}

#[async_trait::async_trait]
impl TokenRefresher for HttpTokenRefresher {
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedToken, RefreshError> {
        let resp = self
            .client
            .post(self.endpoint())
            .json(&RefreshRequest { refresh_token })
            .send()
            .await
            .map_err(|e| RefreshError::Network(e.to_string()))?;

        let status = resp.status();
        if status.is_client_error() {
            return Err(RefreshError::Rejected {
                status: status.as_u16(),
                message: resp.text().await.unwrap_or_default(),
            });
        }
        if !status.is_success() {
            return Err(RefreshError::Network(format!("auth service returned {status}")));
        }

        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| RefreshError::InvalidResponse(e.to_string()))?;
        parse_refresh_body(body)
    }

    async fn revoke(&self, access_token: &str) -> Result<(), RefreshError> {
        let resp = self
            .client
            .post(self.logout_endpoint())
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| RefreshError::Network(e.to_string()))?;

        let status = resp.status();
        if status.is_client_error() {
            return Err(RefreshError::Rejected {
                status: status.as_u16(),
                message: resp.text().await.unwrap_or_default(),
            });
        }
        if !status.is_success() {
            return Err(RefreshError::Network(format!("auth service returned {status}")));
        }
        Ok(())
    }
}

/// Accepts both the bare `{accessToken, ...}` shape and the API envelope
/// `{is_success, data: {accessToken, ...}}`.
fn parse_refresh_body(body: serde_json::Value) -> Result<RefreshedToken, RefreshError> {
    let payload = match body.get("data") {
        Some(data) if data.is_object() => data.clone(),
        _ => body,
    };
    let token: RefreshedToken =
        serde_json::from_value(payload).map_err(|e| RefreshError::InvalidResponse(e.to_string()))?;
    if token.access_token.trim().is_empty() {
        return Err(RefreshError::InvalidResponse("empty accessToken".to_string()));
    }
    Ok(token)
}
