//! HTTP client for the claim request API with the 401 refresh-and-retry path.

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde_json::Value as JsonValue;
use thiserror::Error;

use claimdesk_auth::{ActionCommand, ActionKind};

use crate::error::SessionError;
use crate::guard::{Attempt, SessionGuard};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid response body: {0}")]
    Decode(String),

    #[error("action '{0}' has no API endpoint")]
    NoEndpoint(ActionKind),
}

impl ClientError {
    /// Whether the failure means the user has to log in again.
    pub fn requires_login(&self) -> bool {
        matches!(self, ClientError::Session(err) if err.requires_login())
    }
}

/// API client whose every request goes through the session guard.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    api_url: String,
    guard: Arc<SessionGuard>,
}

impl ApiClient {
    pub fn new(api_url: impl Into<String>, guard: Arc<SessionGuard>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            guard,
        }
    }

    pub fn guard(&self) -> &SessionGuard {
        &self.guard
    }

    /// Send a request with the current bearer token. A 401 triggers one
    /// refresh and one retry; an empty success body decodes as `null`.
    pub async fn send(&self, method: Method, path: &str, body: Option<&JsonValue>) -> Result<JsonValue, ClientError> {
        let url = format!("{}/{}", self.api_url, path.trim_start_matches('/'));

        self.guard
            .run_authorized(|token| {
                let mut req = self.http.request(method.clone(), &url).bearer_auth(token);
                if let Some(body) = body {
                    req = req.json(body);
                }
                async move {
                    let resp = req.send().await.map_err(|e| ClientError::Network(e.to_string()))?;
                    let status = resp.status();
                    if status == StatusCode::UNAUTHORIZED {
                        return Ok(Attempt::Unauthorized);
                    }
                    if !status.is_success() {
                        return Err(ClientError::Api {
                            status: status.as_u16(),
                            message: resp.text().await.unwrap_or_default(),
                        });
                    }

                    let bytes = resp.bytes().await.map_err(|e| ClientError::Network(e.to_string()))?;
                    if bytes.is_empty() {
                        return Ok(Attempt::Done(JsonValue::Null));
                    }
                    serde_json::from_slice(&bytes)
                        .map(Attempt::Done)
                        .map_err(|e| ClientError::Decode(e.to_string()))
                }
            })
            .await
    }

    pub async fn get(&self, path: &str) -> Result<JsonValue, ClientError> {
        self.send(Method::GET, path, None).await
    }

    /// Send an authorized action command to its endpoint.
    pub async fn dispatch(&self, command: &ActionCommand) -> Result<JsonValue, ClientError> {
        let endpoint = command.endpoint().ok_or(ClientError::NoEndpoint(command.action))?;
        let method = Method::from_bytes(endpoint.method.as_bytes()).unwrap_or(Method::PUT);
        let body = command.body();

        tracing::info!(action = %command.action, path = %endpoint.path, "dispatching action command");
        self.send(method, &endpoint.path, (!body.is_null()).then_some(&body))
            .await
    }
}
