//! Session/guard configuration, read from the environment.

use std::path::PathBuf;
use std::time::Duration;

use claimdesk_auth::OwnershipPolicy;
use thiserror::Error;

pub const ENV_API_URL: &str = "CLAIMDESK_API_URL";
pub const ENV_REFRESH_TIMEOUT_SECS: &str = "CLAIMDESK_REFRESH_TIMEOUT_SECS";
pub const ENV_DEFAULT_TOKEN_TTL_SECS: &str = "CLAIMDESK_DEFAULT_TOKEN_TTL_SECS";
pub const ENV_SESSION_FILE: &str = "CLAIMDESK_SESSION_FILE";
pub const ENV_OWNERSHIP_POLICY: &str = "CLAIMDESK_OWNERSHIP_POLICY";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: '{value}' ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Base URL of the remote API (without trailing slash).
    pub api_url: String,
    /// Upper bound on a single refresh call. There is exactly one attempt.
    pub refresh_timeout: Duration,
    /// Lifetime assumed for a refreshed token that carries no expiry.
    pub default_token_ttl: Duration,
    /// Location of the file-backed session store.
    pub session_file: PathBuf,
    pub ownership_policy: OwnershipPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080/api/v1".to_string(),
            refresh_timeout: Duration::from_secs(10),
            default_token_ttl: Duration::from_secs(3600),
            session_file: PathBuf::from("session.json"),
            ownership_policy: OwnershipPolicy::Legacy,
        }
    }
}

impl SessionConfig {
    /// Read `CLAIMDESK_*` variables, falling back to defaults for unset ones.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            config = config.with_api_url(url);
        }
        if let Some(raw) = lookup(ENV_REFRESH_TIMEOUT_SECS) {
            config.refresh_timeout = parse_secs(ENV_REFRESH_TIMEOUT_SECS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_DEFAULT_TOKEN_TTL_SECS) {
            config.default_token_ttl = parse_secs(ENV_DEFAULT_TOKEN_TTL_SECS, &raw)?;
        }
        if let Some(path) = lookup(ENV_SESSION_FILE).filter(|v| !v.trim().is_empty()) {
            config.session_file = PathBuf::from(path);
        }
        if let Some(raw) = lookup(ENV_OWNERSHIP_POLICY) {
            config.ownership_policy = match raw.trim().to_ascii_lowercase().as_str() {
                "legacy" => OwnershipPolicy::Legacy,
                "by_id" | "by-id" => OwnershipPolicy::ById,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: ENV_OWNERSHIP_POLICY,
                        value: raw,
                        reason: "expected 'legacy' or 'by_id'",
                    });
                }
            };
        }

        Ok(config)
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = timeout;
        self
    }

    pub fn with_default_token_ttl(mut self, ttl: Duration) -> Self {
        self.default_token_ttl = ttl;
        self
    }

    pub fn with_session_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_file = path.into();
        self
    }

    pub fn with_ownership_policy(mut self, policy: OwnershipPolicy) -> Self {
        self.ownership_policy = policy;
        self
    }
}

fn parse_secs(var: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::Invalid {
            var,
            value: raw.to_string(),
            reason: "must be greater than zero",
        }),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(_) => Err(ConfigError::Invalid {
            var,
            value: raw.to_string(),
            reason: "expected a whole number of seconds",
        }),
    }
}
