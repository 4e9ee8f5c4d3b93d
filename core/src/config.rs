//! Client configuration read from the environment.
//!
//! # Environment Variables
//!
//! - `GIG_BEARER_TOKEN`: token used to sign requests (required)
//! - `GIG_BASE_URL`: API base URL (default: https://api.twitter.com/1.1)
//! - `GIG_TIMEOUT_SECS`: per-request timeout in seconds (default: 30)

use std::env;

use crate::client::DEFAULT_BASE_URL;
use crate::error::ApiError;

#[derive(Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub bearer_token: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            bearer_token: String::new(),
            timeout_secs: 30,
            user_agent: concat!("gig/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("bearer_token", &"<secret>")
            .field("timeout_secs", &self.timeout_secs)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source; `from_env` passes the process
    /// environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let mut config = Self::default();

        config.bearer_token = lookup("GIG_BEARER_TOKEN").unwrap_or_default();
        config.validate()?;

        if let Some(base_url) = lookup("GIG_BASE_URL") {
            config.base_url = base_url;
        }
        if let Some(timeout) = lookup("GIG_TIMEOUT_SECS") {
            config.timeout_secs = timeout.trim().parse().map_err(|_| {
                ApiError::Config(format!("GIG_TIMEOUT_SECS is not a number: {timeout}"))
            })?;
        }
        Ok(config)
    }

    /// Every request needs a credential; an empty or blank token is rejected.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.bearer_token.trim().is_empty() {
            return Err(ApiError::Config("GIG_BEARER_TOKEN is not set".to_string()));
        }
        Ok(())
    }
}
