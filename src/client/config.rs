// SPDX-License-Identifier: MIT

//! Client configuration

use std::env;
use std::time::Duration;

use crate::engine::error::{FlagsError, Result};
use crate::engine::types::Variable;

/// Interval between background syncs when none (or zero) is configured
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(10);

/// Per-request timeout when none (or zero) is configured
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for [`FeatureFlags`](crate::client::FeatureFlags)
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub project: String,
    /// Variables declared to the remote authority for targeting rules
    pub variables: Vec<Variable>,
    pub sync_interval: Duration,
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            project: project.into(),
            variables: Vec::new(),
            sync_interval: DEFAULT_SYNC_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Build from environment variables.
    ///
    /// Requires `FEATUREFLAGS_URL` and `FEATUREFLAGS_PROJECT`. Optionally reads
    /// `FEATUREFLAGS_SYNC_INTERVAL_SECS` and `FEATUREFLAGS_REQUEST_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        let base_url = env::var("FEATUREFLAGS_URL")
            .map_err(|_| FlagsError::config("FEATUREFLAGS_URL must be set"))?;
        let project = env::var("FEATUREFLAGS_PROJECT")
            .map_err(|_| FlagsError::config("FEATUREFLAGS_PROJECT must be set"))?;

        Self::new(base_url, project).with_env_intervals()
    }

    /// Apply `FEATUREFLAGS_SYNC_INTERVAL_SECS` / `FEATUREFLAGS_REQUEST_TIMEOUT_SECS` when set
    pub fn with_env_intervals(mut self) -> Result<Self> {
        if let Some(interval) = env_secs("FEATUREFLAGS_SYNC_INTERVAL_SECS")? {
            self.sync_interval = interval;
        }
        if let Some(timeout) = env_secs("FEATUREFLAGS_REQUEST_TIMEOUT_SECS")? {
            self.request_timeout = timeout;
        }
        Ok(self)
    }

    pub fn with_variables(mut self, variables: Vec<Variable>) -> Self {
        self.variables = variables;
        self
    }

    /// Zero falls back to [`DEFAULT_SYNC_INTERVAL`]
    pub fn with_sync_interval(mut self, interval: Duration) -> Self {
        self.sync_interval = interval;
        self
    }

    /// Zero falls back to [`DEFAULT_REQUEST_TIMEOUT`]; a client never waits forever.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn effective_sync_interval(&self) -> Duration {
        non_zero_or(self.sync_interval, DEFAULT_SYNC_INTERVAL)
    }

    pub fn effective_request_timeout(&self) -> Duration {
        non_zero_or(self.request_timeout, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Check that the base URL is usable and the project is named
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.base_url)
            .map_err(|e| FlagsError::config(format!("invalid base url {}: {}", self.base_url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FlagsError::config(format!(
                "unsupported scheme in base url: {}",
                url.scheme()
            )));
        }
        if self.project.trim().is_empty() {
            return Err(FlagsError::config("project must not be empty"));
        }
        Ok(())
    }
}

fn non_zero_or(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

/// Non-positive values are treated as unset
fn env_secs(key: &str) -> Result<Option<Duration>> {
    match env::var(key) {
        Err(_) => Ok(None),
        Ok(raw) => {
            let secs: i64 = raw
                .trim()
                .parse()
                .map_err(|_| FlagsError::config(format!("{} must be an integer, got {}", key, raw)))?;
            Ok((secs > 0).then(|| Duration::from_secs(secs as u64)))
        }
    }
}
