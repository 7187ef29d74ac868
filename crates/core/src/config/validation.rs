//! Configuration validation rules.
//!
//! Checks `AppConfig` values after they have been loaded from environment,
//! files, or defaults.

use std::collections::HashSet;

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `version` is empty or contains whitespace
    /// - `origin` is not an http(s) URL
    /// - a manifest path does not start with `/` or appears twice
    /// - `max_bytes` is 0 or exceeds 100MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    ///
    /// Returns `ConfigError::Missing` if the manifest is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version.is_empty() || self.version.chars().any(char::is_whitespace) {
            return Err(ConfigError::Invalid {
                field: "version".into(),
                reason: "must be non-empty and contain no whitespace".into(),
            });
        }

        self.origin_url()?;

        if self.manifest.is_empty() {
            return Err(ConfigError::Missing {
                field: "manifest".into(),
                hint: "list at least the app shell root, e.g. [\"/\"]".into(),
            });
        }
        let mut seen = HashSet::new();
        for path in &self.manifest {
            if !path.starts_with('/') {
                return Err(ConfigError::Invalid {
                    field: "manifest".into(),
                    reason: format!("path {path:?} must start with '/'"),
                });
            }
            if !seen.insert(path.as_str()) {
                return Err(ConfigError::Invalid {
                    field: "manifest".into(),
                    reason: format!("path {path:?} listed more than once"),
                });
            }
        }

        if self.max_bytes == 0 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must be greater than 0".into() });
        }
        if self.max_bytes > 100 * 1024 * 1024 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must not exceed 100MB".into() });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if !self.manifest.iter().any(|p| p == "/index.html") {
            tracing::warn!(
                manifest_len = self.manifest.len(),
                "manifest does not preload /index.html; offline navigation fallback will be unavailable"
            );
        }

        Ok(())
    }
}
