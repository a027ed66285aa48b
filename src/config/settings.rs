//! Application settings and configuration
//!
//! Settings shared by every entry point, loaded from environment variables
//! with sensible defaults. Values are read through a lookup function so the
//! same code path serves the process environment and tests.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

use crate::error::ConfigError;
use crate::waiter::{BackoffPolicy, PollingPolicies};

/// Main application settings
#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    // App settings
    pub app_name: String,
    pub app_version: String,
    pub log_level: String,

    // AWS settings
    pub aws_region: String,
    pub glue_endpoint_url: Option<String>,
    pub bedrock_agent_endpoint_url: Option<String>,

    // Polling
    #[serde(skip)]
    pub polling: BackoffPolicy,
}

impl Settings {
    /// Load settings from environment variables with defaults
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists (absent in Lambda)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load settings from an arbitrary key/value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let polling = BackoffPolicy::new()
            .with_initial_interval(Duration::from_secs(parse_or(
                &lookup,
                "POLL_INITIAL_INTERVAL_SECS",
                5u64,
            )?))
            .with_max_interval(Duration::from_secs(parse_or(
                &lookup,
                "POLL_MAX_INTERVAL_SECS",
                60u64,
            )?))
            .with_max_attempts(parse_or(&lookup, "POLL_MAX_ATTEMPTS", 10u32)?)
            .with_multiplier(parse_or(&lookup, "POLL_MULTIPLIER", 2.0f64)?);

        let settings = Self {
            app_name: or_default(&lookup, "APP_NAME", "agent-provisioner"),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            log_level: or_default(&lookup, "LOG_LEVEL", "info"),
            aws_region: or_default(&lookup, "AWS_REGION", "us-east-1"),
            glue_endpoint_url: optional(&lookup, "GLUE_ENDPOINT_URL"),
            bedrock_agent_endpoint_url: optional(&lookup, "BEDROCK_AGENT_ENDPOINT_URL"),
            polling,
        };

        settings.validate()?;

        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.polling
            .validate()
            .map_err(|reason| ConfigError::Invalid {
                key: "POLL_*",
                value: format!("{:?}", self.polling),
                reason,
            })
    }

    /// Per-operation polling policies derived from the shared default
    pub fn polling_policies(&self) -> PollingPolicies {
        PollingPolicies::new(self.polling.clone())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_name: "agent-provisioner".to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            log_level: "info".to_string(),
            aws_region: "us-east-1".to_string(),
            glue_endpoint_url: None,
            bedrock_agent_endpoint_url: None,
            polling: BackoffPolicy::default(),
        }
    }
}

/// Value for `key`, treating empty strings as unset
pub(crate) fn optional<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|value| !value.trim().is_empty())
}

pub(crate) fn or_default<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, key).unwrap_or_else(|| default.to_string())
}

pub(crate) fn required<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, key).ok_or(ConfigError::Missing(key))
}

/// Parse `key` if set, otherwise use `default`. Malformed values are errors.
pub(crate) fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional(lookup, key) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings.app_name, "agent-provisioner");
        assert_eq!(settings.log_level, "info");
        assert_eq!(settings.aws_region, "us-east-1");
        assert_eq!(settings.polling, BackoffPolicy::default());
        assert!(settings.glue_endpoint_url.is_none());
    }

    #[test]
    fn test_polling_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            ("POLL_INITIAL_INTERVAL_SECS", "2"),
            ("POLL_MAX_INTERVAL_SECS", "30"),
            ("POLL_MAX_ATTEMPTS", "20"),
            ("POLL_MULTIPLIER", "1.5"),
            ("AWS_REGION", "eu-west-1"),
        ]))
        .unwrap();

        assert_eq!(settings.polling.initial_interval, Duration::from_secs(2));
        assert_eq!(settings.polling.max_interval, Duration::from_secs(30));
        assert_eq!(settings.polling.max_attempts, 20);
        assert_eq!(settings.polling.multiplier, 1.5);
        assert_eq!(settings.aws_region, "eu-west-1");
    }

    #[test]
    fn test_malformed_number_is_rejected() {
        let err = Settings::from_lookup(lookup(&[("POLL_MAX_ATTEMPTS", "ten")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { key: "POLL_MAX_ATTEMPTS", .. }
        ));
    }

    #[test]
    fn test_invalid_policy_is_rejected() {
        let err = Settings::from_lookup(lookup(&[("POLL_MAX_ATTEMPTS", "0")])).unwrap_err();
        assert!(err.to_string().contains("max_attempts"));
    }

    #[test]
    fn test_empty_values_fall_back_to_defaults() {
        let settings = Settings::from_lookup(lookup(&[("LOG_LEVEL", "  ")])).unwrap();
        assert_eq!(settings.log_level, "info");
    }
}
