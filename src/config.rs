// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the confession service.
//!
//! Values come from environment variables (a `.env` file is loaded first if
//! present). Anything unset falls back to the defaults below.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Configuration for the confession service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:5000)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Submission allowance configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Validation configuration
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Outgoing mail configuration
    #[serde(default)]
    pub mail: MailConfig,

    /// Image rendering configuration
    #[serde(default)]
    pub render: RenderConfig,
}

/// Per-client submission allowance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum confessions per client within one reset window (default: 3)
    #[serde(default = "default_max_submissions")]
    pub max_submissions: u32,

    /// Days after the first submission before the count is forgotten (default: 60)
    #[serde(default = "default_reset_period_days")]
    pub reset_period_days: u32,
}

/// Validation configuration for submitted text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Minimum confession length in characters, after trimming (default: 10)
    #[serde(default = "default_min_length")]
    pub min_length: usize,
}

/// SMTP delivery settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// SMTPS relay host (default: smtp.gmail.com)
    #[serde(default = "default_smtp_server")]
    pub smtp_server: String,

    /// SMTPS port, implicit TLS (default: 465)
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    /// Transport timeout in seconds (default: 60)
    #[serde(default = "default_smtp_timeout_secs")]
    pub timeout_secs: u64,

    pub sender_email: Option<String>,

    #[serde(skip_serializing)]
    pub sender_password: Option<String>,

    pub receiver_email: Option<String>,
}

/// Image rendering settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Preferred scalable font. When unset, a few common system locations are tried.
    #[serde(default)]
    pub font_path: Option<PathBuf>,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_max_submissions() -> u32 {
    3
}

fn default_reset_period_days() -> u32 {
    60
}

fn default_min_length() -> usize {
    10
}

fn default_smtp_server() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    465
}

fn default_smtp_timeout_secs() -> u64 {
    60
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            rate_limit: RateLimitConfig::default(),
            validation: ValidationConfig::default(),
            mail: MailConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_submissions: default_max_submissions(),
            reset_period_days: default_reset_period_days(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_length: default_min_length(),
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            smtp_server: default_smtp_server(),
            smtp_port: default_smtp_port(),
            timeout_secs: default_smtp_timeout_secs(),
            sender_email: None,
            sender_password: None,
            receiver_email: None,
        }
    }
}

impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field("smtp_server", &self.smtp_server)
            .field("smtp_port", &self.smtp_port)
            .field("timeout_secs", &self.timeout_secs)
            .field("sender_email", &self.sender_email)
            .field("sender_password", &self.sender_password.as_ref().map(|_| "<redacted>"))
            .field("receiver_email", &self.receiver_email)
            .finish()
    }
}

impl RateLimitConfig {
    /// Get the reset window as a duration
    pub fn reset_window(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.reset_period_days))
    }
}

impl MailConfig {
    /// Get the transport timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Names of the required environment variables that are not set.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if is_blank(&self.sender_email) {
            missing.push("SENDER_EMAIL");
        }
        if is_blank(&self.sender_password) {
            missing.push("SENDER_PASSWORD");
        }
        if is_blank(&self.receiver_email) {
            missing.push("RECEIVER_EMAIL");
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

impl Config {
    /// Load configuration from the process environment, reading `.env` first.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let mut bind_addr = lookup("BIND_ADDR").unwrap_or(defaults.bind_addr);
        if let Some(port) = parse_var::<u16, _>(&lookup, "PORT")? {
            let mut addr: SocketAddr = bind_addr
                .parse()
                .map_err(|_| ConfigError::InvalidBindAddr(bind_addr.clone()))?;
            addr.set_port(port);
            bind_addr = addr.to_string();
        }

        Ok(Self {
            bind_addr,
            rate_limit: RateLimitConfig {
                max_submissions: parse_var(&lookup, "MAX_SUBMISSIONS")?
                    .unwrap_or(defaults.rate_limit.max_submissions),
                reset_period_days: parse_var(&lookup, "RESET_PERIOD_DAYS")?
                    .unwrap_or(defaults.rate_limit.reset_period_days),
            },
            validation: ValidationConfig {
                min_length: parse_var(&lookup, "MIN_CONFESSION_LENGTH")?
                    .unwrap_or(defaults.validation.min_length),
            },
            mail: MailConfig {
                smtp_server: lookup("SMTP_SERVER").unwrap_or(defaults.mail.smtp_server),
                smtp_port: parse_var(&lookup, "SMTP_PORT")?.unwrap_or(defaults.mail.smtp_port),
                timeout_secs: parse_var(&lookup, "SMTP_TIMEOUT_SECS")?
                    .unwrap_or(defaults.mail.timeout_secs),
                sender_email: lookup("SENDER_EMAIL"),
                sender_password: lookup("SENDER_PASSWORD"),
                receiver_email: lookup("RECEIVER_EMAIL"),
            },
            render: RenderConfig {
                font_path: lookup("FONT_PATH").map(PathBuf::from),
            },
        })
    }

    /// Parse the bind address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind_addr
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddr(self.bind_addr.clone()))
    }
}

fn parse_var<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:5000");
        assert_eq!(config.rate_limit.max_submissions, 3);
        assert_eq!(config.rate_limit.reset_window(), chrono::Duration::days(60));
        assert_eq!(config.validation.min_length, 10);
        assert_eq!(config.mail.smtp_server, "smtp.gmail.com");
        assert_eq!(config.mail.smtp_port, 465);
        assert_eq!(config.mail.timeout(), Duration::from_secs(60));
        assert!(config.render.font_path.is_none());
    }

    #[test]
    fn test_port_overrides_bind_addr() {
        let config = Config::from_lookup(lookup_from(&[
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("PORT", "10000"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:10000");
    }

    #[test]
    fn test_invalid_number_rejected() {
        let err = Config::from_lookup(lookup_from(&[("MAX_SUBMISSIONS", "lots")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { key: "MAX_SUBMISSIONS", .. }
        ));
    }

    #[test]
    fn test_missing_mail_fields() {
        let config = Config::from_lookup(lookup_from(&[
            ("SENDER_EMAIL", "me@example.com"),
            ("RECEIVER_EMAIL", "  "),
        ]))
        .unwrap();
        assert_eq!(
            config.mail.missing_fields(),
            vec!["SENDER_PASSWORD", "RECEIVER_EMAIL"]
        );
        assert!(!config.mail.is_complete());
    }

    #[test]
    fn test_password_redacted_in_debug() {
        let mail = MailConfig {
            sender_password: Some("hunter2".to_string()),
            ..Default::default()
        };
        let rendered = format!("{:?}", mail);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
