//! Structured logging setup and log redaction.
//!
//! Logging goes through `tracing`; this module installs a `tracing-subscriber` registry
//! with an `EnvFilter` and a JSON (production) or pretty (development) fmt layer.
//!
//! Raw request values only reach the logs through [`Redactor`], which masks
//! credential-like fields (tokens, cookies, authorization headers) and, at the
//! [`RedactionLevel::Full`] level, personal data too.
//!
//! ## Environment Variables
//!
//! - `BRRTB_LOG_LEVEL`: trace/debug/info/warn/error (default: info)
//! - `BRRTB_LOG_FORMAT`: json/pretty (default: json)
//! - `BRRTB_LOG_TARGET_FILTER`: extra comma-separated filter directives
//! - `BRRTB_LOG_INCLUDE_LOCATION`: include file:line (default: false)
//! - `BRRTB_LOG_REDACT_LEVEL`: none/credentials/full (default: credentials)

use anyhow::{Context, Result};
use std::env;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Log format: JSON for production, pretty-print for development
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

/// Redaction level for request values written to logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedactionLevel {
    /// No redaction (dev only)
    None,
    /// Redact credentials (API keys, tokens, passwords, cookies)
    Credentials,
    /// Redact credentials + PII (emails, IPs, user IDs, names)
    Full,
}

impl RedactionLevel {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "none" => RedactionLevel::None,
            "full" => RedactionLevel::Full,
            _ => RedactionLevel::Credentials,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level: trace/debug/info/warn/error
    pub log_level: String,
    pub format: LogFormat,
    pub redact_level: RedactionLevel,
    /// Extra filter directives (comma-separated)
    pub target_filter: Option<String>,
    /// Include file:line location (dev only)
    pub include_location: bool,
}

impl LogConfig {
    /// Parse configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            log_level: lookup("BRRTB_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            format: LogFormat::parse(&lookup("BRRTB_LOG_FORMAT").unwrap_or_default()),
            redact_level: RedactionLevel::parse(
                &lookup("BRRTB_LOG_REDACT_LEVEL").unwrap_or_default(),
            ),
            target_filter: lookup("BRRTB_LOG_TARGET_FILTER"),
            include_location: lookup("BRRTB_LOG_INCLUDE_LOCATION")
                .and_then(|s| s.parse().ok())
                .unwrap_or(false),
        }
    }

    /// Configuration for local development and tests
    pub fn default_dev() -> Self {
        Self {
            log_level: "debug".to_string(),
            format: LogFormat::Pretty,
            redact_level: RedactionLevel::None,
            target_filter: None,
            include_location: true,
        }
    }

    /// Configuration for production
    pub fn default_prod() -> Self {
        Self {
            log_level: "info".to_string(),
            format: LogFormat::Json,
            redact_level: RedactionLevel::Credentials,
            target_filter: None,
            include_location: false,
        }
    }
}

const CREDENTIAL_PATTERNS: [&str; 16] = [
    "password",
    "passwd",
    "pwd",
    "secret",
    "api_key",
    "apikey",
    "api-key",
    "token",
    "authorization",
    "credentials",
    "cookie",
    "session",
    "ssn",
    "social_security_number",
    "credit_card",
    "creditcard",
];

const PII_PATTERNS: [&str; 6] = ["email", "ip", "ip_address", "user_id", "phone", "name"];

/// Masks sensitive request values before they are logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Redactor {
    level: RedactionLevel,
}

impl Redactor {
    #[must_use]
    pub fn new(level: RedactionLevel) -> Self {
        Self { level }
    }

    #[must_use]
    pub fn level(&self) -> RedactionLevel {
        self.level
    }

    /// Check if a value logged under `field_name` should be masked
    #[must_use]
    pub fn should_redact(&self, field_name: &str) -> bool {
        if self.level == RedactionLevel::None {
            return false;
        }
        let field_name = field_name.to_lowercase();
        if CREDENTIAL_PATTERNS.iter().any(|p| field_name.contains(p)) {
            return true;
        }
        self.level == RedactionLevel::Full && PII_PATTERNS.iter().any(|p| field_name.contains(p))
    }

    /// Mask a value (keys and tokens keep their first 4 chars)
    #[must_use]
    pub fn redact_value(&self, field_name: &str, value: &str) -> String {
        let keeps_prefix = field_name.contains("key") || field_name.contains("token");
        match value.char_indices().nth(4) {
            Some((cut, _)) if keeps_prefix => format!("{}***", &value[..cut]),
            _ => "<REDACTED>".to_string(),
        }
    }

    /// `value` as it may appear in logs.
    #[must_use]
    pub fn display(&self, field_name: &str, value: &str) -> String {
        if self.should_redact(field_name) {
            self.redact_value(field_name, value)
        } else {
            value.to_string()
        }
    }
}

impl Default for Redactor {
    fn default() -> Self {
        Self::new(RedactionLevel::Credentials)
    }
}

/// Initialize logging with the level given and everything else from the environment.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(log_level: &str) -> Result<()> {
    let mut config = LogConfig::from_env();
    config.log_level = log_level.to_string();
    init_logging_with_config(&config)
}

/// Initialize logging with an explicit configuration.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
///
/// # Example
///
/// ```no_run
/// use brrtbind::logging::{init_logging_with_config, LogConfig};
///
/// let config = LogConfig::from_env();
/// init_logging_with_config(&config).expect("Failed to initialize logging");
/// ```
pub fn init_logging_with_config(config: &LogConfig) -> Result<()> {
    let level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let mut env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    if let Some(target_filter) = &config.target_filter {
        for filter in target_filter.split(',') {
            let filter = filter.trim();
            if filter.is_empty() {
                continue;
            }
            match filter.parse() {
                Ok(directive) => env_filter = env_filter.add_directive(directive),
                Err(_) => eprintln!("Warning: Invalid log filter directive: {filter}"),
            }
        }
    }

    let fmt_layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_thread_ids(true)
            .with_span_list(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(())
}
