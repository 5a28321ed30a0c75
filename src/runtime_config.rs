//! # Runtime Configuration Module
//!
//! Environment variable-based configuration for request binding.
//!
//! ## Environment Variables
//!
//! ### `BRRTB_MAX_BODY_BYTES`
//!
//! Largest request body the binder will decode. Accepts values in:
//! - Decimal: `1048576` (1 MiB)
//! - Hexadecimal: `0x100000` (1 MiB)
//!
//! Default: `0x100000` (1 MiB). Larger bodies fail binding with a constraint error on
//! the `body` field.
//!
//! ### `BRRTB_ERROR_STATUS`
//!
//! HTTP status returned when binding fails. Must be a 4xx code; anything else falls
//! back to the default.
//!
//! Default: `422`
//!
//! ## Usage
//!
//! ```rust
//! use brrtbind::runtime_config::BindConfig;
//!
//! let config = BindConfig::from_env();
//! println!("Max body: {} bytes", config.max_body_bytes);
//! ```
//!
//! ## Example Configuration
//!
//! ```bash
//! export BRRTB_MAX_BODY_BYTES=0x8000
//! export BRRTB_ERROR_STATUS=400
//! brrtbind bind --routes demos/tutorial_routes.yaml --method GET --url /items/
//! ```

use std::env;
use tracing::warn;

/// Default body limit: 1 MiB
pub const DEFAULT_MAX_BODY_BYTES: usize = 0x10_0000;

/// Default status for bind failures
pub const DEFAULT_ERROR_STATUS: u16 = 422;

/// Binder configuration loaded from environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindConfig {
    /// Largest body decoded, in bytes (default: 1 MiB / 0x100000)
    pub max_body_bytes: usize,
    /// Status of the error response when binding fails (default: 422)
    pub error_status: u16,
}

impl Default for BindConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            error_status: DEFAULT_ERROR_STATUS,
        }
    }
}

impl BindConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let max_body_bytes = match lookup("BRRTB_MAX_BODY_BYTES") {
            Some(val) => parse_size(&val).unwrap_or_else(|| {
                warn!(value = %val, "Invalid BRRTB_MAX_BODY_BYTES, using default");
                DEFAULT_MAX_BODY_BYTES
            }),
            None => DEFAULT_MAX_BODY_BYTES,
        };

        let error_status = match lookup("BRRTB_ERROR_STATUS") {
            Some(val) => match val.trim().parse::<u16>() {
                Ok(status) if (400..500).contains(&status) => status,
                _ => {
                    warn!(value = %val, "BRRTB_ERROR_STATUS must be a 4xx status, using default");
                    DEFAULT_ERROR_STATUS
                }
            },
            None => DEFAULT_ERROR_STATUS,
        };

        BindConfig {
            max_body_bytes,
            error_status,
        }
    }
}

fn parse_size(val: &str) -> Option<usize> {
    let val = val.trim();
    if let Some(hex) = val.strip_prefix("0x").or_else(|| val.strip_prefix("0X")) {
        usize::from_str_radix(hex, 16).ok()
    } else {
        val.parse().ok()
    }
}
