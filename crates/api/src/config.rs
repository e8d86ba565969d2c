//! Server configuration read from the environment.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

pub const BIND_ADDR_VAR: &str = "TUTORBOOK_BIND_ADDR";
pub const REMINDER_SENDER_VAR: &str = "TUTORBOOK_REMINDER_SENDER";
pub const REMINDER_INTERVAL_VAR: &str = "TUTORBOOK_REMINDER_INTERVAL_SECS";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_REMINDER_SENDER: &str = "Administrator";
const DEFAULT_REMINDER_INTERVAL_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: invalid value {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    /// Sender recorded on scheduled payment reminders.
    pub reminder_sender: String,
    /// Period of the built-in reminder trigger; `None` leaves triggering to
    /// an external scheduler.
    pub reminder_interval: Option<Duration>,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = match lookup(BIND_ADDR_VAR) {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                var: BIND_ADDR_VAR,
                value,
            })?,
            None => default_bind_addr(),
        };

        let reminder_sender = lookup(REMINDER_SENDER_VAR)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_REMINDER_SENDER.to_string());

        let interval_secs = match lookup(REMINDER_INTERVAL_VAR) {
            Some(value) => value.trim().parse::<u64>().map_err(|_| ConfigError::Invalid {
                var: REMINDER_INTERVAL_VAR,
                value,
            })?,
            None => DEFAULT_REMINDER_INTERVAL_SECS,
        };

        Ok(Self {
            bind_addr,
            reminder_sender,
            reminder_interval: (interval_secs > 0).then(|| Duration::from_secs(interval_secs)),
        })
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            reminder_sender: DEFAULT_REMINDER_SENDER.to_string(),
            reminder_interval: Some(Duration::from_secs(DEFAULT_REMINDER_INTERVAL_SECS)),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}
