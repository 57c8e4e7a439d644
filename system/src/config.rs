use crate::layout::SurfaceLayout;
use crate::types::SessionCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    ZeroDelay(&'static str),
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid server url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("server url {0} cannot carry a path")]
    UnsupportedUrl(String),
}

/// Delays of the reconnection and save timers, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimingConfig {
    pub reconnect_delay_ms: u64,
    pub first_save_delay_ms: u64,
    pub save_debounce_ms: u64,
    pub periodic_save_ms: u64,
    /// How long an unreported save blocks a retry of the same content.
    pub save_timeout_ms: u64,
}

impl std::default::Default for TimingConfig {
    fn default() -> Self {
        Self {
            reconnect_delay_ms: 3_000,
            first_save_delay_ms: 1_000,
            save_debounce_ms: 5_000,
            periodic_save_ms: 30_000,
            save_timeout_ms: 30_000,
        }
    }
}

impl TimingConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn first_save_delay(&self) -> Duration {
        Duration::from_millis(self.first_save_delay_ms)
    }

    pub fn save_debounce(&self) -> Duration {
        Duration::from_millis(self.save_debounce_ms)
    }

    pub fn periodic_save(&self) -> Duration {
        Duration::from_millis(self.periodic_save_ms)
    }

    pub fn save_timeout(&self) -> Duration {
        Duration::from_millis(self.save_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let delays = [
            ("reconnectDelayMs", self.reconnect_delay_ms),
            ("firstSaveDelayMs", self.first_save_delay_ms),
            ("saveDebounceMs", self.save_debounce_ms),
            ("periodicSaveMs", self.periodic_save_ms),
            ("saveTimeoutMs", self.save_timeout_ms),
        ];
        match delays.iter().find(|(_, value)| *value == 0) {
            Some((name, _)) => Err(ConfigError::ZeroDelay(*name)),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub token: Option<String>,
    pub account_id: Option<String>,
}

impl Credentials {
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

/// Everything a client needs to join one session.
///
/// An empty `session_code` is accepted; such a session never issues saves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConfig {
    pub server_url: String,
    #[serde(default)]
    pub session_code: SessionCode,
    #[serde(flatten)]
    pub credentials: Credentials,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub surface: SurfaceLayout,
}

impl SyncConfig {
    pub fn new(server_url: impl Into<String>, session_code: impl Into<SessionCode>) -> Self {
        Self {
            server_url: server_url.into(),
            session_code: session_code.into(),
            credentials: Credentials::default(),
            timing: TimingConfig::default(),
            surface: SurfaceLayout::default(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.timing.validate()?;
        url::Url::parse(&self.server_url)?;
        Ok(())
    }
}
