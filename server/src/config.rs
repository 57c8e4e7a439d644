use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid {name}: {value:?}")]
pub struct ConfigError {
    pub name: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub data_dir: PathBuf,
    pub save_debounce: Duration,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// `SYNC_BIND`, `SYNC_DATA_DIR` and `SYNC_SAVE_DEBOUNCE_MS`, each optional.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind = match lookup("SYNC_BIND") {
            Some(value) => value.parse().map_err(|_| ConfigError {
                name: "SYNC_BIND",
                value,
            })?,
            None => SocketAddr::from(([127, 0, 0, 1], 8080)),
        };
        let data_dir = lookup("SYNC_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data"));
        let save_debounce = match lookup("SYNC_SAVE_DEBOUNCE_MS") {
            Some(value) => match value.parse::<u64>() {
                Ok(ms) if ms > 0 => Duration::from_millis(ms),
                _ => {
                    return Err(ConfigError {
                        name: "SYNC_SAVE_DEBOUNCE_MS",
                        value,
                    })
                }
            },
            None => Duration::from_secs(5),
        };
        Ok(Self {
            bind,
            data_dir,
            save_debounce,
        })
    }
}
