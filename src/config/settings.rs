use serde::Deserialize;
use std::time::Duration;

/// Top-level configuration settings for the application.
///
/// Includes settings for the listener, the relay core and logging.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub relay: RelaySettings,
    pub log: LogSettings,
}

/// Configuration settings for the server.
///
/// Defines the host and port the server will bind to.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Configuration settings for the channel registry and broadcaster.
#[derive(Debug, Deserialize, Clone)]
pub struct RelaySettings {
    /// Upper bound on a single frame write; `0` waits forever.
    pub send_timeout_ms: u64,
    /// Drop a channel from the registry once its last member leaves.
    pub reclaim_empty_channels: bool,
}

impl RelaySettings {
    pub fn send_timeout(&self) -> Option<Duration> {
        (self.send_timeout_ms > 0).then(|| Duration::from_millis(self.send_timeout_ms))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogSettings {
    pub level: String,
}

/// Partial configuration settings loaded from files or environment.
///
/// Allows partial specification of settings. Missing values can be filled using defaults.
#[derive(Debug, Deserialize)]
pub struct PartialSettings {
    pub server: Option<PartialServerSettings>,
    pub relay: Option<PartialRelaySettings>,
    pub log: Option<PartialLogSettings>,
}

#[derive(Debug, Deserialize)]
pub struct PartialServerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize)]
pub struct PartialRelaySettings {
    pub send_timeout_ms: Option<u64>,
    pub reclaim_empty_channels: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct PartialLogSettings {
    pub level: Option<String>,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            send_timeout_ms: 5000,
            reclaim_empty_channels: false,
        }
    }
}

/// Provides default values for `Settings`.
impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            relay: RelaySettings::default(),
            log: LogSettings {
                level: "info".to_string(),
            },
        }
    }
}
