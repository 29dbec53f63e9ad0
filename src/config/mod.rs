mod settings;

use crate::config::settings::PartialSettings;
use config::{Config, ConfigError, Environment, File};

pub use settings::{LogSettings, RelaySettings, ServerSettings, Settings};

/// Prefix for environment overrides, e.g. `CHANHUB__SERVER__PORT=9000`.
pub const ENV_PREFIX: &str = "CHANHUB";

/// Loads the configuration from the default file and environment variables
/// and merges it with default values.
pub fn load_config() -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

    let config = builder.build()?;

    // Try to deserialize what is available
    let partial: PartialSettings = config.try_deserialize()?;

    let default = Settings::default();
    let server = partial.server;
    let relay = partial.relay;

    Ok(Settings {
        server: ServerSettings {
            host: server
                .as_ref()
                .and_then(|s| s.host.clone())
                .unwrap_or(default.server.host),
            port: server
                .as_ref()
                .and_then(|s| s.port)
                .unwrap_or(default.server.port),
        },
        relay: RelaySettings {
            send_timeout_ms: relay
                .as_ref()
                .and_then(|r| r.send_timeout_ms)
                .unwrap_or(default.relay.send_timeout_ms),
            reclaim_empty_channels: relay
                .as_ref()
                .and_then(|r| r.reclaim_empty_channels)
                .unwrap_or(default.relay.reclaim_empty_channels),
        },
        log: LogSettings {
            level: partial
                .log
                .and_then(|l| l.level)
                .unwrap_or(default.log.level),
        },
    })
}

/// Level to initialize logging with before configuration errors are reported.
/// Falls back to the default level when loading failed.
pub fn startup_log_level(config: &Result<Settings, ConfigError>) -> &str {
    match config {
        Ok(settings) => &settings.log.level,
        Err(_) => "info",
    }
}
