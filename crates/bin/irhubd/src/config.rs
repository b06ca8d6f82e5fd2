//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `irhub.toml` in the working directory. Every field has a
//! default so the file is optional. Environment variables take precedence
//! over file values.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Where the command document lives.
    pub storage: StorageConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Dispatch adapter settings.
    pub blaster: BlasterConfig,
    /// Broadlink code extraction settings.
    pub broadlink: BroadlinkConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// JSON document location.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub path: PathBuf,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Bundled dispatch adapters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlasterKind {
    #[default]
    Virtual,
}

/// Dispatch adapter configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BlasterConfig {
    pub kind: BlasterKind,
    /// Leave a generated code behind after each virtual capture.
    pub auto_code: bool,
    /// How long a virtual capture takes.
    pub capture_delay_ms: u64,
    /// Blaster references answered for; empty means any.
    pub blasters: Vec<String>,
}

/// Broadlink extraction configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BroadlinkConfig {
    /// Directory holding the `broadlink_remote_<mac>_codes` files.
    pub storage_dir: PathBuf,
    /// Blaster reference to MAC address.
    pub blasters: BTreeMap<String, String>,
}

impl Config {
    /// Load configuration from `irhub.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// result fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("irhub.toml")?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("IRHUB_HOST") {
            self.server.host = val;
        }
        if let Some(val) = lookup("IRHUB_PORT")
            && let Ok(port) = val.parse()
        {
            self.server.port = port;
        }
        if let Some(val) = lookup("IRHUB_BIND")
            && let Some((host, port)) = val.rsplit_once(':')
        {
            self.server.host = host.to_string();
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = lookup("IRHUB_STORAGE_PATH") {
            self.storage.path = PathBuf::from(val);
        }
        if let Some(val) = lookup("IRHUB_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = lookup("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.storage.path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "storage path must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl BlasterConfig {
    #[must_use]
    pub fn capture_delay(&self) -> Duration {
        Duration::from_millis(self.capture_delay_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("irhub.json"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "irhubd=info,irhub_app=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for BlasterConfig {
    fn default() -> Self {
        Self {
            kind: BlasterKind::Virtual,
            auto_code: true,
            capture_delay_ms: 0,
            blasters: Vec::new(),
        }
    }
}

impl Default for BroadlinkConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(".storage"),
            blasters: BTreeMap::new(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.storage.path, PathBuf::from("irhub.json"));
        assert_eq!(config.blaster.kind, BlasterKind::Virtual);
        assert!(config.blaster.auto_code);
        assert!(config.broadlink.blasters.is_empty());
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [server]
            host = '127.0.0.1'
            port = 9090

            [storage]
            path = '/var/lib/irhub/commands.json'

            [logging]
            filter = 'debug'

            [blaster]
            kind = 'virtual'
            auto_code = false
            capture_delay_ms = 1500
            blasters = ['remote.living_room']

            [broadlink]
            storage_dir = '/config/.storage'

            [broadlink.blasters]
            'remote.living_room' = '34:EA:34:12:AB:CD'
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9090);
        assert_eq!(
            config.storage.path,
            PathBuf::from("/var/lib/irhub/commands.json")
        );
        assert_eq!(config.logging.filter, "debug");
        assert!(!config.blaster.auto_code);
        assert_eq!(config.blaster.capture_delay(), Duration::from_millis(1500));
        assert_eq!(config.blaster.blasters, vec!["remote.living_room"]);
        assert_eq!(config.broadlink.storage_dir, PathBuf::from("/config/.storage"));
        assert_eq!(
            config.broadlink.blasters.get("remote.living_room").map(String::as_str),
            Some("34:EA:34:12:AB:CD")
        );
    }

    #[test]
    fn should_reject_unknown_blaster_kind() {
        let result: Result<Config, _> = toml::from_str("[blaster]\nkind = 'lirc'");
        assert!(result.is_err());
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn should_reject_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_empty_storage_path() {
        let mut config = Config::default();
        config.storage.path = PathBuf::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_accept_defaults() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn should_override_from_environment() {
        let mut config = Config::default();
        config.apply_overrides(env(&[
            ("IRHUB_HOST", "127.0.0.1"),
            ("IRHUB_PORT", "8123"),
            ("IRHUB_STORAGE_PATH", "/tmp/irhub.json"),
            ("IRHUB_LOG", "debug"),
        ]));
        assert_eq!(config.bind_addr(), "127.0.0.1:8123");
        assert_eq!(config.storage.path, PathBuf::from("/tmp/irhub.json"));
        assert_eq!(config.logging.filter, "debug");
    }

    #[test]
    fn should_prefer_bind_over_host_and_port() {
        let mut config = Config::default();
        config.apply_overrides(env(&[
            ("IRHUB_PORT", "8123"),
            ("IRHUB_BIND", "192.168.1.2:9000"),
        ]));
        assert_eq!(config.bind_addr(), "192.168.1.2:9000");
    }

    #[test]
    fn should_prefer_rust_log_over_irhub_log() {
        let mut config = Config::default();
        config.apply_overrides(env(&[("IRHUB_LOG", "warn"), ("RUST_LOG", "trace")]));
        assert_eq!(config.logging.filter, "trace");
    }

    #[test]
    fn should_ignore_unparsable_port() {
        let mut config = Config::default();
        config.apply_overrides(env(&[("IRHUB_PORT", "http")]));
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }
}
