//! Configuration loading and typed config structures for the rewards server.
//!
//! The configuration lives in `rewards-config.yaml` in the working
//! directory. Every field has a default, so a missing file or a partial
//! file is fine. Environment variables take precedence over the file:
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `REWARDS_HOST` | `server.host` |
//! | `REWARDS_PORT` | `server.port` |
//! | `REWARDS_LOG_LEVEL` | `logging.level` |

use std::path::Path;

use rewards_api::ServerConfig;
use serde::Deserialize;

/// Default location of the configuration file.
pub const CONFIG_PATH: &str = "rewards-config.yaml";

/// Log levels accepted in `logging.level`.
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// An environment override held an unusable value.
    #[error("invalid value {value:?} for {var}: {reason}")]
    InvalidEnv {
        /// The variable name.
        var: &'static str,
        /// The rejected value.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A configured value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level server configuration.
///
/// Mirrors the structure of `rewards-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RewardsConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerSection,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl RewardsConfig {
    /// Load configuration from `path`, falling back to defaults when the
    /// file does not exist. Environment overrides are applied either way.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file exists but cannot be read,
    /// [`ConfigError::Yaml`] if it is not valid YAML, and
    /// [`ConfigError::InvalidEnv`] or [`ConfigError::Invalid`] for bad
    /// values.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            let mut config = Self::default();
            config.apply_env_overrides()?;
            config.validate()?;
            Ok(config)
        }
    }

    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string and apply environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        Self::parse_with(yaml, |var| std::env::var(var).ok())
    }

    /// Parse `yaml` and apply overrides read through `lookup`.
    fn parse_with(
        yaml: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Override file values with `REWARDS_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] if `REWARDS_PORT` is not a port
    /// number.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|var| std::env::var(var).ok())
    }

    fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(host) = lookup("REWARDS_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("REWARDS_PORT") {
            self.server.port = match port.trim().parse() {
                Ok(port) => port,
                Err(e) => {
                    return Err(ConfigError::InvalidEnv {
                        var: "REWARDS_PORT",
                        reason: format!("{e}"),
                        value: port,
                    });
                }
            };
        }
        if let Some(level) = lookup("REWARDS_LOG_LEVEL") {
            self.logging.level = level;
        }
        Ok(())
    }

    /// Check values serde cannot check on its own.
    fn validate(&self) -> Result<(), ConfigError> {
        let level = self.logging.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "logging.level must be one of {}, got {:?}",
                LOG_LEVELS.join(", "),
                self.logging.level
            )));
        }
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::Invalid("server.host must not be empty".to_owned()));
        }
        Ok(())
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerSection {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl From<&ServerSection> for ServerConfig {
    fn from(section: &ServerSection) -> Self {
        Self {
            host: section.host.clone(),
            port: section.port,
        }
    }
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = RewardsConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
server:
  host: "127.0.0.1"
  port: 9090
logging:
  level: "debug"
  format: "json"
"#;
        let config = RewardsConfig::parse_with(yaml, no_env);
        assert!(config.is_ok());
        if let Ok(config) = config {
            assert_eq!(config.server.host, "127.0.0.1");
            assert_eq!(config.server.port, 9090);
            assert_eq!(config.logging.level, "debug");
            assert_eq!(config.logging.format, LogFormat::Json);
        }
    }

    #[test]
    fn parse_minimal_yaml() {
        let config = RewardsConfig::parse_with("server:\n  port: 7000\n", no_env);
        assert!(config.is_ok());
        if let Ok(config) = config {
            // Port is overridden
            assert_eq!(config.server.port, 7000);
            // Everything else uses defaults
            assert_eq!(config.server.host, "0.0.0.0");
            assert_eq!(config.logging, LoggingConfig::default());
        }
    }

    #[test]
    fn parse_empty_yaml() {
        let config = RewardsConfig::parse_with("", no_env);
        assert_eq!(config.ok(), Some(RewardsConfig::default()));
    }

    #[test]
    fn invalid_yaml_rejected() {
        let config = RewardsConfig::parse_with("server: [unclosed", no_env);
        assert!(matches!(config, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn out_of_range_port_rejected() {
        let config = RewardsConfig::parse_with("server:\n  port: 70000\n", no_env);
        assert!(matches!(config, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn unknown_log_format_rejected() {
        let config = RewardsConfig::parse_with("logging:\n  format: xml\n", no_env);
        assert!(config.is_err());
    }

    #[test]
    fn unknown_log_level_rejected() {
        let config = RewardsConfig::parse_with("logging:\n  level: loud\n", no_env);
        assert!(matches!(config, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn env_overrides_file_values() {
        let yaml = "server:\n  host: \"10.0.0.1\"\n  port: 9000\n";
        let lookup = env(&[
            ("REWARDS_HOST", "127.0.0.1"),
            ("REWARDS_PORT", "8181"),
            ("REWARDS_LOG_LEVEL", "warn"),
        ]);
        let config = RewardsConfig::parse_with(yaml, lookup);
        assert!(config.is_ok());
        if let Ok(config) = config {
            assert_eq!(config.server.host, "127.0.0.1");
            assert_eq!(config.server.port, 8181);
            assert_eq!(config.logging.level, "warn");
        }
    }

    #[test]
    fn bad_env_port_rejected() {
        let config = RewardsConfig::parse_with("", env(&[("REWARDS_PORT", "eighty")]));
        assert!(matches!(
            config,
            Err(ConfigError::InvalidEnv {
                var: "REWARDS_PORT",
                ..
            })
        ));
    }

    #[test]
    fn server_section_converts() {
        let section = ServerSection {
            host: "127.0.0.1".to_owned(),
            port: 3000,
        };
        let server = ServerConfig::from(&section);
        assert_eq!(server.host, "127.0.0.1");
        assert_eq!(server.port, 3000);
    }

    #[test]
    fn load_missing_file_uses_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("does-not-exist.yaml");
        let config = RewardsConfig::load(&path);
        assert!(config.is_ok());
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join(CONFIG_PATH);
        if path.exists() {
            let config = RewardsConfig::from_file(&path);
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
        }
    }
}
