//! Shared configuration for the titlecast TUI.
//!
//! A single flat TOML file layered with environment overrides: defaults,
//! then `titlecast.toml` from the platform config directory, then
//! `TITLECAST_*` variables on top.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use titlecast_core::SessionConfig;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Config struct ───────────────────────────────────────────────────

/// Top-level configuration. Every field has a default, so an absent
/// config file is not an error.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Automation server host.
    #[serde(default = "default_server")]
    pub server: String,

    /// Automation server WebSocket port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Required-actions manifest: a local path or an `http(s)://` URL.
    #[serde(default = "default_manifest")]
    pub manifest: String,

    /// Setup documentation shown in the help overlay.
    #[serde(default = "default_docs_url")]
    pub docs_url: String,

    /// Log filter applied when `TITLECAST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: default_server(),
            port: default_port(),
            manifest: default_manifest(),
            docs_url: default_docs_url(),
            log_level: default_log_level(),
        }
    }
}

fn default_server() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    8080
}
fn default_manifest() -> String {
    "required_actions.txt".into()
}
fn default_docs_url() -> String {
    "https://github.com/titlecast/titlecast#setup".into()
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "server".into(),
                reason: "must not be empty".into(),
            });
        }
        if self.port == 0 {
            return Err(ConfigError::Validation {
                field: "port".into(),
                reason: "must be a real port, not 0".into(),
            });
        }
        Ok(())
    }

    /// Connection parameters for `titlecast_core::Session`.
    ///
    /// The reconnect cadence is deliberately not configurable: the fixed
    /// interval is part of the client's contract.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::new(self.server.clone(), self.port)
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "titlecast", "titlecast").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("titlecast.toml");
            p
        },
        |dirs| dirs.config_dir().join("titlecast.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("titlecast");
    p
}

// ── Config loading ──────────────────────────────────────────────────

fn build_figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("TITLECAST_"))
}

/// Load and validate the config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    let config: Config = build_figment(&config_path()).extract()?;
    config.validate()?;
    Ok(config)
}

/// Load config, falling back to defaults on any failure.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Write the default config to the canonical path as a starting point,
/// creating parent directories. Returns the path written.
pub fn write_default_config() -> Result<PathBuf, ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(&Config::default())?;
    std::fs::write(&path, toml_str)?;
    Ok(path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_apply_without_a_file() {
        figment::Jail::expect_with(|_jail| {
            let config: Config = build_figment(Path::new("titlecast.toml")).extract()?;
            assert_eq!(config.server, "127.0.0.1");
            assert_eq!(config.port, 8080);
            assert_eq!(config.manifest, "required_actions.txt");
            assert_eq!(config.log_level, "info");
            Ok(())
        });
    }

    #[test]
    fn toml_file_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "titlecast.toml",
                r#"
                    server = "10.0.0.5"
                    port = 9001
                    manifest = "https://example.com/actions.txt"
                "#,
            )?;
            let config: Config = build_figment(Path::new("titlecast.toml")).extract()?;
            assert_eq!(config.server, "10.0.0.5");
            assert_eq!(config.port, 9001);
            assert_eq!(config.manifest, "https://example.com/actions.txt");
            // Untouched fields keep their defaults.
            assert_eq!(config.log_level, "info");
            Ok(())
        });
    }

    #[test]
    fn environment_beats_the_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("titlecast.toml", "port = 9001")?;
            jail.set_env("TITLECAST_PORT", "9002");
            jail.set_env("TITLECAST_DOCS_URL", "https://docs.example.com");
            let config: Config = build_figment(Path::new("titlecast.toml")).extract()?;
            assert_eq!(config.port, 9002);
            assert_eq!(config.docs_url, "https://docs.example.com");
            Ok(())
        });
    }

    #[test]
    fn validation_rejects_nonsense() {
        let empty_server = Config {
            server: "  ".into(),
            ..Config::default()
        };
        assert!(matches!(
            empty_server.validate(),
            Err(ConfigError::Validation { field, .. }) if field == "server"
        ));

        let zero_port = Config {
            port: 0,
            ..Config::default()
        };
        assert!(matches!(
            zero_port.validate(),
            Err(ConfigError::Validation { field, .. }) if field == "port"
        ));

        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn default_config_serializes_to_parseable_toml() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.port, 8080);
        assert_eq!(parsed.server, "127.0.0.1");
    }

    #[test]
    fn session_config_carries_the_endpoint() {
        let config = Config {
            server: "stream-box".into(),
            port: 7777,
            ..Config::default()
        };
        let session = config.session_config();
        assert_eq!(session.server, "stream-box");
        assert_eq!(session.port, 7777);
    }
}
