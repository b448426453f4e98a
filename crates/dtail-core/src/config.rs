//! Configuration types for dtail.
//!
//! [`Config::load`] layers the built-in defaults, an optional TOML file
//! (`~/.config/dtail/config.toml` unless a path is given) and `DTAIL__*`
//! environment variables. [`Config::defaults`] returns the same defaults
//! without touching the filesystem (useful in tests).

use chrono::format::{Item, StrftimeItems};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::palette::ColorMode;

// ---------------------------------------------------------------------------
// Embedded defaults
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG: &str = r#"
[output]
timestamp_format = "%Y-%m-%d %H:%M:%S"
color            = "auto"

[docker]
host = "unix:///var/run/docker.sock"

[shutdown]
drain_timeout_ms = 5000
"#;

// ---------------------------------------------------------------------------
// Public config types
// ---------------------------------------------------------------------------

/// Top-level application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub docker: DockerConfig,
    #[serde(default)]
    pub shutdown: ShutdownConfig,
}

/// `[output]` section of `config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// chrono format string for the per-line timestamp (local time).
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,
    #[serde(default)]
    pub color: ColorMode,
}

fn default_timestamp_format() -> String { "%Y-%m-%d %H:%M:%S".to_string() }

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            timestamp_format: default_timestamp_format(),
            color: ColorMode::default(),
        }
    }
}

/// `[docker]` section of `config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct DockerConfig {
    /// Engine endpoint: `unix://<path>`, `tcp://host:port` or `http://host:port`.
    #[serde(default = "default_docker_host")]
    pub host: String,
}

fn default_docker_host() -> String { "unix:///var/run/docker.sock".to_string() }

impl Default for DockerConfig {
    fn default() -> Self {
        Self { host: default_docker_host() }
    }
}

/// `[shutdown]` section of `config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ShutdownConfig {
    /// Upper bound on waiting for readers after cancellation. `0` waits forever.
    #[serde(default = "default_drain_timeout_ms")]
    pub drain_timeout_ms: u64,
}

fn default_drain_timeout_ms() -> u64 { 5000 }

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self { drain_timeout_ms: default_drain_timeout_ms() }
    }
}

impl ShutdownConfig {
    pub fn drain_timeout(&self) -> Option<Duration> {
        match self.drain_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Config {
    /// Load `path` (or the default config location) layered on top of the
    /// built-in defaults, then apply `DTAIL__SECTION__KEY` overrides.
    ///
    /// A missing file is not an error; a malformed one is.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(config_path);

        let cfg = config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(config::File::from(path.as_path()).required(false))
            .add_source(config::Environment::with_prefix("DTAIL").separator("__"))
            .build()?;
        let cfg: Self = cfg.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject settings that would only fail once lines are being rendered.
    pub fn validate(&self) -> anyhow::Result<()> {
        let fmt = &self.output.timestamp_format;
        anyhow::ensure!(
            !StrftimeItems::new(fmt).any(|item| matches!(item, Item::Error)),
            "invalid output.timestamp_format {fmt:?}"
        );
        Ok(())
    }

    /// Return the built-in defaults without touching the filesystem.
    pub fn defaults() -> Self {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .build()
            .expect("built-in default config must be valid TOML")
            .try_deserialize()
            .expect("built-in default config must deserialize correctly")
    }
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

fn config_path() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".to_string()))
                .join(".config")
        })
        .join("dtail")
        .join("config.toml")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
