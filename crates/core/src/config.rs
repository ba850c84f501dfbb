//! Configuration loading
//!
//! Settings come from a TOML file (default `chess_tutor.toml`, overridden by
//! `CHESS_TUTOR_CONFIG`), then from environment variables. A missing file
//! means defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::EngineTimeouts;

pub const CONFIG_PATH_ENV: &str = "CHESS_TUTOR_CONFIG";
pub const ENGINE_PATH_ENV: &str = "STOCKFISH_PATH";
pub const BIND_ENV: &str = "CHESS_TUTOR_BIND";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TutorConfig {
    pub engine: EngineConfig,
    pub analysis: DepthPolicy,
    pub server: ServerConfig,
}

/// `[engine]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Engine executable; `stockfish` on PATH when unset
    pub path: Option<PathBuf>,
    pub handshake_timeout_ms: u64,
    pub evaluate_timeout_ms: u64,
    pub health_timeout_ms: u64,
    /// How long a status answer is trusted before probing again
    pub status_ttl_ms: u64,
    /// UCI options sent with `setoption` at startup, e.g. `Threads = "2"`
    pub options: BTreeMap<String, String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let timeouts = EngineTimeouts::default();
        Self {
            path: None,
            handshake_timeout_ms: timeouts.handshake.as_millis() as u64,
            evaluate_timeout_ms: timeouts.evaluate.as_millis() as u64,
            health_timeout_ms: timeouts.health.as_millis() as u64,
            status_ttl_ms: 10_000,
            options: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    pub fn timeouts(&self) -> EngineTimeouts {
        EngineTimeouts {
            handshake: Duration::from_millis(self.handshake_timeout_ms),
            evaluate: Duration::from_millis(self.evaluate_timeout_ms),
            health: Duration::from_millis(self.health_timeout_ms),
        }
    }

    pub fn status_ttl(&self) -> Duration {
        Duration::from_millis(self.status_ttl_ms)
    }

    pub fn uci_options(&self) -> Vec<(String, String)> {
        self.options
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}

/// `[analysis]` section: search depth bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthPolicy {
    pub default_depth: u32,
    pub min_depth: u32,
    pub max_depth: u32,
}

impl Default for DepthPolicy {
    fn default() -> Self {
        Self {
            default_depth: 15,
            min_depth: 1,
            max_depth: 22,
        }
    }
}

impl DepthPolicy {
    /// Clamps a requested depth into `[min_depth, max_depth]`
    pub fn clamp(&self, requested: i64) -> u32 {
        let clamped = requested.clamp(i64::from(self.min_depth), i64::from(self.max_depth));
        // in range of u32 after the clamp above
        u32::try_from(clamped).unwrap_or(self.max_depth)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.min_depth == 0 {
            return Err(ConfigError::Invalid("analysis.min_depth must be at least 1".into()));
        }
        if !(self.min_depth <= self.default_depth && self.default_depth <= self.max_depth) {
            return Err(ConfigError::Invalid(format!(
                "analysis depths must satisfy min <= default <= max (got {} / {} / {})",
                self.min_depth, self.default_depth, self.max_depth
            )));
        }
        Ok(())
    }
}

/// `[server]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// Origins allowed by CORS
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            allowed_origins: vec!["http://localhost:5173".to_string()],
        }
    }
}

impl TutorConfig {
    /// Loads from the configured file path and applies environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(Self::default_path);
        let mut config = Self::load_file(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn default_path() -> PathBuf {
        PathBuf::from("chess_tutor.toml")
    }

    /// Reads `path`, falling back to defaults if it does not exist
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_toml_str(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies environment-style overrides through `lookup`
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup(ENGINE_PATH_ENV).filter(|p| !p.trim().is_empty()) {
            self.engine.path = Some(PathBuf::from(path));
        }
        if let Some(bind) = lookup(BIND_ENV).filter(|b| !b.trim().is_empty()) {
            self.server.bind = bind;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.analysis.validate()?;
        if self.engine.evaluate_timeout_ms == 0 || self.engine.handshake_timeout_ms == 0 {
            return Err(ConfigError::Invalid("engine timeouts must be positive".into()));
        }
        Ok(())
    }
}
