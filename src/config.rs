//! SDK configuration.
//!
//! Layering: `Default` values, then an optional JSON file, then environment variables.
//! The file path itself may come from `TRUVIDEO_CONFIG`.

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::environment::Environment;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid environment in {var}: {value}")]
    InvalidEnvironment { var: String, value: String },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SdkConfig {
    /// Overrides the build flavor when set.
    #[serde(default)]
    pub environment: Option<Environment>,
    /// Where the local engine persists the credential bundle. `None` keeps it in memory only.
    #[serde(default)]
    pub credentials_path: Option<PathBuf>,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogConfig {
    #[serde(default = "default_true")]
    pub print_enabled: bool,
    /// Mask payload and signature values in lifecycle log events.
    #[serde(default = "default_true")]
    pub redact_credentials: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { print_enabled: true, redact_credentials: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    #[serde(default = "EngineConfig::default_payload_ttl_secs")]
    pub payload_ttl_secs: u64,
    #[serde(default = "EngineConfig::default_access_token_ttl_secs")]
    pub access_token_ttl_secs: u64,
    #[serde(default = "EngineConfig::default_refresh_token_ttl_secs")]
    pub refresh_token_ttl_secs: u64,
    /// api key -> shared secret, as known to the backend.
    #[serde(default)]
    pub api_keys: HashMap<String, String>,
}

impl EngineConfig {
    fn default_payload_ttl_secs() -> u64 { 5 * 60 }
    fn default_access_token_ttl_secs() -> u64 { 60 * 60 }
    fn default_refresh_token_ttl_secs() -> u64 { 30 * 24 * 60 * 60 }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            payload_ttl_secs: Self::default_payload_ttl_secs(),
            access_token_ttl_secs: Self::default_access_token_ttl_secs(),
            refresh_token_ttl_secs: Self::default_refresh_token_ttl_secs(),
            api_keys: HashMap::new(),
        }
    }
}

fn default_true() -> bool { true }

impl SdkConfig {
    /// Read a JSON config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(ConfigError::Io { path: path.to_path_buf(), source: e }),
        };
        Ok(serde_json::from_str(&contents)?)
    }

    /// Defaults, then the file named by `TRUVIDEO_CONFIG` (if any), then env overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = match env::var("TRUVIDEO_CONFIG") {
            Ok(p) if !p.trim().is_empty() => Self::load(Path::new(p.trim()))?,
            _ => Self::default(),
        };
        cfg.apply_env_overrides()?;
        Ok(cfg)
    }

    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(v) = env::var("TRUVIDEO_ENVIRONMENT") {
            let parsed = v.parse::<Environment>().map_err(|_| ConfigError::InvalidEnvironment {
                var: "TRUVIDEO_ENVIRONMENT".to_string(),
                value: v.clone(),
            })?;
            self.environment = Some(parsed);
        }
        if let Ok(p) = env::var("TRUVIDEO_CREDENTIALS_PATH") {
            self.credentials_path = if p.trim().is_empty() { None } else { Some(PathBuf::from(p)) };
        }
        if let Some(b) = parse_bool_env("TRUVIDEO_LOG_PRINT") {
            self.log.print_enabled = b;
        }
        if let Some(b) = parse_bool_env("TRUVIDEO_LOG_REDACT") {
            self.log.redact_credentials = b;
        }
        Ok(())
    }

    /// Effective environment: explicit config wins over the build flavor.
    pub fn resolved_environment(&self) -> Environment {
        self.environment.unwrap_or_else(Environment::from_build)
    }
}

fn parse_bool_env(name: &str) -> Option<bool> {
    match env::var(name) {
        Ok(v) => parse_bool(&v),
        Err(_) => None,
    }
}

pub(crate) fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
