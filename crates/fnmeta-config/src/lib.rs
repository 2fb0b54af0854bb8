//! fnmeta configuration
//!
//! Settings live in a small TOML file. The file location is resolved in this order:
//! 1. `FNMETA_CONFIG` environment variable
//! 2. A `.fnmeta_config_path` pointer file next to the default location
//! 3. `~/.config/fnmeta/fnmeta.toml` (the platform config dir on Windows)
//!
//! The build-facing subset of the settings is exposed as `ControlSwitches`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "FNMETA_CONFIG";
/// File next to the default config that redirects to another config path
pub const POINTER_FILE: &str = ".fnmeta_config_path";
/// Execution model whose projects get generated metadata
pub const TARGET_EXECUTION_MODEL: &str = "isolated";

/// Every key accepted by `get` and `set`, in display order
pub const KEYS: [&str; 6] = [
    "execution-model",
    "enable-generation",
    "auto-register",
    "output-namespace",
    "output-dir",
    "script-file",
];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Unknown config key '{0}'. Valid keys: {keys}", keys = KEYS.join(", "))]
    UnknownKey(String),

    #[error("Invalid value '{value}' for '{key}': expected true or false")]
    InvalidBool { key: String, value: String },
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_generation: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_register: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script_file: Option<String>,
}

/// Build switches deciding whether and where metadata is generated
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlSwitches {
    pub generation_enabled: bool,
    /// Running inside a project of the target execution model
    pub is_target_project: bool,
    pub auto_register: bool,
    /// `None` leaves the emitter's fallback namespace in place
    pub output_namespace: Option<String>,
}

impl ControlSwitches {
    pub fn should_generate(&self) -> bool {
        self.generation_enabled && self.is_target_project
    }
}

fn default_path() -> PathBuf {
    #[cfg(not(target_os = "windows"))]
    let base = dirs::home_dir().map(|home| home.join(".config"));

    #[cfg(target_os = "windows")]
    let base = dirs::config_dir();

    base.unwrap_or_else(|| PathBuf::from("."))
        .join("fnmeta")
        .join("fnmeta.toml")
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim() {
        v if v.eq_ignore_ascii_case("true") => Ok(true),
        v if v.eq_ignore_ascii_case("false") => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

impl Config {
    pub fn path() -> PathBuf {
        if let Ok(env_path) = std::env::var(CONFIG_ENV) {
            let trimmed = env_path.trim();
            if !trimmed.is_empty() {
                return PathBuf::from(trimmed);
            }
        }

        // ~/.config/fnmeta/.fnmeta_config_path may redirect to another file
        if let Some(redirect) = Self::pointer_target() {
            return redirect;
        }

        default_path()
    }

    /// Location of the pointer file, next to the default config
    pub fn pointer_path() -> PathBuf {
        default_path()
            .parent()
            .map_or_else(|| PathBuf::from(POINTER_FILE), |dir| dir.join(POINTER_FILE))
    }

    /// Path the pointer file redirects to, if any
    pub fn pointer_target() -> Option<PathBuf> {
        let contents = fs::read_to_string(Self::pointer_path()).ok()?;
        let trimmed = contents.trim();
        (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
    }

    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path())
    }

    /// Load from `path`, defaults when the file does not exist
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "execution-model" => self.execution_model.clone(),
            "enable-generation" => self.enable_generation.map(|v| v.to_string()),
            "auto-register" => self.auto_register.map(|v| v.to_string()),
            "output-namespace" => self.output_namespace.clone(),
            "output-dir" => self.output_dir.clone(),
            "script-file" => self.script_file.clone(),
            _ => None,
        }
    }

    pub fn set(&mut self, key: &str, value: String) -> Result<(), ConfigError> {
        match key {
            "execution-model" => self.execution_model = Some(value),
            "enable-generation" => self.enable_generation = Some(parse_bool(key, &value)?),
            "auto-register" => self.auto_register = Some(parse_bool(key, &value)?),
            "output-namespace" => self.output_namespace = Some(value),
            "output-dir" => self.output_dir = Some(value),
            "script-file" => self.script_file = Some(value),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        *self == Config::default()
    }

    /// Set values as `(key, value)` pairs
    pub fn values_iter(&self) -> Vec<(&'static str, String)> {
        KEYS.iter()
            .filter_map(|key| self.get(key).map(|value| (*key, value)))
            .collect()
    }

    pub fn switches(&self) -> ControlSwitches {
        ControlSwitches {
            generation_enabled: self.enable_generation.unwrap_or(false),
            is_target_project: self
                .execution_model
                .as_deref()
                .is_some_and(|model| model.trim().eq_ignore_ascii_case(TARGET_EXECUTION_MODEL)),
            auto_register: self.auto_register.unwrap_or(false),
            output_namespace: self
                .output_namespace
                .as_deref()
                .map(str::trim)
                .filter(|ns| !ns.is_empty())
                .map(str::to_string),
        }
    }
}
