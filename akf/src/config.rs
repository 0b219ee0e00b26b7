//! Configuration for the ArmoniK CLI.
//!
//! Config file resolution order:
//! 1. Explicit path passed to [`Config::locate`]
//! 2. ARMONIK_CLI_CONFIG environment variable
//! 3. Platform config directory (e.g. ~/.config/armonik_cli/config.toml)
//! 4. Fallback: $HOME/.config/armonik_cli/config.toml

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

const CONFIG_FILE: &str = "config.toml";
const CONFIG_ENV: &str = "ARMONIK_CLI_CONFIG";

/// How commands print their results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Table,
    Text,
    Yaml,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Table => "table",
            OutputFormat::Text => "text",
            OutputFormat::Yaml => "yaml",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "table" => Ok(OutputFormat::Table),
            "text" => Ok(OutputFormat::Text),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            _ => Err(Error::Config(format!(
                "Unknown output format '{}' (expected json, yaml, table or text)",
                s
            ))),
        }
    }
}

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// File this config was loaded from and is saved to.
    #[serde(skip)]
    path: PathBuf,

    /// Control plane endpoint, e.g. `http://localhost:5001`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Default output format.
    #[serde(default)]
    pub output: OutputFormat,
}

impl Config {
    /// Keys accepted by [`Config::get`] and [`Config::set`].
    pub const KEYS: [&'static str; 2] = ["endpoint", "output"];

    /// Default config bound to the given file.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            endpoint: None,
            output: OutputFormat::default(),
        }
    }

    /// Resolve the config file path.
    pub fn locate(explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            return Ok(path.to_path_buf());
        }

        if let Ok(path) = std::env::var(CONFIG_ENV) {
            if !path.is_empty() {
                return Ok(PathBuf::from(path));
            }
        }

        if let Some(proj_dirs) = ProjectDirs::from("", "", "armonik_cli") {
            return Ok(proj_dirs.config_dir().join(CONFIG_FILE));
        }

        let home = std::env::var("HOME")
            .map_err(|_| Error::Config("Could not determine home directory".to_string()))?;
        Ok(PathBuf::from(home)
            .join(".config/armonik_cli")
            .join(CONFIG_FILE))
    }

    /// Load from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::locate(None)?)
    }

    /// Load from a file; a missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::with_path(path));
        }
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents).map_err(|e| {
            Error::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        config.path = path.to_path_buf();
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(&self.path, contents)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Result<String> {
        match key {
            "endpoint" => Ok(self.endpoint.clone().unwrap_or_default()),
            "output" => Ok(self.output.to_string()),
            _ => Err(unknown_key(key)),
        }
    }

    /// Set a key from its textual value. An empty endpoint unsets it.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "endpoint" => {
                let value = value.trim();
                self.endpoint = (!value.is_empty()).then(|| value.to_string());
            }
            "output" => self.output = value.parse()?,
            _ => return Err(unknown_key(key)),
        }
        Ok(())
    }

    /// All keys with their current values, in [`Config::KEYS`] order.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        Self::KEYS
            .iter()
            .filter_map(|key| self.get(key).ok().map(|value| (*key, value)))
            .collect()
    }
}

fn unknown_key(key: &str) -> Error {
    Error::Config(format!(
        "Unknown config key '{}' (expected one of: {})",
        key,
        Config::KEYS.join(", ")
    ))
}
