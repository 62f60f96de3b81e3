//! CLI configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/eventcal/config.toml` by default:
//!
//! ```toml
//! debug = false
//!
//! [calendar]
//! default_name = "personal"
//! default_timezone = "Europe/Paris"
//!
//! [export]
//! directory = "/home/me/exports"
//!
//! [display]
//! json = false
//! ```

use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use eventcal_core::parse_timezone;
use serde::{Deserialize, Serialize};

use crate::error::{CliError, CliResult};

/// Configuration for the eventcal CLI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Debug logging.
    pub debug: bool,

    /// Calendar created and selected when a session starts.
    pub calendar: CalendarSettings,

    pub export: ExportSettings,

    pub display: DisplaySettings,
}

/// Starting calendar settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarSettings {
    /// Name of the calendar to create at startup.
    pub default_name: Option<String>,

    /// IANA timezone of that calendar; defaults to UTC.
    pub default_timezone: Option<String>,
}

impl CalendarSettings {
    /// The calendar to create at session start, if configured.
    pub fn startup_calendar(&self) -> CliResult<Option<(String, Tz)>> {
        let Some(name) = &self.default_name else {
            return Ok(None);
        };
        let timezone = match &self.default_timezone {
            Some(zone) => parse_timezone(zone).map_err(|v| CliError::config(v.to_string()))?,
            None => Tz::UTC,
        };
        Ok(Some((name.clone(), timezone)))
    }
}

/// Export settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Directory relative export paths are resolved against; defaults to the
    /// current directory.
    pub directory: Option<PathBuf>,
}

impl ExportSettings {
    pub fn resolve(&self, file: &Path) -> PathBuf {
        match &self.directory {
            Some(dir) if file.is_relative() => dir.join(file),
            _ => file.to_path_buf(),
        }
    }
}

/// Display settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// Print outcomes as JSON instead of text.
    pub json: bool,
}

impl CliConfig {
    /// Loads configuration from the default path, or defaults if the file
    /// does not exist.
    pub fn load() -> CliResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    /// Parses and validates configuration text.
    pub fn parse(content: &str) -> CliResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| CliError::config(format!("failed to parse config: {}", e)))?;
        config.calendar.startup_calendar()?;
        Ok(config)
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("eventcal")
    }
}
