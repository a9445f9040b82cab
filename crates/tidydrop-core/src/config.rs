/// Persisted configuration (`organizer_config.json`).
///
/// Loading never fails: a missing file, unreadable file or invalid JSON all
/// produce [`OrganizerConfig::default`]. The last two also hand back the
/// problem so the caller can report it once logging is up.
/// Every field is optional so partial documents keep the remaining defaults.
use crate::classifier::RuleSet;
use crate::detector::DetectorMode;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Log verbosity as written in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    #[serde(alias = "WARNING")]
    Warn,
    Error,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`.
    pub fn as_filter(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        })
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(Self::Debug),
            "INFO" => Ok(Self::Info),
            "WARN" | "WARNING" => Ok(Self::Warn),
            "ERROR" => Ok(Self::Error),
            other => Err(format!("unknown log level '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizerConfig {
    /// Start watching when launched without a command.
    pub auto_start: bool,
    pub show_notifications: bool,
    pub log_level: LogLevel,
    /// Directory to organize; the platform download folder when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downloads_dir: Option<PathBuf>,
    pub watch_mode: DetectorMode,
    pub rules: RuleSet,
}

impl Default for OrganizerConfig {
    fn default() -> Self {
        Self {
            auto_start: true,
            show_notifications: true,
            log_level: LogLevel::Info,
            downloads_dir: None,
            watch_mode: DetectorMode::Auto,
            rules: RuleSet::default(),
        }
    }
}

impl OrganizerConfig {
    /// Load from `path`, falling back to defaults on any problem.
    ///
    /// A missing file is the normal first-run case and yields no error.
    pub fn load(path: &Path) -> (Self, Option<Error>) {
        match Self::try_load(path) {
            Ok(config) => (config, None),
            Err(err) if err.is_not_found() => {
                debug!("No config at {}, using defaults", path.display());
                (Self::default(), None)
            }
            Err(err) => (Self::default(), Some(err)),
        }
    }

    pub fn try_load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::from_io(path, e))?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Write the config as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| Error::from_io(parent, e))?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|e| Error::from_io(path, e))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
