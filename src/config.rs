//! Command-line configuration file (`config.toml`).
//!
//! ```toml
//! rows = 100
//! columns = 26
//! log_level = "info"
//! ```
//!
//! Every key is optional. Unknown keys are rejected so typos surface.

use cellcalc_core::SheetConfig;
use directories::ProjectDirs;
use log::LevelFilter;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

pub const MAX_CONFIG_FILE_BYTES: u64 = 1_048_576; // 1 MiB

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Refusing to read {path}: file too large ({size} bytes, max {max})")]
    TooLarge { path: PathBuf, size: u64, max: u64 },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid log_level {0:?} (expected off, error, warn, info, debug or trace)")]
    LogLevel(String),

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub rows: Option<usize>,
    pub columns: Option<usize>,
    pub log_level: Option<String>,
}

impl ConfigFile {
    /// Sheet dimensions, falling back to the defaults for missing keys.
    pub fn sheet_config(&self) -> SheetConfig {
        let defaults = SheetConfig::default();
        SheetConfig::new(
            self.rows.unwrap_or(defaults.rows),
            self.columns.unwrap_or(defaults.columns),
        )
    }

    pub fn log_level(&self) -> Result<Option<LevelFilter>, ConfigError> {
        match &self.log_level {
            None => Ok(None),
            Some(name) => LevelFilter::from_str(name.trim())
                .map(Some)
                .map_err(|_| ConfigError::LogLevel(name.clone())),
        }
    }
}

/// Load the config file given on the command line, or the user's default one.
///
/// A missing default file is not an error; a missing explicit one is.
/// Problems come back as warnings alongside the defaults.
pub fn load_config(explicit: Option<&Path>) -> (ConfigFile, Vec<String>) {
    let mut warnings = Vec::new();
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => user_config_path(),
    };

    let Some(path) = path else {
        return (ConfigFile::default(), warnings);
    };

    if !path.exists() {
        if explicit.is_some() {
            warnings.push(ConfigError::NotFound(path).to_string());
        }
        return (ConfigFile::default(), warnings);
    }

    match read_config(&path) {
        Ok(mut config) => {
            if let Err(err) = config.sheet_config().validate() {
                warnings.push(format!(
                    "Ignoring sheet size in {}: {}",
                    path.display(),
                    err
                ));
                config.rows = None;
                config.columns = None;
            }
            (config, warnings)
        }
        Err(err) => {
            warnings.push(err.to_string());
            (ConfigFile::default(), warnings)
        }
    }
}

pub fn read_config(path: &Path) -> Result<ConfigFile, ConfigError> {
    let read_error = |source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    };
    let meta = std::fs::metadata(path).map_err(read_error)?;
    if meta.len() > MAX_CONFIG_FILE_BYTES {
        return Err(ConfigError::TooLarge {
            path: path.to_path_buf(),
            size: meta.len(),
            max: MAX_CONFIG_FILE_BYTES,
        });
    }
    let content = std::fs::read_to_string(path).map_err(read_error)?;
    toml::from_str::<ConfigFile>(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn user_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "cellcalc")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("config.toml");
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(tag: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "cellcalc_config_{}_{}_{:?}.toml",
            tag,
            std::process::id(),
            std::thread::current().id(),
        ));
        std::fs::write(&path, content).expect("write temp config");
        path
    }

    #[test]
    fn parses_all_keys() {
        let path = temp_file("full", "rows = 10\ncolumns = 5\nlog_level = \"debug\"\n");
        let (config, warnings) = load_config(Some(&path));
        assert!(warnings.is_empty());
        assert_eq!(config.sheet_config(), SheetConfig::new(10, 5));
        assert_eq!(config.log_level().unwrap(), Some(LevelFilter::Debug));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_keys_use_defaults() {
        let path = temp_file("partial", "rows = 7\n");
        let (config, _) = load_config(Some(&path));
        assert_eq!(config.sheet_config(), SheetConfig::new(7, 26));
        assert_eq!(config.log_level().unwrap(), None);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn unknown_key_is_a_warning() {
        let path = temp_file("unknown", "rows = 7\ncolour = \"red\"\n");
        let (config, warnings) = load_config(Some(&path));
        assert_eq!(config, ConfigFile::default());
        assert!(warnings.iter().any(|w| w.contains("Failed to parse")));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn invalid_size_warns_and_uses_defaults() {
        let path = temp_file(
            "huge",
            "rows = 9223372036854775807\nlog_level = \"info\"\n",
        );
        let (config, warnings) = load_config(Some(&path));
        assert_eq!(config.sheet_config(), SheetConfig::default());
        assert_eq!(config.log_level().unwrap(), Some(LevelFilter::Info));
        assert!(warnings.iter().any(|w| w.contains("Ignoring sheet size")));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn rejects_oversized_file() {
        let oversized = "#".repeat(MAX_CONFIG_FILE_BYTES as usize + 1);
        let path = temp_file("large", &oversized);
        let (_, warnings) = load_config(Some(&path));
        assert!(
            warnings
                .iter()
                .any(|w| w.contains("file too large") && w.contains("Refusing to read"))
        );
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_explicit_file_warns() {
        let path = std::env::temp_dir().join("cellcalc_config_does_not_exist.toml");
        let (config, warnings) = load_config(Some(&path));
        assert_eq!(config, ConfigFile::default());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn bad_log_level() {
        let config = ConfigFile {
            log_level: Some("loud".to_string()),
            ..ConfigFile::default()
        };
        assert!(matches!(config.log_level(), Err(ConfigError::LogLevel(_))));
    }
}
