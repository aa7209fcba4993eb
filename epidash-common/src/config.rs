//! Configuration loading and store resolution
//!
//! The pipeline never bakes in absolute paths. Every externally visible
//! location (store connection string, snapshot directory, population
//! reference file) is resolved through the same priority chain:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Environment variable naming the store connection string
pub const ENV_DATABASE_URL: &str = "EPIDASH_DB";
/// Environment variable naming the snapshot output directory
pub const ENV_SNAPSHOT_DIR: &str = "EPIDASH_SNAPSHOT_DIR";
/// Environment variable naming the local-authority population CSV
pub const ENV_POPULATION_FILE: &str = "EPIDASH_POPULATION_FILE";

/// Keys understood in the optional TOML config file
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub database_url: Option<String>,
    pub snapshot_dir: Option<PathBuf>,
    pub population_file: Option<PathBuf>,
}

/// Fully resolved pipeline settings
#[derive(Debug, Clone)]
pub struct Settings {
    /// Store connection string (sqlx URL)
    pub database_url: String,
    /// Directory receiving the published view snapshot files
    pub snapshot_dir: PathBuf,
    /// Optional local-authority population reference CSV
    pub population_file: Option<PathBuf>,
}

impl Settings {
    /// Resolve settings from CLI arguments, environment, config file and defaults
    pub fn resolve(
        cli_database_url: Option<String>,
        cli_snapshot_dir: Option<PathBuf>,
        cli_population_file: Option<PathBuf>,
    ) -> Result<Self> {
        let file = load_config_file().unwrap_or_default();

        let database_url = cli_database_url
            .or_else(|| std::env::var(ENV_DATABASE_URL).ok())
            .or(file.database_url)
            .unwrap_or_else(default_database_url);

        let snapshot_dir = cli_snapshot_dir
            .or_else(|| std::env::var(ENV_SNAPSHOT_DIR).ok().map(PathBuf::from))
            .or(file.snapshot_dir)
            .unwrap_or_else(default_snapshot_dir);

        let population_file = cli_population_file
            .or_else(|| std::env::var(ENV_POPULATION_FILE).ok().map(PathBuf::from))
            .or(file.population_file);

        Ok(Settings {
            database_url,
            snapshot_dir,
            population_file,
        })
    }
}

/// Locate and parse the TOML config file, if one exists
fn load_config_file() -> Result<ConfigFile> {
    let path = config_file_path()?;
    let content = std::fs::read_to_string(&path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))
}

/// Get the platform config file path
fn config_file_path() -> Result<PathBuf> {
    if cfg!(target_os = "linux") {
        // Try ~/.config/epidash/config.toml first, then /etc/epidash/config.toml
        if let Some(path) = dirs::config_dir().map(|d| d.join("epidash").join("config.toml")) {
            if path.exists() {
                return Ok(path);
            }
        }
        let system_config = PathBuf::from("/etc/epidash/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
        Err(Error::Config("No config file found".to_string()))
    } else {
        let path = dirs::config_dir()
            .map(|d| d.join("epidash").join("config.toml"))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;
        if path.exists() {
            Ok(path)
        } else {
            Err(Error::Config(format!("Config file not found: {:?}", path)))
        }
    }
}

/// Default store: a SQLite database under the platform data directory
fn default_database_url() -> String {
    let path = data_dir().join("epidash.db");
    format!("sqlite://{}?mode=rwc", path.display())
}

/// Default snapshot directory under the platform data directory
fn default_snapshot_dir() -> PathBuf {
    data_dir().join("data_view")
}

fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("epidash"))
        .unwrap_or_else(|| PathBuf::from("./epidash_data"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_argument_wins_over_defaults() {
        let settings = Settings::resolve(
            Some("sqlite://custom.db".to_string()),
            Some(PathBuf::from("/tmp/views")),
            None,
        )
        .unwrap();
        assert_eq!(settings.database_url, "sqlite://custom.db");
        assert_eq!(settings.snapshot_dir, PathBuf::from("/tmp/views"));
        assert!(settings.population_file.is_none());
    }

    #[test]
    fn defaults_are_never_empty() {
        let url = default_database_url();
        assert!(url.starts_with("sqlite://"));
        assert!(url.contains("epidash.db"));
    }

    #[test]
    fn config_file_parses_partial_keys() {
        let parsed: ConfigFile = toml::from_str("database_url = \"sqlite://x.db\"").unwrap();
        assert_eq!(parsed.database_url.as_deref(), Some("sqlite://x.db"));
        assert!(parsed.snapshot_dir.is_none());
    }
}
