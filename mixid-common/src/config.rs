//! Configuration loading and output folder resolution
//!
//! Bootstrap settings come from a TOML file. Every value can be overridden, in
//! priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the output folder
pub const OUTPUT_DIR_ENV: &str = "MIXID_OUTPUT_DIR";

/// Default chunk duration in seconds
pub const DEFAULT_CHUNK_DURATION: u32 = 10;

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Folder receiving tracklists and archived downloads
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// Default chunk duration in seconds
    #[serde(default)]
    pub chunk_duration: Option<u32>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Recognition service credentials and tuning
    #[serde(default)]
    pub acrcloud: AcrCloudSection,

    /// Video link lookup settings
    #[serde(default)]
    pub links: LinksSection,

    /// Mix downloader settings
    #[serde(default)]
    pub downloader: DownloaderSection,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directives (e.g. "info", "mixid_extract=debug")
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// `[acrcloud]` table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AcrCloudSection {
    pub host: Option<String>,
    pub access_key: Option<String>,
    pub access_secret: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,
    /// Minimum interval between two identify requests
    pub min_interval_ms: Option<u64>,
}

/// `[links]` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinksSection {
    /// Resolve video links for identified tracks
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// YouTube Data API key; search page scraping is used when absent
    #[serde(default)]
    pub youtube_api_key: Option<String>,
    /// Attempts per lookup on transport failures
    #[serde(default)]
    pub max_retries: Option<u32>,
}

impl Default for LinksSection {
    fn default() -> Self {
        Self {
            enabled: true,
            youtube_api_key: None,
            max_retries: None,
        }
    }
}

fn default_true() -> bool {
    true
}

/// `[downloader]` table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DownloaderSection {
    /// Downloader executable (default: `scdl` on PATH)
    pub program: Option<String>,
}

/// Default configuration file path for the platform
///
/// `~/.config/mixid/config.toml` on Linux, the platform config dir elsewhere.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("mixid").join("config.toml"))
}

/// Load the TOML bootstrap file
///
/// A missing file is not an error: defaults are returned and a warning is
/// logged. A file that exists but cannot be parsed is a configuration error.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        warn!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;

    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Load the TOML file given on the command line, or the platform default
pub fn load_config(cli_path: Option<&Path>) -> Result<TomlConfig> {
    match cli_path {
        Some(path) => load_toml_config(path),
        None => match default_config_path() {
            Some(path) => load_toml_config(&path),
            None => {
                warn!("Could not determine config directory, using defaults");
                Ok(TomlConfig::default())
            }
        },
    }
}

/// Resolve one string setting: CLI → ENV → TOML
///
/// Blank values are treated as absent at every tier.
pub fn resolve_setting(
    cli_value: Option<&str>,
    env_var_name: &str,
    toml_value: Option<&str>,
) -> Option<String> {
    let non_blank = |v: &str| !v.trim().is_empty();

    if let Some(value) = cli_value.filter(|v| non_blank(v)) {
        return Some(value.to_string());
    }

    if let Ok(value) = std::env::var(env_var_name) {
        if non_blank(&value) {
            return Some(value);
        }
    }

    toml_value.filter(|v| non_blank(v)).map(str::to_string)
}

/// Output folder resolution: CLI → `MIXID_OUTPUT_DIR` → TOML → `./output`
pub fn resolve_output_dir(cli_arg: Option<&Path>, toml_config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(OUTPUT_DIR_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    toml_config
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("./output"))
}

/// Chunk duration resolution: CLI → TOML → 10 seconds
pub fn resolve_chunk_duration(cli_arg: Option<u32>, toml_config: &TomlConfig) -> Result<u32> {
    let value = cli_arg
        .or(toml_config.chunk_duration)
        .unwrap_or(DEFAULT_CHUNK_DURATION);

    if value == 0 {
        return Err(Error::InvalidInput(
            "chunk_duration must be a positive number of seconds".to_string(),
        ));
    }
    Ok(value)
}
