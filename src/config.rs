//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.teampulse.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".teampulse.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Export and presentation settings.
    #[serde(default)]
    pub export: ExportConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to listen on.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Externally reachable base URL used in survey links.
    ///
    /// When unset, links are built from the request's Host header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,

    /// Respondent page path the survey link points at.
    #[serde(default = "default_survey_page")]
    pub survey_page: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            public_url: None,
            survey_page: default_survey_page(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_survey_page() -> String {
    "index.html".to_string()
}

/// Storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite database path, `:memory:` for an in-memory SQLite database,
    /// or `memory` for the non-persistent in-process store.
    #[serde(default = "default_database")]
    pub database: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
        }
    }
}

fn default_database() -> String {
    "assessments.db".to_string()
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

/// Export and presentation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Decimal places used when rendering means.
    #[serde(default = "default_decimal_places")]
    pub decimal_places: u32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            decimal_places: default_decimal_places(),
        }
    }
}

fn default_decimal_places() -> u32 {
    2
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments (and their environment fallbacks) take precedence over
    /// config file settings, but only when actually provided.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref database) = args.database {
            self.storage.database = database.clone();
        }

        if let Some(ref bind) = args.bind {
            self.server.bind = bind.clone();
        }
        if let Some(ref public_url) = args.public_url {
            self.server.public_url = Some(public_url.clone());
        }
    }

    /// Check values that serde accepts but the service cannot use.
    pub fn validate(&self) -> Result<()> {
        self.server
            .bind
            .parse::<std::net::SocketAddr>()
            .with_context(|| format!("Invalid bind address: {}", self.server.bind))?;

        if let Some(ref url) = self.server.public_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                anyhow::bail!("Public URL must start with 'http://' or 'https://'");
            }
        }

        if self.storage.database.trim().is_empty() {
            anyhow::bail!("Database path must not be empty");
        }

        if self.export.decimal_places > 10 {
            anyhow::bail!("Decimal places must be at most 10");
        }

        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
