// ⚙️ Configuration
// Loaded from TOML, with environment overrides and defaults for every field.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Env var naming a config file to load
pub const CONFIG_ENV: &str = "DANBIZ_CONFIG";
/// Env var overriding `database_path`
pub const DATABASE_ENV: &str = "DANBIZ_DATABASE";
/// Config file looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "danbiz.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database file holding company, financials and users
    pub database_path: PathBuf,

    /// tracing filter directive, used when RUST_LOG is unset
    pub log_filter: String,

    pub hashing: HashingConfig,

    pub server: ServerConfig,
}

/// Argon2 cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HashingConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_path: PathBuf::from("cvr_database.db"),
            log_filter: "info".to_string(),
            hashing: HashingConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Default for HashingConfig {
    // argon2 crate defaults (OWASP minimum for Argon2id)
    fn default() -> Self {
        HashingConfig {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_addr: "127.0.0.1:3000".to_string(),
        }
    }
}

impl Config {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("Failed to parse configuration")
    }

    /// Load a config file from disk
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&raw)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Resolve configuration for a binary:
    /// explicit path > $DANBIZ_CONFIG > ./danbiz.toml (if present) > defaults,
    /// then $DANBIZ_DATABASE overrides the database path.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);

        let mut config = match explicit.map(Path::to_path_buf).or(from_env) {
            Some(path) => Self::from_file(&path)?,
            None => {
                let local = Path::new(DEFAULT_CONFIG_FILE);
                if local.exists() {
                    Self::from_file(local)?
                } else {
                    Config::default()
                }
            }
        };

        if let Some(db) = std::env::var_os(DATABASE_ENV) {
            config.database_path = PathBuf::from(db);
        }

        Ok(config)
    }
}
