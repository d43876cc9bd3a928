//! Server configuration
//!
//! Layered: built-in defaults, then an optional TOML file, then `HBNB__*`
//! environment variables (`HBNB__SERVER__PORT=8080`,
//! `HBNB__STORAGE__TYPE=db`, ...).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable naming an optional configuration file
pub const CONFIG_PATH_VAR: &str = "HBNB_CONFIG";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Run mode; `test` wipes the database schema on reload
    #[serde(default)]
    pub env: RunMode,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    #[default]
    Dev,
    Test,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Which storage backend serves the process
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// JSON file loaded into memory
    #[default]
    File,
    /// SQLite database
    Db,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(rename = "type", default)]
    pub backend: Backend,

    /// JSON document used by the file backend
    #[serde(default = "default_file_path")]
    pub file_path: PathBuf,

    /// Connection URL used by the database backend
    #[serde(default = "default_database_url")]
    pub database_url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: Backend::File,
            file_path: default_file_path(),
            database_url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_file_path() -> PathBuf {
    PathBuf::from("file.json")
}

fn default_database_url() -> String {
    "sqlite://hbnb.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    /// Load configuration, reading the file at `path` if given
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&Settings::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("HBNB")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Load configuration using the file named by `HBNB_CONFIG`, if set
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let path = std::env::var(CONFIG_PATH_VAR).ok();
        Self::load(path.as_deref())
    }
}
