use crate::constants::{
    DEFAULT_CHUNK_DELAY_US, DEFAULT_CHUNK_SIZE, DEFAULT_CONFIG_PATH_UNIX, DEFAULT_CONFIG_PATH_WINDOWS,
    DEFAULT_MAX_REPLY_LEN, FTP_CONTROL_PORT,
};
use crate::core_network::AddressingMode;
use crate::core_transfer::Throttle;
use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub default_mode: AddressingMode,
    pub local_dir: PathBuf,
    pub chunk_size: usize,
    pub chunk_delay_us: u64,
    pub max_reply_len: usize,
    pub accept_timeout_secs: Option<u64>, // None waits for the server forever
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub client: ClientConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: String::from("localhost"),
            port: FTP_CONTROL_PORT,
            username: None,
            default_mode: AddressingMode::Passive,
            local_dir: PathBuf::from("."),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_delay_us: DEFAULT_CHUNK_DELAY_US,
            max_reply_len: DEFAULT_MAX_REPLY_LEN,
            accept_timeout_secs: None,
        }
    }
}

impl ClientConfig {
    pub fn throttle(&self) -> Throttle {
        Throttle::new(self.chunk_size, Duration::from_micros(self.chunk_delay_us))
    }

    pub fn accept_timeout(&self) -> Option<Duration> {
        self.accept_timeout_secs.map(Duration::from_secs)
    }
}

impl Config {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
        Self::from_toml(&config_str)
            .with_context(|| format!("Failed to parse configuration file: {}", path.display()))
    }

    pub fn from_toml(config_str: &str) -> Result<Self> {
        Ok(toml::from_str(config_str)?)
    }

    /// Loads `explicit` when given. Otherwise the platform default file is
    /// read if it exists, and built-in defaults are used if it does not.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from_file(path);
        }

        let default_path = Path::new(if cfg!(target_os = "windows") {
            DEFAULT_CONFIG_PATH_WINDOWS
        } else {
            DEFAULT_CONFIG_PATH_UNIX
        });
        if default_path.exists() {
            Self::load_from_file(default_path)
        } else {
            debug!("No configuration file at {}, using defaults", default_path.display());
            Ok(Self::default())
        }
    }
}

pub fn log_config(config: &ClientConfig) {
    info!("  Server: {}:{}", config.host, config.port);
    info!("  Data Mode: {}", config.default_mode);
    info!("  Local Directory: {}", config.local_dir.display());
    info!(
        "  Throttle: {} bytes per chunk, {} us per chunk",
        config.chunk_size, config.chunk_delay_us
    );
    match config.accept_timeout_secs {
        Some(secs) => info!("  Active Accept Timeout: {} s", secs),
        None => info!("  Active Accept Timeout: none"),
    }
}
