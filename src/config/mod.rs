//! Configuration for kernel locations and remote services
//!
//! Values come from built-in defaults, an optional JSON file named by
//! `SPICETOOLS_CONFIG`, and finally individual environment overrides.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{Result, SpiceToolsError};

/// Environment variable naming a JSON configuration file
pub const CONFIG_ENV: &str = "SPICETOOLS_CONFIG";
/// Environment variable overriding the kernel directory
pub const KERNEL_DIR_ENV: &str = "SPICETOOLS_KERNEL_DIR";
/// Environment variable overriding the HTTP timeout in seconds
pub const HTTP_TIMEOUT_ENV: &str = "SPICETOOLS_HTTP_TIMEOUT";

/// Get the cache directory path
pub fn get_cache_dir() -> PathBuf {
    let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".cache").join("spicetools")
}

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory substituted for the `$KERNELS` symbol and used for downloads
    pub kernel_dir: PathBuf,
    /// Timeout applied to every HTTP request
    pub http_timeout_secs: u64,
    /// User-Agent header sent to remote services
    pub user_agent: String,
    /// Small-Body Database query endpoint
    pub sbdb_url: String,
    /// Horizons API endpoint
    pub horizons_url: String,
    /// Directory listing of the planetary DE kernels
    pub de_base_url: String,
    /// Root of the NAIF generic kernels tree
    pub naif_generic_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            kernel_dir: get_cache_dir().join("kernels"),
            http_timeout_secs: 300,
            user_agent: format!("spicetools/{}", env!("CARGO_PKG_VERSION")),
            sbdb_url: "https://ssd-api.jpl.nasa.gov/sbdb_query.api".to_string(),
            horizons_url: "https://ssd.jpl.nasa.gov/api/horizons.api".to_string(),
            de_base_url: "https://ssd.jpl.nasa.gov/ftp/eph/planets/bsp".to_string(),
            naif_generic_url: "https://naif.jpl.nasa.gov/pub/naif/generic_kernels".to_string(),
        }
    }
}

impl Config {
    /// Load defaults, the optional config file and environment overrides
    pub fn load() -> Result<Self> {
        let base = match env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(base.with_env_overrides())
    }

    /// Read a JSON configuration file; missing keys keep their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        let config: Config = serde_json::from_str(&text)?;
        debug!("Loaded configuration from {}", path.as_ref().display());
        Ok(config)
    }

    /// Apply `SPICETOOLS_KERNEL_DIR` and `SPICETOOLS_HTTP_TIMEOUT`
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(dir) = env::var_os(KERNEL_DIR_ENV) {
            self.kernel_dir = PathBuf::from(dir);
        }
        if let Ok(raw) = env::var(HTTP_TIMEOUT_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(secs) => self.http_timeout_secs = secs,
                Err(_) => warn!("Ignoring {}={:?}: not a whole number", HTTP_TIMEOUT_ENV, raw),
            }
        }
        self
    }

    /// Set a custom kernel directory
    pub fn with_kernel_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.kernel_dir = path.as_ref().to_path_buf();
        self
    }

    /// Ensure that the kernel directory exists
    pub fn ensure_kernel_dir(&self) -> Result<&Path> {
        fs::create_dir_all(&self.kernel_dir)?;
        Ok(&self.kernel_dir)
    }

    /// Build a blocking HTTP client with the configured timeout and agent
    pub fn http_client(&self) -> Result<reqwest::blocking::Client> {
        reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(self.http_timeout_secs))
            .user_agent(self.user_agent.clone())
            .build()
            .map_err(SpiceToolsError::Http)
    }
}
