//! Configuration types

use std::path::{Path, PathBuf};
use std::time::Duration;

use appetize_publish::{TransportConfig, DEFAULT_API_BASE};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

use super::defaults::{
    default_credentials_file, default_state_dir, DEFAULT_CONNECT_TIMEOUT_SECS,
    DEFAULT_RECORDS_DIR, DEFAULT_TIMEOUT_SECS, ENV_FILE_VAR,
};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote API settings
    pub api: ApiConfig,

    /// Forward proxy settings
    pub proxy: ProxyConfig,

    /// Credential store settings
    pub credentials: CredentialsConfig,

    /// Build record settings
    pub records: RecordsConfig,

    /// Directory holding the persisted instance identifier
    pub state_dir: Option<PathBuf>,
}

impl Config {
    /// State directory, defaulting to `~/.appetize`
    pub fn state_dir(&self) -> Result<PathBuf> {
        match &self.state_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_state_dir().ok_or(CoreError::NoHomeDir),
        }
    }

    /// Credentials file, defaulting to `~/.appetize/credentials.toml`
    pub fn credentials_file(&self) -> Result<PathBuf> {
        match &self.credentials.file {
            Some(file) => Ok(file.clone()),
            None => default_credentials_file().ok_or(CoreError::NoHomeDir),
        }
    }
}

/// Remote API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API host
    pub base_url: String,

    /// Whole-request timeout in seconds
    pub timeout_secs: u64,

    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

impl ApiConfig {
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            timeout: Duration::from_secs(self.timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
        }
    }
}

/// Proxy type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyType {
    #[default]
    Http,
    Socks,
    None,
}

/// Forward proxy configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Proxy URL (e.g., "http://proxy.internal:3128")
    pub url: Option<String>,

    /// Proxy type
    pub kind: ProxyType,

    /// Host patterns that bypass the proxy (e.g., "*.internal")
    pub no_proxy: Vec<String>,
}

/// Credential store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    /// Credentials file (defaults to ~/.appetize/credentials.toml)
    pub file: Option<PathBuf>,
}

/// Build record configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordsConfig {
    /// Directory for build records, relative to the workspace
    pub dir: PathBuf,

    /// File receiving `KEY=value` lines for later build steps
    pub env_file: Option<PathBuf>,
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_RECORDS_DIR),
            env_file: None,
        }
    }
}

impl RecordsConfig {
    /// Records directory resolved against a workspace
    pub fn dir_in(&self, workspace: &Path) -> PathBuf {
        workspace.join(&self.dir)
    }

    /// Env file from configuration, or from `APPETIZE_ENV_FILE`
    pub fn env_file(&self) -> Option<PathBuf> {
        self.env_file.clone().or_else(|| {
            std::env::var_os(ENV_FILE_VAR)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        })
    }
}
