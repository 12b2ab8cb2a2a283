//! Default configuration values

use std::path::PathBuf;

/// Default configuration file name (TOML)
pub const DEFAULT_CONFIG_TOML: &str = "appetize.toml";

/// Default configuration file name (YAML)
pub const DEFAULT_CONFIG_YAML: &str = "appetize.yaml";

/// Default request timeout, generous enough for large bundles
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Default connect timeout
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default build record directory, relative to the workspace
pub const DEFAULT_RECORDS_DIR: &str = ".appetize/builds";

/// Environment variable naming the env file for later build steps
pub const ENV_FILE_VAR: &str = "APPETIZE_ENV_FILE";

/// Get list of config file names to search for
pub fn config_file_names() -> Vec<&'static str> {
    vec![
        DEFAULT_CONFIG_TOML,
        DEFAULT_CONFIG_YAML,
        ".appetize.toml",
        ".appetize.yaml",
    ]
}

/// `~/.appetize`
pub fn default_state_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".appetize"))
}

/// `~/.appetize/credentials.toml`
pub fn default_credentials_file() -> Option<PathBuf> {
    default_state_dir().map(|dir| dir.join("credentials.toml"))
}

/// Default configuration template
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# Appetize.io publish configuration

[api]
base_url = "https://api.appetize.io"
timeout_secs = 600
connect_timeout_secs = 30

[proxy]
# url = "http://proxy.internal:3128"
kind = "http"
no_proxy = []

[credentials]
# file = "~/.appetize/credentials.toml"

[records]
dir = ".appetize/builds"
# env_file = "appetize.env"
"#;
