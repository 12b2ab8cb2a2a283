//! Configuration validation

use tracing::debug;

use crate::error::{ConfigError, Result};

use super::types::{Config, ProxyType};

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    debug!("validating configuration");
    validate_api(config)?;
    validate_proxy(config)?;
    debug!("configuration validation passed");
    Ok(())
}

fn validate_api(config: &Config) -> Result<()> {
    match url::Url::parse(&config.api.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        _ => {
            return Err(ConfigError::InvalidValue {
                field: "api.base_url".to_string(),
                message: format!("not an http(s) URL: {}", config.api.base_url),
            }
            .into());
        }
    }

    if config.api.timeout_secs == 0 {
        return Err(ConfigError::InvalidValue {
            field: "api.timeout_secs".to_string(),
            message: "must be greater than zero".to_string(),
        }
        .into());
    }

    if config.api.connect_timeout_secs == 0 {
        return Err(ConfigError::InvalidValue {
            field: "api.connect_timeout_secs".to_string(),
            message: "must be greater than zero".to_string(),
        }
        .into());
    }

    Ok(())
}

fn validate_proxy(config: &Config) -> Result<()> {
    if config.proxy.kind == ProxyType::None {
        return Ok(());
    }

    if let Some(proxy_url) = &config.proxy.url {
        if url::Url::parse(proxy_url).is_err() {
            return Err(ConfigError::InvalidValue {
                field: "proxy.url".to_string(),
                message: format!("not a valid URL: {}", proxy_url),
            }
            .into());
        }
    }

    for pattern in &config.proxy.no_proxy {
        if glob::Pattern::new(pattern).is_err() {
            return Err(ConfigError::InvalidValue {
                field: "proxy.no_proxy".to_string(),
                message: format!("invalid host pattern: {}", pattern),
            }
            .into());
        }
    }

    Ok(())
}
