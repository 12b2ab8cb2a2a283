//! Proxy resolution from configuration

use appetize_publish::{ProxyKind, ProxyResolver, ProxySetting};
use tracing::debug;

use crate::config::{ProxyConfig, ProxyType};

/// Resolves proxies from the `[proxy]` configuration section
#[derive(Debug, Clone)]
pub struct ConfiguredProxyResolver {
    setting: Option<ProxySetting>,
    no_proxy: Vec<glob::Pattern>,
}

impl ConfiguredProxyResolver {
    pub fn new(config: &ProxyConfig) -> Self {
        let kind = match config.kind {
            ProxyType::Http => Some(ProxyKind::Http),
            ProxyType::Socks => Some(ProxyKind::Socks),
            ProxyType::None => None,
        };

        let setting = match (kind, &config.url) {
            (Some(kind), Some(url)) if !url.trim().is_empty() => Some(ProxySetting {
                kind,
                url: url.clone(),
            }),
            _ => None,
        };

        // Patterns were checked by config validation; unparsable ones are dropped.
        let no_proxy = config
            .no_proxy
            .iter()
            .filter_map(|p| glob::Pattern::new(&p.to_ascii_lowercase()).ok())
            .collect();

        Self { setting, no_proxy }
    }
}

impl ProxyResolver for ConfiguredProxyResolver {
    fn resolve_proxy(&self, host: &str) -> Option<ProxySetting> {
        let setting = self.setting.as_ref()?;
        let host = host.to_ascii_lowercase();

        if self.no_proxy.iter().any(|p| p.matches(&host)) {
            debug!(host = %host, "host bypasses proxy");
            return None;
        }

        Some(setting.clone())
    }
}
