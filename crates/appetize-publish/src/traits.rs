//! Collaborator traits supplied by the host
//!
//! The pipeline only reads from these; implementations own any locking.

use crate::error::Result;
use crate::record::BuildRecord;

/// Kind of a forward proxy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyKind {
    Http,
    Socks,
}

/// A forward proxy selected for a target host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxySetting {
    pub kind: ProxyKind,
    /// Proxy URL, e.g. `http://proxy.internal:3128`
    pub url: String,
}

/// Resolves the forward proxy for a host
pub trait ProxyResolver: Send + Sync {
    /// Proxy to use for `host`, or `None` to connect directly
    fn resolve_proxy(&self, host: &str) -> Option<ProxySetting>;
}

/// Resolver that always connects directly
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProxy;

impl ProxyResolver for NoProxy {
    fn resolve_proxy(&self, _host: &str) -> Option<ProxySetting> {
        None
    }
}

/// A stored API token
#[derive(Clone, PartialEq, Eq)]
pub struct StoredCredential {
    pub id: String,
    pub description: Option<String>,
    pub secret: String,
}

impl StoredCredential {
    /// Name shown when listing credentials
    pub fn display_name(&self) -> String {
        match self.description.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            Some(description) => format!("API Token ({})", description),
            None => "API Token".to_string(),
        }
    }
}

impl std::fmt::Debug for StoredCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredCredential")
            .field("id", &self.id)
            .field("description", &self.description)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Read-only query over the host's credential vault
pub trait CredentialStore: Send + Sync {
    /// All credentials of the given kind
    fn list_credentials(&self, kind: &str) -> Result<Vec<StoredCredential>>;
}

/// Receives the record of a successful publish
pub trait BuildRecordSink {
    fn attach(&self, record: &BuildRecord) -> Result<()>;
}

/// Line-oriented build console
pub trait BuildLog: Send + Sync {
    fn println(&self, line: &str);
}

/// Build log that forwards every line as a tracing event
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl BuildLog for TracingLog {
    fn println(&self, line: &str) {
        tracing::info!(target: "appetize::build", "{}", line);
    }
}
