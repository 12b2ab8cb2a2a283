//! File-backed credential store

use std::env;
use std::path::{Path, PathBuf};

use appetize_publish::{CredentialStore, PublishError, StoredCredential, CREDENTIAL_KIND};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::error::{CoreError, Result};

/// Credentials read from a TOML file
///
/// ```toml
/// [[credentials]]
/// id = "ci"
/// description = "CI account"
/// api_token = "${APPETIZE_API_TOKEN}"
/// ```
///
/// The file is re-read on every query and never written.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

#[derive(Default, Deserialize)]
struct CredentialsFile {
    #[serde(default)]
    credentials: Vec<CredentialEntry>,
}

#[derive(Deserialize)]
struct CredentialEntry {
    id: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default = "default_kind")]
    kind: String,
    api_token: String,
}

fn default_kind() -> String {
    CREDENTIAL_KIND.to_string()
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<CredentialsFile> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "credentials file not found");
            return Ok(CredentialsFile::default());
        }

        let content = std::fs::read_to_string(&self.path).map_err(|e| self.error(e))?;
        toml::from_str(&content).map_err(|e| self.error(e))
    }

    fn error(&self, err: impl std::fmt::Display) -> CoreError {
        CoreError::Credentials {
            path: self.path.clone(),
            reason: err.to_string(),
        }
    }
}

impl CredentialStore for FileCredentialStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn list_credentials(&self, kind: &str) -> appetize_publish::Result<Vec<StoredCredential>> {
        let file = self
            .read()
            .map_err(|e| PublishError::CredentialStore(e.to_string()))?;

        let mut credentials = Vec::new();
        for entry in file.credentials.into_iter().filter(|entry| entry.kind == kind) {
            let secret = expand_env(&entry.api_token).map_err(|var_name| {
                warn!(
                    id = %entry.id,
                    var = %var_name,
                    "credential references an unset environment variable"
                );
                PublishError::CredentialStore(format!(
                    "credential '{}' references unset variable {}",
                    entry.id, var_name
                ))
            })?;
            credentials.push(StoredCredential {
                id: entry.id,
                description: entry.description,
                secret,
            });
        }

        debug!(count = credentials.len(), kind, "listed credentials");
        Ok(credentials)
    }
}

/// Expand a whole-value `${VAR}` reference, returning the variable name when unset
fn expand_env(value: &str) -> std::result::Result<String, String> {
    let value = value.trim();
    match value.strip_prefix("${").and_then(|v| v.strip_suffix('}')) {
        Some(var_name) => env::var(var_name).map_err(|_| var_name.to_string()),
        None => Ok(value.to_string()),
    }
}
