//! API token resolution

use tracing::{debug, instrument};

use crate::error::{PublishError, Result};
use crate::traits::CredentialStore;

/// Credential reference that selects the placeholder token
pub const PLACEHOLDER_ID: &str = "placeholder";

/// Shared token that lets the integration run without real credentials
pub const PLACEHOLDER_API_TOKEN: &str = "tok_7vkmr5quwwjjxy4rv1q1h0rn08";

/// Credential kind holding Appetize.io API tokens
pub const CREDENTIAL_KIND: &str = "appetize-api-token";

/// Maps a credential reference to a cleartext API token
pub struct CredentialResolver<'a> {
    store: &'a dyn CredentialStore,
}

impl<'a> CredentialResolver<'a> {
    pub fn new(store: &'a dyn CredentialStore) -> Self {
        Self { store }
    }

    #[instrument(skip(self))]
    pub fn resolve(&self, credential_ref: Option<&str>) -> Result<String> {
        let id = match credential_ref.map(str::trim) {
            None | Some("") | Some(PLACEHOLDER_ID) => {
                debug!("using placeholder API token");
                return Ok(PLACEHOLDER_API_TOKEN.to_string());
            }
            Some(id) => id,
        };

        let credentials = self.store.list_credentials(CREDENTIAL_KIND)?;
        debug!(count = credentials.len(), "scanning stored credentials");

        credentials
            .into_iter()
            .find(|c| c.id == id)
            .map(|c| c.secret)
            .ok_or_else(|| PublishError::CredentialNotFound(id.to_string()))
    }
}
