//! Host integration for appetize-publish
//!
//! Supplies the collaborators the publish pipeline expects from its host
//! when running as a standalone CI tool:
//!
//! - configuration loading (`appetize.toml` / `appetize.yaml`)
//! - the persisted instance identifier
//! - a proxy resolver driven by the `[proxy]` section
//! - a file-backed credential store
//! - a build record sink that exports `APPETIZEIO_*` variables

pub mod config;
pub mod credentials;
pub mod error;
pub mod instance;
pub mod proxy;
pub mod records;

pub use config::Config;
pub use credentials::FileCredentialStore;
pub use error::{ConfigError, CoreError, Result};
pub use instance::InstanceId;
pub use proxy::ConfiguredProxyResolver;
pub use records::FileRecordSink;
