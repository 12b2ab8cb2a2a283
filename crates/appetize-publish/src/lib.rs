//! Publish mobile builds to Appetize.io
//!
//! This crate implements the publish pipeline that takes a freshly built app,
//! uploads it to Appetize.io and records the resulting URLs against the build.
//!
//! ## Platforms
//!
//! - **iOS**: a simulator `.app` directory, zipped before upload
//! - **Android**: an `.apk` file, uploaded as-is
//!
//! ## Usage
//!
//! ```ignore
//! use appetize_publish::{AppetizeApi, PublishPipeline, TransportClient, TransportConfig};
//!
//! let transport = TransportClient::new(&TransportConfig::default(), proxies)?;
//! let api = AppetizeApi::new(transport, log.clone());
//! let pipeline = PublishPipeline::new(api, credentials, log);
//!
//! match pipeline.run(&request).await {
//!     PublishOutcome::Success { result, .. } => println!("{}", result.public_url),
//!     PublishOutcome::Failure { stage, reason } => eprintln!("{stage}: {reason}"),
//! }
//! ```

pub mod api;
pub mod credentials;
pub mod error;
pub mod job_id;
pub mod packager;
pub mod pipeline;
pub mod record;
pub mod traits;
pub mod transport;
pub mod types;

pub use api::{AppetizeApi, DEFAULT_API_BASE};
pub use credentials::{CredentialResolver, CREDENTIAL_KIND, PLACEHOLDER_API_TOKEN, PLACEHOLDER_ID};
pub use error::{PublishError, Result};
pub use job_id::derive_job_id;
pub use packager::{ArtifactPackager, PackagedArtifact};
pub use pipeline::PublishPipeline;
pub use record::{AppRecord, BuildRecord};
pub use traits::{
    BuildLog, BuildRecordSink, CredentialStore, NoProxy, ProxyKind, ProxyResolver, ProxySetting,
    StoredCredential, TracingLog,
};
pub use transport::{TransportClient, TransportConfig};
pub use types::*;

// Re-export so callers can build a token without depending on tokio-util
pub use tokio_util::sync::CancellationToken;
