//! Appetize.io API client

use std::sync::Arc;

use reqwest::Method;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument};

use crate::error::{PublishError, Result};
use crate::packager::PackagedArtifact;
use crate::traits::BuildLog;
use crate::transport::{RequestBody, TransportClient, TransportResponse};
use crate::types::{PresignedUrls, UpdateRequest, UpdateResult};

/// Production API host
pub const DEFAULT_API_BASE: &str = "https://api.appetize.io";

const PRESIGN_PATH: &str = "/v1/jenkins/presigned";
const UPDATE_PATH: &str = "/v1/app/update";

/// Client for the presign, upload and update calls
///
/// Each call is attempted once. Failures are written to the build log as a
/// one-line diagnostic and returned to the caller.
pub struct AppetizeApi {
    transport: TransportClient,
    base_url: String,
    log: Arc<dyn BuildLog>,
}

impl AppetizeApi {
    pub fn new(transport: TransportClient, log: Arc<dyn BuildLog>) -> Self {
        Self::with_base_url(transport, DEFAULT_API_BASE, log)
    }

    /// Point the client at a different API host
    pub fn with_base_url(
        transport: TransportClient,
        base_url: impl Into<String>,
        log: Arc<dyn BuildLog>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            transport,
            base_url,
            log,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch fresh upload URLs
    #[instrument(skip(self))]
    pub async fn presign(&self) -> Result<PresignedUrls> {
        let url = format!("{}{}", self.base_url, PRESIGN_PATH);

        let result = async {
            let response = self.transport.request(Method::GET, &url, None, None).await?;
            decode(response)
        }
        .await;

        if let Err(ref e) = result {
            self.log.println(&format!("Error getting Appetize.io upload URLs: {}", e));
        }
        result
    }

    /// PUT the artifact to a presigned URL
    ///
    /// The response body is not interpreted, so a rejected upload is
    /// reported by status alone.
    #[instrument(skip(self, artifact), fields(len = artifact.len()))]
    pub async fn upload(&self, artifact: &PackagedArtifact, url: &str) -> Result<()> {
        let result = async {
            let file = artifact.open().await?;
            let body = RequestBody::File {
                file,
                len: artifact.len(),
            };
            self.transport.request(Method::PUT, url, Some(body), None).await
        }
        .await;

        match result {
            Ok(response) => {
                debug!(status = response.status, "upload accepted");
                Ok(())
            }
            Err(e) => {
                let e = match e {
                    PublishError::Api { status, .. } => PublishError::Api { status, body: None },
                    other => other,
                };
                self.log
                    .println(&format!("Error uploading to {}: {}", redact_query(url), e));
                Err(e)
            }
        }
    }

    /// Create or update the remote app record
    #[instrument(skip(self, request), fields(platform = %request.platform, build = request.build_number))]
    pub async fn update(&self, request: &UpdateRequest) -> Result<UpdateResult> {
        let url = format!("{}{}", self.base_url, UPDATE_PATH);

        let result = async {
            let body = serde_json::to_vec(request).map_err(|e| PublishError::InvalidResponse {
                status: 0,
                message: format!("failed to encode update request: {}", e),
            })?;
            let response = self
                .transport
                .request(
                    Method::POST,
                    &url,
                    Some(RequestBody::Bytes(body)),
                    Some("application/json"),
                )
                .await?;
            decode::<UpdateResult>(response)
        }
        .await;

        match result {
            Ok(record) => {
                info!(public_key = %record.public_key, "app record updated");
                Ok(record)
            }
            Err(e) => {
                self.log.println(&format!("Error calling Appetize.io API: {}", e));
                Err(e)
            }
        }
    }
}

fn decode<T: DeserializeOwned>(response: TransportResponse) -> Result<T> {
    serde_json::from_slice(&response.body).map_err(|e| PublishError::InvalidResponse {
        status: response.status,
        message: format!("{}: {}", e, String::from_utf8_lossy(&response.body)),
    })
}

/// Strip the signature from a presigned URL before it reaches a log
fn redact_query(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}
