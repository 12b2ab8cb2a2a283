//! HTTP transport with proxy selection and status classification

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Body, Client, Method};
use tokio_util::io::ReaderStream;
use tracing::debug;

use crate::error::{PublishError, Result};
use crate::traits::{ProxyKind, ProxyResolver};

const USER_AGENT_VALUE: &str = concat!("appetize-publish/", env!("CARGO_PKG_VERSION"));

/// Transport timeouts
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Whole-request timeout, including streaming the body
    pub timeout: Duration,
    /// TCP/TLS connect timeout
    pub connect_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(600),
            connect_timeout: Duration::from_secs(30),
        }
    }
}

/// Request body
pub enum RequestBody {
    /// Small in-memory payload
    Bytes(Vec<u8>),
    /// File streamed from disk
    File { file: tokio::fs::File, len: u64 },
}

/// Raw 2xx response
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Outbound HTTP client
///
/// Non-2xx responses become [`PublishError::Api`]; network failures become
/// [`PublishError::Transport`].
#[derive(Clone)]
pub struct TransportClient {
    client: Client,
}

impl TransportClient {
    pub fn new(config: &TransportConfig, proxies: Arc<dyn ProxyResolver>) -> Result<Self> {
        // Only HTTP proxies are honoured; anything else connects directly.
        let proxy = reqwest::Proxy::custom(move |url| {
            let host = url.host_str()?;
            let setting = proxies.resolve_proxy(host)?;
            if setting.kind != ProxyKind::Http {
                debug!(host, kind = ?setting.kind, "ignoring non-HTTP proxy");
                return None;
            }
            debug!(host, proxy = %setting.url, "using proxy");
            Some(setting.url)
        });

        let client = Client::builder()
            .user_agent(USER_AGENT_VALUE)
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .proxy(proxy)
            .build()
            .map_err(|e| PublishError::Transport(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Issue a request and return the body of a 2xx response
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<RequestBody>,
        content_type: Option<&str>,
    ) -> Result<TransportResponse> {
        debug!(%method, url, "sending request");

        let mut request = self.client.request(method.clone(), url);

        if let Some(content_type) = content_type {
            request = request.header(CONTENT_TYPE, content_type);
        }

        request = match body {
            Some(RequestBody::Bytes(bytes)) => request.body(bytes),
            Some(RequestBody::File { file, len }) => request
                .header(CONTENT_LENGTH, len)
                .body(Body::wrap_stream(ReaderStream::new(file))),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response
                .bytes()
                .await
                .ok()
                .map(|b| String::from_utf8_lossy(&b).into_owned());
            debug!(%method, url, status = status.as_u16(), "request failed");
            return Err(PublishError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await?.to_vec();
        debug!(%method, url, status = status.as_u16(), bytes = body.len(), "request succeeded");

        Ok(TransportResponse {
            status: status.as_u16(),
            body,
        })
    }
}
