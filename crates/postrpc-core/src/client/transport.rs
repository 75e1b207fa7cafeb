//! HTTP transports used by client stubs.
//!
//! A transport performs a single `POST {endpoint}?rpc={name}` with a form body and
//! reports the status and body text. It knows nothing about envelopes; interpreting the
//! response is the stub's job. Timeouts, TLS and connection reuse are transport concerns.

use crate::config::{NetworkConfig, ProtocolConfig};
use crate::error::TransportError;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::sync::OnceLock;
use std::time::Duration;
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::debug;
use url::Url;

/// Raw answer of a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    /// `None` when no body could be read.
    pub body: Option<String>,
}

impl TransportResponse {
    pub fn new(status: u16, body: Option<String>) -> Self {
        Self { status, body }
    }

    /// A 200 response with the given body.
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, Some(body.into()))
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// Transport that suspends the calling thread until the response arrives.
pub trait BlockingTransport: Send + Sync {
    fn post(&self, rpc_name: &str, form_body: String) -> Result<TransportResponse, TransportError>;
}

/// Transport driven by the async runtime.
#[async_trait]
pub trait AsyncTransport: Send + Sync {
    async fn post(&self, rpc_name: &str, form_body: String)
        -> Result<TransportResponse, TransportError>;
}

/// Parse an endpoint URL.
pub fn parse_endpoint(endpoint: &str) -> Result<Url, TransportError> {
    Url::parse(endpoint).map_err(|e| TransportError::InvalidEndpoint(format!("{}: {}", endpoint, e)))
}

/// Build the request URL for one call, keeping any query the endpoint already has.
pub fn rpc_url(endpoint: &Url, rpc_name: &str) -> Url {
    let mut url = endpoint.clone();
    url.query_pairs_mut()
        .append_pair(ProtocolConfig::RPC_QUERY_PARAM, rpc_name);
    url
}

/// Non-blocking HTTP transport backed by `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpTransport {
    /// Create a transport with the default request timeout.
    pub fn new(endpoint: &str) -> Result<Self, TransportError> {
        Self::with_timeout(parse_endpoint(endpoint)?, NetworkConfig::REQUEST_TIMEOUT)
    }

    pub fn with_timeout(endpoint: Url, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(NetworkConfig::USER_AGENT)
            .build()?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl AsyncTransport for HttpTransport {
    async fn post(
        &self,
        rpc_name: &str,
        form_body: String,
    ) -> Result<TransportResponse, TransportError> {
        let url = rpc_url(&self.endpoint, rpc_name);
        debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, ProtocolConfig::FORM_CONTENT_TYPE)
            .body(form_body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await.ok();
        Ok(TransportResponse::new(status, body))
    }
}

/// Blocking HTTP transport backed by `reqwest::blocking::Client`.
///
/// The client is built on the first request, not at construction. Inside a multi-thread
/// Tokio runtime each request runs under `block_in_place`; inside a current-thread runtime
/// requests fail with [`TransportError::BlockingInAsyncContext`] instead of panicking.
#[derive(Debug, Clone)]
pub struct BlockingHttpTransport {
    client: OnceLock<reqwest::blocking::Client>,
    timeout: Duration,
    endpoint: Url,
}

impl BlockingHttpTransport {
    /// Create a transport with the default request timeout.
    pub fn new(endpoint: &str) -> Result<Self, TransportError> {
        Ok(Self::with_timeout(
            parse_endpoint(endpoint)?,
            NetworkConfig::REQUEST_TIMEOUT,
        ))
    }

    pub fn with_timeout(endpoint: Url, timeout: Duration) -> Self {
        Self {
            client: OnceLock::new(),
            timeout,
            endpoint,
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn client(&self) -> Result<&reqwest::blocking::Client, TransportError> {
        if let Some(client) = self.client.get() {
            return Ok(client);
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .user_agent(NetworkConfig::USER_AGENT)
            .build()?;
        Ok(self.client.get_or_init(|| client))
    }

    fn send(&self, rpc_name: &str, form_body: String) -> Result<TransportResponse, TransportError> {
        let url = rpc_url(&self.endpoint, rpc_name);
        debug!("POST {} (blocking)", url);

        let response = self
            .client()?
            .post(url)
            .header(CONTENT_TYPE, ProtocolConfig::FORM_CONTENT_TYPE)
            .body(form_body)
            .send()?;

        let status = response.status().as_u16();
        let body = response.text().ok();
        Ok(TransportResponse::new(status, body))
    }
}

/// Run blocking work from whatever context the caller is in.
fn run_blocking<T>(
    work: impl FnOnce() -> Result<T, TransportError>,
) -> Result<T, TransportError> {
    match Handle::try_current() {
        Err(_) => work(),
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(work)
        }
        Ok(_) => Err(TransportError::BlockingInAsyncContext),
    }
}

impl BlockingTransport for BlockingHttpTransport {
    fn post(&self, rpc_name: &str, form_body: String) -> Result<TransportResponse, TransportError> {
        run_blocking(|| self.send(rpc_name, form_body))
    }
}
