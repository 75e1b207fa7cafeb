//! Client set-up: declare remote functions and look their stubs up by name.
//!
//! # Example
//!
//! ```rust,ignore
//! use postrpc::client::{CallMode, RpcApiConfig};
//! use serde_json::json;
//!
//! let mut config = RpcApiConfig::new("http://127.0.0.1:8080/rpc")?;
//! config.declare_function("add", CallMode::Async)?;
//! config.declare_function("version", CallMode::Blocking)?;
//! let api = config.into_api();
//!
//! let sum = api.async_fn("add").unwrap().call(&[json!(1), json!(2)]).await?;
//! ```

use super::stub::{AsyncStub, BlockingStub};
use super::transport::{
    parse_endpoint, AsyncTransport, BlockingHttpTransport, BlockingTransport, HttpTransport,
};
use crate::config::NetworkConfig;
use crate::error::ClientError;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// How a declared function is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CallMode {
    /// The caller's thread waits for the response. Discouraged on async runtimes: on a
    /// multi-thread runtime the call runs under `block_in_place`, on a current-thread
    /// runtime it fails with `Failed to call <name>`.
    Blocking,
    /// The caller receives a pending result immediately.
    #[default]
    Async,
}

/// Stub for one declared function.
#[derive(Debug, Clone)]
pub enum Stub {
    Blocking(BlockingStub),
    Async(AsyncStub),
}

impl Stub {
    pub fn name(&self) -> &str {
        match self {
            Stub::Blocking(stub) => stub.name(),
            Stub::Async(stub) => stub.name(),
        }
    }

    pub fn mode(&self) -> CallMode {
        match self {
            Stub::Blocking(_) => CallMode::Blocking,
            Stub::Async(_) => CallMode::Async,
        }
    }

    pub fn as_blocking(&self) -> Option<&BlockingStub> {
        match self {
            Stub::Blocking(stub) => Some(stub),
            Stub::Async(_) => None,
        }
    }

    pub fn as_async(&self) -> Option<&AsyncStub> {
        match self {
            Stub::Async(stub) => Some(stub),
            Stub::Blocking(_) => None,
        }
    }
}

/// The declared functions, by name.
#[derive(Debug, Clone, Default)]
pub struct RpcApi {
    stubs: HashMap<String, Stub>,
}

impl RpcApi {
    pub fn get(&self, name: &str) -> Option<&Stub> {
        self.stubs.get(name)
    }

    /// The stub for `name` if it was declared in blocking mode.
    pub fn blocking_fn(&self, name: &str) -> Option<&BlockingStub> {
        self.get(name).and_then(Stub::as_blocking)
    }

    /// The stub for `name` if it was declared in async mode.
    pub fn async_fn(&self, name: &str) -> Option<&AsyncStub> {
        self.get(name).and_then(Stub::as_async)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.stubs.contains_key(name)
    }

    /// Declared names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.stubs.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.stubs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stubs.is_empty()
    }
}

/// Builder for an [`RpcApi`] bound to one endpoint.
pub struct RpcApiConfig {
    async_transport: Arc<dyn AsyncTransport>,
    blocking_transport: Arc<dyn BlockingTransport>,
    api: RpcApi,
}

impl RpcApiConfig {
    /// Configure a client for the endpoint URL, using the bundled HTTP transports.
    pub fn new(endpoint: &str) -> Result<Self, ClientError> {
        let url = parse_endpoint(endpoint).map_err(|e| ClientError::InvalidEndpoint {
            url: endpoint.to_string(),
            message: e.to_string(),
        })?;
        let async_transport = HttpTransport::with_timeout(url.clone(), NetworkConfig::REQUEST_TIMEOUT)?;
        let blocking_transport =
            BlockingHttpTransport::with_timeout(url, NetworkConfig::REQUEST_TIMEOUT);
        Ok(Self::with_transports(
            Arc::new(async_transport),
            Arc::new(blocking_transport),
        ))
    }

    /// Configure a client over caller-supplied transports.
    pub fn with_transports(
        async_transport: Arc<dyn AsyncTransport>,
        blocking_transport: Arc<dyn BlockingTransport>,
    ) -> Self {
        Self {
            async_transport,
            blocking_transport,
            api: RpcApi::default(),
        }
    }

    /// Declare a remote function, replacing any earlier declaration of the same name.
    ///
    /// Declaring never performs I/O, in either mode and from any context.
    pub fn declare_function(
        &mut self,
        name: impl Into<String>,
        mode: CallMode,
    ) -> Result<&mut Self, ClientError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ClientError::EmptyName);
        }

        let stub = match mode {
            CallMode::Blocking => Stub::Blocking(BlockingStub::new(
                name.clone(),
                Arc::clone(&self.blocking_transport),
            )),
            CallMode::Async => Stub::Async(AsyncStub::new(
                name.clone(),
                Arc::clone(&self.async_transport),
            )),
        };
        debug!("Declared remote function {} ({:?})", name, mode);
        self.api.stubs.insert(name, stub);
        Ok(self)
    }

    pub fn api(&self) -> &RpcApi {
        &self.api
    }

    pub fn into_api(self) -> RpcApi {
        self.api
    }
}
