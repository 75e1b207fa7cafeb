//! Client stubs: callable proxies for one remote function in one invocation mode.
//!
//! Both modes marshal arguments the same way and interpret the response the same way;
//! they differ only in how the caller waits. Every invocation issues exactly one request,
//! without retries or caching.

use super::transport::{AsyncTransport, BlockingTransport, TransportResponse};
use crate::codec::{decode_envelope, encode_args, Outcome};
use crate::error::{CallError, TransportError};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Turn a transport result into the call's result.
///
/// An error envelope is surfaced as [`CallError::Rpc`] even on a non-success status.
/// Anything else that is not a success envelope on a success status (transport error,
/// missing or empty body, malformed body) becomes [`CallError::Failed`].
pub(crate) fn interpret_response(
    name: &str,
    response: Result<TransportResponse, TransportError>,
) -> Result<Value, CallError> {
    let response = match response {
        Ok(response) => response,
        Err(e) => {
            warn!("Failed to call {}: {}", name, e);
            return Err(CallError::failed(name));
        }
    };

    let body = match response.body.as_deref() {
        Some(body) if !body.trim().is_empty() => body,
        _ => {
            warn!("Failed to call {}: no response body (status {})", name, response.status);
            return Err(CallError::failed(name));
        }
    };

    match decode_envelope(body) {
        Ok(Outcome::Error { reason }) => Err(CallError::Rpc { reason }),
        Ok(Outcome::Success { result }) if response.is_success() => Ok(result),
        Ok(Outcome::Success { .. }) => {
            warn!("Failed to call {}: status {}", name, response.status);
            Err(CallError::failed(name))
        }
        Err(e) => {
            warn!("Failed to call {}: malformed response: {}", name, e);
            Err(CallError::failed(name))
        }
    }
}

/// Stub that blocks the calling thread until the call completes.
#[derive(Clone)]
pub struct BlockingStub {
    name: String,
    transport: Arc<dyn BlockingTransport>,
}

impl BlockingStub {
    pub fn new(name: impl Into<String>, transport: Arc<dyn BlockingTransport>) -> Self {
        Self {
            name: name.into(),
            transport,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Call the remote function and wait for its result.
    pub fn call(&self, args: &[Value]) -> Result<Value, CallError> {
        debug!("Calling {} with {} argument(s) (blocking)", self.name, args.len());
        let response = self.transport.post(&self.name, encode_args(args));
        interpret_response(&self.name, response)
    }
}

impl std::fmt::Debug for BlockingStub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingStub")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Stub that returns immediately with a [`PendingCall`].
#[derive(Clone)]
pub struct AsyncStub {
    name: String,
    transport: Arc<dyn AsyncTransport>,
}

impl AsyncStub {
    pub fn new(name: impl Into<String>, transport: Arc<dyn AsyncTransport>) -> Self {
        Self {
            name: name.into(),
            transport,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Start the call on the Tokio runtime and return its pending result.
    ///
    /// The request is issued whether or not the returned handle is ever awaited. There is
    /// no cancellation: dropping the handle only discards the result.
    ///
    /// # Panics
    ///
    /// Panics when called outside of a Tokio runtime.
    pub fn call(&self, args: &[Value]) -> PendingCall {
        debug!("Calling {} with {} argument(s)", self.name, args.len());
        let (tx, rx) = oneshot::channel();
        let name = self.name.clone();
        let transport = Arc::clone(&self.transport);
        let body = encode_args(args);

        tokio::spawn(async move {
            let response = transport.post(&name, body).await;
            // The receiver is gone when the caller dropped the handle.
            let _ = tx.send(interpret_response(&name, response));
        });

        PendingCall {
            name: self.name.clone(),
            rx,
        }
    }
}

impl std::fmt::Debug for AsyncStub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncStub")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Result of an in-flight asynchronous call.
///
/// Settles exactly once, with the call's result or its failure. Await it directly, or
/// hand it callbacks with [`PendingCall::on_settled`].
#[derive(Debug)]
pub struct PendingCall {
    name: String,
    rx: oneshot::Receiver<Result<Value, CallError>>,
}

impl PendingCall {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run `on_success` or `on_failure` once the call settles.
    ///
    /// Exactly one of the two callbacks runs, at most once.
    pub fn on_settled<S, F>(self, on_success: S, on_failure: F) -> JoinHandle<()>
    where
        S: FnOnce(Value) + Send + 'static,
        F: FnOnce(CallError) + Send + 'static,
    {
        tokio::spawn(async move {
            match self.await {
                Ok(value) => on_success(value),
                Err(e) => on_failure(e),
            }
        })
    }
}

impl Future for PendingCall {
    type Output = Result<Value, CallError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            // The request task died without settling (runtime shut down).
            Poll::Ready(Err(_)) => Poll::Ready(Err(CallError::failed(this.name.clone()))),
            Poll::Pending => Poll::Pending,
        }
    }
}
