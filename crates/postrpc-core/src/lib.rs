//! postrpc - call named server functions over HTTP POST.
//!
//! A call is a single round trip: the client sends `POST {endpoint}?rpc={name}` with the
//! positional arguments as JSON-encoded form fields `arg0`, `arg1`, ..., and the server
//! answers with a uniform envelope:
//!
//! ```text
//! {"response": {"type": "success", "result": <any JSON>}}
//! {"response": {"type": "error",   "reason": "<string>"}}
//! ```
//!
//! The [`server`] module holds the function registry and the dispatcher that answers
//! requests. The [`client`] module turns declared names into stubs that are invoked either
//! blocking or asynchronously. The [`codec`] module holds the wire formats shared by both.
//!
//! # Example
//!
//! ```rust,ignore
//! use postrpc::server::{Dispatcher, Registry};
//! use postrpc::HandlerError;
//!
//! fn add(a: i64, b: i64) -> Result<i64, HandlerError> {
//!     Ok(a + b)
//! }
//!
//! let mut registry = Registry::new();
//! registry.add_typed("add", add)?;
//! let dispatcher = Dispatcher::new(registry);
//!
//! let response = dispatcher.respond_to_request(Some("add"), "arg0=1&arg1=2").await;
//! assert_eq!(response.body(), r#"{"response":{"type":"success","result":3}}"#);
//! ```

pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod server;

pub use client::{CallMode, RpcApi, RpcApiConfig};
pub use codec::Outcome;
pub use error::{CallError, ClientError, DispatchError, HandlerError, RegistryError, TransportError};
pub use server::{Args, Arity, Dispatcher, Registry};
