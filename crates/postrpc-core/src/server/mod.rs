//! Server side: function registry and request dispatcher.

mod dispatch;
mod handler;
mod registry;

pub use dispatch::{sanitize_name, DispatchResponse, Dispatcher};
pub use handler::{Args, AsyncFn, Handler, HandlerResult, SyncFn, TypedFn, TypedHandler};
pub use registry::{Arity, Registration, Registry};
