//! HTTP front end for postrpc.
//!
//! Serves a [`postrpc::Dispatcher`] on a single POST route plus a health check.

pub mod functions;
pub mod handler;
pub mod server;

pub use functions::{build_registry, catalogue};
pub use server::{router, start_server};
