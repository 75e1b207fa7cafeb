//! Centralized configuration for postrpc.
//!
//! Wire-level names are shared by the client and the server and must only change together.

use std::time::Duration;

/// Wire protocol constants.
pub struct ProtocolConfig;

impl ProtocolConfig {
    /// Query parameter naming the RPC.
    pub const RPC_QUERY_PARAM: &'static str = "rpc";
    /// Prefix of the positional argument form fields (`arg0`, `arg1`, ...).
    pub const ARG_FIELD_PREFIX: &'static str = "arg";
    pub const FORM_CONTENT_TYPE: &'static str = "application/x-www-form-urlencoded";
    pub const JSON_CONTENT_TYPE: &'static str = "application/json";
}

/// Network-related configuration for the bundled HTTP transports.
pub struct NetworkConfig;

impl NetworkConfig {
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
    pub const USER_AGENT: &'static str = concat!("postrpc/", env!("CARGO_PKG_VERSION"));
}

/// Defaults for the HTTP server front end.
pub struct ServerConfig;

impl ServerConfig {
    pub const DEFAULT_HOST: &'static str = "127.0.0.1";
    pub const DEFAULT_PATH: &'static str = "/rpc";
    pub const HEALTH_PATH: &'static str = "/health";
    pub const BODY_LIMIT_BYTES: usize = 2 * 1024 * 1024; // 2MB
    pub const MAX_CONCURRENT_REQUESTS: usize = 256;
}

/// Name of the form field carrying the argument at `index`.
pub fn arg_field_name(index: usize) -> String {
    format!("{}{}", ProtocolConfig::ARG_FIELD_PREFIX, index)
}
