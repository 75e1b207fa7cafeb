//! Error types for postrpc.
//!
//! Server-side errors never cross the wire as typed values: every dispatch failure is
//! recovered into an error envelope whose `reason` is the error's `Display` output.
//! Client-side errors distinguish application-level failures reported by the server
//! from calls that produced no usable response at all.

use thiserror::Error;

/// Reason sent when the request carried no RPC name.
pub const MISSING_RPC_NAME: &str = "Missing RPC name";
/// Reason sent when the sanitized name has no registration.
pub const UNKNOWN_RPC: &str = "RPC does not exist";
/// Reason sent when fewer arguments than the handler requires were supplied.
pub const NOT_ENOUGH_ARGUMENTS: &str = "Not enough arguments specified";
/// Reason sent when more arguments than the handler accepts were supplied.
pub const TOO_MANY_ARGUMENTS: &str = "Too many arguments specified";
/// Reason sent when a handler panicked.
pub const HANDLER_PANICKED: &str = "RPC handler failed";

/// Failure while resolving, validating or invoking a server-side RPC.
///
/// The `Display` text of each variant is exactly the `reason` written to the error
/// envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("Missing RPC name")]
    MissingRpcName,

    #[error("RPC does not exist")]
    UnknownRpc,

    #[error("Not enough arguments specified")]
    NotEnoughArguments,

    #[error("Too many arguments specified")]
    TooManyArguments,

    #[error("{reason}")]
    HandlerFailure { reason: String },
}

impl DispatchError {
    /// The reason string carried by the error envelope.
    pub fn reason(&self) -> String {
        self.to_string()
    }
}

impl From<HandlerError> for DispatchError {
    fn from(err: HandlerError) -> Self {
        DispatchError::HandlerFailure {
            reason: err.message,
        }
    }
}

/// Error returned by an RPC handler.
///
/// The message is forwarded verbatim to the caller as the envelope reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Error for an argument that could not be converted to the parameter's type.
    pub fn invalid_argument(index: usize, cause: impl std::fmt::Display) -> Self {
        Self::new(format!("Invalid value for argument {}: {}", index, cause))
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(format!("JSON error: {}", err))
    }
}

impl From<anyhow::Error> for HandlerError {
    fn from(err: anyhow::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Failure while registering a function on the server.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Function name must not be empty")]
    EmptyName,

    #[error("Invalid arity for {name}: min {min} exceeds max {max}")]
    InvalidArity { name: String, min: usize, max: usize },

    #[error("No function named {0} is available")]
    UnknownFunction(String),
}

/// Failure reported by a transport before any response body was obtained.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Request timed out")]
    Timeout,

    #[error("Invalid endpoint URL: {0}")]
    InvalidEndpoint(String),

    #[error("Blocking call made on a current-thread async runtime")]
    BlockingInAsyncContext,
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else {
            TransportError::Network {
                message: err.to_string(),
            }
        }
    }
}

/// Failure observed by a client stub.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    /// The server answered with an error envelope; `reason` is passed through verbatim.
    #[error("{reason}")]
    Rpc { reason: String },

    /// No usable response: transport failure, non-success status without an error
    /// payload, empty body or a body that is not an envelope.
    #[error("Failed to call {name}")]
    Failed { name: String },
}

impl CallError {
    pub fn failed(name: impl Into<String>) -> Self {
        CallError::Failed { name: name.into() }
    }

    pub fn is_rpc_error(&self) -> bool {
        matches!(self, CallError::Rpc { .. })
    }

    /// The message a caller sees: the server's reason or the synthesized failure text.
    pub fn reason(&self) -> String {
        self.to_string()
    }
}

/// Failure while configuring the client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Function name must not be empty")]
    EmptyName,

    #[error("Invalid endpoint URL {url}: {message}")]
    InvalidEndpoint { url: String, message: String },

    #[error("Failed to create HTTP client: {0}")]
    Transport(#[from] TransportError),
}
