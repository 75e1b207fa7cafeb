//! Response envelope codec.
//!
//! Every response body is one of:
//!
//! ```text
//! {"response": {"type": "success", "result": <any JSON>}}
//! {"response": {"type": "error",   "reason": "<string>"}}
//! ```

use crate::error::DispatchError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of a single RPC, as carried by the envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Outcome {
    Success {
        #[serde(default)]
        result: Value,
    },
    Error {
        reason: String,
    },
}

impl Outcome {
    pub fn success(result: Value) -> Self {
        Outcome::Success { result }
    }

    pub fn error(reason: impl Into<String>) -> Self {
        Outcome::Error {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    /// Split into the result value or the error reason.
    pub fn into_result(self) -> Result<Value, String> {
        match self {
            Outcome::Success { result } => Ok(result),
            Outcome::Error { reason } => Err(reason),
        }
    }
}

impl From<Result<Value, DispatchError>> for Outcome {
    fn from(result: Result<Value, DispatchError>) -> Self {
        match result {
            Ok(value) => Outcome::success(value),
            Err(e) => Outcome::error(e.reason()),
        }
    }
}

impl From<DispatchError> for Outcome {
    fn from(err: DispatchError) -> Self {
        Outcome::error(err.reason())
    }
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    response: &'a Outcome,
}

#[derive(Deserialize)]
struct Envelope {
    response: Outcome,
}

/// Encode an outcome as the full response body.
pub fn encode_envelope(outcome: &Outcome) -> String {
    // Serializing a `Value` tree into a string cannot fail.
    serde_json::to_string(&EnvelopeRef { response: outcome })
        .unwrap_or_else(|_| r#"{"response":{"type":"error","reason":"Internal error"}}"#.into())
}

/// Decode a response body.
///
/// Fails when the text is not JSON, lacks the `response` wrapper, or the wrapper is not
/// a success/error outcome.
pub fn decode_envelope(text: &str) -> Result<Outcome, serde_json::Error> {
    serde_json::from_str::<Envelope>(text).map(|envelope| envelope.response)
}
