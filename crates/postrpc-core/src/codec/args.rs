//! Positional argument codec.
//!
//! Each argument is JSON-serialized on its own, percent-encoded and sent as a form field
//! named after its position: `arg0=<json>&arg1=<json>&...`. The server reads fields in
//! increasing index order and stops at the first missing index.

use crate::config::arg_field_name;
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

/// Encode a positional argument list as an `application/x-www-form-urlencoded` body.
pub fn encode_args(args: &[Value]) -> String {
    args.iter()
        .enumerate()
        .map(|(index, arg)| {
            format!(
                "{}={}",
                arg_field_name(index),
                urlencoding::encode(&arg.to_string())
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Parse a form body into its fields.
///
/// When a field name repeats, the last occurrence wins.
pub fn parse_form(body: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(body.as_bytes())
        .into_owned()
        .collect()
}

/// Decode the positional argument list from already-parsed form fields.
///
/// Reading stops at the first gap, so `arg0` and `arg2` without `arg1` yields a single
/// argument. A field holding invalid JSON decodes to `null`; the remaining arguments are
/// unaffected.
pub fn decode_args(fields: &HashMap<String, String>) -> Vec<Value> {
    let mut args = Vec::new();
    while let Some(raw) = fields.get(&arg_field_name(args.len())) {
        let value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                warn!("Argument {} is not valid JSON, using null: {}", args.len(), e);
                Value::Null
            }
        };
        args.push(value);
    }
    args
}

/// Decode the positional argument list straight from a form body.
pub fn decode_form_args(body: &str) -> Vec<Value> {
    decode_args(&parse_form(body))
}
