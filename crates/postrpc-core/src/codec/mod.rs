//! Stateless wire codecs shared by client and server.

mod args;
mod envelope;

pub use args::{decode_args, decode_form_args, encode_args, parse_form};
pub use envelope::{decode_envelope, encode_envelope, Outcome};
