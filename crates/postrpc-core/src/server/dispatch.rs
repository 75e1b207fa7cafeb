//! Request dispatch: name resolution, argument decoding, arity validation and invocation.
//!
//! Every failure is recovered into an error [`Outcome`]; nothing a request or a handler
//! does makes dispatch itself fail.

use super::handler::Args;
use super::registry::{Registration, Registry};
use crate::codec::{decode_args, encode_envelope, parse_form, Outcome};
use crate::error::{DispatchError, HANDLER_PANICKED};
use futures::FutureExt;
use serde_json::Value;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, warn};

pub(crate) fn is_valid_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Strip every character outside `[A-Za-z0-9_-]` from a requested name.
pub fn sanitize_name(raw: &str) -> String {
    raw.chars().filter(|c| is_valid_name_char(*c)).collect()
}

/// Result of answering one request.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchResponse {
    /// True when the request named a registered RPC, whatever the call's outcome.
    pub recognized: bool,
    pub outcome: Outcome,
}

impl DispatchResponse {
    /// The complete response body.
    pub fn body(&self) -> String {
        encode_envelope(&self.outcome)
    }
}

/// Dispatches requests against a read-only registry.
///
/// Cheap to clone; clones share the registry.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
}

impl Dispatcher {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Answer a request given its raw `rpc` query value and form body.
    pub async fn respond_to_request(&self, raw_name: Option<&str>, body: &str) -> DispatchResponse {
        self.dispatch(raw_name, &parse_form(body)).await
    }

    /// Answer a request given its raw `rpc` query value and parsed form fields.
    pub async fn dispatch(
        &self,
        raw_name: Option<&str>,
        fields: &HashMap<String, String>,
    ) -> DispatchResponse {
        let Some(raw_name) = raw_name else {
            debug!("Rejecting request without an RPC name");
            return DispatchResponse {
                recognized: false,
                outcome: DispatchError::MissingRpcName.into(),
            };
        };

        let name = sanitize_name(raw_name);
        let Some(registration) = self.registry.get(&name) else {
            debug!("Rejecting call to unknown RPC {:?}", name);
            return DispatchResponse {
                recognized: false,
                outcome: DispatchError::UnknownRpc.into(),
            };
        };

        let args = decode_args(fields);
        debug!("RPC call: {}({:?})", name, args);
        let outcome = self.invoke(registration, Args::new(args)).await.into();
        DispatchResponse {
            recognized: true,
            outcome,
        }
    }

    /// Call a registered function directly, bypassing name sanitization.
    pub async fn call(&self, name: &str, args: Vec<Value>) -> Result<Value, DispatchError> {
        let registration = self.registry.get(name).ok_or(DispatchError::UnknownRpc)?;
        self.invoke(registration, Args::new(args)).await
    }

    async fn invoke(&self, registration: &Registration, args: Args) -> Result<Value, DispatchError> {
        registration.arity().check(args.len())?;

        let handler = registration.handler();
        let future = match std::panic::catch_unwind(AssertUnwindSafe(|| handler.call(args))) {
            Ok(future) => future,
            Err(_) => return Err(Self::panicked(registration.name())),
        };

        match AssertUnwindSafe(future).catch_unwind().await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                warn!("RPC {} failed: {}", registration.name(), e);
                Err(e.into())
            }
            Err(_) => Err(Self::panicked(registration.name())),
        }
    }

    fn panicked(name: &str) -> DispatchError {
        error!("RPC handler for '{}' panicked during execution", name);
        DispatchError::HandlerFailure {
            reason: HANDLER_PANICKED.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_args;
    use crate::error::HandlerError;
    use crate::server::{Arity, HandlerResult};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn fields(args: &[Value]) -> HashMap<String, String> {
        parse_form(&encode_args(args))
    }

    fn reason(response: &DispatchResponse) -> String {
        response.outcome.clone().into_result().unwrap_err()
    }

    /// Registry with `f` accepting 1 to 3 arguments and recording every invocation.
    fn recording_registry() -> (Registry, Arc<Mutex<Vec<Vec<Value>>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&calls);
        let mut registry = Registry::new();
        registry
            .add_function("f", Arity::new(1, 3), move |args: Args| {
                recorded.lock().unwrap().push(args.clone().into_vec());
                Ok(json!(args.len()))
            })
            .unwrap();
        (registry, calls)
    }

    #[tokio::test]
    async fn test_missing_name() {
        let dispatcher = Dispatcher::new(Registry::new());
        let response = dispatcher.dispatch(None, &HashMap::new()).await;
        assert!(!response.recognized);
        assert_eq!(reason(&response), "Missing RPC name");
    }

    #[tokio::test]
    async fn test_unknown_name() {
        let dispatcher = Dispatcher::new(Registry::new());
        let response = dispatcher.dispatch(Some("doStuff"), &HashMap::new()).await;
        assert!(!response.recognized);
        assert_eq!(reason(&response), "RPC does not exist");
    }

    #[tokio::test]
    async fn test_name_empty_after_sanitizing() {
        let mut registry = Registry::new();
        registry
            .add_function("f", Arity::exact(0), |_| Ok(json!(null)))
            .unwrap();
        let dispatcher = Dispatcher::new(registry);
        let response = dispatcher.dispatch(Some("<>;"), &HashMap::new()).await;
        assert_eq!(reason(&response), "RPC does not exist");
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("do;Stuff<script>"), "doStuffscript");
        assert_eq!(sanitize_name("get_user-by-id2"), "get_user-by-id2");
        assert_eq!(sanitize_name("héllo wörld"), "hllowrld");
    }

    #[tokio::test]
    async fn test_sanitized_name_dispatches() {
        let mut registry = Registry::new();
        registry
            .add_function("doStuffscript", Arity::exact(0), |_| Ok(json!("done")))
            .unwrap();
        let dispatcher = Dispatcher::new(registry);
        let response = dispatcher
            .dispatch(Some("do;Stuff<script>"), &HashMap::new())
            .await;
        assert!(response.recognized);
        assert_eq!(response.outcome, Outcome::success(json!("done")));
    }

    #[tokio::test]
    async fn test_arity_bounds() {
        let (registry, calls) = recording_registry();
        let dispatcher = Dispatcher::new(registry);

        let response = dispatcher.dispatch(Some("f"), &fields(&[])).await;
        assert!(response.recognized);
        assert_eq!(reason(&response), "Not enough arguments specified");

        let four = [json!(1), json!(2), json!(3), json!(4)];
        let response = dispatcher.dispatch(Some("f"), &fields(&four)).await;
        assert_eq!(reason(&response), "Too many arguments specified");
        assert!(calls.lock().unwrap().is_empty());

        for count in 1..=3 {
            let args: Vec<Value> = (0..count).map(|i| json!(format!("v{}", i))).collect();
            let response = dispatcher.dispatch(Some("f"), &fields(&args)).await;
            assert_eq!(response.outcome, Outcome::success(json!(count)));
            assert_eq!(calls.lock().unwrap().last(), Some(&args));
        }
        assert_eq!(calls.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_permissive_argument_decoding() {
        let (registry, calls) = recording_registry();
        let dispatcher = Dispatcher::new(registry);
        let response = dispatcher
            .respond_to_request(Some("f"), "arg0=%7Bnot-json&arg1=7")
            .await;
        assert_eq!(response.outcome, Outcome::success(json!(2)));
        assert_eq!(calls.lock().unwrap()[0], vec![Value::Null, json!(7)]);
    }

    #[tokio::test]
    async fn test_handler_error_becomes_envelope() {
        let mut registry = Registry::new();
        registry
            .add_function("fail", Arity::exact(0), |_| {
                Err(HandlerError::new("quota exceeded"))
            })
            .unwrap();
        let dispatcher = Dispatcher::new(registry);
        let response = dispatcher.respond_to_request(Some("fail"), "").await;
        assert!(response.recognized);
        assert_eq!(reason(&response), "quota exceeded");
    }

    async fn explode(_args: Args) -> HandlerResult {
        panic!("async boom")
    }

    #[tokio::test]
    async fn test_handler_panic_becomes_envelope() {
        let mut registry = Registry::new();
        registry
            .add_function("boom", Arity::exact(0), |_| panic!("boom"))
            .unwrap();
        registry
            .add_async_function("async_boom", Arity::exact(0), explode)
            .unwrap();
        let dispatcher = Dispatcher::new(registry);

        for name in ["boom", "async_boom"] {
            let response = dispatcher.respond_to_request(Some(name), "").await;
            assert_eq!(reason(&response), HANDLER_PANICKED);
        }
    }

    #[tokio::test]
    async fn test_body_is_envelope() {
        let mut registry = Registry::new();
        registry
            .add_function("answer", Arity::exact(0), |_| Ok(json!(42)))
            .unwrap();
        let dispatcher = Dispatcher::new(registry);
        let body = dispatcher.respond_to_request(Some("answer"), "").await.body();
        let parsed: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed, json!({"response": {"type": "success", "result": 42}}));
    }

    #[tokio::test]
    async fn test_direct_call() {
        let counter = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&counter);
        let mut registry = Registry::new();
        registry
            .add_async_function("bump", Arity::new(0, 1), move |args: Args| {
                let seen = Arc::clone(&seen);
                async move {
                    let by: Option<usize> = args.optional(0)?;
                    Ok::<_, HandlerError>(json!(seen.fetch_add(by.unwrap_or(1), Ordering::SeqCst)))
                }
            })
            .unwrap();
        let dispatcher = Dispatcher::new(registry);

        assert_eq!(dispatcher.call("bump", vec![json!(5)]).await, Ok(json!(0)));
        assert_eq!(dispatcher.call("bump", vec![]).await, Ok(json!(5)));
        assert_eq!(counter.load(Ordering::SeqCst), 6);
        assert_eq!(
            dispatcher.call("bump", vec![json!(1), json!(2)]).await,
            Err(DispatchError::TooManyArguments)
        );
        assert_eq!(
            dispatcher.call("nope", vec![]).await,
            Err(DispatchError::UnknownRpc)
        );
    }
}
