//! Handler abstractions for server-side RPC functions.
//!
//! Three ways to provide a handler:
//! - a synchronous closure over the raw [`Args`] list,
//! - an async closure over the raw [`Args`] list,
//! - a plain typed function `Fn(A1, .., An) -> Result<R, E>` whose parameters are
//!   deserialized positionally (see [`TypedHandler`]).

use super::registry::Arity;
use crate::error::HandlerError;
use futures::future::{self, BoxFuture};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::marker::PhantomData;

/// Result type for handler functions.
pub type HandlerResult = Result<Value, HandlerError>;

/// Positional arguments passed to a handler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args(Vec<Value>);

impl Args {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.0.iter()
    }

    /// Deserialize a required argument.
    pub fn required<T: DeserializeOwned>(&self, index: usize) -> Result<T, HandlerError> {
        let value = self
            .0
            .get(index)
            .ok_or_else(|| HandlerError::invalid_argument(index, "missing"))?;
        serde_json::from_value(value.clone()).map_err(|e| HandlerError::invalid_argument(index, e))
    }

    /// Deserialize an optional argument. Absent and `null` both yield `None`.
    pub fn optional<T: DeserializeOwned>(&self, index: usize) -> Result<Option<T>, HandlerError> {
        match self.0.get(index) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| HandlerError::invalid_argument(index, e)),
        }
    }

    pub fn into_vec(self) -> Vec<Value> {
        self.0
    }
}

impl From<Vec<Value>> for Args {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

/// Trait for handler functions.
pub trait Handler: Send + Sync + 'static {
    /// Invoke the handler with already arity-checked arguments.
    fn call(&self, args: Args) -> BoxFuture<'static, HandlerResult>;
}

/// Handler wrapping a synchronous closure.
pub struct SyncFn<F> {
    f: F,
}

impl<F> SyncFn<F>
where
    F: Fn(Args) -> HandlerResult + Send + Sync + 'static,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Handler for SyncFn<F>
where
    F: Fn(Args) -> HandlerResult + Send + Sync + 'static,
{
    fn call(&self, args: Args) -> BoxFuture<'static, HandlerResult> {
        Box::pin(future::ready((self.f)(args)))
    }
}

/// Handler wrapping a closure that returns a future.
pub struct AsyncFn<F> {
    f: F,
}

impl<F, Fut> AsyncFn<F>
where
    F: Fn(Args) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F, Fut> Handler for AsyncFn<F>
where
    F: Fn(Args) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, args: Args) -> BoxFuture<'static, HandlerResult> {
        Box::pin((self.f)(args))
    }
}

/// Whether a parameter of type `T` can be left out by the caller.
///
/// Types that deserialize from `null` (`Option<T>`, `()`, `Value`) receive `null` when
/// their argument is absent.
fn accepts_null<T: DeserializeOwned>() -> bool {
    serde_json::from_value::<T>(Value::Null).is_ok()
}

/// A plain function whose parameter list determines its arity.
///
/// Implemented for `Fn(A1, .., An) -> Result<R, E>` with up to eight parameters, where
/// every `Ai` is deserializable, `R` is serializable and `E` is displayable. `Params` is
/// the tuple of parameter types and only exists to keep the impls apart.
///
/// The maximum arity is `n`. Trailing parameters that accept `null` are optional, so
/// `fn(String, Option<u32>)` accepts one or two arguments.
pub trait TypedHandler<Params>: Send + Sync + 'static {
    fn arity() -> Arity;

    fn invoke(&self, args: Args) -> HandlerResult;
}

macro_rules! impl_typed_handler {
    ($count:expr $(, $param:ident $var:ident)*) => {
        impl<F, R, E, $($param,)*> TypedHandler<($($param,)*)> for F
        where
            F: Fn($($param),*) -> Result<R, E> + Send + Sync + 'static,
            R: Serialize,
            E: std::fmt::Display,
            $($param: DeserializeOwned,)*
        {
            fn arity() -> Arity {
                let optional: [bool; $count] = [$(accepts_null::<$param>()),*];
                let min = optional
                    .iter()
                    .rposition(|optional| !optional)
                    .map_or(0, |last_required| last_required + 1);
                Arity::new(min, $count)
            }

            #[allow(unused_mut, unused_variables, unused_assignments)]
            fn invoke(&self, args: Args) -> HandlerResult {
                let mut values = args.into_vec().into_iter();
                let mut index = 0usize;
                $(
                    let $var: $param = serde_json::from_value(values.next().unwrap_or(Value::Null))
                        .map_err(|e| HandlerError::invalid_argument(index, e))?;
                    index += 1;
                )*
                let output = (self)($($var),*).map_err(|e| HandlerError::new(e.to_string()))?;
                Ok(serde_json::to_value(output)?)
            }
        }
    };
}

impl_typed_handler!(0);
impl_typed_handler!(1, A1 a1);
impl_typed_handler!(2, A1 a1, A2 a2);
impl_typed_handler!(3, A1 a1, A2 a2, A3 a3);
impl_typed_handler!(4, A1 a1, A2 a2, A3 a3, A4 a4);
impl_typed_handler!(5, A1 a1, A2 a2, A3 a3, A4 a4, A5 a5);
impl_typed_handler!(6, A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6);
impl_typed_handler!(7, A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6, A7 a7);
impl_typed_handler!(8, A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6, A7 a7, A8 a8);

/// Adapter from a [`TypedHandler`] to a [`Handler`].
pub struct TypedFn<F, Params> {
    f: F,
    _params: PhantomData<fn() -> Params>,
}

impl<F, Params> TypedFn<F, Params>
where
    F: TypedHandler<Params>,
    Params: 'static,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _params: PhantomData,
        }
    }

    pub fn arity(&self) -> Arity {
        F::arity()
    }
}

impl<F, Params> Handler for TypedFn<F, Params>
where
    F: TypedHandler<Params>,
    Params: 'static,
{
    fn call(&self, args: Args) -> BoxFuture<'static, HandlerResult> {
        Box::pin(future::ready(self.f.invoke(args)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn add(a: i64, b: i64) -> Result<i64, HandlerError> {
        Ok(a + b)
    }

    fn now() -> Result<&'static str, String> {
        Ok("noon")
    }

    fn shout(text: String) -> Result<String, String> {
        if text.is_empty() {
            Err("nothing to shout".to_string())
        } else {
            Ok(text.to_uppercase())
        }
    }

    fn greet(name: Option<String>) -> Result<String, String> {
        Ok(format!("Hello, {}!", name.as_deref().unwrap_or("world")))
    }

    fn page(query: String, offset: Option<u32>, limit: Option<u32>) -> Result<Value, String> {
        Ok(json!([query, offset, limit]))
    }

    fn gap(first: Option<i64>, second: i64) -> Result<i64, String> {
        Ok(first.unwrap_or(0) + second)
    }

    #[test]
    fn test_typed_arity() {
        assert_eq!(TypedFn::new(add).arity(), Arity::exact(2));
        assert_eq!(TypedFn::new(now).arity(), Arity::exact(0));
        assert_eq!(TypedFn::new(shout).arity(), Arity::exact(1));
    }

    #[test]
    fn test_typed_arity_trailing_optional() {
        assert_eq!(TypedFn::new(greet).arity(), Arity::new(0, 1));
        assert_eq!(TypedFn::new(page).arity(), Arity::new(1, 3));
        // Only trailing parameters can be left out.
        assert_eq!(TypedFn::new(gap).arity(), Arity::exact(2));
    }

    #[test]
    fn test_typed_invoke_missing_optional() {
        assert_eq!(greet.invoke(Args::default()), Ok(json!("Hello, world!")));
        assert_eq!(greet.invoke(Args::new(vec![json!("Ada")])), Ok(json!("Hello, Ada!")));
        assert_eq!(
            page.invoke(Args::new(vec![json!("q"), json!(20)])),
            Ok(json!(["q", 20, null]))
        );
    }

    #[test]
    fn test_typed_invoke() {
        let result = add.invoke(Args::new(vec![json!(2), json!(40)]));
        assert_eq!(result, Ok(json!(42)));
        assert_eq!(now.invoke(Args::default()), Ok(json!("noon")));
    }

    #[test]
    fn test_typed_invoke_bad_argument_type() {
        let err = add.invoke(Args::new(vec![json!(2), json!("forty")])).unwrap_err();
        assert!(err.message().starts_with("Invalid value for argument 1"), "{}", err);
    }

    #[test]
    fn test_typed_invoke_error_message() {
        let err = shout.invoke(Args::new(vec![json!("")])).unwrap_err();
        assert_eq!(err.message(), "nothing to shout");
    }

    #[test]
    fn test_args_accessors() {
        let args = Args::new(vec![json!("a"), json!(null)]);
        assert_eq!(args.len(), 2);
        assert_eq!(args.required::<String>(0).unwrap(), "a");
        assert!(args.required::<String>(5).is_err());
        assert_eq!(args.optional::<i64>(1).unwrap(), None);
        assert_eq!(args.optional::<i64>(2).unwrap(), None);
        assert!(args.optional::<i64>(0).is_err());
    }

    #[tokio::test]
    async fn test_sync_and_async_handlers() {
        let sync = SyncFn::new(|args: Args| Ok(json!(args.len())));
        assert_eq!(sync.call(Args::new(vec![json!(1)])).await, Ok(json!(1)));

        let asynchronous = AsyncFn::new(|args: Args| async move {
            let name: String = args.required(0)?;
            Ok::<_, HandlerError>(json!(format!("hi {}", name)))
        });
        assert_eq!(
            asynchronous.call(Args::new(vec![json!("bob")])).await,
            Ok(json!("hi bob"))
        );
    }
}
