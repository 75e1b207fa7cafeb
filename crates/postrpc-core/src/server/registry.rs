//! Registry of callable server functions.
//!
//! A registry is filled during start-up and then handed to a [`Dispatcher`], which only
//! reads it. Registering a name twice replaces the earlier entry.
//!
//! # Example
//!
//! ```
//! use postrpc::server::{Args, Arity, Registry};
//! use postrpc::HandlerError;
//! use serde_json::json;
//!
//! fn add(a: i64, b: i64) -> Result<i64, HandlerError> {
//!     Ok(a + b)
//! }
//!
//! let mut registry = Registry::new();
//! registry.add_typed("add", add).unwrap();
//! registry
//!     .add_function("greet", Arity::new(0, 1), |args: Args| {
//!         let name: Option<String> = args.optional(0)?;
//!         Ok(json!(format!("Hello, {}!", name.as_deref().unwrap_or("world"))))
//!     })
//!     .unwrap();
//!
//! assert!(registry.contains("add"));
//! assert_eq!(registry.get("add").unwrap().arity().max, 2);
//! ```
//!
//! [`Dispatcher`]: super::Dispatcher

use super::dispatch::is_valid_name_char;
use super::handler::{Args, AsyncFn, Handler, HandlerResult, SyncFn, TypedFn, TypedHandler};
use crate::error::{DispatchError, RegistryError};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

/// Accepted argument count range of a handler.
///
/// `min` counts the parameters that must be supplied, `max` all declared parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    pub min: usize,
    pub max: usize,
}

impl Arity {
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    /// Exactly `count` arguments.
    pub const fn exact(count: usize) -> Self {
        Self::new(count, count)
    }

    /// At least `min` arguments, no upper bound.
    pub const fn variadic(min: usize) -> Self {
        Self::new(min, usize::MAX)
    }

    /// Validate a supplied argument count.
    pub fn check(&self, count: usize) -> Result<(), DispatchError> {
        if count < self.min {
            Err(DispatchError::NotEnoughArguments)
        } else if count > self.max {
            Err(DispatchError::TooManyArguments)
        } else {
            Ok(())
        }
    }
}

/// A registered function.
#[derive(Clone)]
pub struct Registration {
    name: String,
    handler: Arc<dyn Handler>,
    arity: Arity,
}

impl Registration {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> Arity {
        self.arity
    }

    pub(crate) fn handler(&self) -> Arc<dyn Handler> {
        Arc::clone(&self.handler)
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// Name to handler bindings.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    functions: HashMap<String, Registration>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler with an explicit arity.
    pub fn add_handler(
        &mut self,
        name: impl Into<String>,
        arity: Arity,
        handler: Arc<dyn Handler>,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if arity.min > arity.max {
            return Err(RegistryError::InvalidArity {
                name,
                min: arity.min,
                max: arity.max,
            });
        }
        if !name.chars().all(is_valid_name_char) {
            warn!(
                "RPC name {:?} contains characters that are stripped from requests; it is only reachable in-process",
                name
            );
        }

        let registration = Registration {
            name: name.clone(),
            handler,
            arity,
        };
        if self.functions.insert(name.clone(), registration).is_some() {
            warn!("Replacing existing RPC registration for function: {}", name);
        }
        debug!("Registered RPC function: {} ({:?})", name, arity);
        Ok(())
    }

    /// Register a synchronous function over the raw argument list.
    pub fn add_function<F>(
        &mut self,
        name: impl Into<String>,
        arity: Arity,
        f: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn(Args) -> HandlerResult + Send + Sync + 'static,
    {
        self.add_handler(name, arity, Arc::new(SyncFn::new(f)))
    }

    /// Register an async function over the raw argument list.
    pub fn add_async_function<F, Fut>(
        &mut self,
        name: impl Into<String>,
        arity: Arity,
        f: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.add_handler(name, arity, Arc::new(AsyncFn::new(f)))
    }

    /// Register a typed function; its arity comes from its parameter list.
    ///
    /// Trailing parameters that accept `null`, such as `Option<T>`, may be omitted.
    pub fn add_typed<F, Params>(
        &mut self,
        name: impl Into<String>,
        f: F,
    ) -> Result<(), RegistryError>
    where
        F: TypedHandler<Params>,
        Params: 'static,
    {
        let handler = TypedFn::new(f);
        let arity = handler.arity();
        self.add_handler(name, arity, Arc::new(handler))
    }

    /// Register a function by name alone, resolving it from a catalogue of available
    /// functions.
    pub fn add_named(&mut self, name: &str, catalogue: &Registry) -> Result<(), RegistryError> {
        let entry = catalogue
            .get(name)
            .ok_or_else(|| RegistryError::UnknownFunction(name.to_string()))?;
        self.add_handler(entry.name.clone(), entry.arity, entry.handler())
    }

    /// Check whether a name has been registered.
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Registration> {
        self.functions.get(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerError;
    use serde_json::json;

    fn concat(a: String, b: String) -> Result<String, HandlerError> {
        Ok(a + &b)
    }

    #[test]
    fn test_arity_check() {
        let arity = Arity::new(1, 3);
        assert_eq!(arity.check(0), Err(DispatchError::NotEnoughArguments));
        assert_eq!(arity.check(1), Ok(()));
        assert_eq!(arity.check(3), Ok(()));
        assert_eq!(arity.check(4), Err(DispatchError::TooManyArguments));
        assert_eq!(Arity::variadic(0).check(10_000), Ok(()));
    }

    #[test]
    fn test_typed_registration_arity() {
        let mut registry = Registry::new();
        registry.add_typed("concat", concat).unwrap();
        assert_eq!(registry.get("concat").unwrap().arity(), Arity::exact(2));
    }

    fn greet(name: Option<String>) -> Result<String, HandlerError> {
        Ok(format!("Hello, {}!", name.as_deref().unwrap_or("world")))
    }

    #[test]
    fn test_typed_registration_optional_arity() {
        let mut registry = Registry::new();
        registry.add_typed("greet", greet).unwrap();
        assert_eq!(registry.get("greet").unwrap().arity(), Arity::new(0, 1));
    }

    #[test]
    fn test_rejects_empty_name_and_inverted_arity() {
        let mut registry = Registry::new();
        assert_eq!(
            registry.add_function("", Arity::exact(0), |_| Ok(json!(null))),
            Err(RegistryError::EmptyName)
        );
        assert!(matches!(
            registry.add_function("f", Arity::new(2, 1), |_| Ok(json!(null))),
            Err(RegistryError::InvalidArity { min: 2, max: 1, .. })
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_last_registration_wins() {
        let mut registry = Registry::new();
        registry
            .add_function("f", Arity::exact(0), |_| Ok(json!(1)))
            .unwrap();
        registry
            .add_function("f", Arity::exact(2), |_| Ok(json!(2)))
            .unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("f").unwrap().arity(), Arity::exact(2));
    }

    #[test]
    fn test_add_named_from_catalogue() {
        let mut catalogue = Registry::new();
        catalogue.add_typed("concat", concat).unwrap();

        let mut registry = Registry::new();
        registry.add_named("concat", &catalogue).unwrap();
        assert!(registry.contains("concat"));
        assert_eq!(
            registry.add_named("missing", &catalogue),
            Err(RegistryError::UnknownFunction("missing".into()))
        );
    }

    #[test]
    fn test_names_sorted() {
        let mut registry = Registry::new();
        for name in ["zeta", "alpha", "mid"] {
            registry
                .add_function(name, Arity::exact(0), |_| Ok(json!(null)))
                .unwrap();
        }
        assert_eq!(registry.names(), vec!["alpha", "mid", "zeta"]);
    }
}
