//! Built-in functions the server can expose by name.
//!
//! The catalogue is a registry of everything available; the served registry is built
//! from it by name, either all entries or the ones selected on the command line.

use postrpc::server::HandlerResult;
use postrpc::{Args, Arity, HandlerError, Registry, RegistryError};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::info;

/// Upper bound for `sleep`, in milliseconds.
const MAX_SLEEP_MS: u64 = 10_000;

fn echo(args: Args) -> HandlerResult {
    Ok(args.into_vec().into_iter().next().unwrap_or(Value::Null))
}

fn add(a: i64, b: i64) -> Result<i64, HandlerError> {
    a.checked_add(b)
        .ok_or_else(|| HandlerError::new("Integer overflow"))
}

fn concat(a: String, b: String) -> Result<String, HandlerError> {
    Ok(a + &b)
}

fn greet(name: Option<String>) -> Result<String, HandlerError> {
    Ok(format!("Hello, {}!", name.as_deref().unwrap_or("world")))
}

fn sum(args: Args) -> HandlerResult {
    let mut total = 0.0;
    for (index, value) in args.iter().enumerate() {
        total += value
            .as_f64()
            .ok_or_else(|| HandlerError::invalid_argument(index, "expected a number"))?;
    }
    Ok(json!(total))
}

fn fail(message: Option<String>) -> Result<(), HandlerError> {
    Err(HandlerError::new(
        message.unwrap_or_else(|| "Requested failure".to_string()),
    ))
}

async fn sleep(args: Args) -> HandlerResult {
    let millis: u64 = args.required(0)?;
    if millis > MAX_SLEEP_MS {
        return Err(HandlerError::invalid_argument(
            0,
            format!("at most {} milliseconds", MAX_SLEEP_MS),
        ));
    }
    tokio::time::sleep(Duration::from_millis(millis)).await;
    Ok(json!(millis))
}

/// Every built-in function.
pub fn catalogue() -> Result<Registry, RegistryError> {
    let mut registry = Registry::new();
    registry.add_function("echo", Arity::exact(1), echo)?;
    registry.add_typed("add", add)?;
    registry.add_typed("concat", concat)?;
    registry.add_typed("greet", greet)?;
    registry.add_function("sum", Arity::variadic(0), sum)?;
    registry.add_typed("fail", fail)?;
    registry.add_async_function("sleep", Arity::exact(1), sleep)?;
    Ok(registry)
}

/// Build the served registry from the catalogue.
///
/// An empty selection exposes every built-in function.
pub fn build_registry(expose: &[String]) -> Result<Registry, RegistryError> {
    let catalogue = catalogue()?;
    if expose.is_empty() {
        info!("Exposing all functions: {}", catalogue.names().join(", "));
        return Ok(catalogue);
    }

    let mut registry = Registry::new();
    for name in expose {
        registry.add_named(name, &catalogue)?;
    }
    info!("Exposing functions: {}", registry.names().join(", "));
    Ok(registry)
}
