/// Tools Module
///
/// Each tool lives in its own module and exports a `register` function that
/// adds it to the registry during startup. Add new tools to `build_registry`.

pub mod calculator;
pub mod greeter;
pub mod user;

use crate::core::dispatcher::Dispatcher;
use crate::core::error::ToolResult;
use crate::core::middleware::{LoggingMiddleware, MiddlewareChain};
use crate::core::registry::ToolRegistry;

/// Register every built-in tool. Listing order follows this order.
pub fn build_registry() -> ToolResult<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    greeter::register(&mut registry)?;
    calculator::register(&mut registry)?;
    user::register(&mut registry)?;
    Ok(registry)
}

/// Middleware applied to every tool call, outermost first.
pub fn default_middleware() -> MiddlewareChain {
    MiddlewareChain::new().with(LoggingMiddleware)
}

/// Registry plus default middleware, ready to serve.
pub fn build_dispatcher() -> ToolResult<Dispatcher> {
    Ok(Dispatcher::new(build_registry()?, &default_middleware()))
}
