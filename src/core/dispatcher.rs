/// Dispatcher
///
/// Owns the finished registry and one pre-composed handler chain per tool.
/// Building a `Dispatcher` ends the registration phase; afterwards it is shared
/// behind an `Arc` and only read, so `dispatch` may run from any number of
/// worker threads at once.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::core::error::{ToolError, ToolResult};
use crate::core::middleware::MiddlewareChain;
use crate::core::registry::ToolRegistry;
use crate::core::schema::ToolDescriptor;
use crate::core::tool::{CallRequest, CallResult, ToolCall, ToolHandler};

pub struct Dispatcher {
    registry: ToolRegistry,
    chains: HashMap<String, ToolHandler>,
}

impl Dispatcher {
    /// Compose `middleware` around every registered handler.
    pub fn new(registry: ToolRegistry, middleware: &MiddlewareChain) -> Self {
        let chains = registry
            .definitions()
            .map(|def| (def.name().to_string(), middleware.compose(def.handler.clone())))
            .collect();
        Self { registry, chains }
    }

    /// Execute one call.
    ///
    /// An unknown tool is returned as `ToolError::NotFound` so the transport can
    /// report it at the protocol level. Argument validation failures become
    /// error results. Everything the wrapped handler returns is passed back
    /// unaltered.
    pub fn dispatch(&self, request: &CallRequest) -> ToolResult<CallResult> {
        let definition = self.registry.lookup(&request.tool_name)?;

        let arguments = match definition.descriptor.validate(&request.arguments) {
            Ok(arguments) => arguments,
            Err(e) => {
                warn!(tool = %request.tool_name, error = %e, "Rejected tool arguments");
                return Ok(CallResult::error(format!("Error: {}", e)));
            }
        };

        let handler = self
            .chains
            .get(&request.tool_name)
            .ok_or_else(|| ToolError::NotFound(request.tool_name.clone()))?;

        debug!(tool = %request.tool_name, args = arguments.len(), "Dispatching tool call");
        handler(&ToolCall { request, arguments })
    }

    /// Descriptors for capability discovery, in registration order.
    pub fn list_tools(&self) -> Vec<&ToolDescriptor> {
        self.registry.list()
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::ParameterSpec;
    use crate::core::tool::ToolDefinition;
    use serde_json::{Value, json};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn request(name: &str, args: Value) -> CallRequest {
        let Value::Object(arguments) = args else {
            panic!("expected object");
        };
        CallRequest::new(name, arguments)
    }

    fn echo_registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        let descriptor = ToolDescriptor::new("echo", "Echo a message back")
            .with_parameter(ParameterSpec::string("message", "text to echo").required());
        registry
            .register(ToolDefinition::new(descriptor, |call| {
                Ok(CallResult::text(call.arguments.str("message").unwrap_or_default()))
            }))
            .unwrap();
        registry
    }

    #[test]
    fn unknown_tool_is_distinguishable() {
        let dispatcher = Dispatcher::new(echo_registry(), &MiddlewareChain::new());
        match dispatcher.dispatch(&request("nope", json!({}))) {
            Err(ToolError::NotFound(name)) => assert_eq!(name, "nope"),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn validation_failure_becomes_error_result_without_invoking_chain() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let chain = MiddlewareChain::new().with(move |next: ToolHandler| -> ToolHandler {
            let counter = counter.clone();
            Arc::new(move |call: &ToolCall<'_>| {
                counter.fetch_add(1, Ordering::SeqCst);
                next(call)
            })
        });
        let dispatcher = Dispatcher::new(echo_registry(), &chain);

        let result = dispatcher.dispatch(&request("echo", json!({"message": 5}))).unwrap();
        assert_eq!(
            result,
            CallResult::error("Error: message parameter is required and must be a string")
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let result = dispatcher.dispatch(&request("echo", json!({"message": "hi"}))).unwrap();
        assert_eq!(result, CallResult::text("hi"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn middleware_sees_raw_arguments_and_can_rewrite_result() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let chain = MiddlewareChain::new().with(move |next: ToolHandler| -> ToolHandler {
            let sink = sink.clone();
            Arc::new(move |call: &ToolCall<'_>| -> ToolResult<CallResult> {
                sink.lock().unwrap().push(call.request.arguments.clone());
                let mut result = next(call)?;
                result.content.push(crate::core::tool::ContentItem::text("audited"));
                Ok(result)
            })
        });
        let dispatcher = Dispatcher::new(echo_registry(), &chain);

        let result = dispatcher
            .dispatch(&request("echo", json!({"message": "hi", "trace": true})))
            .unwrap();
        assert_eq!(result.content.len(), 2);
        assert_eq!(seen.lock().unwrap()[0].get("trace"), Some(&json!(true)));
    }

    #[test]
    fn handler_errors_propagate_unaltered() {
        let mut registry = ToolRegistry::new();
        registry
            .register(ToolDefinition::new(ToolDescriptor::new("broken", "Always fails"), |_| {
                Err(ToolError::handler("upstream unavailable"))
            }))
            .unwrap();
        let dispatcher = Dispatcher::new(registry, &MiddlewareChain::new());

        match dispatcher.dispatch(&request("broken", json!({}))) {
            Err(ToolError::Handler(msg)) => assert_eq!(msg, "upstream unavailable"),
            other => panic!("expected handler error, got {:?}", other),
        }
    }

    #[test]
    fn dispatch_is_safe_across_threads() {
        let dispatcher = Arc::new(Dispatcher::new(echo_registry(), &MiddlewareChain::new()));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let dispatcher = dispatcher.clone();
                std::thread::spawn(move || {
                    let msg = format!("thread-{}", i);
                    let result = dispatcher
                        .dispatch(&request("echo", json!({"message": msg.clone()})))
                        .unwrap();
                    assert_eq!(result.first_text(), Some(msg.as_str()));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    }
}
