/// Middleware Chain
///
/// A middleware turns the next handler into a new handler. The chain is
/// composed once per tool when the dispatcher is built; the first middleware
/// pushed becomes the outermost wrapper, so pre-processing runs in push order
/// and post-processing in reverse.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::core::tool::{ToolCall, ToolHandler};

pub trait Middleware: Send + Sync {
    /// Wrap `next`. The returned handler must call `next` exactly once or
    /// short-circuit with its own result.
    fn wrap(&self, next: ToolHandler) -> ToolHandler;
}

impl<F> Middleware for F
where
    F: Fn(ToolHandler) -> ToolHandler + Send + Sync,
{
    fn wrap(&self, next: ToolHandler) -> ToolHandler {
        self(next)
    }
}

/// Ordered list of middlewares, filled during startup.
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    layers: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.push(middleware);
        self
    }

    pub fn push<M: Middleware + 'static>(&mut self, middleware: M) {
        self.layers.push(Arc::new(middleware));
    }

    /// Wrap `handler` so the first pushed middleware runs outermost.
    pub fn compose(&self, handler: ToolHandler) -> ToolHandler {
        self.layers
            .iter()
            .rev()
            .fold(handler, |next, layer| layer.wrap(next))
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

/// Logs every tool call. Pure observer: the result or error is passed through
/// untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingMiddleware;

impl Middleware for LoggingMiddleware {
    fn wrap(&self, next: ToolHandler) -> ToolHandler {
        Arc::new(move |call: &ToolCall<'_>| {
            let start = Instant::now();
            info!(
                tool = %call.tool_name(),
                input = %serde_json::Value::Object(call.request.arguments.clone()),
                "Tool call started"
            );

            let result = next(call);

            let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
            match &result {
                Ok(res) => info!(
                    tool = %call.tool_name(),
                    duration_ms,
                    is_error = res.is_error,
                    "Tool call completed"
                ),
                Err(e) => warn!(
                    tool = %call.tool_name(),
                    duration_ms,
                    error = %e,
                    "Tool call failed"
                ),
            }

            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{ToolError, ToolResult};
    use crate::core::tool::{CallRequest, CallResult};
    use std::sync::Mutex;

    type Trace = Arc<Mutex<Vec<String>>>;

    fn recording(label: &'static str, trace: Trace) -> impl Middleware {
        move |next: ToolHandler| -> ToolHandler {
            let trace = trace.clone();
            Arc::new(move |call: &ToolCall<'_>| {
                trace.lock().unwrap().push(format!("{}-pre", label));
                let result = next(call);
                trace.lock().unwrap().push(format!("{}-post", label));
                result
            })
        }
    }

    fn run(handler: &ToolHandler) -> ToolResult<CallResult> {
        let request = CallRequest::new("probe", Default::default());
        let call = ToolCall {
            request: &request,
            arguments: Default::default(),
        };
        handler(&call)
    }

    #[test]
    fn first_pushed_wraps_outermost() {
        let trace: Trace = Arc::default();
        let chain = MiddlewareChain::new()
            .with(recording("m1", trace.clone()))
            .with(recording("m2", trace.clone()));

        let inner_trace = trace.clone();
        let handler: ToolHandler = Arc::new(move |_: &ToolCall<'_>| -> ToolResult<CallResult> {
            inner_trace.lock().unwrap().push("handler".to_string());
            Ok(CallResult::text("done"))
        });

        run(&chain.compose(handler)).unwrap();
        assert_eq!(
            *trace.lock().unwrap(),
            vec!["m1-pre", "m2-pre", "handler", "m2-post", "m1-post"]
        );
    }

    #[test]
    fn middleware_can_short_circuit() {
        let reached = Arc::new(Mutex::new(false));
        let deny = |_next: ToolHandler| -> ToolHandler {
            Arc::new(|_: &ToolCall<'_>| -> ToolResult<CallResult> {
                Ok(CallResult::error("Error: Access denied"))
            })
        };
        let chain = MiddlewareChain::new().with(deny);

        let flag = reached.clone();
        let handler: ToolHandler = Arc::new(move |_: &ToolCall<'_>| -> ToolResult<CallResult> {
            *flag.lock().unwrap() = true;
            Ok(CallResult::text("secret"))
        });

        let result = run(&chain.compose(handler)).unwrap();
        assert_eq!(result, CallResult::error("Error: Access denied"));
        assert!(!*reached.lock().unwrap());
    }

    #[test]
    fn logging_passes_results_and_errors_through() {
        let chain = MiddlewareChain::new().with(LoggingMiddleware);

        let ok = chain.compose(Arc::new(|_: &ToolCall<'_>| -> ToolResult<CallResult> {
            Ok(CallResult::error("Error: Division by zero"))
        }));
        assert_eq!(run(&ok).unwrap(), CallResult::error("Error: Division by zero"));

        let failing = chain.compose(Arc::new(|_: &ToolCall<'_>| -> ToolResult<CallResult> {
            Err(ToolError::handler("backend down"))
        }));
        match run(&failing) {
            Err(ToolError::Handler(msg)) => assert_eq!(msg, "backend down"),
            other => panic!("expected handler error, got {:?}", other),
        }
    }

    #[test]
    fn empty_chain_returns_handler_unchanged() {
        let chain = MiddlewareChain::new();
        assert!(chain.is_empty());
        let handler: ToolHandler = Arc::new(|_: &ToolCall<'_>| -> ToolResult<CallResult> {
            Ok(CallResult::text("plain"))
        });
        let composed = chain.compose(handler.clone());
        assert!(Arc::ptr_eq(&composed, &handler));
    }
}
