/// Core Module
///
/// Tool registry, middleware chain and dispatcher, plus the JSON-RPC transport
/// and configuration that expose them over HTTP and STDIO.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod jsonrpc;
pub mod middleware;
pub mod registry;
pub mod schema;
pub mod server;
pub mod tool;

pub use dispatcher::Dispatcher;
pub use error::{ToolError, ToolResult, ValidationError};
pub use middleware::{LoggingMiddleware, Middleware, MiddlewareChain};
pub use registry::ToolRegistry;
pub use schema::{ArgValue, Arguments, ParameterKind, ParameterSpec, ToolDescriptor};
pub use tool::{CallRequest, CallResult, ContentItem, ToolCall, ToolDefinition, ToolHandler};
