/// Greeter Tool
///
/// Says hello to the person named in the `name` argument.

use crate::core::error::ToolResult;
use crate::core::registry::ToolRegistry;
use crate::core::schema::{ParameterSpec, ToolDescriptor};
use crate::core::tool::{CallResult, ToolCall, ToolDefinition};

pub const NAME: &str = "hello_world";

pub fn descriptor() -> ToolDescriptor {
    ToolDescriptor::new(NAME, "Say hello to someone")
        .with_parameter(ParameterSpec::string("name", "Name of the person to greet").required())
}

pub fn handle(call: &ToolCall<'_>) -> ToolResult<CallResult> {
    // Validation already guarantees a string; this only guards direct callers.
    let Some(name) = call.arguments.str("name") else {
        return Ok(CallResult::error(
            "Error: name parameter is required and must be a string",
        ));
    };
    Ok(CallResult::text(format!("Hello to MCP tool, {}!", name)))
}

pub fn register(registry: &mut ToolRegistry) -> ToolResult<()> {
    registry.register(ToolDefinition::new(descriptor(), handle))
}
