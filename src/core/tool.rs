/// Tool Definitions, Calls and Results
///
/// A `ToolDefinition` pairs a `ToolDescriptor` with the handler that executes
/// it. Handlers come in two flavours:
/// - plain handlers receive the validated `Arguments` and build a `CallResult`
/// - typed handlers take a `Deserialize` input and return a `Serialize` output;
///   `ToolDefinition::typed` adapts them by marshalling the arguments into the
///   input type and the output back into a `CallResult`

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::error::{ToolError, ToolResult, ValidationError};
use crate::core::schema::{Arguments, ToolDescriptor};

/// One inbound tool invocation, as received from the transport.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallRequest {
    #[serde(rename = "name")]
    pub tool_name: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl CallRequest {
    pub fn new(tool_name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
        }
    }
}

/// A single piece of tool output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentItem {
    Text { text: String },
}

impl ContentItem {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text { text: value.into() }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
        }
    }
}

/// Uniform response envelope for every tool invocation.
///
/// Business failures such as division by zero are results with `is_error` set,
/// not `Err`s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallResult {
    pub content: Vec<ContentItem>,
    #[serde(default)]
    pub is_error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<Value>,
}

impl CallResult {
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            content: vec![ContentItem::text(value)],
            is_error: false,
            structured_content: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ContentItem::text(message)],
            is_error: true,
            structured_content: None,
        }
    }

    /// Serialize a typed output into both a text block and structured content.
    pub fn structured<T: Serialize>(output: &T) -> ToolResult<Self> {
        let value = serde_json::to_value(output)
            .map_err(|e| ToolError::handler(format!("Failed to encode tool output: {}", e)))?;
        Ok(Self {
            content: vec![ContentItem::text(value.to_string())],
            is_error: false,
            structured_content: Some(value),
        })
    }

    /// First text block, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(ContentItem::as_text)
    }
}

/// What a handler sees: the inbound request plus its validated arguments.
#[derive(Debug)]
pub struct ToolCall<'a> {
    pub request: &'a CallRequest,
    pub arguments: Arguments,
}

impl ToolCall<'_> {
    pub fn tool_name(&self) -> &str {
        &self.request.tool_name
    }
}

/// Tool handler function type.
///
/// `Err` is reserved for failures the handler cannot express as a result; the
/// transport reports those as error results as well.
pub type ToolHandler = Arc<dyn Fn(&ToolCall<'_>) -> ToolResult<CallResult> + Send + Sync>;

/// A registered tool: descriptor plus handler.
#[derive(Clone)]
pub struct ToolDefinition {
    pub descriptor: ToolDescriptor,
    pub handler: ToolHandler,
}

impl ToolDefinition {
    pub fn new<F>(descriptor: ToolDescriptor, handler: F) -> Self
    where
        F: Fn(&ToolCall<'_>) -> ToolResult<CallResult> + Send + Sync + 'static,
    {
        Self {
            descriptor,
            handler: Arc::new(handler),
        }
    }

    /// Wrap a statically typed handler.
    ///
    /// The validated arguments are decoded into `I`; a decoding failure becomes a
    /// validation error result. `Err(message)` from the handler becomes an error
    /// result carrying `message`.
    pub fn typed<I, O, F>(descriptor: ToolDescriptor, handler: F) -> Self
    where
        I: DeserializeOwned,
        O: Serialize,
        F: Fn(I) -> Result<O, String> + Send + Sync + 'static,
    {
        Self::new(descriptor, move |call| {
            let input: I = match serde_json::from_value(call.arguments.to_json()) {
                Ok(input) => input,
                Err(e) => {
                    let err = ValidationError::Input(e.to_string());
                    return Ok(CallResult::error(format!("Error: {}", err)));
                }
            };
            match handler(input) {
                Ok(output) => CallResult::structured(&output),
                Err(message) => Ok(CallResult::error(format!("Error: {}", message))),
            }
        })
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }
}

impl std::fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}
