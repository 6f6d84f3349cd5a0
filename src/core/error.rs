/// Error types for tool registration and dispatch.
///
/// `ToolError` is what the registry and dispatcher return. Argument problems are
/// `ValidationError`s; the dispatcher turns them into error `CallResult`s so a
/// malformed call never reaches the transport as a fault.

use thiserror::Error;

use crate::core::schema::ParameterKind;

/// Result type for registry and dispatch operations
pub type ToolResult<T> = Result<T, ToolError>;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    NotFound(String),

    /// Two definitions share a name. Only raised while the registry is being built.
    #[error("Tool already registered: {0}")]
    Duplicate(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Handler(String),
}

impl ToolError {
    pub fn handler(msg: impl Into<String>) -> Self {
        Self::Handler(msg.into())
    }
}

/// A call argument that does not match the tool's parameter schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required parameter is absent, null, or not convertible to its kind.
    #[error("{} parameter is required and must be {}", .name, .kind.with_article())]
    Required { name: String, kind: ParameterKind },

    /// An optional parameter was supplied with a value of the wrong kind.
    #[error("{} parameter must be {}", .name, .kind.with_article())]
    WrongType { name: String, kind: ParameterKind },

    #[error("Invalid input: {0}")]
    Input(String),
}

impl ValidationError {
    pub fn parameter(&self) -> Option<&str> {
        match self {
            Self::Required { name, .. } | Self::WrongType { name, .. } => Some(name),
            Self::Input(_) => None,
        }
    }
}
