/// Tool Registry
///
/// The registry is built once during startup and then moved into the
/// `Dispatcher`, after which it is only ever read. Duplicate names are rejected
/// so wiring mistakes surface before the server accepts a call. Listing returns
/// descriptors in registration order.

use std::collections::HashMap;

use crate::core::error::{ToolError, ToolResult};
use crate::core::schema::ToolDescriptor;
use crate::core::tool::ToolDefinition;

#[derive(Debug, Default)]
pub struct ToolRegistry {
    definitions: Vec<ToolDefinition>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under its descriptor name.
    pub fn register(&mut self, definition: ToolDefinition) -> ToolResult<()> {
        let name = definition.name().to_string();
        if self.index.contains_key(&name) {
            return Err(ToolError::Duplicate(name));
        }
        self.index.insert(name, self.definitions.len());
        self.definitions.push(definition);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> ToolResult<&ToolDefinition> {
        self.index
            .get(name)
            .map(|&i| &self.definitions[i])
            .ok_or_else(|| ToolError::NotFound(name.to_string()))
    }

    /// Descriptors of every registered tool, in registration order.
    pub fn list(&self) -> Vec<&ToolDescriptor> {
        self.definitions.iter().map(|d| &d.descriptor).collect()
    }

    pub fn definitions(&self) -> impl Iterator<Item = &ToolDefinition> {
        self.definitions.iter()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tool::CallResult;
    use std::sync::Arc;

    fn tool(name: &str, reply: &'static str) -> ToolDefinition {
        ToolDefinition::new(
            ToolDescriptor::new(name, format!("{} tool", name)),
            move |_| Ok(CallResult::text(reply)),
        )
    }

    #[test]
    fn lookup_returns_registered_definition() {
        let mut registry = ToolRegistry::new();
        let definition = tool("alpha", "a");
        let handler = definition.handler.clone();
        registry.register(definition).unwrap();

        let found = registry.lookup("alpha").unwrap();
        assert_eq!(found.descriptor, ToolDescriptor::new("alpha", "alpha tool"));
        assert!(Arc::ptr_eq(&found.handler, &handler));
    }

    #[test]
    fn lookup_unknown_tool_fails() {
        let registry = ToolRegistry::new();
        match registry.lookup("missing") {
            Err(ToolError::NotFound(name)) => assert_eq!(name, "missing"),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn duplicate_registration_is_rejected_and_keeps_first() {
        let mut registry = ToolRegistry::new();
        registry.register(tool("alpha", "first")).unwrap();

        let err = registry.register(tool("alpha", "second")).unwrap_err();
        assert!(matches!(err, ToolError::Duplicate(ref n) if n == "alpha"));
        assert_eq!(registry.len(), 1);

        let request = crate::core::tool::CallRequest::new("alpha", Default::default());
        let call = crate::core::tool::ToolCall {
            request: &request,
            arguments: Default::default(),
        };
        let result = (registry.lookup("alpha").unwrap().handler)(&call).unwrap();
        assert_eq!(result.first_text(), Some("first"));
    }

    #[test]
    fn list_preserves_registration_order() {
        let mut registry = ToolRegistry::new();
        for name in ["gamma", "alpha", "beta"] {
            registry.register(tool(name, "x")).unwrap();
        }
        let names: Vec<&str> = registry.list().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["gamma", "alpha", "beta"]);
        assert!(registry.list().iter().all(|d| !d.description.is_empty()));
    }
}
