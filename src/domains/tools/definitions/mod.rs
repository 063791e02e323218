//! Tool definitions module.
//!
//! This module exports all available tool definitions.
//! Each tool is defined in its own file for better maintainability.

pub mod get_user;
pub mod search;

pub use get_user::{GetUserParams, GetUserTool};
pub use search::{SearchParams, SearchTool};

use super::registry::{DuplicateToolError, ToolRegistry};

/// Register every built-in tool, in advertisement order.
pub fn register_builtin(registry: &mut ToolRegistry) -> Result<(), DuplicateToolError> {
    registry.register_tool(SearchTool)?;
    registry.register_tool(GetUserTool)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_tools() {
        let mut registry = ToolRegistry::new();
        register_builtin(&mut registry).unwrap();
        assert_eq!(registry.tool_names(), vec!["search", "get_user"]);
    }

    #[test]
    fn test_builtin_twice_is_rejected() {
        let mut registry = ToolRegistry::new();
        register_builtin(&mut registry).unwrap();
        let err = register_builtin(&mut registry).unwrap_err();
        assert_eq!(err, DuplicateToolError("search".to_string()));
        assert_eq!(registry.len(), 2);
    }
}
