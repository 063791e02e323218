//! Tool Registry - central registration and lookup for all tools.
//!
//! This module provides:
//! - Tool descriptors (name, description, input schema)
//! - Reject-on-duplicate registration
//! - Ordered listing for capability advertisement
//! - Name resolution for dispatch
//!
//! The registry is populated once at startup and then shared behind an
//! `Arc`; nothing mutates it afterwards.

use std::collections::HashMap;
use std::sync::Arc;

use rmcp::handler::server::tool::schema_for_type;
use rmcp::model::{JsonObject, Tool};
use thiserror::Error;
use tracing::debug;

use super::handlers::{ApiTool, ToolHandler, TypedHandler};
use super::schema::SchemaContract;

// ============================================================================
// Descriptor
// ============================================================================

/// Immutable description of a registered tool.
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    name: String,
    description: String,
    input_schema: Arc<JsonObject>,
    contract: SchemaContract,
}

impl ToolDescriptor {
    /// Create a descriptor, compiling the schema into a validation contract.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Arc<JsonObject>,
    ) -> Self {
        let contract = SchemaContract::compile(&input_schema);
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
            contract,
        }
    }

    /// Descriptor for an [`ApiTool`], with the schema generated from its params.
    pub fn of<T: ApiTool>() -> Self {
        Self::new(T::NAME, T::DESCRIPTION, Arc::new(schema_for_type::<T::Params>()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn input_schema(&self) -> &Arc<JsonObject> {
        &self.input_schema
    }

    pub fn contract(&self) -> &SchemaContract {
        &self.contract
    }

    /// Create a Tool model for this descriptor (metadata).
    pub fn to_tool(&self) -> Tool {
        Tool {
            name: self.name.clone().into(),
            description: Some(self.description.clone().into()),
            input_schema: self.input_schema.clone(),
            annotations: None,
            output_schema: None,
            icons: None,
            meta: None,
            title: None,
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// A tool with the same name is already registered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("tool '{0}' is already registered")]
pub struct DuplicateToolError(pub String);

/// No tool is registered under the requested name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown tool '{0}'")]
pub struct ToolNotFoundError(pub String);

// ============================================================================
// Tool Registry
// ============================================================================

/// A descriptor paired with its handler.
#[derive(Clone)]
pub struct RegisteredTool {
    pub descriptor: ToolDescriptor,
    pub handler: Arc<dyn ToolHandler>,
}

/// Tool registry - maps tool names to descriptors and handlers.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    entries: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. The first registration of a name wins.
    pub fn register(
        &mut self,
        descriptor: ToolDescriptor,
        handler: Arc<dyn ToolHandler>,
    ) -> Result<(), DuplicateToolError> {
        if self.index.contains_key(descriptor.name()) {
            return Err(DuplicateToolError(descriptor.name().to_string()));
        }

        debug!(tool = descriptor.name(), "Registering tool");
        self.index
            .insert(descriptor.name().to_string(), self.entries.len());
        self.entries.push(RegisteredTool {
            descriptor,
            handler,
        });
        Ok(())
    }

    /// Register an [`ApiTool`] implementation.
    pub fn register_tool<T: ApiTool>(&mut self, tool: T) -> Result<(), DuplicateToolError> {
        self.register(ToolDescriptor::of::<T>(), Arc::new(TypedHandler(tool)))
    }

    /// All descriptors, in registration order.
    pub fn list(&self) -> Vec<&ToolDescriptor> {
        self.entries.iter().map(|e| &e.descriptor).collect()
    }

    /// All tools as Tool models, in registration order.
    pub fn to_tools(&self) -> Vec<Tool> {
        self.entries.iter().map(|e| e.descriptor.to_tool()).collect()
    }

    /// Get all tool names.
    pub fn tool_names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.descriptor.name()).collect()
    }

    /// Look up a tool by name.
    pub fn resolve(&self, name: &str) -> Result<&RegisteredTool, ToolNotFoundError> {
        self.index
            .get(name)
            .map(|&i| &self.entries[i])
            .ok_or_else(|| ToolNotFoundError(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
