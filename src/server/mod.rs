//! Tool catalogue and dispatch
//!
//! The registry owns the static table of tools (name, description,
//! input JSON-schema, handler), receives `(name, args)` pairs from the
//! protocol layer, routes to the matching resolver, and hands back the
//! result list rendered as a single JSON text payload. A startup
//! self-check walks every schema and refuses to serve a catalogue
//! whose array-typed properties lack a concretely-typed `items`.

mod catalog;
mod schema;
mod stdio;

pub use schema::SchemaViolation;
pub use stdio::serve_stdio;

use crate::error::ToolError;
use crate::handlers::{ArgsMap, HandlerContext};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// The textual JSON payload a tool call produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResponse {
    text: String,
}

impl ToolResponse {
    /// Renders a result value as an indented JSON payload
    pub fn json<T: Serialize>(value: &T) -> Result<Self, ToolError> {
        Ok(Self {
            text: serde_json::to_string_pretty(value)?,
        })
    }

    /// The payload body
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// A tool's resolver entry point
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, args: &ArgsMap) -> Result<ToolResponse, ToolError>;
}

/// Catalogue entry: name, description, and input schema
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: serde_json::Value,
}

struct RegisteredTool {
    spec: ToolSpec,
    handler: Arc<dyn ToolHandler>,
}

/// The static tool table plus dispatch
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
}

impl ToolRegistry {
    /// Builds the full catalogue over the shared handler context
    pub fn new(ctx: HandlerContext) -> Self {
        Self {
            tools: catalog::build(ctx),
        }
    }

    /// Iterates the catalogue entries
    pub fn tools(&self) -> impl Iterator<Item = &ToolSpec> {
        self.tools.iter().map(|tool| &tool.spec)
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// True when the catalogue is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Verifies every tool schema against the catalogue compliance
    /// rules; called once at startup before serving.
    pub fn verify_schemas(&self) -> Result<(), SchemaViolation> {
        for tool in &self.tools {
            schema::verify_tool_schema(tool.spec.name, &tool.spec.input_schema)?;
        }
        Ok(())
    }

    /// Routes one tool call to its resolver
    pub async fn dispatch(&self, name: &str, args: &ArgsMap) -> Result<ToolResponse, ToolError> {
        let tool = self
            .tools
            .iter()
            .find(|tool| tool.spec.name == name)
            .ok_or_else(|| ToolError::unknown_tool(name))?;
        debug!(tool = name, "dispatching tool call");
        tool.handler.call(args).await
    }
}
