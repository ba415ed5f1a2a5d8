//! Tool-schema compliance check
//!
//! Downstream protocol validators reject a catalogue whose array-typed
//! properties carry no concretely-typed `items`. The check here walks
//! every schema at startup and aborts server start on the first
//! violation instead of letting a client discover it.

use serde_json::Value;
use thiserror::Error;

/// A schema that would be rejected by protocol validators
#[derive(Error, Debug, PartialEq, Eq)]
#[error("tool '{tool}' schema violation at '{property}': {message}")]
pub struct SchemaViolation {
    pub tool: String,
    pub property: String,
    pub message: String,
}

impl SchemaViolation {
    fn new(
        tool: &str,
        property: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            tool: tool.to_string(),
            property: property.into(),
            message: message.into(),
        }
    }
}

/// Verifies one tool's input schema: it must be object-typed, and every
/// array-typed property (at any nesting depth) must declare an `items`
/// object with a non-empty `type` string.
pub fn verify_tool_schema(tool: &str, schema: &Value) -> Result<(), SchemaViolation> {
    if schema.get("type").and_then(Value::as_str) != Some("object") {
        return Err(SchemaViolation::new(
            tool,
            "$",
            "input schema must be object-typed",
        ));
    }
    verify_properties(tool, schema, "$")
}

fn verify_properties(tool: &str, schema: &Value, path: &str) -> Result<(), SchemaViolation> {
    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Ok(());
    };

    for (name, property) in properties {
        let property_path = format!("{}.{}", path, name);

        if property.get("type").and_then(Value::as_str) == Some("array") {
            let Some(items) = property.get("items") else {
                return Err(SchemaViolation::new(
                    tool,
                    &property_path,
                    "array property missing 'items'",
                ));
            };
            if !items.is_object() {
                return Err(SchemaViolation::new(
                    tool,
                    &property_path,
                    "'items' must be an object",
                ));
            }
            match items.get("type").and_then(Value::as_str) {
                Some(item_type) if !item_type.is_empty() => {}
                _ => {
                    return Err(SchemaViolation::new(
                        tool,
                        &property_path,
                        "'items' must declare a non-empty 'type'",
                    ));
                }
            }
            verify_properties(tool, items, &property_path)?;
        }

        // Nested object properties get the same treatment
        verify_properties(tool, property, &property_path)?;
    }

    Ok(())
}
