//! Tool registry keyed by name, with argument validation.

use crate::error::{GistError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// A capability the agent can invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Run the tool with already-validated arguments.
    async fn invoke(&self, arguments: &Value) -> Result<Value>;
}

/// Declaration of a registered tool.
#[derive(Clone)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON Schema for the arguments object.
    pub input_schema: Value,
    pub invoke: Arc<dyn Tool>,
}

impl ToolSpec {
    pub fn new(
        name: &str,
        description: &str,
        input_schema: Value,
        tool: Arc<dyn Tool>,
    ) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            input_schema,
            invoke: tool,
        }
    }

    /// One-entry description for the system preamble.
    pub fn describe(&self) -> String {
        format!(
            "{}: {}\n  Input schema: {}",
            self.name, self.description, self.input_schema
        )
    }
}

impl std::fmt::Debug for ToolSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolSpec")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("input_schema", &self.input_schema)
            .finish_non_exhaustive()
    }
}

/// Registered tools in registration order.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    specs: Vec<ToolSpec>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Names are unique.
    pub fn register(&mut self, spec: ToolSpec) -> Result<()> {
        if self.index.contains_key(&spec.name) {
            return Err(GistError::DuplicateTool(spec.name));
        }
        self.index.insert(spec.name.clone(), self.specs.len());
        self.specs.push(spec);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<&ToolSpec> {
        self.index
            .get(name)
            .map(|&i| &self.specs[i])
            .ok_or_else(|| GistError::UnknownTool(name.to_string()))
    }

    /// All tools in registration order.
    pub fn list(&self) -> &[ToolSpec] {
        &self.specs
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Look up a tool and check the arguments against its schema.
    pub fn validate(&self, name: &str, arguments: &Value) -> Result<&ToolSpec> {
        let spec = self.lookup(name)?;
        validate_arguments(arguments, &spec.input_schema).map_err(|message| {
            GistError::InvalidArguments {
                tool: name.to_string(),
                message,
            }
        })?;
        Ok(spec)
    }

    /// Tool list rendered for the system preamble.
    pub fn describe_all(&self) -> String {
        self.specs
            .iter()
            .map(|s| format!("- {}", s.describe()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Validate tool arguments against a JSON Schema.
///
/// Top-level only: object type, required fields, and primitive property types.
pub fn validate_arguments(args: &Value, schema: &Value) -> std::result::Result<(), String> {
    if let Some(schema_type) = schema.get("type").and_then(|v| v.as_str()) {
        if schema_type == "object" && !args.is_object() {
            return Err(format!(
                "expected object arguments, got {}",
                json_type_name(args)
            ));
        }
    }

    let Some(obj) = args.as_object() else {
        return Ok(());
    };

    if let Some(required) = schema.get("required").and_then(|v| v.as_array()) {
        for field in required.iter().filter_map(|f| f.as_str()) {
            if !obj.contains_key(field) {
                return Err(format!("missing required field '{}'", field));
            }
        }
    }

    if let Some(properties) = schema.get("properties").and_then(|v| v.as_object()) {
        for (key, value) in obj {
            let expected = properties
                .get(key)
                .and_then(|p| p.get("type"))
                .and_then(|t| t.as_str());
            if let Some(expected_type) = expected {
                if !value_matches_type(value, expected_type) {
                    return Err(format!(
                        "field '{}' expected type '{}', got {}",
                        key,
                        expected_type,
                        json_type_name(value)
                    ));
                }
            }
        }
    }

    Ok(())
}

fn value_matches_type(value: &Value, expected: &str) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Echo;

    #[async_trait]
    impl Tool for Echo {
        async fn invoke(&self, arguments: &Value) -> Result<Value> {
            Ok(arguments.clone())
        }
    }

    fn echo_spec(name: &str) -> ToolSpec {
        ToolSpec::new(
            name,
            "Echo the arguments back.",
            json!({
                "type": "object",
                "properties": {"text": {"type": "string"}},
                "required": ["text"]
            }),
            Arc::new(Echo),
        )
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let mut registry = ToolRegistry::new();
        registry.register(echo_spec("echo")).unwrap();
        let err = registry.register(echo_spec("echo")).unwrap_err();
        assert!(matches!(err, GistError::DuplicateTool(name) if name == "echo"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_lookup_unknown() {
        let registry = ToolRegistry::new();
        assert!(matches!(
            registry.lookup("missing"),
            Err(GistError::UnknownTool(name)) if name == "missing"
        ));
    }

    #[test]
    fn test_list_keeps_registration_order() {
        let mut registry = ToolRegistry::new();
        for name in ["zeta", "alpha", "mid"] {
            registry.register(echo_spec(name)).unwrap();
        }
        let names: Vec<_> = registry.list().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_validate_arguments() {
        let mut registry = ToolRegistry::new();
        registry.register(echo_spec("echo")).unwrap();

        assert!(registry.validate("echo", &json!({"text": "hi"})).is_ok());
        assert!(matches!(
            registry.validate("echo", &json!({})),
            Err(GistError::InvalidArguments { message, .. }) if message.contains("'text'")
        ));
        assert!(matches!(
            registry.validate("echo", &json!({"text": 3})),
            Err(GistError::InvalidArguments { message, .. }) if message.contains("expected type 'string'")
        ));
        assert!(registry.validate("echo", &json!("hi")).is_err());
    }

    #[tokio::test]
    async fn test_invoke_through_spec() {
        let mut registry = ToolRegistry::new();
        registry.register(echo_spec("echo")).unwrap();

        let spec = registry.lookup("echo").unwrap();
        let output = spec.invoke.invoke(&json!({"text": "hi"})).await.unwrap();
        assert_eq!(output, json!({"text": "hi"}));
    }

    #[test]
    fn test_describe_all_lists_schema() {
        let mut registry = ToolRegistry::new();
        registry.register(echo_spec("echo")).unwrap();
        let listing = registry.describe_all();
        assert!(listing.starts_with("- echo: Echo the arguments back."));
        assert!(listing.contains("\"required\":[\"text\"]"));
    }
}
