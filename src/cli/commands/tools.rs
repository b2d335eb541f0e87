//! Tools command - list what the agent can call.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;
use serde_json::Value;

/// Run the tools command.
pub fn run_tools(settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;
    let registry = orchestrator.registry();

    Output::header(&format!("Tools ({})", registry.len()));
    for spec in registry.list() {
        println!();
        Output::list_item(&spec.name);
        Output::kv("description", &spec.description);
        for argument in describe_arguments(&spec.input_schema) {
            Output::kv("argument", &argument);
        }
    }
    Ok(())
}

/// `name: type` lines for each schema property, marking required ones.
fn describe_arguments(schema: &Value) -> Vec<String> {
    let required: Vec<&str> = schema
        .get("required")
        .and_then(|r| r.as_array())
        .map(|r| r.iter().filter_map(|v| v.as_str()).collect())
        .unwrap_or_default();

    let Some(properties) = schema.get("properties").and_then(|p| p.as_object()) else {
        return Vec::new();
    };

    properties
        .iter()
        .map(|(name, property)| {
            let kind = property
                .get("type")
                .and_then(|t| t.as_str())
                .unwrap_or("any");
            if required.contains(&name.as_str()) {
                format!("{}: {} (required)", name, kind)
            } else {
                format!("{}: {}", name, kind)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_describe_arguments() {
        let schema = json!({
            "type": "object",
            "properties": {
                "video_id": {"type": "string"},
                "lang": {"type": "string"}
            },
            "required": ["video_id"]
        });
        let mut lines = describe_arguments(&schema);
        lines.sort();
        assert_eq!(lines, vec!["lang: string", "video_id: string (required)"]);
        assert!(describe_arguments(&json!({})).is_empty());
    }
}
