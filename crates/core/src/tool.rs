//! Tool types: named, schema-described capabilities callable by the model.
//!
//! A [`Tool`] is pure data. Behavior is attached separately through a
//! [`ToolHandler`], so the workspace can keep an explicit handler table
//! keyed by tool name.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ToolError;
use crate::provider::ToolDefinition;

/// A named capability with a parameter schema. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    /// Unique name within a workspace (e.g., "search_papers")
    pub name: String,

    /// What the tool does (sent to the model)
    pub description: String,

    /// JSON Schema for the parameters. Structural only, never validated here.
    pub parameters: serde_json::Value,
}

impl Tool {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// A tool that takes no parameters.
    pub fn without_parameters(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(
            name,
            description,
            serde_json::json!({ "type": "object", "properties": {}, "required": [] }),
        )
    }

    /// Project this tool into the transport's tool-calling schema.
    pub fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self.parameters.clone(),
        }
    }
}

/// Who owns a tool registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "owner", rename_all = "snake_case")]
pub enum ToolSource {
    /// Preregistered by the workspace; always enabled.
    Global,
    /// Owned by the component registered under this key.
    Component(String),
    /// Owned by the skill with this name.
    Skill(String),
}

impl std::fmt::Display for ToolSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Global => write!(f, "global"),
            Self::Component(key) => write!(f, "component '{key}'"),
            Self::Skill(name) => write!(f, "skill '{name}'"),
        }
    }
}

/// One entry in the workspace's handler table.
///
/// Handlers receive the tool name so one handler can serve several tools
/// (a component forwards every tool it owns through a single handler).
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(
        &self,
        tool_name: &str,
        params: serde_json::Value,
    ) -> std::result::Result<serde_json::Value, ToolError>;
}

/// The structured result of dispatching one tool call.
///
/// Failures are values, not errors: the agent feeds them back to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallResult {
    /// Name of the tool that was called
    pub tool_name: String,

    /// Parameters the call was made with
    pub params: serde_json::Value,

    /// Whether the tool executed successfully
    pub success: bool,

    /// Handler output on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,

    /// Error description on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Wall-clock duration of the handler call
    #[serde(default)]
    pub duration_ms: u64,

    pub timestamp: DateTime<Utc>,
}

impl ToolCallResult {
    pub fn ok(tool_name: impl Into<String>, params: serde_json::Value, result: serde_json::Value) -> Self {
        Self {
            tool_name: tool_name.into(),
            params,
            success: true,
            result: Some(result),
            error: None,
            duration_ms: 0,
            timestamp: Utc::now(),
        }
    }

    pub fn failure(tool_name: impl Into<String>, params: serde_json::Value, error: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            params,
            success: false,
            result: None,
            error: Some(error.into()),
            duration_ms: 0,
            timestamp: Utc::now(),
        }
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    /// Render the outcome as text for the model.
    pub fn to_observation(&self) -> String {
        if self.success {
            match &self.result {
                Some(serde_json::Value::String(s)) => s.clone(),
                Some(v) => v.to_string(),
                None => String::from("(no output)"),
            }
        } else {
            format!("Error: {}", self.error.as_deref().unwrap_or("unknown error"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definition_projection_is_structural() {
        let tool = Tool::without_parameters("list_skills", "List skills");
        let def = tool.to_definition();
        assert_eq!(def.name, "list_skills");
        assert_eq!(def.parameters["type"], "object");
    }

    #[test]
    fn observation_renders_string_results_verbatim() {
        let ok = ToolCallResult::ok("echo", serde_json::json!({}), serde_json::json!("hello"));
        assert_eq!(ok.to_observation(), "hello");

        let failed = ToolCallResult::failure("echo", serde_json::json!({}), "boom");
        assert!(!failed.success);
        assert_eq!(failed.to_observation(), "Error: boom");
    }

    #[test]
    fn source_display_names_owner() {
        assert_eq!(ToolSource::Component("papers".into()).to_string(), "component 'papers'");
        assert_eq!(ToolSource::Global.to_string(), "global");
    }
}
