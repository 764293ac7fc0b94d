//! Global tools preregistered in every workspace and never disabled.

use mindloop_core::Tool;
use mindloop_core::error::ToolError;
use serde_json::json;

pub const ATTEMPT_COMPLETION: &str = "attempt_completion";
pub const LIST_SKILLS: &str = "list_skills";
pub const ACTIVATE_SKILL: &str = "activate_skill";
pub const DEACTIVATE_SKILL: &str = "deactivate_skill";

/// Definitions of all global tools, in catalogue order.
pub fn definitions() -> Vec<Tool> {
    vec![
        Tool::new(
            ATTEMPT_COMPLETION,
            "Finish the task. Call this once the work is done, passing the final result.",
            json!({
                "type": "object",
                "properties": {
                    "result": {
                        "type": "string",
                        "description": "The final result of the task"
                    }
                },
                "required": ["result"]
            }),
        ),
        Tool::without_parameters(LIST_SKILLS, "List the registered skills and which one is active."),
        Tool::new(
            ACTIVATE_SKILL,
            "Activate a skill by name. Deactivates the current skill first and changes which tools are callable.",
            json!({
                "type": "object",
                "properties": {
                    "name": {
                        "type": "string",
                        "description": "Name of the skill to activate"
                    }
                },
                "required": ["name"]
            }),
        ),
        Tool::without_parameters(
            DEACTIVATE_SKILL,
            "Deactivate the current skill and restore the full component tool set.",
        ),
    ]
}

/// Read a required string parameter.
pub(crate) fn required_str<'a>(params: &'a serde_json::Value, key: &str) -> Result<&'a str, ToolError> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ToolError::InvalidArguments(format!("Missing required parameter '{key}'")))
}
