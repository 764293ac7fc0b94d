//! System prompt assembly.
//!
//! Section order is fixed: workspace, base capability, skill capability
//! enhancement, base direction, skill direction guidance. Skill sections
//! only appear while a skill is active and has text for them.

use mindloop_core::{AgentConfig, Skill};

pub fn build_system_prompt(workspace_context: &str, config: &AgentConfig, active: Option<&Skill>) -> String {
    let mut sections = vec![workspace_context.trim_end().to_string()];

    sections.push(format!("# Capability\n{}", config.capability.trim()));
    if let Some(skill) = active.filter(|s| !s.capability.trim().is_empty()) {
        sections.push(format!(
            "## Skill Capability: {}\n{}",
            skill.display_name,
            skill.capability.trim()
        ));
    }

    sections.push(format!("# Direction\n{}", config.direction.trim()));
    if let Some(skill) = active.filter(|s| !s.direction.trim().is_empty()) {
        sections.push(format!(
            "## Skill Direction: {}\n{}",
            skill.display_name,
            skill.direction.trim()
        ));
    }

    sections.join("\n\n")
}
