//! Tool registry: the workspace's handler table.
//!
//! One registration per tool name. Disabling a tool never removes it; the
//! skill change listener flips `enabled` flags in place.

use std::sync::Arc;

use mindloop_core::error::WorkspaceError;
use mindloop_core::{Skill, Tool, ToolDefinition, ToolHandler, ToolSource};

use crate::global_tools;

/// A tool plus its ownership, enablement, and handler.
#[derive(Clone)]
pub struct ToolRegistration {
    pub tool: Tool,
    pub source: ToolSource,
    pub enabled: bool,
    /// `None` for global tools, which the workspace dispatches itself.
    pub handler: Option<Arc<dyn ToolHandler>>,
}

impl std::fmt::Debug for ToolRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistration")
            .field("tool", &self.tool.name)
            .field("source", &self.source)
            .field("enabled", &self.enabled)
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}

/// Registrations in insertion order.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    entries: Vec<ToolRegistration>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding only the global tools, all enabled.
    pub fn with_global_tools() -> Self {
        let entries = global_tools::definitions()
            .into_iter()
            .map(|tool| ToolRegistration {
                tool,
                source: ToolSource::Global,
                enabled: true,
                handler: None,
            })
            .collect();
        Self { entries }
    }

    /// Register a tool. Rejects a name that is already taken.
    pub fn register(&mut self, registration: ToolRegistration) -> Result<(), WorkspaceError> {
        self.ensure_free(&registration.tool.name)?;
        self.entries.push(registration);
        Ok(())
    }

    /// Fail with `DuplicateToolName` if `name` is already registered.
    pub fn ensure_free(&self, name: &str) -> Result<(), WorkspaceError> {
        match self.get(name) {
            Some(existing) => Err(WorkspaceError::DuplicateToolName {
                tool: name.to_string(),
                owner: existing.source.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Remove every registration owned by `source`. Returns how many were removed.
    pub fn remove_source(&mut self, source: &ToolSource) -> usize {
        let before = self.entries.len();
        self.entries.retain(|r| &r.source != source);
        before - self.entries.len()
    }

    pub fn get(&self, name: &str) -> Option<&ToolRegistration> {
        self.entries.iter().find(|r| r.tool.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.get(name).is_some_and(|r| r.enabled)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToolRegistration> {
        self.entries.iter()
    }

    pub fn enabled(&self) -> impl Iterator<Item = &ToolRegistration> {
        self.entries.iter().filter(|r| r.enabled)
    }

    /// Enabled tools projected to the transport schema.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.enabled().map(|r| r.tool.to_definition()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resynchronize enablement with the active skill.
    ///
    /// With a skill active, component tools are enabled only if the skill
    /// lists them (or lists nothing), and only that skill's own tools are
    /// enabled. With no skill active, every component tool is enabled and
    /// every skill-owned tool disabled. Global tools are never touched.
    pub fn apply_skill(&mut self, active: Option<&Skill>) {
        match active {
            None => {
                for entry in &mut self.entries {
                    match entry.source {
                        ToolSource::Component(_) => entry.enabled = true,
                        ToolSource::Skill(_) => entry.enabled = false,
                        ToolSource::Global => {}
                    }
                }
            }
            Some(skill) => {
                for entry in &mut self.entries {
                    match &entry.source {
                        ToolSource::Component(_) => {
                            entry.enabled = skill.tools.is_none() || skill.exposes(&entry.tool.name);
                        }
                        ToolSource::Skill(owner) => entry.enabled = owner == &skill.name,
                        ToolSource::Global => {}
                    }
                }
                if let Some(listed) = &skill.tools {
                    for name in listed.iter().filter(|name| !self.contains(name)) {
                        tracing::warn!(
                            skill = %skill.name,
                            tool = %name,
                            "Skill lists a tool that is not registered"
                        );
                    }
                }
            }
        }
    }

    /// Whether a newly registered tool from `source` starts enabled under `active`.
    pub fn initial_enablement(source: &ToolSource, name: &str, active: Option<&Skill>) -> bool {
        match (source, active) {
            (ToolSource::Global, _) => true,
            (ToolSource::Component(_), None) => true,
            (ToolSource::Component(_), Some(skill)) => skill.tools.is_none() || skill.exposes(name),
            (ToolSource::Skill(owner), active) => active.is_some_and(|s| &s.name == owner),
        }
    }
}
