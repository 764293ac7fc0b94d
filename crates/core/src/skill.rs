//! Skill types: mutually exclusive bundles of prompt guidance and a tool subset.
//!
//! Skills are registered once and never change; only the workspace's
//! *active* pointer moves between them.

use std::sync::Arc;

use async_trait::async_trait;

use crate::tool::{Tool, ToolHandler};

/// Optional lifecycle callbacks run during skill transitions.
///
/// Both default to success so implementors override only what they need.
#[async_trait]
pub trait SkillHooks: Send + Sync {
    async fn on_activate(&self, _skill: &Skill) -> std::result::Result<(), String> {
        Ok(())
    }

    async fn on_deactivate(&self, _skill: &Skill) -> std::result::Result<(), String> {
        Ok(())
    }
}

/// A tool shipped by the skill itself, enabled only while the skill is active.
#[derive(Clone)]
pub struct SkillTool {
    pub tool: Tool,
    pub handler: Arc<dyn ToolHandler>,
}

/// A named skill.
#[derive(Clone)]
pub struct Skill {
    /// Unique name used for activation (e.g., "literature-review")
    pub name: String,

    /// Human-readable name
    pub display_name: String,

    /// One-line description shown in the skills catalogue
    pub description: String,

    /// Document version, when loaded from a skill document
    pub version: Option<String>,

    /// Component tool names this skill exposes. `None` leaves every
    /// component tool enabled while the skill is active.
    pub tools: Option<Vec<String>>,

    /// Capability enhancement appended to the base capability section
    pub capability: String,

    /// Direction guidance appended to the base direction section
    pub direction: String,

    /// Bullet-list capabilities advertised in the catalogue
    pub capabilities: Vec<String>,

    /// Tools owned by this skill
    pub owned_tools: Vec<SkillTool>,

    /// Lifecycle hooks
    pub hooks: Option<Arc<dyn SkillHooks>>,
}

impl Skill {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            description: description.into(),
            version: None,
            tools: None,
            capability: String::new(),
            direction: String::new(),
            capabilities: Vec::new(),
            owned_tools: Vec::new(),
            hooks: None,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Restrict the callable component tools to exactly these names.
    pub fn with_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tools = Some(tools.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_prompt(mut self, capability: impl Into<String>, direction: impl Into<String>) -> Self {
        self.capability = capability.into();
        self.direction = direction.into();
        self
    }

    pub fn with_capabilities(mut self, capabilities: Vec<String>) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_owned_tool(mut self, tool: Tool, handler: Arc<dyn ToolHandler>) -> Self {
        self.owned_tools.push(SkillTool { tool, handler });
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn SkillHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// Whether the skill names `tool` in its tool list.
    pub fn exposes(&self, tool: &str) -> bool {
        self.tools
            .as_ref()
            .is_some_and(|tools| tools.iter().any(|t| t == tool))
    }

    /// One catalogue line: `name (Display Name): description`.
    pub fn summary(&self) -> String {
        if self.display_name == self.name {
            format!("{}: {}", self.name, self.description)
        } else {
            format!("{} ({}): {}", self.name, self.display_name, self.description)
        }
    }
}

impl std::fmt::Debug for Skill {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Skill")
            .field("name", &self.name)
            .field("display_name", &self.display_name)
            .field("version", &self.version)
            .field("tools", &self.tools)
            .field(
                "owned_tools",
                &self.owned_tools.iter().map(|t| t.tool.name.as_str()).collect::<Vec<_>>(),
            )
            .field("has_hooks", &self.hooks.is_some())
            .finish()
    }
}
