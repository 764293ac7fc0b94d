//! The virtual workspace: components, the tool registry, and skills behind
//! one shared handle.
//!
//! All methods take `&self`; agents share a workspace through `Arc`. Skill
//! transitions are serialized by the skill manager's mutex, and every
//! registry mutation happens inside a workspace method.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures::future::join_all;
use mindloop_core::error::{SkillError, ToolError, WorkspaceError};
use mindloop_core::{Skill, ToolCallResult, ToolDefinition, ToolSource};
use serde_json::json;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::component::{Component, ComponentEntry, ComponentToolHandler};
use crate::global_tools::{self, required_str};
use crate::registry::{ToolRegistration, ToolRegistry};
use crate::skill_manager::{SkillChangeListener, SkillManager};

const DEFAULT_TITLE: &str = "Virtual Workspace";

/// Keeps registry enablement in step with the active skill.
struct RegistrySync {
    registry: Arc<RwLock<ToolRegistry>>,
}

#[async_trait]
impl SkillChangeListener for RegistrySync {
    async fn on_skill_changed(&self, active: Option<&Skill>) {
        self.registry.write().await.apply_skill(active);
    }
}

/// The environment the agent acts in.
pub struct VirtualWorkspace {
    title: String,
    registry: Arc<RwLock<ToolRegistry>>,
    components: RwLock<Vec<ComponentEntry>>,
    skills: Mutex<SkillManager>,
}

impl VirtualWorkspace {
    /// A workspace with only the global tools registered.
    pub fn new() -> Self {
        let registry = Arc::new(RwLock::new(ToolRegistry::with_global_tools()));
        let listener = Arc::new(RegistrySync {
            registry: registry.clone(),
        });

        Self {
            title: DEFAULT_TITLE.into(),
            registry,
            components: RwLock::new(Vec::new()),
            skills: Mutex::new(SkillManager::new().with_listener(listener)),
        }
    }

    /// Set the header rendered at the top of the workspace.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    // --- Components ---

    /// Mount a component and register its tools.
    ///
    /// Fails without changing anything if the key is taken or any of the
    /// component's tool names collides with an existing registration.
    pub async fn register_component(
        &self,
        key: impl Into<String>,
        component: Arc<dyn Component>,
        priority: i32,
    ) -> Result<(), WorkspaceError> {
        let key = key.into();
        let skills = self.skills.lock().await;
        let mut components = self.components.write().await;
        if components.iter().any(|c| c.key == key) {
            return Err(WorkspaceError::DuplicateComponentKey(key));
        }

        let source = ToolSource::Component(key.clone());
        let tools = component.tools();
        let mut registry = self.registry.write().await;
        {
            let mut seen = HashSet::new();
            for tool in &tools {
                registry.ensure_free(&tool.name)?;
                if !seen.insert(tool.name.as_str()) {
                    return Err(WorkspaceError::DuplicateToolName {
                        tool: tool.name.clone(),
                        owner: source.to_string(),
                    });
                }
            }
        }

        let handler = Arc::new(ComponentToolHandler::new(component.clone()));
        let tool_count = tools.len();
        for tool in tools {
            let enabled = ToolRegistry::initial_enablement(&source, &tool.name, skills.active());
            registry.register(ToolRegistration {
                tool,
                source: source.clone(),
                enabled,
                handler: Some(handler.clone()),
            })?;
        }

        let position = components
            .iter()
            .position(|c| c.priority > priority)
            .unwrap_or(components.len());
        components.insert(
            position,
            ComponentEntry {
                key: key.clone(),
                priority,
                component,
            },
        );

        info!(component = %key, priority, tools = tool_count, "Registered component");
        Ok(())
    }

    /// Unmount a component and drop its tool registrations.
    pub async fn unregister_component(&self, key: &str) -> bool {
        let mut components = self.components.write().await;
        let Some(index) = components.iter().position(|c| c.key == key) else {
            return false;
        };
        components.remove(index);
        let removed = self
            .registry
            .write()
            .await
            .remove_source(&ToolSource::Component(key.to_string()));
        info!(component = %key, tools = removed, "Unregistered component");
        true
    }

    /// Component keys in render order.
    pub async fn component_keys(&self) -> Vec<String> {
        self.components.read().await.iter().map(|c| c.key.clone()).collect()
    }

    // --- Skills ---

    /// Add a skill to the catalogue, registering any tools it owns (disabled
    /// until the skill is activated).
    pub async fn register_skill(&self, skill: Skill) -> Result<(), WorkspaceError> {
        let mut skills = self.skills.lock().await;
        if skills.get(&skill.name).is_some() {
            return Err(SkillError::DuplicateSkill(skill.name).into());
        }

        let source = ToolSource::Skill(skill.name.clone());
        let mut registry = self.registry.write().await;
        {
            let mut seen = HashSet::new();
            for owned in &skill.owned_tools {
                registry.ensure_free(&owned.tool.name)?;
                if !seen.insert(owned.tool.name.as_str()) {
                    return Err(WorkspaceError::DuplicateToolName {
                        tool: owned.tool.name.clone(),
                        owner: source.to_string(),
                    });
                }
            }
        }

        for owned in &skill.owned_tools {
            registry.register(ToolRegistration {
                tool: owned.tool.clone(),
                source: source.clone(),
                enabled: false,
                handler: Some(owned.handler.clone()),
            })?;
        }
        drop(registry);

        skills.register(skill)?;
        Ok(())
    }

    /// Activate a skill, swapping the callable tool set.
    pub async fn activate_skill(&self, name: &str) -> Result<(), WorkspaceError> {
        self.skills.lock().await.activate(name).await?;
        Ok(())
    }

    /// Deactivate the current skill. Returns the deactivated skill's name.
    pub async fn deactivate_skill(&self) -> Option<String> {
        self.skills.lock().await.deactivate().await
    }

    pub async fn active_skill(&self) -> Option<Skill> {
        self.skills.lock().await.active().cloned()
    }

    /// Registered skills in registration order.
    pub async fn list_skills(&self) -> Vec<Skill> {
        self.skills.lock().await.skills().to_vec()
    }

    // --- Tools ---

    pub async fn is_tool_available(&self, name: &str) -> bool {
        self.registry.read().await.is_enabled(name)
    }

    /// Enabled tools in the transport's tool-calling schema.
    pub async fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.registry.read().await.definitions()
    }

    /// Enabled tools as a bullet list, one `- name: description` per line.
    pub async fn render_tool_catalogue(&self) -> String {
        let registry = self.registry.read().await;
        let lines: Vec<String> = registry
            .enabled()
            .map(|r| format!("- {}: {}", r.tool.name, r.tool.description))
            .collect();
        if lines.is_empty() {
            "(no tools available)".into()
        } else {
            lines.join("\n")
        }
    }

    /// Dispatch a tool call.
    ///
    /// An unregistered name is an error. Everything else (disabled tool,
    /// handler failure, bad parameters) comes back as a failed
    /// [`ToolCallResult`].
    pub async fn handle_tool_call(
        &self,
        name: &str,
        params: serde_json::Value,
    ) -> Result<ToolCallResult, WorkspaceError> {
        let (enabled, source, handler) = {
            let registry = self.registry.read().await;
            let registration = registry
                .get(name)
                .ok_or_else(|| WorkspaceError::ToolNotFound(name.to_string()))?;
            (
                registration.enabled,
                registration.source.clone(),
                registration.handler.clone(),
            )
        };

        if !enabled {
            debug!(tool = %name, "Rejected call to disabled tool");
            return Ok(ToolCallResult::failure(
                name,
                params,
                ToolError::Disabled(name.to_string()).to_string(),
            ));
        }

        let started = Instant::now();
        let outcome = match (&source, handler) {
            (ToolSource::Global, _) => self.dispatch_global(name, &params).await,
            (_, Some(handler)) => handler
                .call(name, params.clone())
                .await
                .map_err(|e| e.to_string()),
            (_, None) => Err(format!("Tool '{name}' has no handler")),
        };
        let elapsed = started.elapsed().as_millis() as u64;

        let result = match outcome {
            Ok(value) => {
                debug!(tool = %name, source = %source, duration_ms = elapsed, "Tool call succeeded");
                ToolCallResult::ok(name, params, value)
            }
            Err(error) => {
                warn!(tool = %name, source = %source, error = %error, "Tool call failed");
                ToolCallResult::failure(name, params, error)
            }
        };
        Ok(result.with_duration(elapsed))
    }

    async fn dispatch_global(
        &self,
        name: &str,
        params: &serde_json::Value,
    ) -> Result<serde_json::Value, String> {
        match name {
            global_tools::ATTEMPT_COMPLETION => {
                let result = required_str(params, "result").map_err(|e| e.to_string())?;
                Ok(json!(result))
            }
            global_tools::LIST_SKILLS => {
                let skills = self.skills.lock().await;
                Ok(json!(skills_section(&skills)))
            }
            global_tools::ACTIVATE_SKILL => {
                let skill = required_str(params, "name").map_err(|e| e.to_string())?;
                self.activate_skill(skill).await.map_err(|e| e.to_string())?;
                let catalogue = self.render_tool_catalogue().await;
                Ok(json!(format!(
                    "Activated skill '{skill}'. Available tools:\n{catalogue}"
                )))
            }
            global_tools::DEACTIVATE_SKILL => match self.deactivate_skill().await {
                Some(previous) => Ok(json!(format!("Deactivated skill '{previous}'."))),
                None => Ok(json!("No skill was active.")),
            },
            other => Err(format!("Unknown global tool '{other}'")),
        }
    }

    // --- Rendering ---

    /// Render the workspace for the model: header, skills, the active
    /// skill's tools, then each component by ascending priority.
    pub async fn render(&self) -> String {
        let mut out = format!("# {}\n", self.title);

        let active = {
            let skills = self.skills.lock().await;
            out.push_str("\n## Skills\n");
            out.push_str(&skills_section(&skills));
            out.push('\n');
            skills.active().cloned()
        };

        if let Some(skill) = &active {
            out.push_str(&format!("\n## Active Skill: {}\n", skill.display_name));
            let registry = self.registry.read().await;
            let lines: Vec<String> = registry
                .enabled()
                .filter(|r| r.source != ToolSource::Global)
                .map(|r| format!("- {}: {}", r.tool.name, r.tool.description))
                .collect();
            if lines.is_empty() {
                out.push_str("No component tools are enabled for this skill.\n");
            } else {
                out.push_str("Tools enabled by this skill:\n");
                out.push_str(&lines.join("\n"));
                out.push('\n');
            }
        }

        let entries = self.components.read().await.clone();
        let rendered = join_all(entries.iter().map(|e| e.component.render())).await;
        for (entry, text) in entries.iter().zip(rendered) {
            out.push_str(&format!("\n## {}\n{}\n", entry.key, text.trim_end()));
        }

        out
    }
}

impl Default for VirtualWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

fn skills_section(manager: &SkillManager) -> String {
    if manager.skills().is_empty() {
        return "No skills registered.".into();
    }
    let active = manager.active().map(|s| s.name.as_str()).unwrap_or("none");
    let mut lines = vec![format!("Active skill: {active}"), "Available skills:".to_string()];
    for skill in manager.skills() {
        lines.push(format!("- {}", skill.summary()));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use mindloop_core::{SkillHooks, Tool, ToolHandler};

    struct Papers;

    #[async_trait]
    impl Component for Papers {
        fn tools(&self) -> Vec<Tool> {
            vec![
                Tool::without_parameters("T1", "Search papers"),
                Tool::without_parameters("T2", "Download a paper"),
            ]
        }

        async fn render(&self) -> String {
            "3 papers in the reading list".into()
        }

        async fn handle_tool_call(
            &self,
            tool_name: &str,
            params: serde_json::Value,
        ) -> Result<serde_json::Value, ToolError> {
            match tool_name {
                "T1" => Ok(json!({ "hits": 2, "echo": params })),
                _ => Err(ToolError::ExecutionFailed {
                    tool_name: tool_name.into(),
                    reason: "download failed".into(),
                }),
            }
        }
    }

    struct Notes;

    #[async_trait]
    impl Component for Notes {
        fn tools(&self) -> Vec<Tool> {
            vec![Tool::without_parameters("T3", "Write a note")]
        }

        async fn render(&self) -> String {
            "no notes yet".into()
        }

        async fn handle_tool_call(
            &self,
            _tool_name: &str,
            _params: serde_json::Value,
        ) -> Result<serde_json::Value, ToolError> {
            Ok(json!("saved"))
        }
    }

    struct Draft;

    #[async_trait]
    impl ToolHandler for Draft {
        async fn call(&self, _tool_name: &str, _params: serde_json::Value) -> Result<serde_json::Value, ToolError> {
            Ok(json!("drafted"))
        }
    }

    struct Refuse;

    #[async_trait]
    impl SkillHooks for Refuse {
        async fn on_activate(&self, _skill: &Skill) -> Result<(), String> {
            Err("not today".into())
        }
    }

    async fn workspace() -> VirtualWorkspace {
        let ws = VirtualWorkspace::new();
        ws.register_component("papers", Arc::new(Papers), 10).await.unwrap();
        ws.register_component("notes", Arc::new(Notes), 5).await.unwrap();
        ws.register_skill(Skill::new("S", "Search only").with_tools(["T1"])).await.unwrap();
        ws.register_skill(
            Skill::new("writer", "Write drafts")
                .with_tools(["T3"])
                .with_owned_tool(Tool::without_parameters("draft", "Write a draft"), Arc::new(Draft)),
        )
        .await
        .unwrap();
        ws
    }

    #[tokio::test]
    async fn global_tools_always_available() {
        let ws = workspace().await;
        ws.activate_skill("S").await.unwrap();
        for name in ["attempt_completion", "list_skills", "activate_skill", "deactivate_skill"] {
            assert!(ws.is_tool_available(name).await, "{name} should stay enabled");
        }
    }

    #[tokio::test]
    async fn activation_restricts_and_deactivation_restores() {
        let ws = workspace().await;

        ws.activate_skill("S").await.unwrap();
        assert!(ws.is_tool_available("T1").await);
        assert!(!ws.is_tool_available("T2").await);
        assert!(!ws.is_tool_available("T3").await);

        ws.deactivate_skill().await;
        assert!(ws.is_tool_available("T1").await);
        assert!(ws.is_tool_available("T2").await);
        assert!(ws.is_tool_available("T3").await);
    }

    #[tokio::test]
    async fn switching_skills_keeps_one_active() {
        let ws = workspace().await;
        ws.activate_skill("S").await.unwrap();
        ws.activate_skill("writer").await.unwrap();

        assert_eq!(ws.active_skill().await.unwrap().name, "writer");
        assert!(!ws.is_tool_available("T1").await);
        assert!(ws.is_tool_available("T3").await);
        assert!(ws.is_tool_available("draft").await);

        ws.deactivate_skill().await;
        assert!(!ws.is_tool_available("draft").await);
    }

    #[tokio::test]
    async fn disabled_tool_returns_failure_result() {
        let ws = workspace().await;
        ws.activate_skill("S").await.unwrap();

        let result = ws.handle_tool_call("T2", json!({})).await.unwrap();
        assert!(!result.success);
        assert!(result.error.unwrap().contains("disabled"));
    }

    #[tokio::test]
    async fn unknown_tool_is_an_error() {
        let ws = workspace().await;
        let err = ws.handle_tool_call("nope", json!({})).await.unwrap_err();
        assert!(matches!(err, WorkspaceError::ToolNotFound(_)));
    }

    #[tokio::test]
    async fn handler_errors_become_failure_results() {
        let ws = workspace().await;
        let ok = ws.handle_tool_call("T1", json!({"q": "rust"})).await.unwrap();
        assert!(ok.success);
        assert_eq!(ok.result.unwrap()["hits"], 2);

        let failed = ws.handle_tool_call("T2", json!({})).await.unwrap();
        assert!(!failed.success);
        assert!(failed.error.unwrap().contains("download failed"));
    }

    #[tokio::test]
    async fn duplicate_component_key_changes_nothing() {
        let ws = workspace().await;
        let err = ws.register_component("papers", Arc::new(Notes), 1).await.unwrap_err();
        assert!(matches!(err, WorkspaceError::DuplicateComponentKey(_)));
        assert_eq!(ws.component_keys().await, vec!["notes", "papers"]);
    }

    #[tokio::test]
    async fn colliding_tool_names_are_rejected() {
        let ws = workspace().await;
        let err = ws.register_component("papers-2", Arc::new(Papers), 1).await.unwrap_err();
        assert!(matches!(err, WorkspaceError::DuplicateToolName { .. }));
        assert!(!ws.component_keys().await.contains(&"papers-2".to_string()));
    }

    #[tokio::test]
    async fn component_registered_under_active_skill_follows_its_tool_list() {
        let ws = VirtualWorkspace::new();
        ws.register_skill(Skill::new("S", "Search only").with_tools(["T1"])).await.unwrap();
        ws.activate_skill("S").await.unwrap();
        ws.register_component("papers", Arc::new(Papers), 0).await.unwrap();

        assert!(ws.is_tool_available("T1").await);
        assert!(!ws.is_tool_available("T2").await);
    }

    #[tokio::test]
    async fn unregister_removes_tools() {
        let ws = workspace().await;
        assert!(ws.unregister_component("papers").await);
        assert!(!ws.unregister_component("papers").await);
        assert!(matches!(
            ws.handle_tool_call("T1", json!({})).await,
            Err(WorkspaceError::ToolNotFound(_))
        ));
    }

    #[tokio::test]
    async fn render_orders_sections() {
        let ws = workspace().await;
        ws.activate_skill("S").await.unwrap();
        let text = ws.render().await;

        let header = text.find("# Virtual Workspace").unwrap();
        let skills = text.find("## Skills").unwrap();
        let active = text.find("## Active Skill: S").unwrap();
        let notes = text.find("## notes").unwrap();
        let papers = text.find("## papers").unwrap();
        assert!(header < skills && skills < active && active < notes && notes < papers);
        assert!(text.contains("Active skill: S"));
        assert!(text.contains("- T1: Search papers"));
        assert!(text.contains("3 papers in the reading list"));
    }

    #[tokio::test]
    async fn skill_tools_drive_transitions() {
        let ws = workspace().await;

        let activated = ws
            .handle_tool_call("activate_skill", json!({"name": "S"}))
            .await
            .unwrap();
        assert!(activated.success);
        assert_eq!(ws.active_skill().await.unwrap().name, "S");

        let unknown = ws
            .handle_tool_call("activate_skill", json!({"name": "painter"}))
            .await
            .unwrap();
        assert!(!unknown.success);
        assert!(unknown.error.unwrap().contains("Unknown skill"));
        assert_eq!(ws.active_skill().await.unwrap().name, "S");

        let listed = ws.handle_tool_call("list_skills", json!({})).await.unwrap();
        assert!(listed.to_observation().contains("writer: Write drafts"));

        let deactivated = ws.handle_tool_call("deactivate_skill", json!({})).await.unwrap();
        assert!(deactivated.success);
        assert!(ws.active_skill().await.is_none());
    }

    #[tokio::test]
    async fn attempt_completion_requires_result() {
        let ws = workspace().await;
        let done = ws
            .handle_tool_call("attempt_completion", json!({"result": "42"}))
            .await
            .unwrap();
        assert_eq!(done.to_observation(), "42");

        let missing = ws.handle_tool_call("attempt_completion", json!({})).await.unwrap();
        assert!(!missing.success);
        assert!(missing.error.unwrap().starts_with("Invalid tool arguments"));
    }

    #[tokio::test]
    async fn failed_activation_hook_leaves_no_skill_active() {
        let ws = workspace().await;
        ws.register_skill(Skill::new("stubborn", "Refuses").with_tools(["T2"]).with_hooks(Arc::new(Refuse)))
            .await
            .unwrap();
        ws.activate_skill("S").await.unwrap();

        let err = ws.activate_skill("stubborn").await.unwrap_err();
        assert!(matches!(err, WorkspaceError::Skill(SkillError::HookFailed { .. })));
        assert!(ws.active_skill().await.is_none());
        assert!(ws.is_tool_available("T1").await);
        assert!(ws.is_tool_available("T2").await);
    }

    #[tokio::test]
    async fn definitions_follow_enablement() {
        let ws = workspace().await;
        ws.activate_skill("S").await.unwrap();
        let names: Vec<String> = ws.tool_definitions().await.into_iter().map(|d| d.name).collect();
        assert_eq!(
            names,
            vec!["attempt_completion", "list_skills", "activate_skill", "deactivate_skill", "T1"]
        );
    }
}
