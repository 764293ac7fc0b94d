//! Skill manager: the NoActiveSkill / SkillActive state machine.
//!
//! Transitions always pass through NoActiveSkill: the previous skill's
//! deactivation completes (and listeners observe `None`) before the next
//! skill's activation hook runs.

use std::sync::Arc;

use async_trait::async_trait;
use mindloop_core::Skill;
use mindloop_core::error::SkillError;
use tracing::{debug, info, warn};

/// Notified after every change of the active skill pointer.
#[async_trait]
pub trait SkillChangeListener: Send + Sync {
    async fn on_skill_changed(&self, active: Option<&Skill>);
}

/// Catalogue of registered skills plus the active pointer.
#[derive(Default)]
pub struct SkillManager {
    skills: Vec<Skill>,
    active: Option<usize>,
    listener: Option<Arc<dyn SkillChangeListener>>,
}

impl SkillManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listener(mut self, listener: Arc<dyn SkillChangeListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Add a skill to the catalogue.
    pub fn register(&mut self, skill: Skill) -> Result<(), SkillError> {
        if self.get(&skill.name).is_some() {
            return Err(SkillError::DuplicateSkill(skill.name));
        }
        debug!(skill = %skill.name, "Registered skill");
        self.skills.push(skill);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Skill> {
        self.skills.iter().find(|s| s.name == name)
    }

    /// Registered skills in registration order.
    pub fn skills(&self) -> &[Skill] {
        &self.skills
    }

    pub fn active(&self) -> Option<&Skill> {
        self.active.and_then(|i| self.skills.get(i))
    }

    /// Make `name` the active skill.
    ///
    /// An unknown name leaves the state untouched. If the target's
    /// activation hook fails the manager stays in NoActiveSkill.
    pub async fn activate(&mut self, name: &str) -> Result<(), SkillError> {
        let index = self
            .skills
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| SkillError::UnknownSkill(name.to_string()))?;

        self.deactivate().await;

        let skill = &self.skills[index];
        if let Some(hooks) = &skill.hooks {
            if let Err(reason) = hooks.on_activate(skill).await {
                warn!(skill = %name, reason = %reason, "Skill activation hook failed");
                return Err(SkillError::HookFailed {
                    skill: name.to_string(),
                    reason,
                });
            }
        }

        self.active = Some(index);
        info!(skill = %name, "Skill activated");
        self.notify().await;
        Ok(())
    }

    /// Clear the active skill. Returns the name of the skill that was
    /// deactivated, or `None` if nothing was active.
    ///
    /// A failing deactivation hook is logged; the pointer is cleared regardless.
    pub async fn deactivate(&mut self) -> Option<String> {
        let index = self.active?;
        let skill = &self.skills[index];
        if let Some(hooks) = &skill.hooks {
            if let Err(reason) = hooks.on_deactivate(skill).await {
                warn!(skill = %skill.name, reason = %reason, "Skill deactivation hook failed");
            }
        }
        let name = skill.name.clone();
        self.active = None;
        info!(skill = %name, "Skill deactivated");
        self.notify().await;
        Some(name)
    }

    async fn notify(&self) {
        if let Some(listener) = &self.listener {
            listener.on_skill_changed(self.active()).await;
        }
    }
}
