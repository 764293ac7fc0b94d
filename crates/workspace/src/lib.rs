//! # mindloop Workspace
//!
//! The environment an agent acts in: mounted components, the tool handler
//! table, and the skill state machine that decides which tools are callable.

pub mod component;
pub mod global_tools;
pub mod registry;
pub mod skill_manager;
pub mod workspace;

pub use component::{Component, ComponentToolHandler};
pub use registry::{ToolRegistration, ToolRegistry};
pub use skill_manager::{SkillChangeListener, SkillManager};
pub use workspace::VirtualWorkspace;
