//! Components: capability providers that own tools and render state.

use std::sync::Arc;

use async_trait::async_trait;
use mindloop_core::error::ToolError;
use mindloop_core::{Tool, ToolHandler};

/// A capability provider mounted into a workspace.
///
/// `render` only sees `&self`, so a component cannot touch tool
/// registrations while the workspace is being rendered.
#[async_trait]
pub trait Component: Send + Sync {
    /// Tools this component owns. Read once at registration.
    fn tools(&self) -> Vec<Tool>;

    /// Text describing the component's current state for the model.
    async fn render(&self) -> String;

    /// Execute one of this component's tools.
    async fn handle_tool_call(
        &self,
        tool_name: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, ToolError>;
}

/// Forwards a registry entry to the component that owns it.
pub struct ComponentToolHandler {
    component: Arc<dyn Component>,
}

impl ComponentToolHandler {
    pub fn new(component: Arc<dyn Component>) -> Self {
        Self { component }
    }
}

#[async_trait]
impl ToolHandler for ComponentToolHandler {
    async fn call(
        &self,
        tool_name: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, ToolError> {
        self.component.handle_tool_call(tool_name, params).await
    }
}

/// A mounted component with its registration key and render priority.
#[derive(Clone)]
pub(crate) struct ComponentEntry {
    pub key: String,
    pub priority: i32,
    pub component: Arc<dyn Component>,
}
