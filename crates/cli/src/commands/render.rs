//! `mindloop render`: show a workspace exactly as the model would see it.

use std::path::{Path, PathBuf};

use mindloop_config::AppConfig;
use mindloop_skills::load_dir;
use mindloop_workspace::VirtualWorkspace;
use tracing::warn;

pub async fn run(skills: Option<PathBuf>, activate: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    let dir = skills.or(config.skills.directory);
    let activate = activate.or(config.skills.default_skill);

    let workspace = build_workspace(dir.as_deref(), activate.as_deref()).await?;

    println!("{}", workspace.render().await);
    println!();
    println!("# Enabled Tools");
    println!("{}", serde_json::to_string_pretty(&workspace.tool_definitions().await)?);
    Ok(())
}

/// A workspace with the global tools, every valid skill from `skills_dir`,
/// and `activate` active if given.
pub async fn build_workspace(
    skills_dir: Option<&Path>,
    activate: Option<&str>,
) -> Result<VirtualWorkspace, Box<dyn std::error::Error>> {
    let workspace = VirtualWorkspace::new();

    if let Some(dir) = skills_dir {
        let report = load_dir(dir)?;
        for (path, error) in &report.errors {
            warn!(path = %path.display(), error = %error, "Skipping skill document");
        }
        for skill in report.skills {
            workspace.register_skill(skill).await?;
        }
    }

    if let Some(name) = activate {
        workspace.activate_skill(name).await?;
    }
    Ok(workspace)
}
