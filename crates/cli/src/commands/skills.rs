//! `mindloop skills`: validate a skill directory.

use std::fmt::Write;
use std::path::Path;

use mindloop_skills::{LoadReport, load_dir};

pub fn run(dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let report = load_dir(dir)?;
    print!("{}", format_report(&report));

    if report.has_errors() {
        return Err(format!("{} skill document(s) failed to load", report.errors.len()).into());
    }
    Ok(())
}

/// Human-readable summary of a load: skills, then warnings, then errors.
pub fn format_report(report: &LoadReport) -> String {
    let mut out = String::new();

    if report.skills.is_empty() {
        out.push_str("No skills found.\n");
    } else {
        let _ = writeln!(out, "Skills ({}):", report.skills.len());
        for skill in &report.skills {
            let tools = match &skill.tools {
                Some(tools) if tools.is_empty() => "no component tools".to_string(),
                Some(tools) => tools.join(", "),
                None => "all component tools".to_string(),
            };
            let version = skill.version.as_deref().map(|v| format!(" v{v}")).unwrap_or_default();
            let _ = writeln!(out, "  ✅ {}{version} [{tools}]", skill.summary());
        }
    }

    for (path, warning) in &report.warnings {
        let _ = writeln!(out, "  ⚠️  {}: {warning}", path.display());
    }
    for (path, error) in &report.errors {
        let _ = writeln!(out, "  ❌ {}: {error}", path.display());
    }
    out
}
