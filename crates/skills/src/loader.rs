//! Load every skill document in a directory.
//!
//! A directory entry is a skill document if it is a `*.md` file, or a
//! subdirectory containing `SKILL.md`. Entries are processed in file-name
//! order so the resulting catalogue is deterministic.

use std::path::{Path, PathBuf};

use mindloop_core::Skill;
use tracing::{debug, warn};

use crate::document::{SkillDocError, SkillDocWarning, parse_skill_document};

/// Outcome of loading a directory. Bad documents never abort the load.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub skills: Vec<Skill>,
    pub errors: Vec<(PathBuf, SkillDocError)>,
    pub warnings: Vec<(PathBuf, SkillDocWarning)>,
}

impl LoadReport {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Load one skill document from disk.
pub fn load_file(path: &Path) -> Result<crate::ParsedSkill, SkillDocError> {
    let content = std::fs::read_to_string(path).map_err(|e| SkillDocError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    parse_skill_document(&content)
}

/// Load all skill documents under `dir`.
///
/// Only a failure to list the directory itself is an error; per-document
/// problems are collected in the report.
pub fn load_dir(dir: &Path) -> Result<LoadReport, SkillDocError> {
    let entries = std::fs::read_dir(dir).map_err(|e| SkillDocError::Io {
        path: dir.display().to_string(),
        reason: e.to_string(),
    })?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter_map(|path| {
            if path.is_dir() {
                let nested = path.join("SKILL.md");
                nested.is_file().then_some(nested)
            } else if path.extension().is_some_and(|ext| ext == "md") {
                Some(path)
            } else {
                None
            }
        })
        .collect();
    paths.sort();

    let mut report = LoadReport::default();
    for path in paths {
        match load_file(&path) {
            Ok(parsed) => {
                if report.skills.iter().any(|s| s.name == parsed.skill.name) {
                    warn!(path = %path.display(), skill = %parsed.skill.name, "Duplicate skill name");
                    report
                        .errors
                        .push((path, SkillDocError::DuplicateName(parsed.skill.name)));
                    continue;
                }
                for warning in parsed.warnings {
                    debug!(path = %path.display(), %warning, "Skill document warning");
                    report.warnings.push((path.clone(), warning));
                }
                debug!(path = %path.display(), skill = %parsed.skill.name, "Loaded skill");
                report.skills.push(parsed.skill);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping invalid skill document");
                report.errors.push((path, e));
            }
        }
    }

    Ok(report)
}
