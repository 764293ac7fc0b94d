//! Skill documents: YAML front matter followed by a markdown body.
//!
//! ```text
//! ---
//! name: literature-review
//! version: 1.0.0
//! description: Survey related work for a topic
//! tools: [search_papers, read_paper]
//! ---
//! # Literature Review
//!
//! ## Capability
//! You can search and read academic papers.
//!
//! ## Direction
//! Start broad, then narrow to the most cited work.
//!
//! ## Capabilities
//! - Keyword search
//! - Citation tracing
//! ```
//!
//! `name`, `version` and `description` are required, as is the `# Title`
//! heading. A missing direction or capability list is only a warning.

use mindloop_core::Skill;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
struct FrontMatter {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<serde_yaml::Value>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    tools: Option<Vec<String>>,
}

/// Hard failures: the document does not describe a usable skill.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkillDocError {
    #[error("missing YAML front matter (expected leading '---' fence)")]
    MissingFrontMatter,

    #[error("unterminated YAML front matter (missing closing '---' fence)")]
    UnterminatedFrontMatter,

    #[error("invalid YAML front matter: {0}")]
    InvalidYaml(String),

    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("missing '# Title' heading")]
    MissingTitle,

    #[error("duplicate skill name '{0}'")]
    DuplicateName(String),

    #[error("failed to read {path}: {reason}")]
    Io { path: String, reason: String },
}

/// Soft findings: the skill loads, but something is probably missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkillDocWarning {
    NoCapabilities,
    NoDirection,
    NoCapabilityText,
}

impl std::fmt::Display for SkillDocWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoCapabilities => write!(f, "no capabilities listed"),
            Self::NoDirection => write!(f, "no direction section"),
            Self::NoCapabilityText => write!(f, "no capability section"),
        }
    }
}

/// A validated skill plus any warnings raised while parsing it.
#[derive(Debug, Clone)]
pub struct ParsedSkill {
    pub skill: Skill,
    pub warnings: Vec<SkillDocWarning>,
}

#[derive(Default)]
struct Body {
    title: Option<String>,
    capability: Vec<String>,
    direction: Vec<String>,
    capabilities: Vec<String>,
}

enum Section {
    Preamble,
    Capability,
    Direction,
    Capabilities,
    Other,
}

/// Parse one skill document.
pub fn parse_skill_document(input: &str) -> Result<ParsedSkill, SkillDocError> {
    let input = input.replace("\r\n", "\n");
    let (front, body) = split_front_matter(&input)?;

    let front: FrontMatter = if front.trim().is_empty() {
        FrontMatter::default()
    } else {
        serde_yaml::from_str(front).map_err(|e| SkillDocError::InvalidYaml(e.to_string()))?
    };

    let name = non_empty(front.name).ok_or(SkillDocError::MissingField("name"))?;
    let version = front
        .version
        .and_then(scalar_to_string)
        .ok_or(SkillDocError::MissingField("version"))?;
    let description = non_empty(front.description).ok_or(SkillDocError::MissingField("description"))?;

    let body = parse_body(body);
    let title = body.title.ok_or(SkillDocError::MissingTitle)?;

    let capability = join_paragraph(&body.capability);
    let direction = join_paragraph(&body.direction);

    let mut warnings = Vec::new();
    if body.capabilities.is_empty() {
        warnings.push(SkillDocWarning::NoCapabilities);
    }
    if direction.is_empty() {
        warnings.push(SkillDocWarning::NoDirection);
    }
    if capability.is_empty() {
        warnings.push(SkillDocWarning::NoCapabilityText);
    }

    let mut skill = Skill::new(name, description)
        .with_display_name(non_empty(front.display_name).unwrap_or(title))
        .with_version(version)
        .with_prompt(capability, direction)
        .with_capabilities(body.capabilities);
    if let Some(tools) = front.tools {
        skill = skill.with_tools(tools);
    }

    Ok(ParsedSkill { skill, warnings })
}

fn split_front_matter(input: &str) -> Result<(&str, &str), SkillDocError> {
    let rest = input
        .strip_prefix("---\n")
        .ok_or(SkillDocError::MissingFrontMatter)?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches('\n') == "---" {
            let front = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Ok((front, body));
        }
        offset += line.len();
    }
    Err(SkillDocError::UnterminatedFrontMatter)
}

fn parse_body(body: &str) -> Body {
    let mut parsed = Body::default();
    let mut section = Section::Preamble;

    for line in body.lines() {
        let trimmed = line.trim();
        if let Some(heading) = trimmed.strip_prefix("## ") {
            section = match heading.trim().to_lowercase().as_str() {
                "capability" => Section::Capability,
                "direction" => Section::Direction,
                "capabilities" => Section::Capabilities,
                _ => Section::Other,
            };
            continue;
        }
        if let Some(title) = trimmed.strip_prefix("# ") {
            if parsed.title.is_none() && !title.trim().is_empty() {
                parsed.title = Some(title.trim().to_string());
            }
            continue;
        }

        match section {
            Section::Capability => parsed.capability.push(line.to_string()),
            Section::Direction => parsed.direction.push(line.to_string()),
            Section::Capabilities => {
                let item = trimmed
                    .strip_prefix("- ")
                    .or_else(|| trimmed.strip_prefix("* "))
                    .map(str::trim);
                if let Some(item) = item.filter(|i| !i.is_empty()) {
                    parsed.capabilities.push(item.to_string());
                }
            }
            Section::Preamble | Section::Other => {}
        }
    }

    parsed
}

fn join_paragraph(lines: &[String]) -> String {
    lines.join("\n").trim().to_string()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn scalar_to_string(value: serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => non_empty(Some(s)),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
