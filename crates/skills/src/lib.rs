//! # mindloop Skills
//!
//! Turns skill documents on disk into validated [`Skill`](mindloop_core::Skill)
//! values. The workspace only ever sees the result; it never reads files.

pub mod document;
pub mod loader;

pub use document::{ParsedSkill, SkillDocError, SkillDocWarning, parse_skill_document};
pub use loader::{LoadReport, load_dir, load_file};
