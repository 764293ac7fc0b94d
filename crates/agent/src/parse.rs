//! Extract a structured thinking reply from free-form model output.
//!
//! Models are asked for a JSON object but often wrap it in a markdown fence
//! or surround it with prose. Anything that still fails to parse is taken as
//! plain reasoning with no request to continue.

use serde::Deserialize;

/// A request to pull earlier turns into the current round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RecallRequest {
    #[serde(default)]
    pub turns: Vec<u64>,
    #[serde(default)]
    pub query: Option<String>,
}

impl RecallRequest {
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty() && self.query.as_deref().is_none_or(|q| q.trim().is_empty())
    }
}

/// One parsed thinking reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThinkingReply {
    pub reasoning: String,
    pub continue_thinking: bool,
    pub summary: Option<String>,
    pub recall: Option<RecallRequest>,
}

#[derive(Deserialize)]
struct RawReply {
    #[serde(default, alias = "reasoning", alias = "thought")]
    thinking: Option<String>,
    #[serde(default, alias = "continue")]
    continue_thinking: Option<bool>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    recall: Option<RecallRequest>,
}

/// Parse a thinking reply.
pub fn parse_thinking_reply(text: &str) -> ThinkingReply {
    let raw = candidates(text)
        .into_iter()
        .find_map(|candidate| serde_json::from_str::<RawReply>(&candidate).ok());

    match raw {
        Some(raw) => ThinkingReply {
            reasoning: raw
                .thinking
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| text.trim().to_string()),
            continue_thinking: raw.continue_thinking.unwrap_or(false),
            summary: raw.summary.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
            recall: raw.recall.filter(|r| !r.is_empty()),
        },
        None => ThinkingReply {
            reasoning: text.trim().to_string(),
            continue_thinking: false,
            summary: None,
            recall: None,
        },
    }
}

/// JSON candidates in order of preference: fenced block, outermost braces,
/// then the whole text.
fn candidates(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    if let Some(fenced) = extract_json_fence(text) {
        out.push(fenced);
    }
    if let Some(braced) = extract_braces(text) {
        out.push(braced);
    }
    out.push(text.trim().to_string());
    out
}

fn extract_json_fence(raw: &str) -> Option<String> {
    let start = raw.find("```")?;
    let after_start = &raw[start + 3..];
    let newline = after_start.find('\n')?;
    let after_lang = &after_start[newline + 1..];
    let end = after_lang.find("```")?;
    let candidate = after_lang[..end].trim();
    candidate.starts_with('{').then(|| candidate.to_string())
}

fn extract_braces(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| text[start..=end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json() {
        let reply = parse_thinking_reply(
            r#"{"thinking": "Need the abstract first", "continue_thinking": true}"#,
        );
        assert_eq!(reply.reasoning, "Need the abstract first");
        assert!(reply.continue_thinking);
        assert!(reply.summary.is_none());
    }

    #[test]
    fn accepts_aliases_and_fences() {
        let text = "Here you go:\n```json\n{\"reasoning\": \"Done\", \"continue\": false, \"summary\": \"Use T1\"}\n```";
        let reply = parse_thinking_reply(text);
        assert_eq!(reply.reasoning, "Done");
        assert!(!reply.continue_thinking);
        assert_eq!(reply.summary.as_deref(), Some("Use T1"));
    }

    #[test]
    fn json_embedded_in_prose() {
        let reply = parse_thinking_reply(r#"Sure. {"thinking": "x", "continue_thinking": true} Hope that helps."#);
        assert_eq!(reply.reasoning, "x");
        assert!(reply.continue_thinking);
    }

    #[test]
    fn free_text_stops_thinking() {
        let reply = parse_thinking_reply("  I should search for papers.  ");
        assert_eq!(reply.reasoning, "I should search for papers.");
        assert!(!reply.continue_thinking);
        assert!(reply.recall.is_none());
    }

    #[test]
    fn recall_requests_are_parsed() {
        let reply = parse_thinking_reply(
            r#"{"thinking": "what did I find?", "recall": {"turns": [1, 2], "query": "dataset"}}"#,
        );
        let recall = reply.recall.unwrap();
        assert_eq!(recall.turns, vec![1, 2]);
        assert_eq!(recall.query.as_deref(), Some("dataset"));
    }

    #[test]
    fn empty_recall_is_dropped() {
        let reply = parse_thinking_reply(r#"{"thinking": "t", "recall": {"turns": [], "query": " "}}"#);
        assert!(reply.recall.is_none());
    }
}
