//! Strict decoding of structured records from model output.
//!
//! A response is accepted only if a fenced ` ```json ` / ` ```plan ` / bare
//! ` ``` ` block, or the entire trimmed response, deserializes into the
//! target type. There is no substring search: anything else is a
//! [`DomainError::MalformedOutput`] and the caller takes its fallback path.

use crate::core::error::DomainError;
use crate::policy::entities::{Decision, GateResult, Memo, Position};
use serde::Deserialize;
use serde::de::DeserializeOwned;

const FENCE_TAGS: [&str; 3] = ["json", "plan", ""];

/// Candidate JSON bodies, fenced blocks first, then the whole response.
fn candidates(response: &str) -> Vec<String> {
    let mut found = Vec::new();
    let mut current: Option<String> = None;

    for line in response.lines() {
        let trimmed = line.trim();
        match current.as_mut() {
            None => {
                if let Some(tag) = trimmed.strip_prefix("```")
                    && FENCE_TAGS.contains(&tag.trim())
                {
                    current = Some(String::new());
                }
            }
            Some(body) => {
                if trimmed == "```" {
                    found.push(std::mem::take(body));
                    current = None;
                } else {
                    body.push_str(line);
                    body.push('\n');
                }
            }
        }
    }

    found.push(response.trim().to_string());
    found
}

/// Decode `T` from a model response.
pub fn decode_structured<T: DeserializeOwned>(response: &str) -> Result<T, DomainError> {
    let mut last_error = None;
    for body in candidates(response) {
        match serde_json::from_str::<T>(&body) {
            Ok(value) => return Ok(value),
            Err(e) => last_error = Some(e.to_string()),
        }
    }
    Err(DomainError::MalformedOutput(
        last_error.unwrap_or_else(|| "empty response".to_string()),
    ))
}

/// A department memo as produced by the reasoning service
#[derive(Debug, Clone, Deserialize)]
pub struct MemoDraft {
    pub position: Position,
    pub rationale: String,
    #[serde(default)]
    pub concerns: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub conditions: Vec<String>,
    #[serde(default)]
    pub bottom_line: Option<String>,
}

impl MemoDraft {
    pub fn into_memo(self, department: impl Into<String>) -> Memo {
        let mut recommendations = self.recommendations;
        recommendations.extend(self.conditions.into_iter().map(|c| format!("Condition: {}", c)));
        let mut concerns = self.concerns;
        if let Some(line) = self.bottom_line.filter(|l| !l.trim().is_empty()) {
            concerns.push(format!("Red line: {}", line));
        }
        Memo::new(department, self.position, self.rationale)
            .with_concerns(concerns)
            .with_recommendations(recommendations)
    }
}

/// A final decision as produced by the reasoning service
#[derive(Debug, Clone, Deserialize)]
pub struct DecisionDraft {
    pub approved: bool,
    pub final_policy_text: String,
    pub rationale: String,
    #[serde(default)]
    pub conditions: Vec<String>,
    #[serde(default)]
    pub next_steps: Vec<String>,
}

impl From<DecisionDraft> for Decision {
    fn from(draft: DecisionDraft) -> Self {
        Decision::new(draft.approved, draft.final_policy_text, draft.rationale)
            .with_conditions(draft.conditions)
            .with_next_steps(draft.next_steps)
    }
}

/// A reviewer's gate verdict
#[derive(Debug, Clone, Deserialize)]
pub struct GateVerdict {
    pub passed: bool,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

impl GateVerdict {
    pub fn into_result(self, gate_name: impl Into<String>) -> GateResult {
        let mut result = GateResult::new(gate_name, self.passed);
        result.issues = self.issues;
        result.recommendations = self.recommendations;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::entities::PolicyCard;

    #[test]
    fn test_decode_whole_response() {
        let verdict: GateVerdict = decode_structured(r#"  {"passed": false, "issues": ["no legal basis"]}  "#).unwrap();
        assert!(!verdict.passed);
        assert_eq!(verdict.issues.len(), 1);
    }

    #[test]
    fn test_decode_fenced_block() {
        let response = "Here is my memo:\n```json\n{\"position\": \"oppose\", \"rationale\": \"too costly\"}\n```\nThanks.";
        let draft: MemoDraft = decode_structured(response).unwrap();
        assert_eq!(draft.position, Position::Oppose);
    }

    #[test]
    fn test_embedded_json_without_fence_is_rejected() {
        let response = "Sure! {\"passed\": true} hope that helps";
        let result: Result<GateVerdict, _> = decode_structured(response);
        assert!(matches!(result, Err(DomainError::MalformedOutput(_))));
    }

    #[test]
    fn test_schema_mismatch_is_rejected() {
        let result: Result<MemoDraft, _> =
            decode_structured(r#"{"position": "lukewarm", "rationale": "hm"}"#);
        assert!(result.is_err());
        let result: Result<DecisionDraft, _> = decode_structured(r#"{"approved": "yes"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_policy_card_decodes() {
        let card: PolicyCard = decode_structured(
            "```json\n{\"title\": \"Bus lanes\", \"summary\": \"Add 40km\", \"estimated_budget\": 3e8}\n```",
        )
        .unwrap();
        assert_eq!(card.title, "Bus lanes");
    }

    #[test]
    fn test_memo_draft_folds_conditions_and_red_line() {
        let draft: MemoDraft = decode_structured(
            r#"{"position": "conditional", "rationale": "r", "conditions": ["cap spend"], "bottom_line": "no new debt"}"#,
        )
        .unwrap();
        let memo = draft.into_memo("agent_finance");
        assert_eq!(memo.recommendations, vec!["Condition: cap spend".to_string()]);
        assert_eq!(memo.concerns, vec!["Red line: no new debt".to_string()]);
    }
}
