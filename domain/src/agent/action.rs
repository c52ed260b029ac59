//! Actions an actor can take in a cycle.
//!
//! The set of action kinds is closed: plan text that names anything else is
//! rejected at decode time, and an [`Action`] without a kind produces a
//! failed [`ActionResult`] instead of an error.

use super::value_objects::StepId;
use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kind of action an actor performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Produce the role's defining record (memo, dispute list or decision)
    GenerateMemo,
    SendMessage,
    RequestInfo,
    ProposeSolution,
    /// Broadcast a proposal to every other party of a dispute
    Negotiate,
    Review,
    Decide,
    UseTool,
}

impl ActionKind {
    pub const ALL: [ActionKind; 8] = [
        ActionKind::GenerateMemo,
        ActionKind::SendMessage,
        ActionKind::RequestInfo,
        ActionKind::ProposeSolution,
        ActionKind::Negotiate,
        ActionKind::Review,
        ActionKind::Decide,
        ActionKind::UseTool,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            ActionKind::GenerateMemo => "generate_memo",
            ActionKind::SendMessage => "send_message",
            ActionKind::RequestInfo => "request_info",
            ActionKind::ProposeSolution => "propose_solution",
            ActionKind::Negotiate => "negotiate",
            ActionKind::Review => "review",
            ActionKind::Decide => "decide",
            ActionKind::UseTool => "use_tool",
        }
    }

    /// Parse an action kind label exactly.
    pub fn parse(label: &str) -> Result<Self, DomainError> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == label)
            .ok_or_else(|| DomainError::UnknownActionKind(label.to_string()))
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A concrete action request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub kind: Option<ActionKind>,
    pub description: String,
    #[serde(default)]
    pub step_id: Option<StepId>,
    /// Kind-specific parameters (`to_agent`, `content`, `dispute_id`,
    /// `proposal`, `tool_name`, `arguments`, ...)
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl Action {
    pub fn new(kind: ActionKind, description: impl Into<String>) -> Self {
        Self {
            kind: Some(kind),
            description: description.into(),
            step_id: None,
            params: Map::new(),
        }
    }

    /// An action whose kind could not be determined
    pub fn untyped(description: impl Into<String>) -> Self {
        Self {
            kind: None,
            description: description.into(),
            step_id: None,
            params: Map::new(),
        }
    }

    pub fn with_step(mut self, step_id: StepId) -> Self {
        self.step_id = Some(step_id);
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Non-empty string parameter
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Outcome of an action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub success: bool,
    /// Structured detail (message ids, memo, verdict, tool output, ...)
    pub detail: Value,
    pub error: Option<String>,
}

impl ActionResult {
    pub fn success(detail: Value) -> Self {
        Self {
            success: true,
            detail,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            detail: Value::Null,
            error: Some(error.into()),
        }
    }

    /// Short text form stored as a step's result
    pub fn summary(&self) -> String {
        match (&self.error, &self.detail) {
            (Some(e), _) => format!("error: {}", e),
            (None, Value::Object(map)) => map
                .get("status")
                .and_then(Value::as_str)
                .unwrap_or("ok")
                .to_string(),
            (None, Value::Null) => "ok".to_string(),
            (None, other) => crate::core::string::truncate(&other.to_string(), 200),
        }
    }
}
