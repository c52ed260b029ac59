//! Message entities exchanged between council actors.

use crate::agent::value_objects::AgentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Unique message identifier (UUID v4)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Request,
    Response,
    Notification,
    Query,
    Proposal,
    Agreement,
    Disagreement,
}

impl MessageType {
    pub fn as_str(&self) -> &str {
        match self {
            MessageType::Request => "request",
            MessageType::Response => "response",
            MessageType::Notification => "notification",
            MessageType::Query => "query",
            MessageType::Proposal => "proposal",
            MessageType::Agreement => "agreement",
            MessageType::Disagreement => "disagreement",
        }
    }

    /// Requests and queries expect an answer
    pub fn requires_response(&self) -> bool {
        matches!(self, MessageType::Request | MessageType::Query)
    }

    /// Types the recipient answers when it processes the message
    pub fn warrants_reply(&self) -> bool {
        matches!(
            self,
            MessageType::Request | MessageType::Query | MessageType::Proposal
        )
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for MessageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "request" => Ok(MessageType::Request),
            "response" => Ok(MessageType::Response),
            "notification" => Ok(MessageType::Notification),
            "query" => Ok(MessageType::Query),
            "proposal" => Ok(MessageType::Proposal),
            "agreement" => Ok(MessageType::Agreement),
            "disagreement" => Ok(MessageType::Disagreement),
            other => Err(format!("unknown message type: {}", other)),
        }
    }
}

/// A message on the shared queue.
///
/// `responded` only ever moves from `false` to `true`, through
/// [`AgentMessage::mark_responded`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMessage {
    pub id: MessageId,
    pub from_agent: AgentId,
    pub to_agent: AgentId,
    pub message_type: MessageType,
    pub content: String,
    #[serde(default)]
    pub context: Map<String, Value>,
    pub timestamp: DateTime<Utc>,
    pub requires_response: bool,
    responded: bool,
}

impl AgentMessage {
    pub fn new(
        from_agent: AgentId,
        to_agent: AgentId,
        message_type: MessageType,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: MessageId::generate(),
            from_agent,
            to_agent,
            message_type,
            content: content.into(),
            context: Map::new(),
            timestamp: Utc::now(),
            requires_response: message_type.requires_response(),
            responded: false,
        }
    }

    pub fn with_context(mut self, context: Map<String, Value>) -> Self {
        self.context = context;
        self
    }

    pub fn responded(&self) -> bool {
        self.responded
    }

    /// Flip `responded` to true. Returns false if it already was.
    pub fn mark_responded(&mut self) -> bool {
        if self.responded {
            return false;
        }
        self.responded = true;
        true
    }

    /// Unanswered and addressed to `agent`
    pub fn is_pending_for(&self, agent: &AgentId) -> bool {
        !self.responded && &self.to_agent == agent
    }
}
