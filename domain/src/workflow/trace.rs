//! Trace events - the append-only audit stream of a run.

use super::stage::Stage;
use crate::agent::value_objects::AgentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of trace event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceEventType {
    StageChange,
    PolicyCardCreated,
    MemoReady,
    DisputeUpdate,
    NegotiationRound,
    DimensionSettlement,
    GateResult,
    Decision,
    ArtifactCreated,
    Error,
    Completed,
}

impl TraceEventType {
    pub fn as_str(&self) -> &str {
        match self {
            TraceEventType::StageChange => "stage_change",
            TraceEventType::PolicyCardCreated => "policy_card_created",
            TraceEventType::MemoReady => "memo_ready",
            TraceEventType::DisputeUpdate => "dispute_update",
            TraceEventType::NegotiationRound => "negotiation_round",
            TraceEventType::DimensionSettlement => "dimension_settlement",
            TraceEventType::GateResult => "gate_result",
            TraceEventType::Decision => "decision",
            TraceEventType::ArtifactCreated => "artifact_created",
            TraceEventType::Error => "error",
            TraceEventType::Completed => "completed",
        }
    }
}

impl std::fmt::Display for TraceEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One audit log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEvent {
    pub timestamp: DateTime<Utc>,
    pub stage: Stage,
    pub event_type: TraceEventType,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<AgentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl TraceEvent {
    pub fn new(stage: Stage, event_type: TraceEventType, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            stage,
            event_type,
            message: message.into(),
            agent_id: None,
            data: None,
        }
    }

    pub fn with_agent(mut self, agent_id: AgentId) -> Self {
        self.agent_id = Some(agent_id);
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}
