//! The shared run aggregate.
//!
//! [`SharedState`] is plain data. Synchronisation is the application
//! layer's concern; every method here is a single, self-contained mutation
//! so it can be applied under one lock acquisition.

use super::stage::{RunStatus, Stage};
use super::trace::TraceEvent;
use crate::agent::entities::{AgentState, AgentStatus};
use crate::agent::value_objects::{AgentId, AgentRole};
use crate::dispute::entities::{Dispute, NegotiationRound};
use crate::message::{AgentMessage, MessageId};
use crate::negotiation::dimension::DimensionValue;
use crate::negotiation::engine::{NegotiationOutcome, SettlementStatus};
use crate::policy::entities::{Artifact, Constraints, Decision, GateResult, Issue, Memo, PolicyCard, Position};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Settled values for the issue's negotiable dimensions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionSettlement {
    pub status: SettlementStatus,
    pub compromise: BTreeMap<String, DimensionValue>,
    pub rounds: u32,
    pub timestamp: DateTime<Utc>,
}

impl From<&NegotiationOutcome> for DimensionSettlement {
    fn from(outcome: &NegotiationOutcome) -> Self {
        Self {
            status: outcome.status,
            compromise: outcome.compromise.clone(),
            rounds: outcome.rounds_run(),
            timestamp: Utc::now(),
        }
    }
}

/// What an actor can see of its peers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerStatus {
    pub role: AgentRole,
    pub status: AgentStatus,
    pub position: Option<Position>,
}

/// Read-only snapshot handed to an actor at the start of its cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub stage: Stage,
    pub issue: Issue,
    pub constraints: Constraints,
    pub policy_card: Option<PolicyCard>,
    pub peers: BTreeMap<AgentId, PeerStatus>,
    /// Unanswered messages addressed to the observing actor
    pub pending_messages: Vec<AgentMessage>,
    /// Disputes that are not yet resolved
    pub open_disputes: Vec<Dispute>,
    pub memos: Vec<Memo>,
    pub gate_results: Vec<GateResult>,
}

/// All mutable data of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedState {
    pub run_id: String,
    pub issue: Issue,
    pub constraints: Constraints,

    pub draft_policy_text: String,
    pub policy_version: String,
    pub policy_card: Option<PolicyCard>,

    pub agents: BTreeMap<AgentId, AgentState>,
    pub message_queue: Vec<AgentMessage>,

    pub memos: Vec<Memo>,
    pub disputes: Vec<Dispute>,
    pub negotiation_history: Vec<NegotiationRound>,
    #[serde(default)]
    pub dimension_settlement: Option<DimensionSettlement>,
    pub gate_results: Vec<GateResult>,
    pub decision: Option<Decision>,

    pub run_status: RunStatus,
    pub current_stage: Stage,
    pub error_message: Option<String>,

    pub trace_log: Vec<TraceEvent>,
    pub artifacts: Vec<Artifact>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SharedState {
    pub fn new(run_id: impl Into<String>, issue: Issue, constraints: Constraints) -> Self {
        let now = Utc::now();
        Self {
            run_id: run_id.into(),
            issue,
            constraints,
            draft_policy_text: String::new(),
            policy_version: "v0.0".to_string(),
            policy_card: None,
            agents: BTreeMap::new(),
            message_queue: Vec::new(),
            memos: Vec::new(),
            disputes: Vec::new(),
            negotiation_history: Vec::new(),
            dimension_settlement: None,
            gate_results: Vec::new(),
            decision: None,
            run_status: RunStatus::Pending,
            current_stage: Stage::Init,
            error_message: None,
            trace_log: Vec::new(),
            artifacts: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Snapshot of what `agent_id` may observe
    pub fn observe(&self, agent_id: &AgentId) -> Observation {
        Observation {
            stage: self.current_stage,
            issue: self.issue.clone(),
            constraints: self.constraints.clone(),
            policy_card: self.policy_card.clone(),
            peers: self
                .agents
                .iter()
                .filter(|(id, _)| *id != agent_id)
                .map(|(id, state)| {
                    (
                        id.clone(),
                        PeerStatus {
                            role: state.role,
                            status: state.status,
                            position: state.position,
                        },
                    )
                })
                .collect(),
            pending_messages: self.pending_messages_for(agent_id),
            open_disputes: self.disputes.iter().filter(|d| !d.is_resolved()).cloned().collect(),
            memos: self.memos.clone(),
            gate_results: self.gate_results.clone(),
        }
    }

    pub fn pending_messages_for(&self, agent_id: &AgentId) -> Vec<AgentMessage> {
        self.message_queue
            .iter()
            .filter(|m| m.is_pending_for(agent_id))
            .cloned()
            .collect()
    }

    /// Every unanswered message, in queue order
    pub fn pending_messages(&self) -> Vec<AgentMessage> {
        self.message_queue
            .iter()
            .filter(|m| !m.responded())
            .cloned()
            .collect()
    }

    pub fn post_message(&mut self, message: AgentMessage) {
        self.message_queue.push(message);
        self.touch();
    }

    /// Flip a queued message to responded. False if unknown or already
    /// responded.
    pub fn mark_message_responded(&mut self, id: &MessageId) -> bool {
        let flipped = self
            .message_queue
            .iter_mut()
            .find(|m| &m.id == id)
            .is_some_and(|m| m.mark_responded());
        if flipped {
            self.touch();
        }
        flipped
    }

    pub fn put_agent(&mut self, state: AgentState) {
        self.agents.insert(state.agent_id.clone(), state);
        self.touch();
    }

    pub fn add_memo(&mut self, memo: Memo) {
        self.memos.push(memo);
        self.touch();
    }

    pub fn dispute(&self, id: &str) -> Option<&Dispute> {
        self.disputes.iter().find(|d| d.id == id)
    }

    pub fn dispute_mut(&mut self, id: &str) -> Option<&mut Dispute> {
        self.disputes.iter_mut().find(|d| d.id == id)
    }

    pub fn open_dispute_ids(&self) -> Vec<String> {
        self.disputes
            .iter()
            .filter(|d| !d.is_resolved())
            .map(|d| d.id.clone())
            .collect()
    }

    pub fn resolved_dispute_count(&self) -> usize {
        self.disputes.iter().filter(|d| d.is_resolved()).count()
    }

    pub fn record_trace(&mut self, event: TraceEvent) {
        self.trace_log.push(event);
        self.touch();
    }

    pub fn enter_stage(&mut self, stage: Stage) {
        self.current_stage = stage;
        self.touch();
    }

    pub fn start(&mut self) {
        self.run_status = RunStatus::Running;
        self.touch();
    }

    pub fn complete(&mut self) {
        self.run_status = RunStatus::Completed;
        self.current_stage = Stage::Completed;
        self.touch();
    }

    /// Mark the run failed, keeping everything gathered so far
    pub fn fail(&mut self, message: impl Into<String>) {
        self.run_status = RunStatus::Failed;
        self.error_message = Some(message.into());
        self.touch();
    }

    pub fn set_policy_card(&mut self, card: PolicyCard, version: impl Into<String>) {
        self.policy_card = Some(card);
        self.policy_version = version.into();
        self.touch();
    }

    pub fn set_decision(&mut self, decision: Decision) {
        self.draft_policy_text = decision.final_policy_text.clone();
        self.policy_version = "v1.0".to_string();
        self.decision = Some(decision);
        self.touch();
    }
}
