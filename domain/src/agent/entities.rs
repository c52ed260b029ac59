//! Agent domain entities - lifecycle status, plans, memory and state.

use super::action::{ActionKind, ActionResult};
use super::value_objects::{AgentId, AgentRole, StepId};
use crate::core::error::DomainError;
use crate::message::AgentMessage;
use crate::policy::entities::Position;
use crate::workflow::stage::Stage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Where an actor is in its observe/think/plan/act cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    #[default]
    Idle,
    Observing,
    Thinking,
    Planning,
    Acting,
    Communicating,
}

impl AgentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            AgentStatus::Idle => "idle",
            AgentStatus::Observing => "observing",
            AgentStatus::Thinking => "thinking",
            AgentStatus::Planning => "planning",
            AgentStatus::Acting => "acting",
            AgentStatus::Communicating => "communicating",
        }
    }
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status of a plan step. Only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl StepStatus {
    pub fn as_str(&self) -> &str {
        match self {
            StepStatus::Pending => "pending",
            StepStatus::InProgress => "in_progress",
            StepStatus::Completed => "completed",
            StepStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, StepStatus::Completed | StepStatus::Failed)
    }

    fn can_become(&self, next: StepStatus) -> bool {
        match (self, next) {
            (StepStatus::Pending, StepStatus::InProgress) => true,
            (StepStatus::Pending | StepStatus::InProgress, StepStatus::Completed | StepStatus::Failed) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single step of an actor's plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    pub step_id: StepId,
    pub description: String,
    pub action_kind: ActionKind,
    #[serde(default)]
    pub dependencies: Vec<StepId>,
    #[serde(default)]
    pub params: Map<String, Value>,
    status: StepStatus,
    pub result: Option<String>,
}

impl PlanStep {
    pub fn new(step_id: impl Into<StepId>, description: impl Into<String>, action_kind: ActionKind) -> Self {
        Self {
            step_id: step_id.into(),
            description: description.into(),
            action_kind,
            dependencies: Vec::new(),
            params: Map::new(),
            status: StepStatus::Pending,
            result: None,
        }
    }

    pub fn with_dependency(mut self, step_id: impl Into<StepId>) -> Self {
        self.dependencies.push(step_id.into());
        self
    }

    pub fn with_params(mut self, params: Map<String, Value>) -> Self {
        self.params = params;
        self
    }

    pub fn status(&self) -> StepStatus {
        self.status
    }

    fn transition(&mut self, next: StepStatus) -> Result<(), DomainError> {
        if !self.status.can_become(next) {
            return Err(DomainError::InvalidTransition {
                entity: "plan step",
                from: self.status.as_str().to_string(),
                to: next.as_str().to_string(),
            });
        }
        self.status = next;
        Ok(())
    }

    pub fn mark_in_progress(&mut self) -> Result<(), DomainError> {
        self.transition(StepStatus::InProgress)
    }

    pub fn mark_completed(&mut self, result: impl Into<String>) -> Result<(), DomainError> {
        self.transition(StepStatus::Completed)?;
        self.result = Some(result.into());
        Ok(())
    }

    pub fn mark_failed(&mut self, result: impl Into<String>) -> Result<(), DomainError> {
        self.transition(StepStatus::Failed)?;
        self.result = Some(result.into());
        Ok(())
    }

    /// Pending with every dependency completed
    pub fn is_ready(&self, completed: &[&StepId]) -> bool {
        self.status == StepStatus::Pending
            && self.dependencies.iter().all(|dep| completed.contains(&dep))
    }
}

/// An actor's local plan, scoped to the stage it was made for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentPlan {
    pub agent_id: AgentId,
    pub goal: String,
    pub stage: Stage,
    pub steps: Vec<PlanStep>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_active: bool,
}

impl AgentPlan {
    pub fn new(agent_id: AgentId, goal: impl Into<String>, stage: Stage) -> Self {
        let now = Utc::now();
        Self {
            agent_id,
            goal: goal.into(),
            stage,
            steps: Vec::new(),
            created_at: now,
            updated_at: now,
            is_active: true,
        }
    }

    pub fn with_step(mut self, step: PlanStep) -> Self {
        self.steps.push(step);
        self
    }

    /// One-step plan performing the stage's default action.
    pub fn default_for(agent_id: AgentId, goal: impl Into<String>, stage: Stage, role: AgentRole) -> Self {
        let kind = stage.default_action_kind();
        Self::new(agent_id, goal, stage).with_step(PlanStep::new(
            "default_step_1",
            format!("Carry out the {} task for {}", stage.display_name(), role.display_name()),
            kind,
        ))
    }

    /// Make sure the first step performs `kind`, prepending one if needed.
    pub fn ensure_lead_action(&mut self, kind: ActionKind, description: impl Into<String>) {
        if self.steps.first().map(|s| s.action_kind) == Some(kind) {
            return;
        }
        let mut id = format!("lead_{}", kind.as_str());
        while self.steps.iter().any(|s| s.step_id.as_str() == id) {
            id.push('_');
        }
        self.steps.insert(0, PlanStep::new(id, description, kind));
        self.updated_at = Utc::now();
    }

    /// Next ready step, following declaration order.
    pub fn next_step(&self) -> Option<&PlanStep> {
        let completed: Vec<&StepId> = self
            .steps
            .iter()
            .filter(|s| s.status == StepStatus::Completed)
            .map(|s| &s.step_id)
            .collect();
        self.steps.iter().find(|s| s.is_ready(&completed))
    }

    pub fn step_mut(&mut self, id: &StepId) -> Option<&mut PlanStep> {
        self.steps.iter_mut().find(|s| &s.step_id == id)
    }

    /// Fail every pending step that can no longer run because a dependency
    /// failed. Returns how many were failed.
    pub fn fail_blocked(&mut self) -> usize {
        let mut failed = 0;
        loop {
            let dead: Vec<StepId> = self
                .steps
                .iter()
                .filter(|s| s.status == StepStatus::Failed)
                .map(|s| s.step_id.clone())
                .collect();
            let mut changed = false;
            for step in self.steps.iter_mut() {
                if step.status == StepStatus::Pending
                    && step.dependencies.iter().any(|d| dead.contains(d))
                    && step.mark_failed("dependency failed").is_ok()
                {
                    failed += 1;
                    changed = true;
                }
            }
            if !changed {
                return failed;
            }
        }
    }

    pub fn is_complete(&self) -> bool {
        self.steps.iter().all(|s| s.status.is_terminal())
    }

    /// Deactivate the plan. Steps that never ran are failed so a retired
    /// plan holds only terminal steps.
    pub fn retire(&mut self) {
        for step in self.steps.iter_mut() {
            if step.status == StepStatus::Pending {
                let _ = step.mark_failed("plan retired before the step could run");
            }
        }
        self.is_active = false;
        self.updated_at = Utc::now();
    }

    /// (terminal steps, total steps)
    pub fn progress(&self) -> (usize, usize) {
        let done = self.steps.iter().filter(|s| s.status.is_terminal()).count();
        (done, self.steps.len())
    }
}

/// One executed action, as remembered by the actor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub timestamp: DateTime<Utc>,
    pub kind: Option<ActionKind>,
    pub description: String,
    pub result: ActionResult,
}

impl ActionRecord {
    pub fn new(kind: Option<ActionKind>, description: impl Into<String>, result: ActionResult) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
            description: description.into(),
            result,
        }
    }
}

/// Append-only per-actor memory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMemory {
    pub agent_id: AgentId,
    pub observations: Vec<String>,
    pub thoughts: Vec<String>,
    pub actions: Vec<ActionRecord>,
    pub received_messages: Vec<AgentMessage>,
    pub sent_messages: Vec<AgentMessage>,
    pub last_updated: DateTime<Utc>,
}

impl AgentMemory {
    pub fn new(agent_id: AgentId) -> Self {
        Self {
            agent_id,
            observations: Vec::new(),
            thoughts: Vec::new(),
            actions: Vec::new(),
            received_messages: Vec::new(),
            sent_messages: Vec::new(),
            last_updated: Utc::now(),
        }
    }

    pub fn observe(&mut self, note: impl Into<String>) {
        self.observations.push(format!("[{}] {}", Utc::now().to_rfc3339(), note.into()));
        self.last_updated = Utc::now();
    }

    pub fn think(&mut self, summary: impl Into<String>) {
        self.thoughts.push(format!("[{}] {}", Utc::now().to_rfc3339(), summary.into()));
        self.last_updated = Utc::now();
    }

    pub fn record_action(&mut self, record: ActionRecord) {
        self.actions.push(record);
        self.last_updated = Utc::now();
    }

    pub fn record_sent(&mut self, message: AgentMessage) {
        self.sent_messages.push(message);
        self.last_updated = Utc::now();
    }

    pub fn record_received(&mut self, message: AgentMessage) {
        self.received_messages.push(message);
        self.last_updated = Utc::now();
    }
}

/// Snapshot of one actor, persisted into the shared state after each cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    pub agent_id: AgentId,
    pub role: AgentRole,
    pub status: AgentStatus,
    pub current_task: Option<String>,
    pub plan: Option<AgentPlan>,
    pub memory: AgentMemory,
    pub position: Option<Position>,
    pub rationale: Option<String>,
    #[serde(default)]
    pub concerns: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    pub last_action: Option<ActionRecord>,
    pub last_updated: DateTime<Utc>,
}

impl AgentState {
    pub fn new(agent_id: AgentId, role: AgentRole) -> Self {
        Self {
            memory: AgentMemory::new(agent_id.clone()),
            agent_id,
            role,
            status: AgentStatus::Idle,
            current_task: None,
            plan: None,
            position: None,
            rationale: None,
            concerns: Vec::new(),
            recommendations: Vec::new(),
            last_action: None,
            last_updated: Utc::now(),
        }
    }

    pub fn set_status(&mut self, status: AgentStatus) {
        self.status = status;
        self.last_updated = Utc::now();
    }

    /// Active plan made for `stage`, if any
    pub fn active_plan_for(&self, stage: Stage) -> Option<&AgentPlan> {
        self.plan.as_ref().filter(|p| p.is_active && p.stage == stage)
    }

    pub fn touch(&mut self) {
        self.last_updated = Utc::now();
    }
}
