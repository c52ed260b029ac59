//! Actor lifecycle
//!
//! An [`Actor`] runs the observe / think / plan / act cycle for one council
//! role against the run's [`SharedStore`]. Transitions are driven from
//! outside by the [`ActorManager`](crate::use_cases::actor_manager::ActorManager);
//! an actor never schedules itself.
//!
//! One cycle:
//!
//! 1. observe the shared state
//! 2. answer this actor's own unanswered inbound messages
//! 3. reflect (free text, never blocks progress)
//! 4. plan, unless an active plan for the current stage exists
//! 5. execute exactly one ready step
//! 6. write the updated [`AgentState`] back into the shared state
//!
//! When no step is ready the plan is retired and the cycle reports
//! [`CycleOutcome::PlanCompleted`] without acting.

mod actions;
pub mod behavior;
pub mod review;

pub use behavior::{CoordinatorRole, DeciderRole, DepartmentRole, RoleBehavior, behavior_for};
pub use review::apply_gate_checks;

use crate::ports::llm_gateway::{GatewayError, LlmGateway, ModelProfile};
use crate::ports::tool_executor::ToolExecutorPort;
use crate::use_cases::shared_store::SharedStore;
use council_domain::core::string::clip_chars;
use council_domain::dispute::entities::RESOLUTION_MAX_CHARS;
use council_domain::{
    Action, ActionKind, ActionResult, AgentId, AgentMessage, AgentPlan, AgentRole, AgentState,
    AgentStatus, CouncilPromptTemplate, Decision, DomainError, MessageType, Observation,
    RoleProfile, StepId, parse_plan, truncate,
};
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Longest reflection kept in memory
const THOUGHT_MAX_LEN: usize = 500;

/// Errors raised by an actor operation
#[derive(Error, Debug)]
pub enum ActorError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),
}

/// What one cycle did
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// One plan step was executed
    Acted {
        step_id: StepId,
        kind: ActionKind,
        result: ActionResult,
    },
    /// No step was left; the plan has been retired
    PlanCompleted,
}

impl CycleOutcome {
    pub fn is_success(&self) -> bool {
        match self {
            CycleOutcome::Acted { result, .. } => result.success,
            CycleOutcome::PlanCompleted => true,
        }
    }

    pub fn summary(&self) -> String {
        match self {
            CycleOutcome::Acted {
                step_id,
                kind,
                result,
            } => format!("{} ({}): {}", step_id, kind, result.summary()),
            CycleOutcome::PlanCompleted => "plan_completed".to_string(),
        }
    }
}

/// Everything an actor owns except its role behavior.
///
/// Role behaviors receive `&mut ActorCore` so they can reason, post
/// messages and update the actor's declared position.
pub struct ActorCore {
    profile: RoleProfile,
    state: AgentState,
    system_prompt: String,
    model: ModelProfile,
    gateway: Arc<dyn LlmGateway>,
    tools: Arc<dyn ToolExecutorPort>,
    store: SharedStore,
    max_tool_iterations: usize,
}

impl ActorCore {
    pub fn agent_id(&self) -> &AgentId {
        &self.state.agent_id
    }

    pub fn profile(&self) -> &RoleProfile {
        &self.profile
    }

    pub fn state(&self) -> &AgentState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut AgentState {
        &mut self.state
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn tools(&self) -> &Arc<dyn ToolExecutorPort> {
        &self.tools
    }

    /// Fresh observation for this actor
    pub async fn observation(&self) -> Observation {
        let id = self.state.agent_id.clone();
        self.store.read(|s| s.observe(&id)).await
    }

    /// One request to the reasoning service under this actor's system prompt
    pub async fn ask(&self, prompt: &str) -> Result<String, GatewayError> {
        let session = self
            .gateway
            .create_session_with_system_prompt(&self.model, &self.system_prompt)
            .await?;
        debug!("{} -> {}: {}", self.state.agent_id, self.model, truncate(prompt, 120));
        session.send(prompt).await
    }

    /// Like [`ask`](Self::ask), letting the model call the analysis tools
    pub async fn ask_with_tools(&self, prompt: &str) -> Result<String, GatewayError> {
        let session = self
            .gateway
            .create_session_with_system_prompt(&self.model, &self.system_prompt)
            .await?;
        session.send_with_tools(prompt, self.max_tool_iterations).await
    }

    /// Post a message to the shared queue and remember it as sent
    pub async fn communicate(
        &mut self,
        to: AgentId,
        message_type: MessageType,
        content: impl Into<String>,
        context: Map<String, Value>,
    ) -> Result<AgentMessage, ActorError> {
        if to.is_empty() {
            return Err(ActorError::InvalidArgument(
                "message recipient must not be empty".to_string(),
            ));
        }
        self.state.set_status(AgentStatus::Communicating);

        let message = AgentMessage::new(self.state.agent_id.clone(), to, message_type, content)
            .with_context(context);
        let queued = message.clone();
        self.store.update(move |s| s.post_message(queued)).await;
        self.state.memory.record_sent(message.clone());

        debug!(
            "{} sent {} to {}",
            message.from_agent, message.message_type, message.to_agent
        );
        Ok(message)
    }
}

/// One council participant
pub struct Actor {
    core: ActorCore,
    behavior: Box<dyn RoleBehavior>,
}

impl Actor {
    /// Create an actor; the role behavior follows from `profile.role`
    pub fn new(
        profile: RoleProfile,
        model: ModelProfile,
        gateway: Arc<dyn LlmGateway>,
        tools: Arc<dyn ToolExecutorPort>,
        store: SharedStore,
    ) -> Self {
        let behavior = behavior_for(profile.role);
        let agent_id = AgentId::for_role(profile.role);
        let system_prompt = behavior.system_prompt(&profile);
        Self {
            core: ActorCore {
                state: AgentState::new(agent_id, profile.role),
                profile,
                system_prompt,
                model,
                gateway,
                tools,
                store,
                max_tool_iterations: 5,
            },
            behavior,
        }
    }

    pub fn with_max_tool_iterations(mut self, max: usize) -> Self {
        self.core.max_tool_iterations = max;
        self
    }

    pub fn id(&self) -> &AgentId {
        self.core.agent_id()
    }

    pub fn role(&self) -> AgentRole {
        self.core.profile.role
    }

    pub fn profile(&self) -> &RoleProfile {
        &self.core.profile
    }

    pub fn state(&self) -> &AgentState {
        &self.core.state
    }

    pub fn model(&self) -> &ModelProfile {
        &self.core.model
    }

    // ==================== Lifecycle ====================

    /// Snapshot of the shared state as this actor sees it.
    pub async fn observe(&mut self) -> Observation {
        self.core.state.set_status(AgentStatus::Observing);
        let obs = self.core.observation().await;
        self.core.state.memory.observe(format!(
            "stage={} pending_messages={} open_disputes={} memos={}",
            obs.stage,
            obs.pending_messages.len(),
            obs.open_disputes.len(),
            obs.memos.len()
        ));
        obs
    }

    /// Reflect on the observation. Failures leave a note and never stop
    /// the cycle.
    pub async fn think(&mut self, obs: &Observation) -> String {
        self.core.state.set_status(AgentStatus::Thinking);
        let prompt = self.behavior.thinking_prompt(&self.core.profile, obs);
        let thought = match self.core.ask_with_tools(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!("{} could not reflect: {}", self.id(), e);
                format!("(no reflection: {})", e)
            }
        };
        self.core.state.memory.think(truncate(&thought, THOUGHT_MAX_LEN));
        thought
    }

    /// Make a plan for the current stage.
    ///
    /// Undecodable or invalid plans are replaced by the stage's one-step
    /// default plan. Either way the stage's required action leads.
    pub async fn plan(&mut self, goal: &str, obs: &Observation) -> AgentPlan {
        self.core.state.set_status(AgentStatus::Planning);
        self.core.state.current_task = Some(goal.to_string());

        let prompt = CouncilPromptTemplate::planning(&self.core.profile, goal, obs);
        let decoded = match self.core.ask(&prompt).await {
            Ok(reply) => parse_plan(&reply, self.id(), goal, obs.stage).map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        let mut plan = match decoded {
            Ok(plan) => plan,
            Err(reason) => {
                warn!("{} plan unusable ({}), using default plan", self.id(), reason);
                AgentPlan::default_for(self.id().clone(), goal, obs.stage, self.role())
            }
        };
        if let Some(kind) = obs.stage.required_lead_action() {
            plan.ensure_lead_action(kind, format!("{}: {}", obs.stage.display_name(), kind));
        }

        if let Some(stale) = self.core.state.plan.as_mut()
            && stale.is_active
        {
            debug!("{} retires its {} plan", stale.agent_id, stale.stage);
            stale.retire();
        }
        info!("{} planned {} step(s) for {}", self.id(), plan.steps.len(), obs.stage);
        self.core.state.plan = Some(plan.clone());
        plan
    }

    /// Ask for a revision of the active plan. Returns whether the plan
    /// changed; undecodable output keeps the current plan.
    pub async fn update_plan(&mut self, reason: &str) -> bool {
        let Some(current) = self.core.state.plan.clone().filter(|p| p.is_active) else {
            let obs = self.observe().await;
            let goal = obs.stage.planning_hint().to_string();
            self.plan(&goal, &obs).await;
            return true;
        };

        let policy_title = self
            .core
            .store
            .read(|s| s.policy_card.as_ref().map(|c| c.title.clone()))
            .await
            .unwrap_or_default();
        let prompt =
            CouncilPromptTemplate::plan_revision(&current, reason, current.stage, &policy_title);
        let revised = match self.core.ask(&prompt).await {
            Ok(reply) => parse_plan(&reply, self.id(), &current.goal, current.stage)
                .map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        match revised {
            Ok(plan) => {
                info!("{} revised its plan: {}", self.id(), reason);
                self.core.state.plan = Some(plan);
                true
            }
            Err(e) => {
                warn!("{} keeps its plan, revision unusable: {}", self.id(), e);
                false
            }
        }
    }

    /// Send a message
    pub async fn communicate(
        &mut self,
        to: AgentId,
        message_type: MessageType,
        content: impl Into<String>,
        context: Map<String, Value>,
    ) -> Result<AgentMessage, ActorError> {
        self.core.communicate(to, message_type, content, context).await
    }

    /// Take delivery of an inbound message.
    ///
    /// Marks it responded in the shared queue (the only place that
    /// happens) and answers requests, queries and proposals. A message that
    /// was already responded is ignored.
    pub async fn process_message(
        &mut self,
        mut message: AgentMessage,
    ) -> Result<Option<AgentMessage>, ActorError> {
        let id = message.id.clone();
        let flipped = self.core.store.update(|s| s.mark_message_responded(&id)).await;
        if !flipped {
            debug!("{} skips message {}: already handled", self.id(), message.id);
            return Ok(None);
        }
        message.mark_responded();
        self.core.state.memory.record_received(message.clone());

        if !message.message_type.warrants_reply() || message.from_agent.is_empty() {
            return Ok(None);
        }

        let content = match message.message_type {
            MessageType::Proposal => {
                self.behavior
                    .evaluate_proposal(&mut self.core, &message)
                    .await
            }
            MessageType::Query => format!(
                "On '{}': {} needs further analysis before answering",
                truncate(&message.content, 80),
                self.core.profile.name
            ),
            _ => format!(
                "Received the request from {}: {}",
                message.from_agent,
                truncate(&message.content, 120)
            ),
        };

        let mut context = Map::new();
        context.insert("in_reply_to".to_string(), Value::from(message.id.as_str()));
        if let Some(dispute_id) = message.context.get("dispute_id") {
            context.insert("dispute_id".to_string(), dispute_id.clone());
        }
        let reply = self
            .core
            .communicate(message.from_agent.clone(), MessageType::Response, content, context)
            .await?;
        Ok(Some(reply))
    }

    /// Run one full cycle.
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome, ActorError> {
        let obs = self.observe().await;

        for message in obs.pending_messages.iter().cloned() {
            self.process_message(message).await?;
        }

        self.think(&obs).await;

        if self.core.state.active_plan_for(obs.stage).is_none() {
            let goal = obs.stage.planning_hint().to_string();
            self.plan(&goal, &obs).await;
        }

        let outcome = self.execute_next_step().await;
        self.persist().await;
        let outcome = outcome?;
        info!("{} cycle: {}", self.id(), outcome.summary());
        Ok(outcome)
    }

    async fn execute_next_step(&mut self) -> Result<CycleOutcome, ActorError> {
        let Some(plan) = self.core.state.plan.as_mut() else {
            return Ok(CycleOutcome::PlanCompleted);
        };
        let Some(step) = plan.next_step().cloned() else {
            plan.retire();
            return Ok(CycleOutcome::PlanCompleted);
        };
        if let Some(s) = plan.step_mut(&step.step_id) {
            s.mark_in_progress()?;
        }

        let mut action =
            Action::new(step.action_kind, step.description.clone()).with_step(step.step_id.clone());
        action.params = step.params.clone();
        let result = self.act(action).await;

        if let Some(plan) = self.core.state.plan.as_mut() {
            if let Some(s) = plan.step_mut(&step.step_id) {
                if result.success {
                    s.mark_completed(result.summary())?;
                } else {
                    s.mark_failed(result.summary())?;
                }
            }
            let blocked = plan.fail_blocked();
            if blocked > 0 {
                debug!("{} step(s) blocked by failed dependencies", blocked);
            }
        }

        Ok(CycleOutcome::Acted {
            step_id: step.step_id,
            kind: step.action_kind,
            result,
        })
    }

    /// Write this actor's state back into the shared state
    pub async fn persist(&mut self) {
        self.core.state.set_status(AgentStatus::Idle);
        self.core.state.touch();
        let snapshot = self.core.state.clone();
        self.core.store.update(move |s| s.put_agent(snapshot)).await;
    }

    // ==================== Role capabilities ====================

    /// Produce a mediation for a dispute and send it to the parties as a
    /// proposal. Returns the mediation text, clipped for use as the
    /// dispute's resolution.
    pub async fn organize_negotiation(&mut self, dispute_id: &str) -> Result<String, ActorError> {
        let dispute = self
            .core
            .store
            .read(|s| s.dispute(dispute_id).cloned())
            .await
            .ok_or_else(|| DomainError::NotFound(format!("dispute {}", dispute_id)))?;

        let mediation = match self.behavior.mediate(&mut self.core, &dispute).await {
            Some(text) if !text.trim().is_empty() => text,
            _ => format!(
                "Through coordination the parties reached a compromise on {}",
                dispute.topic
            ),
        };
        let proposal = clip_chars(mediation.trim(), RESOLUTION_MAX_CHARS);

        let action = Action::new(ActionKind::Negotiate, format!("Mediate: {}", dispute.topic))
            .with_param("dispute_id", dispute_id)
            .with_param("proposal", proposal.clone());
        let result = self.act(action).await;
        if !result.success {
            warn!("{} could not broadcast mediation: {}", self.id(), result.summary());
        }
        self.persist().await;
        Ok(proposal)
    }

    /// Synthesize the final decision directly, outside any plan
    pub async fn make_decision(&mut self) -> Result<Decision, ActorError> {
        let obs = self.core.observation().await;
        let decision = self.behavior.decide(&mut self.core, &obs).await;
        self.persist().await;
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::test_support::{
        DECISION, MEDIATION, MEMO, PLANNING, PROPOSAL, RecordingTools, ScriptedGateway,
        decision_json, memo_json, store_with_card,
    };
    use council_domain::{Dispute, DisputeStatus, Position, Severity, Stage};

    fn actor(role: AgentRole, gateway: &ScriptedGateway, store: &SharedStore) -> Actor {
        Actor::new(
            RoleProfile::for_role(role),
            ModelProfile::default(),
            Arc::new(gateway.clone()),
            Arc::new(RecordingTools::default()),
            store.clone(),
        )
    }

    async fn at_stage(store: &SharedStore, stage: Stage) {
        store.update(|s| s.enter_stage(stage)).await;
    }

    #[tokio::test]
    async fn test_communicate_rejects_empty_recipient() {
        let store = store_with_card();
        let mut finance = actor(AgentRole::Finance, &ScriptedGateway::new(), &store);

        let err = finance
            .communicate(AgentId::new(""), MessageType::Notification, "hello", Map::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ActorError::InvalidArgument(_)));
        assert!(store.read(|s| s.message_queue.is_empty()).await);
    }

    #[tokio::test]
    async fn test_process_message_flips_responded_once() {
        let store = store_with_card();
        let gateway = ScriptedGateway::new().reply(PROPOSAL, "Acceptable with a cost cap");
        let mut finance = actor(AgentRole::Finance, &gateway, &store);
        let proposal = AgentMessage::new(
            AgentId::new("agent_office"),
            finance.id().clone(),
            MessageType::Proposal,
            "Cap spending at 80%",
        );
        let queued = proposal.clone();
        store.update(move |s| s.post_message(queued)).await;

        let reply = finance.process_message(proposal.clone()).await.unwrap().unwrap();
        assert_eq!(reply.message_type, MessageType::Response);
        assert_eq!(reply.to_agent, AgentId::new("agent_office"));
        assert_eq!(reply.content, "Acceptable with a cost cap");
        assert!(store.read(|s| s.message_queue[0].responded()).await);

        let again = finance.process_message(proposal).await.unwrap();
        assert!(again.is_none());
        assert_eq!(finance.state().memory.received_messages.len(), 1);
    }

    #[tokio::test]
    async fn test_notification_is_not_answered() {
        let store = store_with_card();
        let mut legal = actor(AgentRole::Legal, &ScriptedGateway::new(), &store);
        let note = AgentMessage::new(
            AgentId::new("agent_finance"),
            legal.id().clone(),
            MessageType::Notification,
            "Memo filed",
        );
        let queued = note.clone();
        store.update(move |s| s.post_message(queued)).await;

        assert!(legal.process_message(note).await.unwrap().is_none());
        assert_eq!(store.read(|s| s.message_queue.len()).await, 1);
    }

    #[tokio::test]
    async fn test_cycle_falls_back_to_default_plan_and_writes_memo() {
        let store = store_with_card();
        at_stage(&store, Stage::DepartmentsGenerateMemos).await;
        let gateway = ScriptedGateway::new()
            .reply(PLANNING, "I will write a memo, then talk to legal.")
            .reply(MEMO, &memo_json("support"));
        let mut finance = actor(AgentRole::Finance, &gateway, &store);

        let outcome = finance.run_cycle().await.unwrap();
        match outcome {
            CycleOutcome::Acted { kind, result, .. } => {
                assert_eq!(kind, ActionKind::GenerateMemo);
                assert!(result.success);
            }
            other => panic!("expected an action, got {:?}", other),
        }

        let (memos, position) = store
            .read(|s| {
                (
                    s.memos.len(),
                    s.agents.get(&AgentId::new("agent_finance")).and_then(|a| a.position),
                )
            })
            .await;
        assert_eq!(memos, 1);
        assert_eq!(position, Some(Position::Support));

        let outcome = finance.run_cycle().await.unwrap();
        assert_eq!(outcome, CycleOutcome::PlanCompleted);
        assert!(!finance.state().plan.as_ref().unwrap().is_active);
        assert_eq!(gateway.count(PLANNING), 1);
    }

    #[tokio::test]
    async fn test_malformed_memo_uses_fallback_position() {
        let store = store_with_card();
        at_stage(&store, Stage::DepartmentsGenerateMemos).await;
        let gateway = ScriptedGateway::new().reply(MEMO, "We broadly support it.");
        let mut security = actor(AgentRole::Security, &gateway, &store);

        security.run_cycle().await.unwrap();
        let memo = store.read(|s| s.memos[0].clone()).await;
        assert_eq!(memo.department, "agent_security");
        assert_eq!(memo.position, Position::Conditional);
    }

    #[tokio::test]
    async fn test_decoded_plan_gets_required_lead_step() {
        let store = store_with_card();
        at_stage(&store, Stage::DepartmentsGenerateMemos).await;
        let plan = r#"```json
{"goal": "Share the view", "steps": [
  {"step_id": "s1", "description": "Tell the office", "action_type": "send_message",
   "params": {"to_agent": "agent_office", "content": "Memo filed"}}
]}
```"#;
        let gateway = ScriptedGateway::new()
            .reply(PLANNING, plan)
            .reply(MEMO, &memo_json("oppose"));
        let mut planning = actor(AgentRole::Planning, &gateway, &store);

        let first = planning.run_cycle().await.unwrap();
        let second = planning.run_cycle().await.unwrap();
        let third = planning.run_cycle().await.unwrap();

        assert!(matches!(first, CycleOutcome::Acted { kind: ActionKind::GenerateMemo, .. }));
        assert!(matches!(second, CycleOutcome::Acted { kind: ActionKind::SendMessage, .. }));
        assert_eq!(third, CycleOutcome::PlanCompleted);

        let to_office = store
            .read(|s| s.pending_messages_for(&AgentId::new("agent_office")))
            .await;
        assert_eq!(to_office.len(), 1);
        assert_eq!(to_office[0].content, "Memo filed");
    }

    #[tokio::test]
    async fn test_gateway_outage_never_stops_a_cycle() {
        let store = store_with_card();
        at_stage(&store, Stage::DepartmentsGenerateMemos).await;
        let gateway = ScriptedGateway::new().fail_on("");
        let mut industry = actor(AgentRole::Industry, &gateway, &store);

        let outcome = industry.run_cycle().await.unwrap();
        assert!(outcome.is_success());
        assert_eq!(store.read(|s| s.memos.len()).await, 1);
        assert!(industry.state().memory.thoughts[0].contains("(no reflection"));
    }

    #[tokio::test]
    async fn test_act_without_kind_fails_softly() {
        let store = store_with_card();
        let mut finance = actor(AgentRole::Finance, &ScriptedGateway::new(), &store);

        let result = finance.act(Action::untyped("do something")).await;
        assert!(!result.success);
        assert_eq!(finance.state().memory.actions.len(), 1);
        assert!(finance.state().last_action.is_some());
    }

    #[tokio::test]
    async fn test_use_tool_supplies_policy_card() {
        let store = store_with_card();
        let tools = Arc::new(RecordingTools::default());
        let mut finance = Actor::new(
            RoleProfile::for_role(AgentRole::Finance),
            ModelProfile::default(),
            Arc::new(ScriptedGateway::new()),
            tools.clone(),
            store.clone(),
        );

        let ok = finance
            .act(Action::new(ActionKind::UseTool, "estimate").with_param("tool_name", "impact_estimate"))
            .await;
        let unknown = finance
            .act(Action::new(ActionKind::UseTool, "guess").with_param("tool_name", "oracle"))
            .await;

        assert!(ok.success);
        assert!(!unknown.success);
        let calls = tools.calls.lock().unwrap();
        assert!(calls[0].1.contains_key("policy_card"));
    }

    #[tokio::test]
    async fn test_organize_negotiation_broadcasts_clipped_proposal() {
        let store = store_with_card();
        let dispute = Dispute::new("dispute_1", "Budget and implementation details", Severity::Medium)
            .with_party(AgentId::new("agent_finance"), "conditional")
            .with_party(AgentId::new("agent_legal"), "conditional");
        store.update(move |s| s.disputes.push(dispute)).await;
        let long = "Phase the rollout over two budget years. ".repeat(10);
        let gateway = ScriptedGateway::new().reply(MEDIATION, &long);
        let mut office = actor(AgentRole::Office, &gateway, &store);

        let proposal = office.organize_negotiation("dispute_1").await.unwrap();
        assert!(proposal.chars().count() <= RESOLUTION_MAX_CHARS);

        let (proposals, status) = store
            .read(|s| {
                (
                    s.message_queue
                        .iter()
                        .filter(|m| m.message_type == MessageType::Proposal)
                        .count(),
                    s.dispute("dispute_1").map(|d| d.status()),
                )
            })
            .await;
        assert_eq!(proposals, 2);
        assert_eq!(status, Some(DisputeStatus::Negotiating));

        let missing = office.organize_negotiation("dispute_9").await;
        assert!(matches!(missing, Err(ActorError::Domain(e)) if e.is_not_found()));
    }

    #[tokio::test]
    async fn test_make_decision_records_or_reports_malformed() {
        let store = store_with_card();
        let garbled = ScriptedGateway::new().reply(DECISION, "Approve, I think.");
        let mut decider = actor(AgentRole::Decider, &garbled, &store);
        let err = decider.make_decision().await.unwrap_err();
        assert!(matches!(err, ActorError::Domain(e) if e.is_malformed_output()));
        assert!(store.read(|s| s.decision.is_none()).await);

        let clean = ScriptedGateway::new().reply(DECISION, &decision_json(true));
        let mut decider = actor(AgentRole::Decider, &clean, &store);
        let decision = decider.make_decision().await.unwrap();
        assert!(decision.approved);
        assert_eq!(store.read(|s| s.policy_version.clone()).await, "v1.0");
    }

    #[tokio::test]
    async fn test_departments_cannot_decide() {
        let store = store_with_card();
        let mut finance = actor(AgentRole::Finance, &ScriptedGateway::new(), &store);
        let result = finance.act(Action::new(ActionKind::Decide, "decide")).await;
        assert!(!result.success);
    }

    #[tokio::test]
    async fn test_update_plan_keeps_plan_on_malformed_revision() {
        let store = store_with_card();
        at_stage(&store, Stage::DepartmentsGenerateMemos).await;
        let gateway = ScriptedGateway::new().reply("Reason for revision", "no idea");
        let mut environment = actor(AgentRole::Environment, &gateway, &store);

        // no plan yet: a fresh one is made
        assert!(environment.update_plan("new information").await);
        let before = environment.state().plan.clone().unwrap();

        assert!(!environment.update_plan("budget changed").await);
        assert_eq!(environment.state().plan.as_ref().unwrap().steps, before.steps);
    }
}
