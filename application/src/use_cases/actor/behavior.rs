//! Role behaviors
//!
//! Departments, the coordinating office and the decider share one
//! lifecycle ([`Actor`](super::Actor)) and differ only in the capabilities
//! below. The behavior is picked once, from the role, when the actor is
//! built.

use super::{ActorCore, ActorError};
use async_trait::async_trait;
use council_domain::{
    ActionResult, AgentMessage, AgentRole, AggregationOutcome, CouncilPromptTemplate, Decision,
    DecisionDraft, Dispute, DomainError, Memo, MemoDraft, Observation, PolicyCard, RoleProfile,
    aggregate_disputes, decode_structured, truncate,
};
use serde_json::json;
use tracing::{info, warn};

/// Role-specific capabilities of an actor
#[async_trait]
pub trait RoleBehavior: Send + Sync {
    fn system_prompt(&self, profile: &RoleProfile) -> String;

    fn thinking_prompt(&self, profile: &RoleProfile, obs: &Observation) -> String;

    /// The `generate_memo` action: produce the role's defining record
    async fn generate_memo(&self, core: &mut ActorCore, obs: &Observation) -> ActionResult;

    /// Reply text for a proposal addressed to this actor
    async fn evaluate_proposal(&self, _core: &mut ActorCore, message: &AgentMessage) -> String {
        format!(
            "Received the proposal from {}; it will be evaluated",
            message.from_agent
        )
    }

    /// Mediation text for a dispute, if this role mediates
    async fn mediate(&self, _core: &mut ActorCore, _dispute: &Dispute) -> Option<String> {
        None
    }

    /// Synthesize and record the final decision
    async fn decide(&self, core: &mut ActorCore, _obs: &Observation) -> Result<Decision, ActorError> {
        Err(ActorError::InvalidArgument(format!(
            "{} cannot make the final decision",
            core.profile().name
        )))
    }
}

/// Behavior for a role
pub fn behavior_for(role: AgentRole) -> Box<dyn RoleBehavior> {
    match role {
        AgentRole::Office => Box::new(CoordinatorRole),
        AgentRole::Decider => Box::new(DeciderRole),
        _ => Box::new(DepartmentRole),
    }
}

// ==================== Department ====================

/// A department: writes memos and weighs proposals
pub struct DepartmentRole;

#[async_trait]
impl RoleBehavior for DepartmentRole {
    fn system_prompt(&self, profile: &RoleProfile) -> String {
        CouncilPromptTemplate::department_system(profile)
    }

    fn thinking_prompt(&self, profile: &RoleProfile, obs: &Observation) -> String {
        CouncilPromptTemplate::department_thinking(profile, obs)
    }

    async fn generate_memo(&self, core: &mut ActorCore, obs: &Observation) -> ActionResult {
        let card = obs
            .policy_card
            .clone()
            .unwrap_or_else(|| PolicyCard::fallback_for(&obs.issue));
        let department = core.agent_id().to_string();
        let prompt = CouncilPromptTemplate::memo_request(core.profile(), &card);

        let memo = match core.ask(&prompt).await {
            Ok(reply) => match decode_structured::<MemoDraft>(&reply) {
                Ok(draft) => draft.into_memo(department.clone()),
                Err(e) => {
                    warn!("{}: memo undecodable ({}), using fallback memo", department, e);
                    Memo::fallback(department.clone())
                }
            },
            Err(e) => {
                warn!("{}: memo request failed ({}), using fallback memo", department, e);
                Memo::fallback(department.clone())
            }
        };

        let state = core.state_mut();
        state.position = Some(memo.position);
        state.rationale = Some(memo.rationale.clone());
        state.concerns = memo.concerns.clone();
        state.recommendations = memo.recommendations.clone();

        let recorded = memo.clone();
        core.store().update(move |s| s.add_memo(recorded)).await;
        info!("{} memo: {}", department, memo.position);

        ActionResult::success(json!({ "memo": memo }))
    }

    async fn evaluate_proposal(&self, core: &mut ActorCore, message: &AgentMessage) -> String {
        let prompt =
            CouncilPromptTemplate::proposal_evaluation(core.profile(), &message.from_agent, &message.content);
        match core.ask(&prompt).await {
            Ok(reply) if !reply.trim().is_empty() => truncate(reply.trim(), 600),
            Ok(_) | Err(_) => format!(
                "{} received the proposal from {} and will evaluate it",
                core.profile().name,
                message.from_agent
            ),
        }
    }
}

// ==================== Coordinator ====================

/// The office: aggregates disputes and mediates them
pub struct CoordinatorRole;

#[async_trait]
impl RoleBehavior for CoordinatorRole {
    fn system_prompt(&self, _profile: &RoleProfile) -> String {
        CouncilPromptTemplate::office_system()
    }

    fn thinking_prompt(&self, _profile: &RoleProfile, obs: &Observation) -> String {
        CouncilPromptTemplate::office_thinking(obs)
    }

    /// Aggregates disputes from the memos gathered so far
    async fn generate_memo(&self, core: &mut ActorCore, _obs: &Observation) -> ActionResult {
        let outcome = core
            .store()
            .update(|s| {
                let outcome = aggregate_disputes(&s.memos, &s.disputes)?;
                if let AggregationOutcome::Created(disputes) = &outcome {
                    s.disputes.extend(disputes.iter().cloned());
                    s.touch();
                }
                Ok::<_, DomainError>(outcome)
            })
            .await;

        match outcome {
            Ok(AggregationOutcome::Created(disputes)) => {
                info!("{} aggregated {} dispute(s)", core.agent_id(), disputes.len());
                let ids: Vec<&str> = disputes.iter().map(|d| d.id.as_str()).collect();
                ActionResult::success(json!({ "created": disputes.len(), "dispute_ids": ids }))
            }
            Ok(AggregationOutcome::AlreadyAggregated) => {
                info!("{}: disputes already aggregated", core.agent_id());
                ActionResult::success(json!({ "created": 0, "already_aggregated": true }))
            }
            Err(e) => ActionResult::failure(e.to_string()),
        }
    }

    async fn mediate(&self, core: &mut ActorCore, dispute: &Dispute) -> Option<String> {
        let prompt = CouncilPromptTemplate::mediation(dispute);
        match core.ask(&prompt).await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("mediation for {} failed: {}", dispute.id, e);
                None
            }
        }
    }
}

// ==================== Decider ====================

/// The decider: rules on the proposal
pub struct DeciderRole;

#[async_trait]
impl RoleBehavior for DeciderRole {
    fn system_prompt(&self, _profile: &RoleProfile) -> String {
        CouncilPromptTemplate::decider_system()
    }

    fn thinking_prompt(&self, _profile: &RoleProfile, obs: &Observation) -> String {
        CouncilPromptTemplate::decider_thinking(obs)
    }

    /// Produces the decision
    async fn generate_memo(&self, core: &mut ActorCore, obs: &Observation) -> ActionResult {
        match self.decide(core, obs).await {
            Ok(decision) => ActionResult::success(json!({ "decision": decision })),
            Err(e) => ActionResult::failure(e.to_string()),
        }
    }

    async fn decide(&self, core: &mut ActorCore, obs: &Observation) -> Result<Decision, ActorError> {
        let disputes_total = core.store().read(|s| s.disputes.len()).await;
        let prompt = CouncilPromptTemplate::decision_request(obs, disputes_total);
        let reply = core.ask(&prompt).await?;
        let decision: Decision = decode_structured::<DecisionDraft>(&reply)?.into();

        let recorded = decision.clone();
        core.store().update(move |s| s.set_decision(recorded)).await;
        let state = core.state_mut();
        state.rationale = Some(decision.rationale.clone());
        info!(
            "{} decided: {}",
            core.agent_id(),
            if decision.approved { "approved" } else { "rejected" }
        );
        Ok(decision)
    }
}
