//! Intake, memo, aggregation and decision stages

use super::{RunContext, RunWorkflowUseCase, WorkflowError};
use crate::ports::run_store::StoreError;
use council_domain::{
    AgentRole, CouncilPromptTemplate, Decision, PolicyCard, Stage, TraceEvent, TraceEventType,
    decode_structured, render_implementation_plan,
};
use serde_json::json;
use tracing::{debug, info, warn};

impl RunWorkflowUseCase {
    /// Draft the policy card. Any failure yields the card derived from the
    /// issue itself, so later stages always see one.
    pub(super) async fn intake(&self, ctx: &mut RunContext) -> Result<(), WorkflowError> {
        let issue = ctx.store.read(|s| s.issue.clone()).await;
        let prompt = CouncilPromptTemplate::intake(&issue);

        let drafted = match self
            .gateway
            .create_session_with_system_prompt(
                &self.params.default_model,
                &CouncilPromptTemplate::office_system(),
            )
            .await
        {
            Ok(session) => session.send(&prompt).await.map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        }
        .and_then(|reply| decode_structured::<PolicyCard>(&reply).map_err(|e| e.to_string()));

        let card = match drafted {
            Ok(card) => card,
            Err(reason) => {
                warn!("Intake output unusable ({}), deriving the card from the issue", reason);
                PolicyCard::fallback_for(&issue)
            }
        };

        info!("Policy card: {}", card.title);
        let data = serde_json::to_value(&card).unwrap_or_default();
        let message = format!("Policy card created: {}", card.title);
        ctx.store.update(move |s| s.set_policy_card(card, "v0.1")).await;
        self.emit(
            &ctx.store,
            TraceEvent::new(Stage::Intake, TraceEventType::PolicyCardCreated, message).with_data(data),
        )
        .await;
        Ok(())
    }

    /// All departments write their memos concurrently.
    pub(super) async fn department_memos(&self, ctx: &mut RunContext) -> Result<(), WorkflowError> {
        let departments = ctx.manager.departments();
        let reports = ctx
            .manager
            .run_concurrent(&departments, self.params.memo_concurrency)
            .await;

        for report in reports {
            let event = match &report.outcome {
                Ok(outcome) => {
                    let position = ctx
                        .store
                        .read(|s| s.agents.get(&report.agent_id).and_then(|a| a.position))
                        .await;
                    TraceEvent::new(
                        Stage::DepartmentsGenerateMemos,
                        TraceEventType::MemoReady,
                        format!(
                            "{} memo: {}",
                            report.agent_id,
                            position.map(|p| p.to_string()).unwrap_or_else(|| "none".to_string())
                        ),
                    )
                    .with_data(json!({ "outcome": outcome.summary() }))
                }
                Err(e) => TraceEvent::new(
                    Stage::DepartmentsGenerateMemos,
                    TraceEventType::Error,
                    format!("{} produced no memo: {}", report.agent_id, e),
                ),
            };
            self.emit(&ctx.store, event.with_agent(report.agent_id.clone()))
                .await;
        }

        let routed = ctx.manager.route_messages().await;
        debug!("Routed {} message(s) after memos", routed);
        Ok(())
    }

    /// The office turns the memos into disputes.
    pub(super) async fn aggregate(&self, ctx: &mut RunContext) -> Result<(), WorkflowError> {
        let office = ctx.actor(AgentRole::Office)?;
        let office_id = office.lock().await.id().clone();
        let outcome = ctx.manager.run_cycle(&office_id).await?;
        if !outcome.is_success() {
            warn!("Dispute aggregation did not succeed: {}", outcome.summary());
        }

        let disputes = ctx.store.read(|s| s.disputes.clone()).await;
        let summary: Vec<_> = disputes
            .iter()
            .map(|d| json!({ "id": d.id, "topic": d.topic, "severity": d.severity }))
            .collect();
        self.emit(
            &ctx.store,
            TraceEvent::new(
                Stage::SecretariatAggregateDisputes,
                TraceEventType::DisputeUpdate,
                format!("{} dispute(s) identified", disputes.len()),
            )
            .with_agent(office_id)
            .with_data(json!({ "disputes": summary })),
        )
        .await;
        Ok(())
    }

    /// The decider rules. If its cycle leaves no decision, the decision is
    /// synthesized directly, and failing that the default approval is used.
    pub(super) async fn finalize_decision(&self, ctx: &mut RunContext) -> Result<(), WorkflowError> {
        let decider = ctx.actor(AgentRole::Decider)?;
        let decider_id = decider.lock().await.id().clone();

        match ctx.manager.run_cycle(&decider_id).await {
            Ok(outcome) => debug!("Decider cycle: {}", outcome.summary()),
            Err(e) => warn!("Decider cycle failed: {}", e),
        }

        if ctx.store.read(|s| s.decision.is_none()).await {
            warn!("Decider cycle produced no decision, synthesizing directly");
            let direct = decider.lock().await.make_decision().await;
            if let Err(e) = direct {
                warn!("Direct decision failed ({}), using the default approval", e);
                ctx.store
                    .update(|s| {
                        let decision = Decision::default_approval(s.policy_card.as_ref());
                        s.set_decision(decision);
                    })
                    .await;
            }
        }

        let Some(decision) = ctx.store.read(|s| s.decision.clone()).await else {
            return Ok(());
        };
        let content = serde_json::to_string_pretty(&decision).map_err(StoreError::from)?;
        self.save_artifact(ctx, Stage::DeciderFinalize, "final_decision.json", &content, "json")
            .await?;

        self.emit(
            &ctx.store,
            TraceEvent::new(
                Stage::DeciderFinalize,
                TraceEventType::Decision,
                if decision.approved {
                    "Policy approved"
                } else {
                    "Policy rejected"
                },
            )
            .with_agent(decider_id)
            .with_data(serde_json::to_value(&decision).unwrap_or_default()),
        )
        .await;
        Ok(())
    }

    /// Render the implementation plan of an approved policy.
    pub(super) async fn implementation_plan(&self, ctx: &mut RunContext) -> Result<(), WorkflowError> {
        let (card, decision) = ctx
            .store
            .read(|s| (s.policy_card.clone(), s.decision.clone()))
            .await;
        let Some(decision) = decision.filter(|d| d.approved) else {
            info!("Policy not approved, no implementation plan");
            return Ok(());
        };

        let plan = render_implementation_plan(card.as_ref(), &decision);
        self.save_artifact(ctx, Stage::ImplementationPlan, "implementation_plan.txt", &plan, "text")
            .await
    }

    async fn save_artifact(
        &self,
        ctx: &RunContext,
        stage: Stage,
        name: &str,
        content: &str,
        kind: &str,
    ) -> Result<(), WorkflowError> {
        let run_id = ctx.store.run_id().await;
        let artifact = self.run_store.save_artifact(&run_id, name, content, kind)?;
        let data = serde_json::to_value(&artifact).unwrap_or_default();
        ctx.store
            .update(move |s| {
                s.artifacts.push(artifact);
                s.touch();
            })
            .await;
        self.emit(
            &ctx.store,
            TraceEvent::new(stage, TraceEventType::ArtifactCreated, format!("Artifact saved: {}", name))
                .with_data(data),
        )
        .await;
        Ok(())
    }
}
