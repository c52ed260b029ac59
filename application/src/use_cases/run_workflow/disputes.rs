//! Negotiation rounds: text disputes settled by the office, then the
//! issue's numeric dimensions settled by the engine.

use super::{RunContext, RunWorkflowUseCase, WorkflowError};
use crate::use_cases::actor_manager::SharedActor;
use crate::use_cases::shared_store::SharedStore;
use council_domain::{
    AgentRole, DimensionSettlement, Dispute, NegotiationEngine, NegotiationRound,
    Negotiator, Stage, TraceEvent, TraceEventType, convergence_score, is_converged,
    select_for_round,
};
use rand::Rng;
use serde_json::json;
use tracing::{debug, info, warn};

impl RunWorkflowUseCase {
    pub(super) async fn negotiation_rounds(&self, ctx: &mut RunContext) -> Result<(), WorkflowError> {
        let office = ctx.actor(AgentRole::Office)?;
        let office_id = office.lock().await.id().clone();
        let max_rounds = self.params.max_rounds;

        for round in 1..=max_rounds {
            let open: Vec<Dispute> = ctx
                .store
                .read(|s| s.disputes.iter().filter(|d| !d.is_resolved()).cloned().collect())
                .await;
            if open.is_empty() {
                break;
            }

            let refs: Vec<&Dispute> = open.iter().collect();
            let rng = &mut ctx.rng;
            let selection = select_for_round(&refs, round, round == max_rounds, || rng.random::<f64>());
            if selection.forced {
                debug!("Round {}: no draw succeeded, forcing {:?}", round, selection.selected);
            }

            let mut record = NegotiationRound::new(round);
            for dispute_id in &selection.selected {
                let resolution = settle(&office, &ctx.store, dispute_id, round).await;
                record.disputes_addressed.push(dispute_id.clone());
                record.resolutions.insert(dispute_id.clone(), resolution);
            }

            let routed = ctx.manager.route_messages().await;
            debug!("Round {}: routed {} message(s)", round, routed);

            let (resolved, total, remaining) = ctx
                .store
                .read(|s| (s.resolved_dispute_count(), s.disputes.len(), s.open_dispute_ids()))
                .await;
            record.remaining_disputes = remaining;
            record.convergence_score = convergence_score(resolved, total);
            let score = record.convergence_score;
            let remaining_count = record.remaining_disputes.len();
            let resolved_this_round = record.disputes_addressed.len();
            info!(
                "Negotiation round {}: {} resolved, {} remaining, convergence {:.2}",
                round, resolved_this_round, remaining_count, score
            );

            ctx.store
                .update(move |s| {
                    s.negotiation_history.push(record);
                    s.touch();
                })
                .await;
            self.emit(
                &ctx.store,
                TraceEvent::new(
                    Stage::NegotiationRounds,
                    TraceEventType::NegotiationRound,
                    format!(
                        "Round {} finished: {} resolved, {} remaining",
                        round, resolved_this_round, remaining_count
                    ),
                )
                .with_agent(office_id.clone())
                .with_data(json!({
                    "round": round,
                    "convergence": score,
                    "resolved_this_round": resolved_this_round,
                    "remaining": remaining_count,
                })),
            )
            .await;

            if remaining_count == 0 || is_converged(score, self.params.convergence_threshold) {
                break;
            }
        }

        // Early convergence can leave a tail of open disputes.
        let leftover = ctx.store.read(|s| s.open_dispute_ids()).await;
        if !leftover.is_empty() {
            info!("Settling {} dispute(s) left after the last round", leftover.len());
            for dispute_id in &leftover {
                settle(&office, &ctx.store, dispute_id, max_rounds).await;
            }
            ctx.manager.route_messages().await;
        }

        self.negotiate_dimensions(ctx).await;
        Ok(())
    }

    /// Settle the issue's dimensions from the department weight profiles.
    /// A failure here is reported but never ends the run.
    async fn negotiate_dimensions(&self, ctx: &mut RunContext) {
        let issue = ctx.store.read(|s| s.issue.clone()).await;
        if issue.dimensions.is_empty() {
            return;
        }

        let mut negotiators = Vec::new();
        for id in ctx.manager.departments() {
            if let Some(actor) = ctx.manager.get(&id) {
                let actor = actor.lock().await;
                negotiators.push(Negotiator::for_profile(id.as_str(), actor.profile()));
            }
        }

        let event = match NegotiationEngine::new(negotiators).run(&issue.id, &issue.dimensions) {
            Ok(outcome) => {
                let settlement = DimensionSettlement::from(&outcome);
                info!(
                    "Dimensions settled ({}) after {} round(s)",
                    settlement.status, settlement.rounds
                );
                let data = serde_json::to_value(&settlement).unwrap_or_default();
                let message = format!("Dimension negotiation {}", settlement.status);
                ctx.store
                    .update(move |s| {
                        s.dimension_settlement = Some(settlement);
                        s.touch();
                    })
                    .await;
                TraceEvent::new(Stage::NegotiationRounds, TraceEventType::DimensionSettlement, message)
                    .with_data(data)
            }
            Err(e) => {
                warn!("Dimension negotiation failed: {}", e);
                TraceEvent::new(
                    Stage::NegotiationRounds,
                    TraceEventType::Error,
                    format!("Dimension negotiation failed: {}", e),
                )
            }
        };
        self.emit(&ctx.store, event).await;
    }
}

/// Have the office mediate one dispute and mark it resolved with the
/// mediation text. Returns the resolution recorded.
async fn settle(office: &SharedActor, store: &SharedStore, dispute_id: &str, round: u32) -> String {
    let mediated = office.lock().await.organize_negotiation(dispute_id).await;
    let text = match mediated {
        Ok(text) => text,
        Err(e) => {
            warn!("Mediation of {} failed: {}", dispute_id, e);
            format!("Consensus reached in negotiation round {}", round)
        }
    };

    let recorded = store
        .update(|s| {
            let dispute = s.dispute_mut(dispute_id)?;
            let settled = dispute
                .begin_negotiation()
                .and_then(|_| dispute.resolve(&text))
                .map(|_| dispute.resolution.clone().unwrap_or_default());
            s.touch();
            Some(settled)
        })
        .await;

    match recorded {
        Some(Ok(resolution)) => resolution,
        Some(Err(e)) => {
            warn!("Could not resolve {}: {}", dispute_id, e);
            text
        }
        None => {
            warn!("Dispute {} vanished before it was resolved", dispute_id);
            text
        }
    }
}
