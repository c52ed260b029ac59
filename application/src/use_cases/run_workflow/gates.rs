//! Legal and fiscal review gates

use super::{RunContext, RunWorkflowUseCase, WorkflowError};
use crate::config::GateMode;
use crate::use_cases::actor::apply_gate_checks;
use council_domain::{AgentRole, GateResult, Stage, TraceEvent, TraceEventType};
use tracing::{info, warn};

impl RunWorkflowUseCase {
    /// Run the reviewing department's cycle and judge its gate result.
    ///
    /// The reviewer records the result during its `review` action. When the
    /// cycle records nothing (a failed cycle, or a plan that never reached
    /// the review) the result comes from the deterministic checks alone.
    pub(super) async fn review_gate(&self, ctx: &mut RunContext, stage: Stage) -> Result<(), WorkflowError> {
        let role = match stage {
            Stage::FiscalCapacityReviewGate => AgentRole::Finance,
            _ => AgentRole::Legal,
        };
        let reviewer = ctx.actor(role)?;
        let reviewer_id = reviewer.lock().await.id().clone();

        if let Err(e) = ctx.manager.run_cycle(&reviewer_id).await {
            warn!("{} review cycle failed: {}", reviewer_id, e);
        }

        let gate = stage.as_str().to_string();
        let recorded = ctx
            .store
            .read(|s| s.gate_results.iter().rev().find(|g| g.gate_name == gate).cloned())
            .await;
        let result = match recorded {
            Some(result) => result,
            None => {
                warn!("{} recorded no result for {}, applying checks only", reviewer_id, gate);
                ctx.store
                    .update(|s| {
                        let mut result = GateResult::new(stage.as_str(), true);
                        apply_gate_checks(stage, s.policy_card.as_ref(), &s.constraints, &mut result);
                        s.gate_results.push(result.clone());
                        s.touch();
                        result
                    })
                    .await
            }
        };

        let verdict = if result.passed { "passed" } else { "failed" };
        info!("{} {}", stage.display_name(), verdict);
        self.emit(
            &ctx.store,
            TraceEvent::new(
                stage,
                TraceEventType::GateResult,
                format!("{} {}", stage.display_name(), verdict),
            )
            .with_agent(reviewer_id)
            .with_data(serde_json::to_value(&result).unwrap_or_default()),
        )
        .await;

        if result.passed {
            return Ok(());
        }
        let reasons = if result.issues.is_empty() {
            "no reason given".to_string()
        } else {
            result.issues.join("; ")
        };
        match self.params.gate_mode {
            GateMode::Enforcing => Err(WorkflowError::GateFailed { gate, reasons }),
            GateMode::Advisory => {
                warn!("{} failed ({}), continuing in advisory mode", gate, reasons);
                Ok(())
            }
        }
    }
}
