//! Plan parsing from model responses.
//!
//! Plans are decoded strictly through [`decode_structured`] and then
//! validated: one to [`MAX_PLAN_STEPS`] steps, unique step ids, known
//! action kinds and dependencies that point at earlier-declared or sibling
//! steps. Any violation is a [`DomainError::MalformedOutput`]; callers
//! substitute [`AgentPlan::default_for`].

use super::action::ActionKind;
use super::entities::{AgentPlan, PlanStep};
use super::structured::decode_structured;
use super::value_objects::AgentId;
use crate::core::error::DomainError;
use crate::workflow::stage::Stage;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashSet;

pub const MAX_PLAN_STEPS: usize = 4;

#[derive(Debug, Deserialize)]
struct PlanDraft {
    #[serde(default)]
    goal: Option<String>,
    steps: Vec<StepDraft>,
}

#[derive(Debug, Deserialize)]
struct StepDraft {
    step_id: String,
    description: String,
    action_type: String,
    #[serde(default)]
    dependencies: Vec<String>,
    #[serde(default)]
    params: Map<String, Value>,
}

/// Decode and validate a plan for `agent_id` in `stage`.
pub fn parse_plan(
    response: &str,
    agent_id: &AgentId,
    default_goal: &str,
    stage: Stage,
) -> Result<AgentPlan, DomainError> {
    let draft: PlanDraft = decode_structured(response)?;

    if draft.steps.is_empty() || draft.steps.len() > MAX_PLAN_STEPS {
        return Err(DomainError::MalformedOutput(format!(
            "plan must have 1 to {} steps, got {}",
            MAX_PLAN_STEPS,
            draft.steps.len()
        )));
    }

    let ids: HashSet<String> = draft.steps.iter().map(|s| s.step_id.clone()).collect();
    if ids.len() != draft.steps.len() || ids.iter().any(|id| id.trim().is_empty()) {
        return Err(DomainError::MalformedOutput(
            "plan step ids must be unique and non-empty".to_string(),
        ));
    }

    let goal = draft
        .goal
        .filter(|g| !g.trim().is_empty())
        .unwrap_or_else(|| default_goal.to_string());
    let mut plan = AgentPlan::new(agent_id.clone(), goal, stage);

    for step in draft.steps {
        let kind = ActionKind::parse(step.action_type.trim())
            .map_err(|e| DomainError::MalformedOutput(e.to_string()))?;
        if let Some(bad) = step
            .dependencies
            .iter()
            .find(|d| *d == &step.step_id || !ids.contains(d.as_str()))
        {
            return Err(DomainError::MalformedOutput(format!(
                "step '{}' has invalid dependency '{}'",
                step.step_id, bad
            )));
        }
        let mut built = PlanStep::new(step.step_id, step.description, kind).with_params(step.params);
        for dep in step.dependencies {
            built = built.with_dependency(dep);
        }
        plan = plan.with_step(built);
    }

    if let Some(stuck) = cyclic_step(&plan) {
        return Err(DomainError::MalformedOutput(format!(
            "step '{}' is part of a dependency cycle",
            stuck
        )));
    }

    Ok(plan)
}

/// First step that can never become ready because its dependencies loop.
fn cyclic_step(plan: &AgentPlan) -> Option<String> {
    let mut ordered: HashSet<&str> = HashSet::new();
    loop {
        let before = ordered.len();
        for step in &plan.steps {
            if step.dependencies.iter().all(|d| ordered.contains(d.as_str())) {
                ordered.insert(step.step_id.as_str());
            }
        }
        if ordered.len() == plan.steps.len() {
            return None;
        }
        if ordered.len() == before {
            return plan
                .steps
                .iter()
                .find(|s| !ordered.contains(s.step_id.as_str()))
                .map(|s| s.step_id.to_string());
        }
    }
}
