//! Workflow stages and run status

use crate::agent::action::ActionKind;
use serde::{Deserialize, Serialize};

/// A named state of the top-level workflow.
///
/// Stages run in [`Stage::SEQUENCE`] order; `Init` precedes the first and
/// `Completed` follows the last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Init,
    Intake,
    DepartmentsGenerateMemos,
    SecretariatAggregateDisputes,
    NegotiationRounds,
    LegalReviewGate,
    FiscalCapacityReviewGate,
    DeciderFinalize,
    ImplementationPlan,
    Completed,
}

impl Stage {
    /// Working stages in execution order
    pub const SEQUENCE: [Stage; 8] = [
        Stage::Intake,
        Stage::DepartmentsGenerateMemos,
        Stage::SecretariatAggregateDisputes,
        Stage::NegotiationRounds,
        Stage::LegalReviewGate,
        Stage::FiscalCapacityReviewGate,
        Stage::DeciderFinalize,
        Stage::ImplementationPlan,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Stage::Init => "init",
            Stage::Intake => "intake",
            Stage::DepartmentsGenerateMemos => "departments_generate_memos",
            Stage::SecretariatAggregateDisputes => "secretariat_aggregate_disputes",
            Stage::NegotiationRounds => "negotiation_rounds",
            Stage::LegalReviewGate => "legal_review_gate",
            Stage::FiscalCapacityReviewGate => "fiscal_capacity_review_gate",
            Stage::DeciderFinalize => "decider_finalize",
            Stage::ImplementationPlan => "implementation_plan",
            Stage::Completed => "completed",
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Stage::Init => "Init",
            Stage::Intake => "Intake",
            Stage::DepartmentsGenerateMemos => "Department Memos",
            Stage::SecretariatAggregateDisputes => "Dispute Aggregation",
            Stage::NegotiationRounds => "Negotiation Rounds",
            Stage::LegalReviewGate => "Legal Review Gate",
            Stage::FiscalCapacityReviewGate => "Fiscal Capacity Review Gate",
            Stage::DeciderFinalize => "Final Decision",
            Stage::ImplementationPlan => "Implementation Plan",
            Stage::Completed => "Completed",
        }
    }

    /// Stage that follows this one
    pub fn next(&self) -> Option<Stage> {
        match self {
            Stage::Init => Some(Stage::Intake),
            Stage::ImplementationPlan => Some(Stage::Completed),
            Stage::Completed => None,
            current => Self::SEQUENCE
                .iter()
                .position(|s| s == current)
                .and_then(|i| Self::SEQUENCE.get(i + 1).copied()),
        }
    }

    pub fn is_gate(&self) -> bool {
        matches!(self, Stage::LegalReviewGate | Stage::FiscalCapacityReviewGate)
    }

    /// Action kind a stage's fallback plan performs
    pub fn default_action_kind(&self) -> ActionKind {
        match self {
            Stage::LegalReviewGate | Stage::FiscalCapacityReviewGate => ActionKind::Review,
            Stage::NegotiationRounds => ActionKind::Negotiate,
            _ => ActionKind::GenerateMemo,
        }
    }

    /// Action the first step of any plan made for this stage must perform
    pub fn required_lead_action(&self) -> Option<ActionKind> {
        match self {
            Stage::DepartmentsGenerateMemos
            | Stage::SecretariatAggregateDisputes
            | Stage::DeciderFinalize => Some(ActionKind::GenerateMemo),
            Stage::LegalReviewGate | Stage::FiscalCapacityReviewGate => Some(ActionKind::Review),
            _ => None,
        }
    }

    /// Task description given to actors when they plan for this stage
    pub fn planning_hint(&self) -> &str {
        match self {
            Stage::DepartmentsGenerateMemos => {
                "Write your department's memo on the proposal. The first step must use action_type 'generate_memo'."
            }
            Stage::SecretariatAggregateDisputes => {
                "Aggregate the departments' disagreements. The first step must use action_type 'generate_memo' (for the office this aggregates disputes)."
            }
            Stage::NegotiationRounds => {
                "Coordinate the open disputes and organise negotiation. Use action_type 'negotiate' or 'propose_solution'."
            }
            Stage::LegalReviewGate => {
                "Perform the legal review and check compliance. The first step must use action_type 'review'."
            }
            Stage::FiscalCapacityReviewGate => {
                "Perform the fiscal review and assess affordability. The first step must use action_type 'review'."
            }
            Stage::DeciderFinalize => {
                "Make the final decision. The first step must use action_type 'generate_memo' (for the decider this produces the decision)."
            }
            _ => "Complete your task given the current situation.",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Overall status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &str {
        match self {
            RunStatus::Pending => "pending",
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_sequence_walk() {
        let mut stage = Stage::Init;
        let mut visited = vec![];
        while let Some(next) = stage.next() {
            visited.push(next);
            stage = next;
        }
        assert_eq!(visited.len(), 9);
        assert_eq!(visited[0], Stage::Intake);
        assert_eq!(visited[8], Stage::Completed);
    }

    #[test]
    fn test_gate_defaults() {
        assert!(Stage::LegalReviewGate.is_gate());
        assert!(!Stage::NegotiationRounds.is_gate());
        assert_eq!(Stage::FiscalCapacityReviewGate.default_action_kind(), ActionKind::Review);
        assert_eq!(Stage::NegotiationRounds.default_action_kind(), ActionKind::Negotiate);
        assert_eq!(Stage::NegotiationRounds.required_lead_action(), None);
        assert_eq!(
            Stage::DeciderFinalize.required_lead_action(),
            Some(ActionKind::GenerateMemo)
        );
    }

    #[test]
    fn test_stage_serde_names() {
        assert_eq!(
            serde_json::to_string(&Stage::SecretariatAggregateDisputes).unwrap(),
            "\"secretariat_aggregate_disputes\""
        );
        assert!(RunStatus::Failed.is_terminal());
        assert!(!RunStatus::Running.is_terminal());
    }
}
