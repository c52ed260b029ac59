//! Policy entities - the issue, proposal card, constraints and the records
//! departments and the decider produce.

use crate::core::string::clip_chars;
use crate::negotiation::dimension::Dimension;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How pressing an issue is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Urgency {
    pub fn as_str(&self) -> &str {
        match self {
            Urgency::Low => "low",
            Urgency::Medium => "medium",
            Urgency::High => "high",
            Urgency::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The issue put before the council. Immutable for the life of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub background: String,
    #[serde(default)]
    pub urgency: Urgency,
    #[serde(default)]
    pub sectors: Vec<String>,
    /// Negotiable dimensions; when present the negotiation stage also
    /// settles them numerically.
    #[serde(default)]
    pub dimensions: Vec<Dimension>,
}

impl Issue {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            background: String::new(),
            urgency: Urgency::default(),
            sectors: Vec::new(),
            dimensions: Vec::new(),
        }
    }

    pub fn with_background(mut self, background: impl Into<String>) -> Self {
        self.background = background.into();
        self
    }

    pub fn with_urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = urgency;
        self
    }

    pub fn with_sector(mut self, sector: impl Into<String>) -> Self {
        self.sectors.push(sector.into());
        self
    }

    pub fn with_dimension(mut self, dimension: Dimension) -> Self {
        self.dimensions.push(dimension);
        self
    }
}

/// The proposal under deliberation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyCard {
    pub title: String,
    pub summary: String,
    #[serde(default)]
    pub estimated_budget: f64,
    #[serde(default = "default_duration_months")]
    pub duration_months: u32,
    #[serde(default)]
    pub affected_population: u64,
    #[serde(default)]
    pub key_measures: Vec<String>,
    #[serde(default)]
    pub risk_factors: Vec<String>,
}

fn default_duration_months() -> u32 {
    12
}

impl PolicyCard {
    /// Minimal card derived from the issue text, used when intake output
    /// cannot be decoded.
    pub fn fallback_for(issue: &Issue) -> Self {
        Self {
            title: issue.title.clone(),
            summary: clip_chars(&issue.description, 200),
            estimated_budget: 1e8,
            duration_months: 12,
            affected_population: 100_000,
            key_measures: vec![
                "Establish a dedicated delivery team".to_string(),
                "Run a staged pilot before full rollout".to_string(),
            ],
            risk_factors: vec!["Implementation capacity may be insufficient".to_string()],
        }
    }
}

/// Per-run limits the proposal must respect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    pub budget_ceiling: f64,
    #[serde(default)]
    pub legal_requirements: Vec<String>,
    #[serde(default)]
    pub timeline_deadline: Option<String>,
    #[serde(default)]
    pub stakeholder_priorities: BTreeMap<String, String>,
}

impl Default for Constraints {
    fn default() -> Self {
        let stakeholder_priorities = [("livelihood", "high"), ("economy", "medium"), ("environment", "medium")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            budget_ceiling: 5e9,
            legal_requirements: vec![
                "Consistent with constitutional and statutory law".to_string(),
                "Public notice and comment completed".to_string(),
            ],
            timeline_deadline: Some("2026-06-30".to_string()),
            stakeholder_priorities,
        }
    }
}

/// A department's stance on the proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Support,
    Oppose,
    Conditional,
}

impl Position {
    pub fn as_str(&self) -> &str {
        match self {
            Position::Support => "support",
            Position::Oppose => "oppose",
            Position::Conditional => "conditional",
        }
    }

    /// Lenient mapping used only on values already extracted from a decoded
    /// record; anything unrecognised is treated as conditional.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "support" | "approve" | "yes" => Position::Support,
            "oppose" | "reject" | "no" => Position::Oppose,
            _ => Position::Conditional,
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A department's formal position record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memo {
    pub department: String,
    pub position: Position,
    pub rationale: String,
    #[serde(default)]
    pub concerns: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl Memo {
    pub fn new(department: impl Into<String>, position: Position, rationale: impl Into<String>) -> Self {
        Self {
            department: department.into(),
            position,
            rationale: rationale.into(),
            concerns: Vec::new(),
            recommendations: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_concerns(mut self, concerns: Vec<String>) -> Self {
        self.concerns = concerns;
        self
    }

    pub fn with_recommendations(mut self, recommendations: Vec<String>) -> Self {
        self.recommendations = recommendations;
        self
    }

    /// Memo recorded when a department's reasoning output is unusable.
    pub fn fallback(department: impl Into<String>) -> Self {
        Self::new(department, Position::Conditional, "Needs further evaluation")
            .with_concerns(vec!["Needs more information".to_string()])
            .with_recommendations(vec!["Strengthen the justification".to_string()])
    }
}

/// Outcome of a review gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateResult {
    pub gate_name: String,
    pub passed: bool,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl GateResult {
    pub fn new(gate_name: impl Into<String>, passed: bool) -> Self {
        Self {
            gate_name: gate_name.into(),
            passed,
            issues: Vec::new(),
            recommendations: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_issue(mut self, issue: impl Into<String>) -> Self {
        self.issues.push(issue.into());
        self
    }

    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendations.push(recommendation.into());
        self
    }
}

/// The final ruling. Exactly one per completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub approved: bool,
    pub final_policy_text: String,
    pub rationale: String,
    #[serde(default)]
    pub conditions: Vec<String>,
    #[serde(default)]
    pub next_steps: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl Decision {
    pub fn new(approved: bool, final_policy_text: impl Into<String>, rationale: impl Into<String>) -> Self {
        Self {
            approved,
            final_policy_text: final_policy_text.into(),
            rationale: rationale.into(),
            conditions: Vec::new(),
            next_steps: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_conditions(mut self, conditions: Vec<String>) -> Self {
        self.conditions = conditions;
        self
    }

    pub fn with_next_steps(mut self, next_steps: Vec<String>) -> Self {
        self.next_steps = next_steps;
        self
    }

    /// Approve-with-conditions ruling used when no decision could be synthesised.
    pub fn default_approval(card: Option<&PolicyCard>) -> Self {
        let text = card
            .map(|c| c.summary.clone())
            .unwrap_or_else(|| "Policy approved pending detailed drafting".to_string());
        Self::new(true, text, "Approved with conditions after departmental deliberation")
            .with_conditions(vec![
                "Strengthen oversight".to_string(),
                "Evaluate regularly".to_string(),
            ])
            .with_next_steps(vec![
                "Draft implementing rules".to_string(),
                "Launch a pilot".to_string(),
            ])
    }
}

/// A file produced by a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub path: String,
    #[serde(default)]
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
}

impl Artifact {
    pub fn new(name: impl Into<String>, kind: impl Into<String>, path: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            path: path.into(),
            size_bytes,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_deserialize_defaults() {
        let issue: Issue = serde_json::from_str(
            r#"{"id": "i1", "title": "Transit", "description": "Expand bus lanes"}"#,
        )
        .unwrap();
        assert_eq!(issue.urgency, Urgency::Medium);
        assert!(issue.sectors.is_empty());
        assert!(issue.dimensions.is_empty());
    }

    #[test]
    fn test_fallback_card_clips_summary() {
        let issue = Issue::new("i1", "Transit", "x".repeat(500));
        let card = PolicyCard::fallback_for(&issue);
        assert_eq!(card.title, "Transit");
        assert_eq!(card.summary.chars().count(), 200);
        assert_eq!(card.estimated_budget, 1e8);
        assert_eq!(card.key_measures.len(), 2);
        assert_eq!(card.risk_factors.len(), 1);
    }

    #[test]
    fn test_policy_card_partial_json() {
        let card: PolicyCard =
            serde_json::from_str(r#"{"title": "T", "summary": "S", "estimated_budget": 2.5e8}"#)
                .unwrap();
        assert_eq!(card.duration_months, 12);
        assert_eq!(card.estimated_budget, 2.5e8);
    }

    #[test]
    fn test_position_labels() {
        assert_eq!(Position::from_label("Support"), Position::Support);
        assert_eq!(Position::from_label("oppose"), Position::Oppose);
        assert_eq!(Position::from_label("maybe"), Position::Conditional);
        assert_eq!(serde_json::to_string(&Position::Oppose).unwrap(), "\"oppose\"");
    }

    #[test]
    fn test_fallback_memo() {
        let memo = Memo::fallback("finance");
        assert_eq!(memo.position, Position::Conditional);
        assert_eq!(memo.concerns, vec!["Needs more information".to_string()]);
    }

    #[test]
    fn test_default_decision_uses_card_summary() {
        let card = PolicyCard::fallback_for(&Issue::new("i", "T", "Short description"));
        let decision = Decision::default_approval(Some(&card));
        assert!(decision.approved);
        assert_eq!(decision.final_policy_text, "Short description");
        assert_eq!(decision.conditions.len(), 2);
        assert_eq!(decision.next_steps.len(), 2);
    }

    #[test]
    fn test_constraints_default() {
        let constraints = Constraints::default();
        assert_eq!(constraints.budget_ceiling, 5e9);
        assert_eq!(constraints.timeline_deadline.as_deref(), Some("2026-06-30"));
    }
}
