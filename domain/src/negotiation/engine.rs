//! Fixed-point negotiation over weighted proposals.

use super::dimension::{Dimension, DimensionKind, DimensionValue};
use crate::agent::value_objects::{AgentRole, RoleProfile};
use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Weight above which a concern drives a negotiator's proposal
const DOMINANT_WEIGHT: f64 = 0.4;

/// Share of the prior value kept on each concession
const CONCESSION_KEEP: f64 = 0.8;

/// A party to the negotiation with its concern weights
/// (e.g. `financial_cost`, `environmental_benefit`, `security_risk`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Negotiator {
    pub id: String,
    pub weights: BTreeMap<String, f64>,
}

impl Negotiator {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            weights: BTreeMap::new(),
        }
    }

    pub fn with_weight(mut self, concern: impl Into<String>, weight: f64) -> Self {
        self.weights.insert(concern.into(), weight);
        self
    }

    /// Negotiator weighted like the given role profile
    pub fn for_profile(id: impl Into<String>, profile: &RoleProfile) -> Self {
        Self {
            id: id.into(),
            weights: profile.weights.clone(),
        }
    }

    /// The six departments with their built-in profiles
    pub fn departments() -> Vec<Negotiator> {
        AgentRole::DEPARTMENTS
            .iter()
            .map(|role| Self::for_profile(role.as_str(), &RoleProfile::for_role(*role)))
            .collect()
    }

    fn weighs(&self, concern: &str) -> bool {
        self.weights.get(concern).is_some_and(|w| *w > DOMINANT_WEIGHT)
    }
}

/// Final status of a negotiation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementStatus {
    /// Proposals agreed on every dimension
    Resolved,
    /// Round cap reached; the median was imposed
    ForcedResolution,
}

impl SettlementStatus {
    pub fn as_str(&self) -> &str {
        match self {
            SettlementStatus::Resolved => "resolved",
            SettlementStatus::ForcedResolution => "forced_resolution",
        }
    }
}

impl std::fmt::Display for SettlementStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One negotiator's move on the contested dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concession {
    pub dimension: String,
    pub before: BTreeMap<String, DimensionValue>,
    pub after: BTreeMap<String, DimensionValue>,
    /// Raw positions after the move; fractional option indices for enums
    pub positions: BTreeMap<String, f64>,
}

/// Snapshot of one engine round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineRound {
    pub round: u32,
    /// negotiator id -> dimension id -> proposal at the start of the round
    pub proposals: BTreeMap<String, BTreeMap<String, DimensionValue>>,
    pub conflict_dimension: Option<String>,
    pub conflict_level: f64,
    pub concession: Option<Concession>,
}

/// Result of [`NegotiationEngine::run`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegotiationOutcome {
    pub issue_id: String,
    pub status: SettlementStatus,
    pub compromise: BTreeMap<String, DimensionValue>,
    pub rounds: Vec<EngineRound>,
    /// Proposals the compromise was computed from
    pub final_proposals: BTreeMap<String, BTreeMap<String, DimensionValue>>,
}

impl NegotiationOutcome {
    pub fn rounds_run(&self) -> u32 {
        self.rounds.last().map(|r| r.round).unwrap_or(0)
    }
}

/// Deterministic negotiation engine.
///
/// Proposals are collected once; each round the dimension with the widest
/// spread is pulled toward the cross-negotiator mean, so concessions carry
/// from round to round.
pub struct NegotiationEngine {
    negotiators: Vec<Negotiator>,
    max_rounds: u32,
}

impl NegotiationEngine {
    pub const DEFAULT_MAX_ROUNDS: u32 = 3;

    pub fn new(negotiators: Vec<Negotiator>) -> Self {
        Self {
            negotiators,
            max_rounds: Self::DEFAULT_MAX_ROUNDS,
        }
    }

    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds.max(1);
        self
    }

    pub fn negotiators(&self) -> &[Negotiator] {
        &self.negotiators
    }

    /// Closed-form opening proposal for one negotiator on one dimension.
    ///
    /// Enum proposals are returned as an option index.
    pub fn propose(negotiator: &Negotiator, dimension: &Dimension) -> f64 {
        match &dimension.kind {
            DimensionKind::Continuous { range: [low, high] } => {
                if negotiator.weighs("financial_cost") {
                    low + 0.2 * (high - low)
                } else if negotiator.weighs("environmental_benefit") {
                    high - 0.1 * (high - low)
                } else {
                    (low + high) / 2.0
                }
            }
            DimensionKind::Enum { options, .. } => {
                if negotiator.weighs("security_risk") {
                    0.0
                } else if negotiator.weighs("industry_growth") {
                    options.len().saturating_sub(1) as f64
                } else {
                    dimension.default_index() as f64
                }
            }
        }
    }

    /// Run the negotiation for an issue's dimensions.
    pub fn run(&self, issue_id: &str, dimensions: &[Dimension]) -> Result<NegotiationOutcome, DomainError> {
        if self.negotiators.is_empty() {
            return Err(DomainError::InvalidArgument(
                "negotiation needs at least one negotiator".to_string(),
            ));
        }
        if dimensions.is_empty() {
            return Err(DomainError::InvalidArgument(format!(
                "issue '{}' declares no dimensions",
                issue_id
            )));
        }
        for dimension in dimensions {
            dimension.validate()?;
        }

        // values[negotiator][dimension]
        let mut values: Vec<Vec<f64>> = self
            .negotiators
            .iter()
            .map(|n| dimensions.iter().map(|d| Self::propose(n, d)).collect())
            .collect();

        let mut rounds = Vec::new();
        let mut status = SettlementStatus::ForcedResolution;

        for round in 1..=self.max_rounds {
            let (conflict_idx, conflict_level) = Self::conflict(&values, dimensions);
            let mut snapshot = EngineRound {
                round,
                proposals: self.present(&values, dimensions),
                conflict_dimension: Some(dimensions[conflict_idx].id.clone()),
                conflict_level,
                concession: None,
            };

            if conflict_level == 0.0 {
                rounds.push(snapshot);
                status = SettlementStatus::Resolved;
                break;
            }

            snapshot.concession = Some(self.concede(&mut values, dimensions, conflict_idx));
            rounds.push(snapshot);
        }

        Ok(NegotiationOutcome {
            issue_id: issue_id.to_string(),
            status,
            compromise: Self::compromise(&values, dimensions),
            rounds,
            final_proposals: self.present(&values, dimensions),
        })
    }

    /// Widest dimension: spread for numbers, distinct options minus one for enums.
    /// Ties go to the earlier dimension.
    fn conflict(values: &[Vec<f64>], dimensions: &[Dimension]) -> (usize, f64) {
        let mut best = (0, -1.0);
        for (d, dimension) in dimensions.iter().enumerate() {
            let column: Vec<f64> = values.iter().map(|row| row[d]).collect();
            let gap = if dimension.is_enum() {
                let mut distinct: Vec<i64> = column.iter().map(|v| v.round() as i64).collect();
                distinct.sort_unstable();
                distinct.dedup();
                (distinct.len() - 1) as f64
            } else {
                let max = column.iter().cloned().fold(f64::MIN, f64::max);
                let min = column.iter().cloned().fold(f64::MAX, f64::min);
                max - min
            };
            if gap > best.1 {
                best = (d, gap);
            }
        }
        best
    }

    fn concede(&self, values: &mut [Vec<f64>], dimensions: &[Dimension], d: usize) -> Concession {
        let dimension = &dimensions[d];
        let before = self.column(values, dimension, d);
        let mean = values.iter().map(|row| row[d]).sum::<f64>() / values.len() as f64;
        // enum positions stay fractional so small pulls accumulate
        for row in values.iter_mut() {
            row[d] = row[d] * CONCESSION_KEEP + mean * (1.0 - CONCESSION_KEEP);
        }
        Concession {
            dimension: dimension.id.clone(),
            before,
            after: self.column(values, dimension, d),
            positions: self
                .negotiators
                .iter()
                .zip(values.iter())
                .map(|(n, row)| (n.id.clone(), row[d]))
                .collect(),
        }
    }

    /// Per-dimension median; enums take the lower median option.
    fn compromise(values: &[Vec<f64>], dimensions: &[Dimension]) -> BTreeMap<String, DimensionValue> {
        dimensions
            .iter()
            .enumerate()
            .map(|(d, dimension)| {
                let mut column: Vec<f64> = values.iter().map(|row| row[d]).collect();
                column.sort_by(|a, b| a.total_cmp(b));
                let n = column.len();
                let median = if dimension.is_enum() {
                    column[(n - 1) / 2]
                } else if n % 2 == 1 {
                    column[n / 2]
                } else {
                    (column[n / 2 - 1] + column[n / 2]) / 2.0
                };
                (dimension.id.clone(), dimension.value_at(median))
            })
            .collect()
    }

    fn column(&self, values: &[Vec<f64>], dimension: &Dimension, d: usize) -> BTreeMap<String, DimensionValue> {
        self.negotiators
            .iter()
            .zip(values)
            .map(|(n, row)| (n.id.clone(), dimension.value_at(row[d])))
            .collect()
    }

    fn present(
        &self,
        values: &[Vec<f64>],
        dimensions: &[Dimension],
    ) -> BTreeMap<String, BTreeMap<String, DimensionValue>> {
        self.negotiators
            .iter()
            .zip(values)
            .map(|(n, row)| {
                let proposals = dimensions
                    .iter()
                    .zip(row)
                    .map(|(dim, v)| (dim.id.clone(), dim.value_at(*v)))
                    .collect();
                (n.id.clone(), proposals)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finance() -> Negotiator {
        Negotiator::new("finance").with_weight("financial_cost", 0.6)
    }

    fn environment() -> Negotiator {
        Negotiator::new("environment").with_weight("environmental_benefit", 0.7)
    }

    fn planning() -> Negotiator {
        Negotiator::new("planning").with_weight("financial_cost", 0.2)
    }

    #[test]
    fn test_department_negotiators_follow_profiles() {
        let negotiators = Negotiator::departments();
        assert_eq!(negotiators.len(), 6);
        assert_eq!(negotiators[0].id, "finance");
        assert!(negotiators[0].weighs("financial_cost"));

        let dim = Dimension::continuous("subsidy", 0.0, 100.0);
        let environment = negotiators.iter().find(|n| n.id == "environment").unwrap();
        assert_eq!(NegotiationEngine::propose(environment, &dim), 90.0);
    }

    #[test]
    fn test_propose_continuous_rules() {
        let dim = Dimension::continuous("subsidy", 0.0, 100.0);
        assert_eq!(NegotiationEngine::propose(&finance(), &dim), 20.0);
        assert_eq!(NegotiationEngine::propose(&environment(), &dim), 90.0);
        assert_eq!(NegotiationEngine::propose(&planning(), &dim), 50.0);
    }

    #[test]
    fn test_propose_enum_rules() {
        let dim = Dimension::options("scope", vec!["pilot", "regional", "national"], Some("regional"));
        let security = Negotiator::new("security").with_weight("security_risk", 0.5);
        let industry = Negotiator::new("industry").with_weight("industry_growth", 0.9);
        assert_eq!(NegotiationEngine::propose(&security, &dim), 0.0);
        assert_eq!(NegotiationEngine::propose(&industry, &dim), 2.0);
        assert_eq!(NegotiationEngine::propose(&planning(), &dim), 1.0);
    }

    #[test]
    fn test_identical_proposals_resolve_in_first_round() {
        let engine = NegotiationEngine::new(vec![planning(), Negotiator::new("legal")]);
        let dims = vec![Dimension::continuous("subsidy", 0.0, 100.0)];
        let outcome = engine.run("i1", &dims).unwrap();

        assert_eq!(outcome.status, SettlementStatus::Resolved);
        assert_eq!(outcome.rounds.len(), 1);
        assert_eq!(outcome.rounds[0].conflict_level, 0.0);
        assert_eq!(outcome.compromise["subsidy"], DimensionValue::Number(50.0));
    }

    #[test]
    fn test_diverging_proposals_force_median() {
        let engine = NegotiationEngine::new(vec![finance(), environment(), planning()]);
        let dims = vec![Dimension::continuous("subsidy", 0.0, 100.0)];
        let outcome = engine.run("i1", &dims).unwrap();

        assert_eq!(outcome.status, SettlementStatus::ForcedResolution);
        assert_eq!(outcome.rounds_run(), 3);

        let mut finals: Vec<f64> = outcome
            .final_proposals
            .values()
            .map(|p| match p["subsidy"] {
                DimensionValue::Number(n) => n,
                _ => panic!("expected a number"),
            })
            .collect();
        finals.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(outcome.compromise["subsidy"], DimensionValue::Number(finals[1]));
    }

    #[test]
    fn test_concessions_carry_forward() {
        let engine = NegotiationEngine::new(vec![finance(), environment()]);
        let dims = vec![Dimension::continuous("subsidy", 0.0, 100.0)];
        let outcome = engine.run("i1", &dims).unwrap();

        // spread 70 shrinks by 0.8 every round
        let levels: Vec<f64> = outcome.rounds.iter().map(|r| r.conflict_level).collect();
        assert!((levels[0] - 70.0).abs() < 1e-9);
        assert!((levels[1] - 56.0).abs() < 1e-9);
        assert!((levels[2] - 44.8).abs() < 1e-9);
    }

    #[test]
    fn test_conflict_picks_widest_dimension() {
        let engine = NegotiationEngine::new(vec![finance(), environment()]);
        let dims = vec![
            Dimension::options("scope", vec!["pilot", "national"], None),
            Dimension::continuous("subsidy", 0.0, 10.0),
        ];
        let outcome = engine.run("i1", &dims).unwrap();
        // enum gap 0, continuous gap 7
        assert_eq!(outcome.rounds[0].conflict_dimension.as_deref(), Some("subsidy"));
        assert_eq!(outcome.compromise["scope"], DimensionValue::Option("pilot".to_string()));
    }

    #[test]
    fn test_enum_lower_median() {
        let security = Negotiator::new("security").with_weight("security_risk", 0.5);
        let industry = Negotiator::new("industry").with_weight("industry_growth", 0.9);
        let engine = NegotiationEngine::new(vec![security, industry]);
        let dims = vec![Dimension::options("scope", vec!["pilot", "regional", "national"], None)];
        let outcome = engine.run("i1", &dims).unwrap();

        assert_eq!(outcome.status, SettlementStatus::ForcedResolution);
        assert_eq!(outcome.compromise["scope"], DimensionValue::Option("pilot".to_string()));
    }

    #[test]
    fn test_enum_concessions_accumulate() {
        let engine = NegotiationEngine::new(Negotiator::departments()).with_max_rounds(8);
        let dims = vec![
            Dimension::options("rollout", vec!["pilot", "phased", "citywide"], Some("phased")),
            Dimension::continuous("subsidy", 0.0, 1.0),
        ];
        let outcome = engine.run("transit", &dims).unwrap();

        let first = outcome.rounds[0].concession.as_ref().unwrap();
        assert_eq!(first.dimension, "rollout");
        assert!((first.positions["security"] - 0.2).abs() < 1e-9);
        assert!((first.positions["industry"] - 1.8).abs() < 1e-9);

        // once rollout rounds to one option, subsidy becomes the conflict
        let subsidy_round = outcome
            .rounds
            .iter()
            .position(|r| r.conflict_dimension.as_deref() == Some("subsidy"))
            .unwrap();
        assert!(subsidy_round > 0);
        assert_eq!(outcome.rounds[subsidy_round - 1].conflict_dimension.as_deref(), Some("rollout"));
        let moved = outcome.rounds[subsidy_round].concession.as_ref().unwrap();
        assert!(moved.positions["finance"] > 0.2);
        assert!(moved.positions["environment"] < 0.9);
        assert_eq!(outcome.compromise["rollout"], DimensionValue::Option("phased".to_string()));
    }

    #[test]
    fn test_run_rejects_empty_inputs() {
        let engine = NegotiationEngine::new(vec![]);
        assert!(engine.run("i1", &[Dimension::continuous("x", 0.0, 1.0)]).is_err());

        let engine = NegotiationEngine::new(vec![finance()]);
        assert!(engine.run("i1", &[]).is_err());
    }
}
