//! Deriving disputes from department memos

use super::entities::{Dispute, Severity};
use crate::agent::value_objects::AgentId;
use crate::core::error::DomainError;
use crate::policy::entities::{Memo, Position};

pub const TOPIC_NECESSITY: &str = "Policy necessity and feasibility";
pub const TOPIC_BUDGET: &str = "Budget and implementation details";
pub const TOPIC_TIMELINE: &str = "Implementation details and timeline";

/// Result of an aggregation pass
#[derive(Debug, Clone, PartialEq)]
pub enum AggregationOutcome {
    /// New disputes to append
    Created(Vec<Dispute>),
    /// Disputes with the aggregation topics already exist
    AlreadyAggregated,
}

/// Build disputes from the memos.
///
/// - any `oppose` memo gives one high dispute over the opposers plus the
///   first supporter
/// - any `conditional` memo gives one medium dispute over the conditional
///   departments
/// - otherwise, if there are supporters, one low dispute over the first two
///
/// A department's latest memo counts. Errors when there are no memos.
pub fn aggregate_disputes(memos: &[Memo], existing: &[Dispute]) -> Result<AggregationOutcome, DomainError> {
    if memos.is_empty() {
        return Err(DomainError::InvalidArgument("no department memos yet".to_string()));
    }
    if existing
        .iter()
        .any(|d| [TOPIC_NECESSITY, TOPIC_BUDGET, TOPIC_TIMELINE].contains(&d.topic.as_str()))
    {
        return Ok(AggregationOutcome::AlreadyAggregated);
    }

    // first-seen department order, latest position
    let mut positions: Vec<(&str, Position)> = Vec::new();
    for memo in memos {
        match positions.iter_mut().find(|(d, _)| *d == memo.department) {
            Some(entry) => entry.1 = memo.position,
            None => positions.push((memo.department.as_str(), memo.position)),
        }
    }
    let with = |p: Position| -> Vec<&str> {
        positions
            .iter()
            .filter(|(_, pos)| *pos == p)
            .map(|(d, _)| *d)
            .collect()
    };
    let opposers = with(Position::Oppose);
    let conditionals = with(Position::Conditional);
    let supporters = with(Position::Support);

    let mut created: Vec<Dispute> = Vec::new();
    let next_id = |created: &[Dispute]| format!("dispute_{}", existing.len() + created.len() + 1);

    if !opposers.is_empty() {
        let mut dispute = Dispute::new(next_id(&created), TOPIC_NECESSITY, Severity::High);
        for d in &opposers {
            dispute = dispute.with_party(AgentId::new(*d), Position::Oppose.as_str());
        }
        if let Some(s) = supporters.first() {
            dispute = dispute.with_party(AgentId::new(*s), Position::Support.as_str());
        }
        created.push(dispute);
    }

    if !conditionals.is_empty() {
        let mut dispute = Dispute::new(next_id(&created), TOPIC_BUDGET, Severity::Medium);
        for d in &conditionals {
            dispute = dispute.with_party(AgentId::new(*d), Position::Conditional.as_str());
        }
        created.push(dispute);
    }

    if created.is_empty() && !supporters.is_empty() {
        let mut dispute = Dispute::new(next_id(&created), TOPIC_TIMELINE, Severity::Low);
        for d in supporters.iter().take(2) {
            dispute = dispute.with_party(AgentId::new(*d), Position::Support.as_str());
        }
        created.push(dispute);
    }

    Ok(AggregationOutcome::Created(created))
}
