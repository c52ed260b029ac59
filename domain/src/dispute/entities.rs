//! Dispute entities

use crate::agent::value_objects::AgentId;
use crate::core::error::DomainError;
use crate::core::string::clip_chars;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum stored length of a resolution text, in characters
pub const RESOLUTION_MAX_CHARS: usize = 200;

/// How serious a dispute is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }

    /// Ordering weight (high 3, medium 2, low 1)
    pub fn weight(&self) -> u8 {
        match self {
            Severity::Low => 1,
            Severity::Medium => 2,
            Severity::High => 3,
        }
    }

    /// Chance a dispute of this severity settles in `round` (1-based).
    ///
    /// Grows with the round number and reaches certainty after two rounds
    /// for low, four for medium and five for high severity.
    pub fn resolve_probability(&self, round: u32) -> f64 {
        let table: &[f64] = match self {
            Severity::Low => &[0.6, 1.0],
            Severity::Medium => &[0.2, 0.4, 0.8, 1.0],
            Severity::High => &[0.1, 0.3, 0.5, 0.7, 1.0],
        };
        match round {
            0 => table[0],
            r => table.get(r as usize - 1).copied().unwrap_or(1.0),
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Dispute status. Only moves unresolved -> negotiating -> resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DisputeStatus {
    #[default]
    Unresolved,
    Negotiating,
    Resolved,
}

impl DisputeStatus {
    pub fn as_str(&self) -> &str {
        match self {
            DisputeStatus::Unresolved => "unresolved",
            DisputeStatus::Negotiating => "negotiating",
            DisputeStatus::Resolved => "resolved",
        }
    }
}

impl std::fmt::Display for DisputeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recorded disagreement among departments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dispute {
    pub id: String,
    pub departments: Vec<AgentId>,
    pub topic: String,
    /// department id -> stated position
    #[serde(default)]
    pub positions: BTreeMap<String, String>,
    pub severity: Severity,
    status: DisputeStatus,
    pub resolution: Option<String>,
}

impl Dispute {
    pub fn new(id: impl Into<String>, topic: impl Into<String>, severity: Severity) -> Self {
        Self {
            id: id.into(),
            departments: Vec::new(),
            topic: topic.into(),
            positions: BTreeMap::new(),
            severity,
            status: DisputeStatus::Unresolved,
            resolution: None,
        }
    }

    pub fn with_party(mut self, department: AgentId, position: impl Into<String>) -> Self {
        self.positions.insert(department.to_string(), position.into());
        if !self.departments.contains(&department) {
            self.departments.push(department);
        }
        self
    }

    pub fn status(&self) -> DisputeStatus {
        self.status
    }

    pub fn is_resolved(&self) -> bool {
        self.status == DisputeStatus::Resolved
    }

    fn advance(&mut self, next: DisputeStatus) -> Result<(), DomainError> {
        if next <= self.status {
            return Err(DomainError::InvalidTransition {
                entity: "dispute",
                from: self.status.as_str().to_string(),
                to: next.as_str().to_string(),
            });
        }
        self.status = next;
        Ok(())
    }

    /// Move an unresolved dispute into negotiation. No-op when already
    /// negotiating.
    pub fn begin_negotiation(&mut self) -> Result<(), DomainError> {
        if self.status == DisputeStatus::Negotiating {
            return Ok(());
        }
        self.advance(DisputeStatus::Negotiating)
    }

    /// Settle the dispute, keeping at most [`RESOLUTION_MAX_CHARS`] of the text.
    pub fn resolve(&mut self, resolution: &str) -> Result<(), DomainError> {
        self.advance(DisputeStatus::Resolved)?;
        self.resolution = Some(clip_chars(resolution, RESOLUTION_MAX_CHARS));
        Ok(())
    }
}

/// Record of one workflow negotiation round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegotiationRound {
    pub round_number: u32,
    pub disputes_addressed: Vec<String>,
    /// dispute id -> resolution text
    pub resolutions: BTreeMap<String, String>,
    pub remaining_disputes: Vec<String>,
    pub convergence_score: f64,
    pub timestamp: DateTime<Utc>,
}

impl NegotiationRound {
    pub fn new(round_number: u32) -> Self {
        Self {
            round_number,
            disputes_addressed: Vec::new(),
            resolutions: BTreeMap::new(),
            remaining_disputes: Vec::new(),
            convergence_score: 0.0,
            timestamp: Utc::now(),
        }
    }
}
