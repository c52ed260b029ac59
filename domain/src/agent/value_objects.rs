//! Agent value objects - identifiers, roles and role profiles.
//!
//! # Identifiers
//! - [`AgentId`] - Unique identifier for a council actor (`agent_finance`, ...)
//! - [`StepId`] - Identifier of a step within an actor's plan
//!
//! # Roles
//! - [`AgentRole`] - The six departments, the coordinating office and the decider
//! - [`RoleProfile`] - Display name, goal, backstory and negotiation weights

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Unique identifier for a council actor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    /// Creates an AgentId from an existing string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Conventional id for the actor playing `role`.
    pub fn for_role(role: AgentRole) -> Self {
        Self(format!("agent_{}", role.as_str()))
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl<T: Into<String>> From<T> for AgentId {
    fn from(s: T) -> Self {
        Self::new(s)
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a step within a plan (e.g. "step_1").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepId(String);

impl StepId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<T: Into<String>> From<T> for StepId {
    fn from(s: T) -> Self {
        Self::new(s)
    }
}

impl std::fmt::Display for StepId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role an actor plays on the council
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentRole {
    Finance,
    Legal,
    Planning,
    Industry,
    Environment,
    Security,
    /// The coordinating office (secretariat)
    Office,
    Decider,
}

impl AgentRole {
    /// The six department roles, in creation order.
    pub const DEPARTMENTS: [AgentRole; 6] = [
        AgentRole::Finance,
        AgentRole::Legal,
        AgentRole::Planning,
        AgentRole::Industry,
        AgentRole::Environment,
        AgentRole::Security,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            AgentRole::Finance => "finance",
            AgentRole::Legal => "legal",
            AgentRole::Planning => "planning",
            AgentRole::Industry => "industry",
            AgentRole::Environment => "environment",
            AgentRole::Security => "security",
            AgentRole::Office => "office",
            AgentRole::Decider => "decider",
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            AgentRole::Finance => "Ministry of Finance",
            AgentRole::Legal => "Legal Affairs Office",
            AgentRole::Planning => "Planning Bureau",
            AgentRole::Industry => "Industry and IT Bureau",
            AgentRole::Environment => "Environmental Protection Bureau",
            AgentRole::Security => "Public Security Bureau",
            AgentRole::Office => "General Office",
            AgentRole::Decider => "Decision Maker",
        }
    }

    pub fn is_department(&self) -> bool {
        !matches!(self, AgentRole::Office | AgentRole::Decider)
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AgentRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "finance" => Ok(AgentRole::Finance),
            "legal" => Ok(AgentRole::Legal),
            "planning" => Ok(AgentRole::Planning),
            "industry" => Ok(AgentRole::Industry),
            "environment" => Ok(AgentRole::Environment),
            "security" => Ok(AgentRole::Security),
            "office" | "coordinator" | "secretariat" => Ok(AgentRole::Office),
            "decider" => Ok(AgentRole::Decider),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// Who an actor is: name, goal, backstory and what it weighs in negotiations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleProfile {
    pub role: AgentRole,
    pub name: String,
    pub goal: String,
    pub backstory: String,
    #[serde(default)]
    pub weights: BTreeMap<String, f64>,
}

impl RoleProfile {
    pub fn new(
        role: AgentRole,
        goal: impl Into<String>,
        backstory: impl Into<String>,
    ) -> Self {
        Self {
            role,
            name: role.display_name().to_string(),
            goal: goal.into(),
            backstory: backstory.into(),
            weights: BTreeMap::new(),
        }
    }

    pub fn with_weight(mut self, concern: impl Into<String>, weight: f64) -> Self {
        self.weights.insert(concern.into(), weight);
        self
    }

    /// Built-in profile for each council role.
    pub fn for_role(role: AgentRole) -> Self {
        match role {
            AgentRole::Finance => Self::new(
                role,
                "Keep public finances sustainable and budgets sound",
                "Manages the budget and reviews the fiscal impact and funding feasibility of every proposal",
            )
            .with_weight("financial_cost", 0.7)
            .with_weight("public_welfare", 0.3),
            AgentRole::Legal => Self::new(
                role,
                "Make sure the policy complies with law and regulation",
                "Performs legal review and compliance checks, insisting on a sound legal basis",
            )
            .with_weight("legal_compliance", 0.7)
            .with_weight("public_welfare", 0.3),
            AgentRole::Planning => Self::new(
                role,
                "Keep the policy coherent with the overall development plan",
                "Coordinates urban planning and cross-cutting policy, watching long-term and systemic effects",
            )
            .with_weight("coordination", 0.4)
            .with_weight("public_welfare", 0.4),
            AgentRole::Industry => Self::new(
                role,
                "Promote industrial development and digital transformation",
                "Drafts and executes industrial policy, focused on the effect on local industry",
            )
            .with_weight("industry_growth", 0.6)
            .with_weight("financial_cost", 0.2),
            AgentRole::Environment => Self::new(
                role,
                "Protect the environment and advance sustainable development",
                "Oversees environmental protection and ecological programs, focused on environmental impact",
            )
            .with_weight("environmental_benefit", 0.7)
            .with_weight("industry_growth", 0.1),
            AgentRole::Security => Self::new(
                role,
                "Keep implementation safe and stable",
                "Assesses security risks and runs emergency management, focused on safety impact",
            )
            .with_weight("security_risk", 0.6)
            .with_weight("public_welfare", 0.2),
            AgentRole::Office => Self::new(
                role,
                "Coordinate the departments, aggregate disagreements and drive consensus",
                "Coordinates departmental work, collects every view, identifies disputes and organises negotiation",
            ),
            AgentRole::Decider => Self::new(
                role,
                "Issue the final ruling that best serves the public interest",
                "Senior decision maker who weighs every department's view, the disputes and the review gates",
            ),
        }
    }
}
