//! [`PolicyToolExecutor`]: the concrete [`ToolExecutorPort`] for the council.
//!
//! ```text
//! ToolExecutorPort::execute(name, arguments)
//!   ├─ arguments["policy_card"] → PolicyCard (blank card if absent or malformed)
//!   ├─ known tool   → policy::<tool>(card, selector)
//!   └─ unknown tool → {"error": "unknown tool: <name>"}
//! ```

use super::policy::{
    self, FEASIBILITY_CHECK, IMPACT_ESTIMATE, PUBLIC_OPINION_SIM, RISK_ASSESSMENT,
    STAKEHOLDER_ANALYSIS,
};
use async_trait::async_trait;
use council_application::{ToolExecutorPort, ToolSchema};
use council_domain::PolicyCard;
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

/// Executor for the deterministic policy analysis tools
#[derive(Debug, Clone)]
pub struct PolicyToolExecutor {
    schemas: Vec<ToolSchema>,
}

impl PolicyToolExecutor {
    pub fn new() -> Self {
        Self {
            schemas: policy::policy_tool_schemas(),
        }
    }

    /// Run a tool synchronously
    pub fn execute_sync(&self, name: &str, arguments: &Map<String, Value>) -> Value {
        let card = policy_card(arguments);
        let selector = |key: &str, default: &'static str| -> String {
            arguments
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| default.to_string())
        };

        debug!("Executing tool {} for '{}'", name, card.title);
        match name {
            IMPACT_ESTIMATE => policy::impact_estimate(&card, &selector("scenario", "baseline")),
            PUBLIC_OPINION_SIM => policy::public_opinion_sim(&card, &selector("context", "")),
            STAKEHOLDER_ANALYSIS => {
                policy::stakeholder_analysis(&card, &selector("stakeholder_type", "citizens"))
            }
            RISK_ASSESSMENT => policy::risk_assessment(&card, &selector("risk_category", "financial")),
            FEASIBILITY_CHECK => policy::feasibility_check(&card, &selector("aspect", "technical")),
            _ => {
                warn!("Unknown tool requested: {}", name);
                json!({ "error": format!("unknown tool: {}", name) })
            }
        }
    }
}

impl Default for PolicyToolExecutor {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode the card argument; tools still answer for a blank card
fn policy_card(arguments: &Map<String, Value>) -> PolicyCard {
    let blank = || PolicyCard {
        title: String::new(),
        summary: String::new(),
        estimated_budget: 0.0,
        duration_months: 12,
        affected_population: 0,
        key_measures: Vec::new(),
        risk_factors: Vec::new(),
    };

    match arguments.get("policy_card") {
        None => blank(),
        Some(value) => serde_json::from_value(value.clone()).unwrap_or_else(|e| {
            warn!("policy_card argument not usable ({}), using a blank card", e);
            blank()
        }),
    }
}

#[async_trait]
impl ToolExecutorPort for PolicyToolExecutor {
    fn schemas(&self) -> Vec<ToolSchema> {
        self.schemas.clone()
    }

    fn has_tool(&self, name: &str) -> bool {
        self.schemas.iter().any(|s| s.name == name)
    }

    async fn execute(&self, name: &str, arguments: &Map<String, Value>) -> Value {
        self.execute_sync(name, arguments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_has_tool() {
        let executor = PolicyToolExecutor::new();
        assert!(executor.has_tool(IMPACT_ESTIMATE));
        assert!(executor.has_tool(FEASIBILITY_CHECK));
        assert!(!executor.has_tool("read_file"));
    }

    #[tokio::test]
    async fn test_execute_uses_card_argument() {
        let executor = PolicyToolExecutor::new();
        let result = executor
            .execute(
                IMPACT_ESTIMATE,
                &args(json!({
                    "policy_card": {"title": "Housing", "summary": "Build homes", "estimated_budget": 1e9},
                    "scenario": "optimistic"
                })),
            )
            .await;
        assert_eq!(result["gdp_delta"], json!(0.03));
        assert_eq!(result["employment_delta"], json!(7500));
    }

    #[tokio::test]
    async fn test_missing_selector_uses_default() {
        let executor = PolicyToolExecutor::new();
        let result = executor.execute(RISK_ASSESSMENT, &Map::new()).await;
        assert_eq!(result["category"], "financial");
        assert_eq!(result["level"], "low");
    }

    #[tokio::test]
    async fn test_malformed_card_falls_back_to_blank() {
        let executor = PolicyToolExecutor::new();
        let result = executor
            .execute(
                STAKEHOLDER_ANALYSIS,
                &args(json!({"policy_card": "not a card", "stakeholder_type": "businesses"})),
            )
            .await;
        assert_eq!(result["policy_title"], "");
        assert_eq!(result["engagement_level"], "medium");
    }

    #[tokio::test]
    async fn test_unknown_tool_returns_error_object() {
        let executor = PolicyToolExecutor::new();
        let result = executor.execute("launch_rockets", &Map::new()).await;
        assert_eq!(result, json!({"error": "unknown tool: launch_rockets"}));
    }
}
