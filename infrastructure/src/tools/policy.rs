//! Policy analysis tools: impact_estimate, public_opinion_sim,
//! stakeholder_analysis, risk_assessment, feasibility_check
//!
//! Every tool is a pure function of the policy card and one selector
//! argument. Unknown selector values fall back to the first table entry.

use council_application::ToolSchema;
use council_domain::PolicyCard;
use serde_json::{Value, json};

/// Tool name constants
pub const IMPACT_ESTIMATE: &str = "impact_estimate";
pub const PUBLIC_OPINION_SIM: &str = "public_opinion_sim";
pub const STAKEHOLDER_ANALYSIS: &str = "stakeholder_analysis";
pub const RISK_ASSESSMENT: &str = "risk_assessment";
pub const FEASIBILITY_CHECK: &str = "feasibility_check";

/// Budget above which the fiscal side of a proposal counts as heavy
const LARGE_BUDGET: f64 = 1e9;
const FINANCIAL_FEASIBILITY_LIMIT: f64 = 5e9;
const MAX_FEASIBLE_MONTHS: u32 = 60;
const MAX_FEASIBLE_MEASURES: usize = 10;

fn schema(name: &str, description: &str, selector: &str, selector_doc: &str, choices: &[&str]) -> ToolSchema {
    ToolSchema {
        name: name.to_string(),
        description: description.to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "policy_card": {
                    "type": "object",
                    "description": "Policy card with title, summary, budget and measures"
                },
                selector: {
                    "type": "string",
                    "description": selector_doc,
                    "enum": choices
                }
            },
            "required": ["policy_card", selector]
        }),
    }
}

/// Schemas of all policy tools, in a stable order
pub fn policy_tool_schemas() -> Vec<ToolSchema> {
    vec![
        schema(
            IMPACT_ESTIMATE,
            "Estimate the policy's effect on GDP, employment and inflation",
            "scenario",
            "Scenario assumption",
            &["baseline", "optimistic", "pessimistic"],
        ),
        ToolSchema {
            name: PUBLIC_OPINION_SIM.to_string(),
            description: "Simulate public reaction: support rate, volatility and key concerns".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "policy_card": { "type": "object", "description": "Policy card" },
                    "context": { "type": "string", "description": "Background the public is reacting to" }
                },
                "required": ["policy_card", "context"]
            }),
        },
        schema(
            STAKEHOLDER_ANALYSIS,
            "Analyse how the policy affects a group of stakeholders",
            "stakeholder_type",
            "Stakeholder group",
            &["citizens", "businesses", "government"],
        ),
        schema(
            RISK_ASSESSMENT,
            "Assess implementation risk in one category",
            "risk_category",
            "Risk category",
            &["financial", "operational", "legal", "social"],
        ),
        schema(
            FEASIBILITY_CHECK,
            "Check implementation feasibility from one angle",
            "aspect",
            "Feasibility aspect",
            &["technical", "financial", "timeline", "resource"],
        ),
    ]
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

pub fn impact_estimate(card: &PolicyCard, scenario: &str) -> Value {
    let multiplier = match scenario {
        "optimistic" => 1.5,
        "pessimistic" => 0.6,
        _ => 1.0,
    };
    let budget = card.estimated_budget;
    let affected = card.affected_population;

    json!({
        "gdp_delta": round_to(budget / 1e9 * 0.02 * multiplier, 4),
        "employment_delta": (budget / 1e6 * 5.0 * multiplier) as i64,
        "inflation_delta": round_to(budget / 1e10 * 0.001 * multiplier, 4),
        "distributional_notes": format!(
            "{} scenario: about {} direct beneficiaries and {} indirectly affected.",
            scenario,
            affected,
            affected.saturating_mul(3)
        ),
    })
}

pub fn public_opinion_sim(card: &PolicyCard, context: &str) -> Value {
    let risks = card.risk_factors.len();
    let support = (0.65 - risks as f64 * 0.05).clamp(0.3, 0.9);
    let volatility = 0.1 + risks as f64 * 0.02;

    let context = context.to_lowercase();
    let mut concerns = Vec::new();
    if context.contains("budget") || context.contains("fiscal") {
        concerns.push("fiscal burden");
    }
    if context.contains("time") || context.contains("urgen") {
        concerns.push("delivery timeliness");
    }
    if risks > 2 {
        concerns.push("policy risk");
    }
    if concerns.is_empty() {
        concerns.push("information transparency");
    }

    json!({
        "support_rate": round_to(support, 2),
        "volatility": round_to(volatility, 2),
        "key_concerns": concerns,
    })
}

pub fn stakeholder_analysis(card: &PolicyCard, stakeholder_type: &str) -> Value {
    let mut result = match stakeholder_type {
        "businesses" => json!({
            "impact_level": "medium",
            "benefits": ["market opportunities", "policy support"],
            "concerns": ["compliance cost", "shifts in competition"],
            "engagement_level": "medium"
        }),
        "government" => json!({
            "impact_level": "high",
            "benefits": ["policy goals met", "stronger governance capacity"],
            "concerns": ["fiscal pressure", "delivery difficulty"],
            "engagement_level": "high"
        }),
        _ => json!({
            "impact_level": "medium",
            "benefits": ["better public services", "improved living conditions"],
            "concerns": ["possible tax burden", "effectiveness of delivery"],
            "engagement_level": "high"
        }),
    };
    result["affected_population"] = json!(card.affected_population);
    result["policy_title"] = json!(card.title);
    result
}

pub fn risk_assessment(card: &PolicyCard, risk_category: &str) -> Value {
    let level = |heavy: bool| if heavy { "medium" } else { "low" };
    let mut result = match risk_category {
        "operational" => json!({
            "level": "medium",
            "risks": ["insufficient delivery capacity", "schedule slippage"],
            "mitigation": ["capacity building", "milestone monitoring"]
        }),
        "legal" => json!({
            "level": "low",
            "risks": ["weak legal basis", "procedural compliance"],
            "mitigation": ["complete the legal basis", "follow due process strictly"]
        }),
        "social" => json!({
            "level": level(card.risk_factors.len() > 2),
            "risks": ["public acceptance", "conflicting interests"],
            "mitigation": ["sustained communication", "benefit balancing mechanism"]
        }),
        _ => json!({
            "level": level(card.estimated_budget > LARGE_BUDGET),
            "risks": ["budget overrun", "unstable funding sources"],
            "mitigation": ["budget monitoring", "diversified funding"]
        }),
    };
    result["category"] = json!(risk_category);
    result["existing_risk_factors"] = json!(card.risk_factors);
    result
}

pub fn feasibility_check(card: &PolicyCard, aspect: &str) -> Value {
    let check = |feasible: bool, good: f64, poor: f64, issue: &str, recommendations: [&str; 2]| {
        json!({
            "feasible": feasible,
            "score": if feasible { good } else { poor },
            "issues": if feasible { Vec::new() } else { vec![issue] },
            "recommendations": recommendations,
        })
    };

    let mut result = match aspect {
        "financial" => check(
            card.estimated_budget <= FINANCIAL_FEASIBILITY_LIMIT,
            0.7,
            0.4,
            "budget is large",
            ["phase the rollout", "seek external funding"],
        ),
        "timeline" => check(
            card.duration_months <= MAX_FEASIBLE_MONTHS,
            0.75,
            0.5,
            "long delivery period",
            ["tighten the schedule", "manage the critical path"],
        ),
        "resource" => check(
            card.key_measures.len() <= MAX_FEASIBLE_MEASURES,
            0.7,
            0.5,
            "many measures, heavy resource demand",
            ["pool resources", "prioritise measures"],
        ),
        _ => json!({
            "feasible": true,
            "score": 0.8,
            "issues": ["needs technical support", "needs specialist staff"],
            "recommendations": ["validate the technical approach", "recruitment plan"]
        }),
    };
    result["aspect"] = json!(aspect);
    result
}
