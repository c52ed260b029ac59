//! Prompt templates for council actors

use crate::agent::entities::AgentPlan;
use crate::agent::value_objects::{AgentId, RoleProfile};
use crate::core::string::truncate;
use crate::dispute::entities::Dispute;
use crate::policy::entities::{Constraints, Issue, PolicyCard};
use crate::workflow::stage::Stage;
use crate::workflow::state::Observation;

/// Templates for generating council prompts
pub struct CouncilPromptTemplate;

impl CouncilPromptTemplate {
    /// System prompt for a department head
    pub fn department_system(profile: &RoleProfile) -> String {
        format!(
            r#"You lead the {name}. Your remit:
{backstory}

Your goal: {goal}

During deliberation you:
1. Analyse the proposal from the {name}'s point of view
2. State the department's position, concerns and recommendations
3. Communicate and coordinate with the other departments
4. Take part in negotiation to settle disagreements
5. Use the analysis tools where they help

Stay professional and objective throughout."#,
            name = profile.name,
            backstory = profile.backstory,
            goal = profile.goal,
        )
    }

    /// System prompt for the coordinating office
    pub fn office_system() -> String {
        r#"You are the coordinator at the General Office. Your remit:
1. Collect the departments' memos and views
2. Identify the points of disagreement between departments
3. Organise coordination and negotiation
4. Move the decision process forward
5. Make sure information flows between departments

Stay neutral and objective; your aim is consensus."#
            .to_string()
    }

    /// System prompt for the final decision maker
    pub fn decider_system() -> String {
        r#"You are the final decision maker. Your remit:
1. Weigh every department's view
2. Take the review gate results into account
3. Balance the policy's benefits against its costs
4. Decide whether to approve the policy
5. If approving, give the final policy text and conditions
6. If not approving, explain why

Be objective and rational and give a clear rationale."#
            .to_string()
    }

    fn policy_block(card: Option<&PolicyCard>) -> String {
        match card {
            Some(card) => format!(
                "Policy title: {}\nSummary: {}\nEstimated budget: {:.0}\nDuration: {} months\nKey measures: {}",
                card.title,
                card.summary,
                card.estimated_budget,
                card.duration_months,
                card.key_measures.join(", ")
            ),
            None => "No policy card yet.".to_string(),
        }
    }

    /// Reflection prompt for a department
    pub fn department_thinking(profile: &RoleProfile, obs: &Observation) -> String {
        format!(
            r#"Current situation:
{policy}

Issue: {title}
Description: {description}
Current stage: {stage}

You have {pending} pending message(s).

Consider:
1. From the {name}'s point of view, how good is this proposal?
2. What needs attention?
3. What is your position (support / oppose / conditional)?
4. What do you need to tell the other departments?
5. What should you do next?

Give your thinking and analysis."#,
            policy = Self::policy_block(obs.policy_card.as_ref()),
            title = obs.issue.title,
            description = obs.issue.description,
            stage = obs.stage,
            pending = obs.pending_messages.len(),
            name = profile.name,
        )
    }

    /// Reflection prompt for the office
    pub fn office_thinking(obs: &Observation) -> String {
        let memos = obs
            .memos
            .iter()
            .map(|m| format!("- {}: {} - {}", m.department, m.position, truncate(&m.rationale, 100)))
            .collect::<Vec<_>>()
            .join("\n");
        let disputes = obs
            .open_disputes
            .iter()
            .map(|d| format!("- {}: involves {}, severity {}", d.topic, join_ids(&d.departments), d.severity))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            r#"Current situation:
- {memo_count} department memo(s) received
- {dispute_count} open dispute(s)
- Current stage: {stage}

Memo summary:
{memos}

Open disputes:
{disputes}

Consider:
1. What needs coordinating now?
2. Which disputes should be handled first?
3. How should negotiation be organised?
4. What should happen next?"#,
            memo_count = obs.memos.len(),
            dispute_count = obs.open_disputes.len(),
            stage = obs.stage,
        )
    }

    /// Reflection prompt for the decider
    pub fn decider_thinking(obs: &Observation) -> String {
        let memos = obs
            .memos
            .iter()
            .map(|m| format!("- {}: {} - {}", m.department, m.position, truncate(&m.rationale, 150)))
            .collect::<Vec<_>>()
            .join("\n");
        let gates = obs
            .gate_results
            .iter()
            .map(|g| {
                format!(
                    "- {}: {} - {}",
                    g.gate_name,
                    if g.passed { "passed" } else { "failed" },
                    g.issues.join(", ")
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            r#"Prepare the final decision.

Issue: {title}
Policy: {policy}

Department views:
{memos}

Review gates:
{gates}

Open disputes: {open}

Weigh all of the above before deciding."#,
            title = obs.issue.title,
            policy = obs.policy_card.as_ref().map(|c| c.title.as_str()).unwrap_or("unknown"),
            open = obs.open_disputes.len(),
        )
    }

    /// Ask for a short structured plan
    pub fn planning(profile: &RoleProfile, goal: &str, obs: &Observation) -> String {
        let peers = obs
            .peers
            .iter()
            .map(|(id, p)| format!("{}={}", id, p.status))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            r#"As the {name}, your goal is: {goal}

Current environment:
- Policy: {policy}
- Current stage: {stage}
- Stage task: {hint}
- Other actors: {peers}

Make an execution plan of 2-4 steps for this stage. Each step needs:
1. a clear description
2. the action to perform; action_type must be one of: generate_memo, send_message, request_info, propose_solution, negotiate, review, decide, use_tool
3. the ids of steps it depends on, if any
4. optional params (to_agent, content, query, proposal, dispute_id, tool_name, arguments)

Reply with JSON only:
```json
{{
  "goal": "goal description",
  "steps": [
    {{"step_id": "step_1", "description": "...", "action_type": "...", "dependencies": [], "params": {{}}}}
  ]
}}
```"#,
            name = profile.name,
            policy = obs.policy_card.as_ref().map(|c| c.title.as_str()).unwrap_or("unknown"),
            stage = obs.stage,
            hint = obs.stage.planning_hint(),
        )
    }

    /// Ask for a revised plan
    pub fn plan_revision(plan: &AgentPlan, reason: &str, stage: Stage, policy_title: &str) -> String {
        let current = serde_json::to_string_pretty(plan).unwrap_or_default();
        format!(
            r#"Current plan:
{current}

Reason for revision: {reason}

Current environment:
- Stage: {stage}
- Policy: {policy_title}

Update the plan: change unfinished steps, add new ones or drop ones no longer needed.
Reply with JSON only, in the same shape as the original planning request:
{{"goal": "...", "steps": [{{"step_id": "...", "description": "...", "action_type": "...", "dependencies": []}}]}}"#
        )
    }

    /// Ask a department for its memo
    pub fn memo_request(profile: &RoleProfile, card: &PolicyCard) -> String {
        format!(
            r#"As head of the {name}, give your department's opinion on this proposal:

{policy}

Answer from the {name}'s remit and goal, as JSON only:
```json
{{
  "position": "support | oppose | conditional",
  "rationale": "reasoning (about 200 words)",
  "concerns": ["concern 1", "concern 2"],
  "recommendations": ["recommendation 1", "recommendation 2"],
  "conditions": ["conditions for support"],
  "bottom_line": "what the department cannot accept"
}}
```"#,
            name = profile.name,
            policy = Self::policy_block(Some(card)),
        )
    }

    /// Ask a department to evaluate a proposal it received
    pub fn proposal_evaluation(profile: &RoleProfile, from: &AgentId, content: &str) -> String {
        format!(
            r#"You received a proposal from {from}:
{content}

Evaluate it:
1. Does it fit the {name}'s interests and position?
2. Is it acceptable?
3. What changes are needed?

Give your evaluation and reply."#,
            name = profile.name,
        )
    }

    /// Ask the office for a mediation proposal
    pub fn mediation(dispute: &Dispute) -> String {
        let positions = serde_json::to_string(&dispute.positions).unwrap_or_default();
        format!(
            r#"As coordinator, mediate the following dispute:

Topic: {topic}
Departments: {departments}
Positions: {positions}

Propose a mediation that helps the parties reach consensus. It should:
1. address every party's concerns
2. offer a workable compromise
3. state the adjustment each party needs to make

Give the proposal in under 100 words."#,
            topic = dispute.topic,
            departments = join_ids(&dispute.departments),
        )
    }

    /// Ask the decider for the final decision
    pub fn decision_request(obs: &Observation, disputes_total: usize) -> String {
        let card = obs
            .policy_card
            .as_ref()
            .and_then(|c| serde_json::to_string_pretty(c).ok())
            .unwrap_or_else(|| "none".to_string());
        let gates = obs
            .gate_results
            .iter()
            .map(|g| format!("{}:{}", g.gate_name, if g.passed { "passed" } else { "failed" }))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            r#"As the final decision maker, rule on the following:

Issue: {title}
Description: {description}

Policy card:
{card}

Department memos: {memos}
Disputes: {disputes_total}
Gate results: [{gates}]

Reply with JSON only:
```json
{{
  "approved": true,
  "final_policy_text": "final policy text (about 300 words)",
  "rationale": "rationale (about 200 words)",
  "conditions": ["condition 1", "condition 2"],
  "next_steps": ["next step 1", "next step 2"]
}}
```"#,
            title = obs.issue.title,
            description = obs.issue.description,
            memos = obs.memos.len(),
        )
    }

    /// Ask a reviewer for a gate verdict
    pub fn review_request(profile: &RoleProfile, stage: Stage, card: Option<&PolicyCard>, constraints: &Constraints) -> String {
        format!(
            r#"As head of the {name}, perform the {gate}.

{policy}

Constraints:
- Budget ceiling: {ceiling:.0}
- Legal requirements: {legal}
- Deadline: {deadline}

Reply with JSON only:
```json
{{"passed": true, "issues": ["issue found"], "recommendations": ["recommendation"]}}
```"#,
            name = profile.name,
            gate = stage.display_name(),
            policy = Self::policy_block(card),
            ceiling = constraints.budget_ceiling,
            legal = constraints.legal_requirements.join("; "),
            deadline = constraints.timeline_deadline.as_deref().unwrap_or("none"),
        )
    }

    /// Ask for the initial policy card
    pub fn intake(issue: &Issue) -> String {
        format!(
            r#"You are a policy analyst. Draft the initial policy card for this issue:

Issue: {title}
Description: {description}
Background: {background}
Urgency: {urgency}

Reply with JSON only:
```json
{{
  "title": "policy title",
  "summary": "summary (about 200 words)",
  "estimated_budget": 100000000,
  "duration_months": 12,
  "affected_population": 100000,
  "key_measures": ["measure"],
  "risk_factors": ["risk"]
}}
```"#,
            title = issue.title,
            description = issue.description,
            background = issue.background,
            urgency = issue.urgency,
        )
    }
}

fn join_ids(ids: &[AgentId]) -> String {
    ids.iter().map(AgentId::as_str).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::value_objects::AgentRole;
    use crate::workflow::state::SharedState;

    #[test]
    fn test_planning_prompt_names_stage_hint() {
        let mut state = SharedState::new("r", Issue::new("i", "Transit", "Buses"), Constraints::default());
        state.enter_stage(Stage::LegalReviewGate);
        let obs = state.observe(&AgentId::for_role(AgentRole::Legal));
        let profile = RoleProfile::for_role(AgentRole::Legal);
        let prompt = CouncilPromptTemplate::planning(&profile, "review", &obs);
        assert!(prompt.contains("legal_review_gate"));
        assert!(prompt.contains("action_type 'review'"));
    }

    #[test]
    fn test_memo_request_mentions_card() {
        let card = PolicyCard::fallback_for(&Issue::new("i", "Transit", "Buses"));
        let profile = RoleProfile::for_role(AgentRole::Finance);
        let prompt = CouncilPromptTemplate::memo_request(&profile, &card);
        assert!(prompt.contains("Ministry of Finance"));
        assert!(prompt.contains("Policy title: Transit"));
        assert!(prompt.contains("\"position\""));
    }
}
