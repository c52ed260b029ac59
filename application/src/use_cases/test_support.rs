//! Test doubles shared by the use case tests

use crate::ports::llm_gateway::{GatewayError, LlmGateway, LlmSession, ModelProfile};
use crate::ports::tool_executor::{ToolExecutorPort, ToolSchema};
use crate::use_cases::shared_store::SharedStore;
use async_trait::async_trait;
use council_domain::{Constraints, Issue, PolicyCard, SharedState};
use serde_json::{Map, Value, json};
use std::sync::{Arc, Mutex};

pub const INTAKE: &str = "Draft the initial policy card";
pub const PLANNING: &str = "Make an execution plan";
pub const MEMO: &str = "give your department's opinion";
pub const MEDIATION: &str = "mediate the following dispute";
pub const DECISION: &str = "rule on the following";
pub const REVIEW: &str = "Budget ceiling:";
pub const PROPOSAL: &str = "You received a proposal";

struct Script {
    rules: Vec<(String, String)>,
    fallback: String,
    failing: Vec<String>,
    prompts: Vec<(String, String)>,
}

/// Gateway answering by the first rule whose marker occurs in the prompt
#[derive(Clone)]
pub struct ScriptedGateway {
    script: Arc<Mutex<Script>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(Script {
                rules: Vec::new(),
                fallback: "Noted.".to_string(),
                failing: Vec::new(),
                prompts: Vec::new(),
            })),
        }
    }

    pub fn reply(self, marker: &str, reply: &str) -> Self {
        self.script
            .lock()
            .unwrap()
            .rules
            .push((marker.to_string(), reply.to_string()));
        self
    }

    /// Requests whose prompt contains `marker` fail
    pub fn fail_on(self, marker: &str) -> Self {
        self.script.lock().unwrap().failing.push(marker.to_string());
        self
    }

    /// (model name, prompt) of every request, in order
    pub fn prompts(&self) -> Vec<(String, String)> {
        self.script.lock().unwrap().prompts.clone()
    }

    pub fn count(&self, marker: &str) -> usize {
        self.prompts()
            .iter()
            .filter(|(_, p)| p.contains(marker))
            .count()
    }

    fn answer(&self, model: &ModelProfile, prompt: &str) -> Result<String, GatewayError> {
        let mut script = self.script.lock().unwrap();
        script.prompts.push((model.name.clone(), prompt.to_string()));
        if script.failing.iter().any(|m| prompt.contains(m.as_str())) {
            return Err(GatewayError::RequestFailed("scripted failure".to_string()));
        }
        Ok(script
            .rules
            .iter()
            .find(|(marker, _)| prompt.contains(marker.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| script.fallback.clone()))
    }
}

struct ScriptedSession {
    gateway: ScriptedGateway,
    model: ModelProfile,
}

#[async_trait]
impl LlmSession for ScriptedSession {
    fn model(&self) -> &ModelProfile {
        &self.model
    }

    async fn send(&self, content: &str) -> Result<String, GatewayError> {
        self.gateway.answer(&self.model, content)
    }
}

#[async_trait]
impl LlmGateway for ScriptedGateway {
    async fn create_session_with_system_prompt(
        &self,
        model: &ModelProfile,
        _system_prompt: &str,
    ) -> Result<Box<dyn LlmSession>, GatewayError> {
        Ok(Box::new(ScriptedSession {
            gateway: self.clone(),
            model: model.clone(),
        }))
    }
}

/// Tool executor that records calls and echoes its arguments
#[derive(Default)]
pub struct RecordingTools {
    pub calls: Mutex<Vec<(String, Map<String, Value>)>>,
}

#[async_trait]
impl ToolExecutorPort for RecordingTools {
    fn schemas(&self) -> Vec<ToolSchema> {
        vec![ToolSchema {
            name: "impact_estimate".to_string(),
            description: "Estimate impact".to_string(),
            parameters: json!({ "type": "object" }),
        }]
    }

    async fn execute(&self, name: &str, arguments: &Map<String, Value>) -> Value {
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), arguments.clone()));
        if self.has_tool(name) {
            json!({ "score": 0.8, "argument_count": arguments.len() })
        } else {
            json!({ "error": format!("unknown tool: {}", name) })
        }
    }
}

pub fn issue() -> Issue {
    Issue::new(
        "issue_transit",
        "Night bus network",
        "Extend public transit to night hours in the outer districts",
    )
}

/// Store holding a fresh run with a policy card already set
pub fn store_with_card() -> SharedStore {
    let issue = issue();
    let mut state = SharedState::new("run_test", issue.clone(), Constraints::default());
    state.set_policy_card(PolicyCard::fallback_for(&issue), "v0.1");
    SharedStore::new(state)
}

pub fn memo_json(position: &str) -> String {
    format!(
        "```json\n{{\"position\": \"{}\", \"rationale\": \"Weighed against our remit\", \"concerns\": [\"cost\"], \"recommendations\": [\"pilot first\"]}}\n```",
        position
    )
}

pub fn decision_json(approved: bool) -> String {
    format!(
        "```json\n{{\"approved\": {}, \"final_policy_text\": \"Night buses run on five lines\", \"rationale\": \"Balanced benefits\", \"conditions\": [\"Quarterly review\"], \"next_steps\": [\"Tender the routes\"]}}\n```",
        approved
    )
}
