//! Action dispatch.
//!
//! Every [`ActionKind`] maps to exactly one handler. Bad input (missing
//! recipient, unknown dispute, missing kind) becomes a failed
//! [`ActionResult`] on that action; nothing here returns an error.

use super::{Actor, ActorError};
use council_domain::{
    Action, ActionKind, ActionRecord, ActionResult, AgentId, AgentMessage, AgentStatus,
    MessageType,
};
use serde_json::{Map, Value, json};
use tracing::debug;

impl Actor {
    /// Execute one action and remember it.
    pub async fn act(&mut self, action: Action) -> ActionResult {
        self.core.state.set_status(AgentStatus::Acting);
        self.core.state.current_task = Some(action.description.clone());

        let result = match action.kind {
            Some(kind) => self.dispatch(kind, &action).await,
            None => ActionResult::failure("action kind is missing"),
        };
        debug!("{} acted: {}", self.id(), result.summary());

        let record = ActionRecord::new(action.kind, action.description.clone(), result.clone());
        self.core.state.memory.record_action(record.clone());
        self.core.state.last_action = Some(record);
        result
    }

    async fn dispatch(&mut self, kind: ActionKind, action: &Action) -> ActionResult {
        match kind {
            ActionKind::GenerateMemo => {
                let obs = self.core.observation().await;
                self.behavior.generate_memo(&mut self.core, &obs).await
            }
            ActionKind::SendMessage => {
                let message_type = match action.param_str("message_type") {
                    Some(label) => match label.parse::<MessageType>() {
                        Ok(t) => t,
                        Err(e) => return ActionResult::failure(e),
                    },
                    None => MessageType::Notification,
                };
                let content = action.param_str("content").unwrap_or(&action.description);
                self.send(action, message_type, content.to_string(), "sent").await
            }
            ActionKind::RequestInfo => {
                let query = action.param_str("query").unwrap_or(&action.description);
                self.send(action, MessageType::Query, query.to_string(), "requested")
                    .await
            }
            ActionKind::ProposeSolution => {
                let proposal = action.param_str("proposal").unwrap_or(&action.description);
                self.send(action, MessageType::Proposal, proposal.to_string(), "proposed")
                    .await
            }
            ActionKind::Negotiate => self.negotiate(action).await,
            ActionKind::Review => self.review().await,
            ActionKind::Decide => {
                let obs = self.core.observation().await;
                match self.behavior.decide(&mut self.core, &obs).await {
                    Ok(decision) => ActionResult::success(json!({ "decision": decision })),
                    Err(e) => ActionResult::failure(e.to_string()),
                }
            }
            ActionKind::UseTool => self.use_tool(action).await,
        }
    }

    /// Point-to-point message to the action's `to_agent`
    async fn send(
        &mut self,
        action: &Action,
        message_type: MessageType,
        content: String,
        status: &str,
    ) -> ActionResult {
        let Some(to) = action.param_str("to_agent") else {
            return ActionResult::failure("to_agent must not be empty");
        };
        message_result(
            self.core
                .communicate(AgentId::new(to), message_type, content, Map::new())
                .await,
            status,
        )
    }

    /// Broadcast a proposal to every other party of a dispute.
    ///
    /// Without a `dispute_id` the first open dispute is used. The dispute
    /// enters negotiation.
    async fn negotiate(&mut self, action: &Action) -> ActionResult {
        let requested = action.param_str("dispute_id").map(str::to_string);
        let dispute = self
            .core
            .store
            .update(|s| {
                let id = requested.or_else(|| s.open_dispute_ids().into_iter().next())?;
                let dispute = s.dispute_mut(&id)?;
                if !dispute.is_resolved() {
                    dispute.begin_negotiation().ok()?;
                }
                let dispute = dispute.clone();
                s.touch();
                Some(dispute)
            })
            .await;
        let Some(dispute) = dispute else {
            return ActionResult::failure("dispute not found");
        };

        let proposal = action
            .param_str("proposal")
            .unwrap_or(&action.description)
            .to_string();
        let mut context = Map::new();
        context.insert("dispute_id".to_string(), Value::from(dispute.id.as_str()));

        let me = self.id().clone();
        let mut sent = Vec::new();
        for party in dispute.departments.iter().filter(|p| **p != me) {
            match self
                .core
                .communicate(party.clone(), MessageType::Proposal, proposal.clone(), context.clone())
                .await
            {
                Ok(message) => sent.push(json!({ "to": party, "message_id": message.id })),
                Err(e) => return ActionResult::failure(e.to_string()),
            }
        }

        ActionResult::success(json!({
            "status": "negotiating",
            "dispute_id": dispute.id,
            "messages": sent,
        }))
    }

    /// Call a deterministic tool, supplying the current policy card
    async fn use_tool(&mut self, action: &Action) -> ActionResult {
        let Some(tool_name) = action.param_str("tool_name").map(str::to_string) else {
            return ActionResult::failure("tool_name must not be empty");
        };
        let mut arguments = action
            .params
            .get("arguments")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        if !arguments.contains_key("policy_card") {
            let card = self.core.store.read(|s| s.policy_card.clone()).await;
            if let Some(card) = card
                && let Ok(value) = serde_json::to_value(&card)
            {
                arguments.insert("policy_card".to_string(), value);
            }
        }

        let result = self.core.tools.execute(&tool_name, &arguments).await;
        if let Some(error) = result.get("error").and_then(Value::as_str) {
            return ActionResult::failure(error);
        }
        ActionResult::success(json!({ "tool": tool_name, "result": result }))
    }
}

fn message_result(sent: Result<AgentMessage, ActorError>, status: &str) -> ActionResult {
    match sent {
        Ok(message) => ActionResult::success(json!({
            "message_id": message.id,
            "status": status,
        })),
        Err(e) => ActionResult::failure(e.to_string()),
    }
}
