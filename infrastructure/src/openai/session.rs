//! Chat completions session.
//!
//! Provides [`ChatSession`] which implements [`LlmSession`] by keeping the
//! conversation history locally and replaying it on every request.

use super::error::{ChatError, Result};
use super::gateway::ChatGatewayConfig;
use super::protocol::{ChatMessage, ChatRequest, ChatResponse, ToolCall, ToolSpec};
use async_trait::async_trait;
use council_application::{GatewayError, LlmSession, ModelProfile, ToolExecutorPort};
use futures::future::join_all;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// One conversation with one model
pub struct ChatSession {
    client: reqwest::Client,
    config: Arc<ChatGatewayConfig>,
    tools: Arc<dyn ToolExecutorPort>,
    model: ModelProfile,
    history: Mutex<Vec<ChatMessage>>,
}

impl ChatSession {
    pub(super) fn new(
        client: reqwest::Client,
        config: Arc<ChatGatewayConfig>,
        tools: Arc<dyn ToolExecutorPort>,
        model: ModelProfile,
        system_prompt: &str,
    ) -> Self {
        let history = if system_prompt.trim().is_empty() {
            Vec::new()
        } else {
            vec![ChatMessage::system(system_prompt)]
        };
        Self {
            client,
            config,
            tools,
            model,
            history: Mutex::new(history),
        }
    }

    async fn complete(&self, messages: &[ChatMessage], with_tools: bool) -> Result<ChatMessage> {
        let tools = with_tools
            .then(|| self.tools.schemas())
            .filter(|schemas| !schemas.is_empty())
            .map(|schemas| schemas.into_iter().map(ToolSpec::from).collect::<Vec<_>>());
        let request = ChatRequest {
            model: &self.model.name,
            messages,
            temperature: self.model.temperature,
            tool_choice: tools.as_ref().map(|_| "auto"),
            tools,
        };

        debug!("POST {} ({} messages)", self.config.endpoint(), messages.len());
        let response = self
            .client
            .post(self.config.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let raw = response.text().await?;
        if !status.is_success() {
            return Err(ChatError::Status {
                status: status.as_u16(),
                body: raw,
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&raw).map_err(|e| ChatError::ParseError {
            error: e.to_string(),
            raw: raw.clone(),
        })?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or(ChatError::EmptyResponse)
    }

    async fn run_tool(&self, call: &ToolCall) -> Value {
        let arguments = match serde_json::from_str::<Map<String, Value>>(call.function.arguments.trim()) {
            Ok(arguments) => arguments,
            Err(e) => {
                warn!(
                    "Unparseable arguments for {} ({}): {}",
                    call.function.name, e, call.function.arguments
                );
                Map::new()
            }
        };
        self.tools.execute(&call.function.name, &arguments).await
    }
}

#[async_trait]
impl LlmSession for ChatSession {
    fn model(&self) -> &ModelProfile {
        &self.model
    }

    async fn send(&self, content: &str) -> std::result::Result<String, GatewayError> {
        let mut history = self.history.lock().await;
        history.push(ChatMessage::user(content));

        let reply = self.complete(&history, false).await?;
        let text = reply.text().to_string();
        history.push(reply);
        Ok(text)
    }

    async fn send_with_tools(
        &self,
        content: &str,
        max_iterations: usize,
    ) -> std::result::Result<String, GatewayError> {
        let mut history = self.history.lock().await;
        history.push(ChatMessage::user(content));

        let mut last_text = String::new();
        for iteration in 0..max_iterations.max(1) {
            let reply = self.complete(&history, true).await?;
            last_text = reply.text().to_string();
            let calls = reply.tool_calls.clone();
            history.push(reply);

            if calls.is_empty() {
                return Ok(last_text);
            }

            debug!(
                "Iteration {}: {} tool call(s) requested",
                iteration + 1,
                calls.len()
            );
            let results = join_all(calls.iter().map(|call| self.run_tool(call))).await;
            for (call, result) in calls.iter().zip(results) {
                history.push(ChatMessage::tool_result(call, &result));
            }
        }

        warn!(
            "{} hit the tool iteration cap ({}), returning the last text",
            self.model.name, max_iterations
        );
        Ok(last_text)
    }
}
