//! Chat completions LLM Gateway implementation

use super::error::ChatError;
use super::session::ChatSession;
use crate::config::FileLlmConfig;
use async_trait::async_trait;
use council_application::{
    GatewayError, LlmGateway, LlmSession, ModelProfile, NoToolExecutor, ToolExecutorPort,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Endpoint settings shared by all sessions of a gateway
#[derive(Debug, Clone)]
pub struct ChatGatewayConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl ChatGatewayConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build from the `[llm]` section, resolving the API key
    pub fn from_file_config(config: &FileLlmConfig) -> Result<Self, GatewayError> {
        let api_key = config
            .resolve_api_key()
            .ok_or_else(|| ChatError::MissingApiKey(config.api_key_env.clone()))?;
        Ok(Self::new(&config.base_url, api_key)
            .with_timeout(Duration::from_secs(config.timeout_seconds.max(1))))
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// LLM Gateway for any OpenAI-compatible chat completions endpoint
pub struct ChatGateway {
    client: reqwest::Client,
    config: Arc<ChatGatewayConfig>,
    tools: Arc<dyn ToolExecutorPort>,
}

impl ChatGateway {
    pub fn new(config: ChatGatewayConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::ConnectionError(e.to_string()))?;

        info!("ChatGateway initialized for {}", config.base_url);

        Ok(Self {
            client,
            config: Arc::new(config),
            tools: Arc::new(NoToolExecutor),
        })
    }

    /// Tools offered to the model by `send_with_tools`
    pub fn with_tools(mut self, tools: Arc<dyn ToolExecutorPort>) -> Self {
        self.tools = tools;
        self
    }

    pub fn config(&self) -> &ChatGatewayConfig {
        &self.config
    }
}

#[async_trait]
impl LlmGateway for ChatGateway {
    async fn create_session_with_system_prompt(
        &self,
        model: &ModelProfile,
        system_prompt: &str,
    ) -> Result<Box<dyn LlmSession>, GatewayError> {
        Ok(Box::new(ChatSession::new(
            self.client.clone(),
            Arc::clone(&self.config),
            Arc::clone(&self.tools),
            model.clone(),
            system_prompt,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::PolicyToolExecutor;
    use serde_json::{Value, json};
    use std::sync::Mutex;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn serve(replies: Vec<Value>) -> (String, Arc<Mutex<Vec<Value>>>) {
        serve_raw(replies.into_iter().map(|r| (200, r.to_string())).collect()).await
    }

    /// Minimal HTTP server answering each request with the next canned response
    async fn serve_raw(replies: Vec<(u16, String)>) -> (String, Arc<Mutex<Vec<Value>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);

        tokio::spawn(async move {
            for (status, payload) in replies {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut buf = Vec::new();
                let mut chunk = [0u8; 4096];
                let body_start = loop {
                    let n = socket.read(&mut chunk).await.unwrap();
                    buf.extend_from_slice(&chunk[..n]);
                    if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                        break pos + 4;
                    }
                };
                let head = String::from_utf8_lossy(&buf[..body_start]).to_lowercase();
                let length: usize = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse().ok())
                    .unwrap_or(0);
                while buf.len() < body_start + length {
                    let n = socket.read(&mut chunk).await.unwrap();
                    buf.extend_from_slice(&chunk[..n]);
                }
                let body: Value = serde_json::from_slice(&buf[body_start..body_start + length]).unwrap();
                seen.lock().unwrap().push(body);

                let response = format!(
                    "HTTP/1.1 {} X\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    status,
                    payload.len(),
                    payload
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.unwrap();
            }
        });

        (format!("http://{}", addr), requests)
    }

    fn text_reply(text: &str) -> Value {
        json!({"choices": [{"message": {"role": "assistant", "content": text}, "finish_reason": "stop"}]})
    }

    fn tool_reply(id: &str, name: &str, arguments: &str) -> Value {
        json!({"choices": [{
            "message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{"id": id, "type": "function", "function": {"name": name, "arguments": arguments}}]
            },
            "finish_reason": "tool_calls"
        }]})
    }

    fn gateway(base_url: &str) -> ChatGateway {
        ChatGateway::new(ChatGatewayConfig::new(base_url, "sk-test"))
            .unwrap()
            .with_tools(Arc::new(PolicyToolExecutor::new()))
    }

    #[test]
    fn test_endpoint_joins_path() {
        let config = ChatGatewayConfig::new("http://localhost:8080/v1/", "k");
        assert_eq!(config.endpoint(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn test_missing_api_key_is_reported() {
        let config = FileLlmConfig {
            api_key: None,
            api_key_env: "COUNCIL_TEST_ABSENT_API_KEY".to_string(),
            ..FileLlmConfig::default()
        };
        let err = ChatGatewayConfig::from_file_config(&config).unwrap_err();
        assert!(err.to_string().contains("COUNCIL_TEST_ABSENT_API_KEY"));
    }

    #[tokio::test]
    async fn test_send_keeps_history() {
        let (url, requests) = serve(vec![text_reply("first"), text_reply("second")]).await;
        let session = gateway(&url)
            .create_session_with_system_prompt(&ModelProfile::new("qwen-plus", 0.7), "You are terse.")
            .await
            .unwrap();

        assert_eq!(session.send("one").await.unwrap(), "first");
        assert_eq!(session.send("two").await.unwrap(), "second");

        let requests = requests.lock().unwrap();
        assert_eq!(requests[0]["model"], "qwen-plus");
        assert!(requests[0].get("tools").is_none());
        let roles: Vec<_> = requests[1]["messages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["role"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
    }

    #[tokio::test]
    async fn test_tool_loop_runs_tools_then_returns_text() {
        let (url, requests) = serve(vec![
            tool_reply("call_1", "feasibility_check", "{\"aspect\": \"timeline\"}"),
            text_reply("Feasible within the timeline."),
        ])
        .await;
        let session = gateway(&url)
            .create_session_with_system_prompt(&ModelProfile::default(), "")
            .await
            .unwrap();

        let text = session.send_with_tools("Assess the timeline", 5).await.unwrap();
        assert_eq!(text, "Feasible within the timeline.");

        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0]["tool_choice"], "auto");
        assert_eq!(requests[0]["tools"].as_array().unwrap().len(), 5);
        let tool_message = requests[1]["messages"]
            .as_array()
            .unwrap()
            .iter()
            .find(|m| m["role"] == "tool")
            .cloned()
            .unwrap();
        assert_eq!(tool_message["tool_call_id"], "call_1");
        let result: Value = serde_json::from_str(tool_message["content"].as_str().unwrap()).unwrap();
        assert_eq!(result["aspect"], "timeline");
    }

    #[tokio::test]
    async fn test_tool_loop_stops_at_cap_without_error() {
        let (url, requests) = serve(vec![
            tool_reply("call_1", "risk_assessment", "{}"),
            tool_reply("call_2", "risk_assessment", "not json"),
        ])
        .await;
        let session = gateway(&url)
            .create_session_with_system_prompt(&ModelProfile::default(), "")
            .await
            .unwrap();

        let text = session.send_with_tools("Assess risk", 2).await.unwrap();
        assert_eq!(text, "");
        assert_eq!(requests.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_http_error_maps_to_gateway_error() {
        let (url, _) = serve_raw(vec![(401, "{\"error\":\"invalid key\"}".to_string())]).await;
        let session = gateway(&url)
            .create_session_with_system_prompt(&ModelProfile::default(), "")
            .await
            .unwrap();
        let err = session.send("hello").await.unwrap_err();
        assert!(matches!(err, GatewayError::RequestFailed(ref m) if m.contains("401")));
    }

    #[tokio::test]
    async fn test_garbage_body_is_malformed_response() {
        let (url, _) = serve_raw(vec![(200, "not json".to_string())]).await;
        let session = gateway(&url)
            .create_session_with_system_prompt(&ModelProfile::default(), "")
            .await
            .unwrap();
        let err = session.send("hello").await.unwrap_err();
        assert!(matches!(err, GatewayError::MalformedResponse(_)));
    }
}
