//! LLM Gateway port
//!
//! Defines the interface for communicating with the reasoning service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during LLM gateway operations
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Timeout")]
    Timeout,

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Other error: {0}")]
    Other(String),
}

/// Model selection for one actor: model name and sampling temperature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelProfile {
    pub name: String,
    pub temperature: f64,
}

impl ModelProfile {
    pub fn new(name: impl Into<String>, temperature: f64) -> Self {
        Self {
            name: name.into(),
            temperature,
        }
    }
}

impl Default for ModelProfile {
    fn default() -> Self {
        Self::new("qwen-plus", 0.7)
    }
}

impl std::fmt::Display for ModelProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.name, self.temperature)
    }
}

/// Gateway for LLM communication
///
/// This port defines how the application layer talks to the reasoning
/// service. Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Create a new session with a system prompt
    async fn create_session_with_system_prompt(
        &self,
        model: &ModelProfile,
        system_prompt: &str,
    ) -> Result<Box<dyn LlmSession>, GatewayError>;
}

/// An active LLM session
#[async_trait]
pub trait LlmSession: Send + Sync {
    /// Get the model used by this session
    fn model(&self) -> &ModelProfile;

    /// Send a message and get a response
    async fn send(&self, content: &str) -> Result<String, GatewayError>;

    /// Send a message letting the model call the deterministic tools, up to
    /// `max_iterations` round trips. After the cap the last text is returned.
    ///
    /// Default implementation ignores tools and calls `send()`.
    async fn send_with_tools(&self, content: &str, _max_iterations: usize) -> Result<String, GatewayError> {
        self.send(content).await
    }
}
