//! Error types for the chat completions adapter

use council_application::GatewayError;
use thiserror::Error;

/// Result type alias for chat completions operations
pub type Result<T> = std::result::Result<T, ChatError>;

/// Errors that can occur when talking to a chat completions endpoint
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse response: {error}\nRaw response: {raw}")]
    ParseError { error: String, raw: String },

    #[error("Response had no choices")]
    EmptyResponse,

    #[error("No API key configured (set {0})")]
    MissingApiKey(String),
}

impl From<ChatError> for GatewayError {
    fn from(error: ChatError) -> Self {
        match error {
            ChatError::Http(e) if e.is_timeout() => GatewayError::Timeout,
            ChatError::Http(e) if e.is_connect() => GatewayError::ConnectionError(e.to_string()),
            ChatError::Http(e) => GatewayError::RequestFailed(e.to_string()),
            e @ ChatError::Status { .. } => GatewayError::RequestFailed(e.to_string()),
            e @ (ChatError::ParseError { .. } | ChatError::EmptyResponse) => {
                GatewayError::MalformedResponse(e.to_string())
            }
            e @ ChatError::MissingApiKey(_) => GatewayError::Other(e.to_string()),
        }
    }
}
