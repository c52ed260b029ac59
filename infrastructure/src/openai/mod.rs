//! OpenAI-compatible chat completions adapter
//!
//! Talks to any endpoint exposing `POST {base_url}/chat/completions`
//! (DashScope compatible mode, vLLM, local servers). Sessions keep their
//! history locally and can run a bounded tool-calling loop.

mod error;
mod gateway;
mod protocol;
mod session;

pub use error::ChatError;
pub use gateway::{ChatGateway, ChatGatewayConfig};
pub use session::ChatSession;
