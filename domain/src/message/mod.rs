//! Inter-actor messaging

pub mod entities;

pub use entities::{AgentMessage, MessageId, MessageType};
