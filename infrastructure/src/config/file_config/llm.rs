//! Reasoning service configuration from TOML (`[llm]` section)

use council_application::ModelProfile;
use serde::{Deserialize, Serialize};

/// OpenAI-compatible chat completions endpoint configuration.
///
/// # Example
///
/// ```toml
/// [llm]
/// base_url = "https://dashscope.aliyuncs.com/compatible-mode/v1"
/// api_key_env = "DASHSCOPE_API_KEY"
/// default_model = "qwen-plus"
/// decider_model = "qwen-max"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLlmConfig {
    /// Base URL; `/chat/completions` is appended
    pub base_url: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Direct API key (not recommended, use the env var instead)
    pub api_key: Option<String>,
    /// Model for departments, the office and intake
    pub default_model: String,
    /// Stronger model for the final decision
    pub decider_model: String,
    pub temperature: f64,
    pub decider_temperature: f64,
    /// Per-request timeout
    pub timeout_seconds: u64,
    /// Tool-calling round trips per request
    pub max_tool_iterations: usize,
}

impl Default for FileLlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://dashscope.aliyuncs.com/compatible-mode/v1".to_string(),
            api_key_env: "DASHSCOPE_API_KEY".to_string(),
            api_key: None,
            default_model: "qwen-plus".to_string(),
            decider_model: "qwen-max".to_string(),
            temperature: 0.7,
            decider_temperature: 0.3,
            timeout_seconds: 120,
            max_tool_iterations: 5,
        }
    }
}

impl FileLlmConfig {
    /// The direct key if set, otherwise the value of `api_key_env`
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|k| !k.trim().is_empty())
    }

    pub fn default_profile(&self) -> ModelProfile {
        ModelProfile::new(&self.default_model, self.temperature)
    }

    pub fn decider_profile(&self) -> ModelProfile {
        ModelProfile::new(&self.decider_model, self.decider_temperature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profiles() {
        let config = FileLlmConfig::default();
        assert_eq!(config.default_profile(), ModelProfile::new("qwen-plus", 0.7));
        assert_eq!(config.decider_profile(), ModelProfile::new("qwen-max", 0.3));
    }

    #[test]
    fn test_direct_key_wins() {
        let config = FileLlmConfig {
            api_key: Some("sk-direct".to_string()),
            api_key_env: "COUNCIL_TEST_UNSET_KEY_VAR".to_string(),
            ..FileLlmConfig::default()
        };
        assert_eq!(config.resolve_api_key().as_deref(), Some("sk-direct"));
    }

    #[test]
    fn test_missing_key() {
        let config = FileLlmConfig {
            api_key: Some("  ".to_string()),
            api_key_env: "COUNCIL_TEST_UNSET_KEY_VAR".to_string(),
            ..FileLlmConfig::default()
        };
        assert!(config.resolve_api_key().is_none());
    }
}
