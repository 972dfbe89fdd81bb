//! Global configuration types for Haven.
//!
//! `HavenConfig` represents the top-level `config.toml` in the data
//! directory. Every field has a default so an empty or missing file works.

use serde::{Deserialize, Serialize};

/// Default system prompt for the AI assistant.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a supportive mental health assistant for students. \
Listen carefully, respond with empathy, and suggest practical coping strategies. \
You do not give medical advice or diagnoses. If the user mentions self-harm or being in danger, \
encourage them to contact emergency services and to speak with one of our human counsellors.";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HavenConfig {
    #[serde(default)]
    pub assistant: AssistantConfig,

    #[serde(default)]
    pub realtime: RealtimeConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

/// Which completion backend the assistant uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssistantProvider {
    /// Any OpenAI-compatible chat completions endpoint.
    OpenaiCompatible,
    /// Offline fixed replies; used when no API key is available.
    Canned,
}

/// AI assistant settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(default = "default_provider")]
    pub provider: AssistantProvider,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: Option<f64>,

    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// How many recent messages are sent as context.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_provider() -> AssistantProvider {
    AssistantProvider::OpenaiCompatible
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_max_tokens() -> u32 {
    512
}

fn default_temperature() -> Option<f64> {
    Some(0.7)
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

fn default_history_limit() -> usize {
    20
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            system_prompt: default_system_prompt(),
            history_limit: default_history_limit(),
        }
    }
}

/// Realtime change-feed settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Broadcast channel capacity; slower subscribers lag past this.
    #[serde(default = "default_feed_capacity")]
    pub feed_capacity: usize,
}

fn default_feed_capacity() -> usize {
    1024
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            feed_capacity: default_feed_capacity(),
        }
    }
}

/// Defaults for `haven serve` when flags are not given.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}
