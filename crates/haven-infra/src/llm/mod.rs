//! LLM provider implementations.
//!
//! Concrete implementations of the [`LlmProvider`] trait defined in
//! `haven-core`, plus a factory ([`create_provider`]) that picks one from
//! the assistant config.
//!
//! [`LlmProvider`]: haven_core::llm::provider::LlmProvider

pub mod canned;
pub mod openai_compat;

use haven_core::llm::box_provider::BoxLlmProvider;
use haven_types::config::{AssistantConfig, AssistantProvider};
use secrecy::SecretString;
use tracing::{info, warn};

use self::canned::CannedProvider;
use self::openai_compat::OpenAiCompatibleProvider;
use self::openai_compat::config::OpenAiCompatConfig;

/// Build the assistant's provider from config.
///
/// The OpenAI-compatible provider needs an API key; without one the canned
/// responder is used instead and a warning is logged.
pub fn create_provider(config: &AssistantConfig, api_key: Option<SecretString>) -> BoxLlmProvider {
    match (config.provider, api_key) {
        (AssistantProvider::OpenaiCompatible, Some(api_key)) => {
            info!(base_url = %config.base_url, model = %config.model, "using OpenAI-compatible assistant provider");
            BoxLlmProvider::new(OpenAiCompatibleProvider::new(OpenAiCompatConfig {
                provider_name: "openai_compatible".to_string(),
                base_url: config.base_url.clone(),
                api_key,
                model: config.model.clone(),
            }))
        }
        (AssistantProvider::OpenaiCompatible, None) => {
            warn!(
                env_var = %config.api_key_env,
                "no API key set for the assistant, falling back to canned replies"
            );
            BoxLlmProvider::new(CannedProvider::new())
        }
        (AssistantProvider::Canned, _) => BoxLlmProvider::new(CannedProvider::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use haven_core::llm::provider::LlmProvider;

    #[test]
    fn test_missing_key_falls_back_to_canned() {
        let provider = create_provider(&AssistantConfig::default(), None);
        assert_eq!(provider.name(), "canned");
    }

    #[test]
    fn test_key_selects_openai_compatible() {
        let provider = create_provider(
            &AssistantConfig::default(),
            Some(SecretString::from("sk-test".to_string())),
        );
        assert_eq!(provider.name(), "openai_compatible");
    }

    #[test]
    fn test_canned_ignores_key() {
        let config = AssistantConfig {
            provider: AssistantProvider::Canned,
            ..Default::default()
        };
        let provider = create_provider(&config, Some(SecretString::from("sk-test".to_string())));
        assert_eq!(provider.name(), "canned");
    }
}
