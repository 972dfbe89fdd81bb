//! Offline assistant provider with fixed supportive replies.
//!
//! Used when no API key is configured. The reply is picked by how many user
//! turns the request holds, so a conversation cycles through the list.

use haven_core::llm::provider::LlmProvider;
use haven_types::llm::{CompletionRequest, CompletionResponse, LlmError, MessageRole, Usage};
use uuid::Uuid;

pub const CANNED_REPLIES: &[&str] = &[
    "I understand how you feel. Would you like to talk more about what's causing these emotions?",
    "That sounds challenging. Have you tried any coping strategies?",
    "I'm here to support you. Would it help to explore some relaxation techniques?",
    "Thank you for sharing that with me. How long have you been feeling this way?",
    "I'm listening. Sometimes expressing our feelings is the first step toward feeling better.",
];

#[derive(Debug, Default)]
pub struct CannedProvider;

impl CannedProvider {
    pub fn new() -> Self {
        Self
    }
}

impl LlmProvider for CannedProvider {
    fn name(&self) -> &str {
        "canned"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let user_turns = request
            .messages
            .iter()
            .filter(|m| m.role == MessageRole::User)
            .count();
        if user_turns == 0 {
            return Err(LlmError::InvalidRequest(
                "no user message to reply to".to_string(),
            ));
        }
        let content = CANNED_REPLIES[(user_turns - 1) % CANNED_REPLIES.len()];

        Ok(CompletionResponse {
            id: format!("canned-{}", Uuid::now_v7()),
            content: content.to_string(),
            model: "canned".to_string(),
            usage: Usage::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use haven_types::llm::Message;

    fn request(user_turns: usize) -> CompletionRequest {
        CompletionRequest {
            model: String::new(),
            messages: (0..user_turns)
                .map(|i| Message {
                    role: MessageRole::User,
                    content: format!("turn {i}"),
                })
                .collect(),
            system: None,
            max_tokens: 64,
            temperature: None,
        }
    }

    #[tokio::test]
    async fn test_cycles_through_replies() {
        let provider = CannedProvider::new();
        let first = provider.complete(&request(1)).await.unwrap();
        let second = provider.complete(&request(2)).await.unwrap();
        let wrapped = provider
            .complete(&request(CANNED_REPLIES.len() + 1))
            .await
            .unwrap();
        assert_eq!(first.content, CANNED_REPLIES[0]);
        assert_eq!(second.content, CANNED_REPLIES[1]);
        assert_eq!(wrapped.content, CANNED_REPLIES[0]);
    }

    #[tokio::test]
    async fn test_requires_user_message() {
        let provider = CannedProvider::new();
        assert!(matches!(
            provider.complete(&request(0)).await,
            Err(LlmError::InvalidRequest(_))
        ));
    }
}
