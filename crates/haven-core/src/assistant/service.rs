//! Assistant service: one user turn in, one AI reply out.
//!
//! The conversation is loaded (or started), the recent history is sent to
//! the provider, and the exchange is persisted only after the provider
//! answers. Provider errors are returned as-is; there is no retry.

use haven_types::assistant::{ASSISTANT_GREETING, AiConversation, AssistantReply, Intent};
use haven_types::config::AssistantConfig;
use haven_types::error::AssistantError;
use haven_types::identity::Principal;
use haven_types::llm::{CompletionRequest, Message};
use haven_types::message::{ChatMessage, SenderRole};
use tracing::{info, warn};
use uuid::Uuid;

use crate::assistant::intent::detect_intent;
use crate::llm::provider::LlmProvider;
use crate::repository::conversation::ConversationRepository;

/// Appended to every reply when crisis language is detected.
pub const CRISIS_NOTICE: &str = "If you are in immediate danger or thinking about harming yourself, \
please contact your local emergency number or a crisis line right now. \
You can also request an urgent session with one of our counsellors.";

/// Appended when the user asks for a human.
pub const ESCALATION_NOTICE: &str =
    "If you'd like to talk with one of our counsellors, you can request an expert session at any time.";

pub struct AssistantService<C: ConversationRepository, P: LlmProvider> {
    conversations: C,
    provider: P,
    config: AssistantConfig,
}

impl<C: ConversationRepository, P: LlmProvider> AssistantService<C, P> {
    pub fn new(conversations: C, provider: P, config: AssistantConfig) -> Self {
        Self {
            conversations,
            provider,
            config,
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn conversations(&self) -> &C {
        &self.conversations
    }

    /// Reply to `text`, continuing `conversation_id` or starting a new one.
    pub async fn reply(
        &self,
        principal: &Principal,
        conversation_id: Option<Uuid>,
        text: &str,
    ) -> Result<AssistantReply, AssistantError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AssistantError::Validation(
                "message cannot be empty".to_string(),
            ));
        }

        let (mut conversation, is_new) = match conversation_id {
            Some(id) => (self.get_conversation(principal, &id).await?, false),
            None => (
                AiConversation::start(
                    principal.user_id,
                    text,
                    ChatMessage::new(ASSISTANT_GREETING, SenderRole::Ai),
                ),
                true,
            ),
        };
        conversation.push(ChatMessage::new(text, SenderRole::User));

        let intent = detect_intent(text);
        let request = self.build_request(&conversation);
        let response = self.provider.complete(&request).await.inspect_err(|e| {
            warn!(
                conversation_id = %conversation.id,
                provider = self.provider.name(),
                error = %e,
                "assistant completion failed"
            )
        })?;

        let content = match intent {
            Intent::General => response.content,
            Intent::Escalation => format!("{}\n\n{ESCALATION_NOTICE}", response.content),
            Intent::Crisis => format!("{}\n\n{CRISIS_NOTICE}", response.content),
        };
        let reply = ChatMessage::new(content, SenderRole::Ai);
        conversation.push(reply.clone());

        if is_new {
            self.conversations.insert_conversation(&conversation).await?;
        } else {
            self.conversations.update_conversation(&conversation).await?;
        }

        info!(
            conversation_id = %conversation.id,
            intent = %intent,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "assistant replied"
        );

        Ok(AssistantReply {
            conversation_id: conversation.id,
            reply,
            intent,
            suggested_urgency: intent.suggested_urgency(),
        })
    }

    /// The caller's conversations, most recent first.
    pub async fn list_conversations(
        &self,
        principal: &Principal,
        limit: Option<i64>,
    ) -> Result<Vec<AiConversation>, AssistantError> {
        Ok(self
            .conversations
            .list_for_user(&principal.user_id, limit)
            .await?)
    }

    /// Another user's conversation looks the same as a missing one.
    pub async fn get_conversation(
        &self,
        principal: &Principal,
        id: &Uuid,
    ) -> Result<AiConversation, AssistantError> {
        match self.conversations.get_conversation(id).await? {
            Some(conv) if conv.user_id == principal.user_id => Ok(conv),
            _ => Err(AssistantError::NotFound),
        }
    }

    fn build_request(&self, conversation: &AiConversation) -> CompletionRequest {
        let skip = conversation
            .messages
            .len()
            .saturating_sub(self.config.history_limit.max(1));
        CompletionRequest {
            model: self.config.model.clone(),
            messages: conversation.messages[skip..]
                .iter()
                .map(Message::from)
                .collect(),
            system: Some(self.config.system_prompt.clone()),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        }
    }
}
