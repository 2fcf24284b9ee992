use std::sync::Arc;

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use tracing::warn;

use common::{
    error::AppError,
    storage::types::{
        conversation::{ChatTurn, Sender},
        system_settings::SystemSettings,
    },
    utils::config::AppConfig,
};

/// Fixed user-facing reply for every model failure mode.
pub const APOLOGY: &str =
    "I'm having trouble responding right now. Please try again in a moment.";

/// Rolling window passed upstream on history-aware calls.
pub const HISTORY_WINDOW: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryRole {
    User,
    Assistant,
}

/// The rolling buffer of recent turns. Pushing past the window discards
/// the oldest entries first.
#[derive(Debug, Clone, Default)]
pub struct HistoryBuffer {
    entries: Vec<(HistoryRole, String)>,
}

impl HistoryBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_turns(turns: &[ChatTurn]) -> Self {
        let mut buffer = Self::new();
        for turn in turns {
            let role = match turn.sender {
                Sender::User => HistoryRole::User,
                Sender::Bot => HistoryRole::Assistant,
            };
            buffer.push(role, turn.message.clone());
        }
        buffer
    }

    pub fn push(&mut self, role: HistoryRole, content: String) {
        self.entries.push((role, content));
        let overflow = self.entries.len().saturating_sub(HISTORY_WINDOW);
        if overflow > 0 {
            self.entries.drain(..overflow);
        }
    }

    pub fn entries(&self) -> &[(HistoryRole, String)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Per-call model knobs, read from the stored settings each request so
/// settings edits apply without a restart.
#[derive(Debug, Clone)]
pub struct ModelParams {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl ModelParams {
    pub fn from_settings(settings: &SystemSettings) -> Self {
        Self {
            model: settings.chat_model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
        }
    }
}

/// Gateway to the chat-completion endpoint. Callers get a `Result`; the
/// dispatcher is the single place that turns failures into the apology.
#[derive(Clone)]
pub struct LlmGateway {
    client: Arc<Client<OpenAIConfig>>,
    api_key_present: bool,
}

impl LlmGateway {
    pub fn new(client: Arc<Client<OpenAIConfig>>, api_key_present: bool) -> Self {
        Self {
            client,
            api_key_present,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let client = Arc::new(Client::with_config(
            OpenAIConfig::new()
                .with_api_key(&config.openai_api_key)
                .with_api_base(&config.openai_base_url),
        ));
        Self::new(client, !config.openai_api_key.is_empty())
    }

    /// History-aware call: the user turn enters the rolling buffer before
    /// the request, the assistant reply enters it only on success.
    pub async fn ask_with_history(
        &self,
        params: &ModelParams,
        system_prompt: Option<&str>,
        history: &mut HistoryBuffer,
        user_text: &str,
    ) -> Result<String, AppError> {
        history.push(HistoryRole::User, user_text.to_string());

        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::new();
        if let Some(system) = system_prompt {
            messages.push(ChatCompletionRequestSystemMessage::from(system).into());
        }
        for (role, content) in history.entries() {
            let message = match role {
                HistoryRole::User => {
                    ChatCompletionRequestUserMessage::from(content.as_str()).into()
                }
                HistoryRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                    .content(content.as_str())
                    .build()?
                    .into(),
            };
            messages.push(message);
        }

        let reply = self.complete(params, messages).await?;
        history.push(HistoryRole::Assistant, reply.clone());
        Ok(reply)
    }

    /// Single-shot call: one user message, no system framing, no history.
    pub async fn ask_single_shot(
        &self,
        params: &ModelParams,
        text: &str,
    ) -> Result<String, AppError> {
        let messages = vec![ChatCompletionRequestUserMessage::from(text).into()];
        self.complete(params, messages).await
    }

    async fn complete(
        &self,
        params: &ModelParams,
        messages: Vec<ChatCompletionRequestMessage>,
    ) -> Result<String, AppError> {
        if !self.api_key_present {
            warn!("Chat completion requested without a configured API key");
            return Err(AppError::Validation("Missing model API key".into()));
        }

        let request = CreateChatCompletionRequestArgs::default()
            .model(&params.model)
            .messages(messages)
            .max_tokens(params.max_tokens)
            .temperature(params.temperature)
            .build()?;

        let response = self.client.chat().create(request).await?;

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| AppError::Validation("No content in model response".into()))
    }
}
