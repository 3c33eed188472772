use std::{sync::Arc, time::Duration};

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
        CreateChatCompletionResponse,
    },
    Client,
};
use thiserror::Error;
use tokio_retry::{
    strategy::{jitter, ExponentialBackoff},
    Retry,
};
use tracing::{debug, warn};

/// Hard cap on outbound message length; Telegram rejects messages over
/// 4096 characters, and the original bot kept a conservative margin.
pub const CHANNEL_MESSAGE_LIMIT: usize = 4000;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_BACKOFF: Duration = Duration::from_secs(10);
const DEFAULT_MAX_ATTEMPTS: usize = 3;
const DEFAULT_DELAY_FACTOR_MS: u64 = 1000;

const SYSTEM_INSTRUCTION: &str = "You are an assistant answering questions about insurance \
policy documents. Answer using only the document context below. If the answer is not in the \
context, say that the documents do not cover it. Be concise.";

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("generation endpoint failed: {0}")]
    UpstreamFailed(String),
    #[error("generation request timed out")]
    Timeout,
}

/// Sends the assembled context plus the user query to the chat-completion
/// endpoint and truncates the answer to the channel limit.
pub struct AnswerGenerator {
    client: Arc<Client<OpenAIConfig>>,
    model: String,
    max_output_tokens: u32,
    temperature: f32,
    max_attempts: usize,
    delay_factor_ms: u64,
}

impl AnswerGenerator {
    pub fn new(
        client: Arc<Client<OpenAIConfig>>,
        model: String,
        max_output_tokens: u32,
        temperature: f32,
    ) -> Self {
        Self {
            client,
            model,
            max_output_tokens,
            temperature,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay_factor_ms: DEFAULT_DELAY_FACTOR_MS,
        }
    }

    /// Overrides the retry policy; the default backs off in the 2-10s
    /// band across three attempts.
    pub fn with_retry_policy(mut self, max_attempts: usize, delay_factor_ms: u64) -> Self {
        self.max_attempts = max_attempts;
        self.delay_factor_ms = delay_factor_ms;
        self
    }

    pub async fn generate(&self, query: &str, context: &str) -> Result<String, GenerationError> {
        let request = self.build_request(query, context)?;

        let strategy = ExponentialBackoff::from_millis(2)
            .factor(self.delay_factor_ms)
            .max_delay(MAX_BACKOFF)
            .map(jitter)
            .take(self.max_attempts.saturating_sub(1));

        let response = Retry::spawn(strategy, || {
            let request = request.clone();
            async move {
                self.request_once(request).await.map_err(|err| {
                    warn!(error = %err, "generation attempt failed");
                    err
                })
            }
        })
        .await?;

        let answer = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| {
                GenerationError::UpstreamFailed("response contained no content".into())
            })?;

        debug!(answer_chars = answer.chars().count(), "generation succeeded");
        Ok(truncate_to_channel_limit(answer))
    }

    fn build_request(
        &self,
        query: &str,
        context: &str,
    ) -> Result<CreateChatCompletionRequest, GenerationError> {
        let system = format!("{SYSTEM_INSTRUCTION}\n\nDocument context:\n==================\n{context}");

        CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .max_tokens(self.max_output_tokens)
            .temperature(self.temperature)
            .messages([
                ChatCompletionRequestSystemMessage::from(system).into(),
                ChatCompletionRequestUserMessage::from(query).into(),
            ])
            .build()
            .map_err(|err| GenerationError::UpstreamFailed(err.to_string()))
    }

    async fn request_once(
        &self,
        request: CreateChatCompletionRequest,
    ) -> Result<CreateChatCompletionResponse, GenerationError> {
        match tokio::time::timeout(REQUEST_TIMEOUT, self.client.chat().create(request)).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(err)) => Err(GenerationError::UpstreamFailed(err.to_string())),
            Err(_) => Err(GenerationError::Timeout),
        }
    }
}

/// Cuts the answer to the channel limit, counted in characters. No
/// marker is appended; an overlong answer simply ends at the cap.
pub fn truncate_to_channel_limit(answer: String) -> String {
    match answer.char_indices().nth(CHANNEL_MESSAGE_LIMIT) {
        Some((byte_index, _)) => {
            let mut truncated = answer;
            truncated.truncate(byte_index);
            truncated
        }
        None => answer,
    }
}
