pub mod models;

use std::time::Duration;

use reqwest::Client;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use models::{ApiResponse, Message, Update};

const DEFAULT_API_BASE: &str = "https://api.telegram.org";

// Long polls block server-side for up to the poll timeout, so the HTTP
// timeout must sit above it.
const HTTP_TIMEOUT: Duration = Duration::from_secs(70);

#[derive(Error, Debug)]
pub enum TelegramError {
    #[error("telegram request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("telegram api error: {0}")]
    Api(String),
}

/// Minimal Bot API client covering what the bot loop needs: long-polled
/// updates, outbound messages, and the typing indicator.
#[derive(Debug, Clone)]
pub struct TelegramClient {
    client: Client,
    base_url: String,
}

impl TelegramClient {
    pub fn new(token: &str) -> Result<Self, TelegramError> {
        Self::with_api_base(token, DEFAULT_API_BASE)
    }

    /// Points the client at a different API host; used by tests.
    pub fn with_api_base(token: &str, api_base: &str) -> Result<Self, TelegramError> {
        let client = Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: format!("{}/bot{}", api_base.trim_end_matches('/'), token),
        })
    }

    /// Long-polls for updates past `offset`, waiting server-side up to
    /// `timeout_secs` before returning an empty batch.
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, TelegramError> {
        let mut body = json!({
            "timeout": timeout_secs,
            "allowed_updates": ["message"],
        });
        if let Some(offset) = offset {
            body["offset"] = json!(offset);
        }

        let response: ApiResponse<Vec<Update>> = self
            .client
            .post(format!("{}/getUpdates", self.base_url))
            .json(&body)
            .send()
            .await?
            .json()
            .await?;

        let updates = into_result(response)?;
        debug!(updates = updates.len(), "polled telegram updates");
        Ok(updates)
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<Message, TelegramError> {
        let response: ApiResponse<Message> = self
            .client
            .post(format!("{}/sendMessage", self.base_url))
            .json(&json!({ "chat_id": chat_id, "text": text }))
            .send()
            .await?
            .json()
            .await?;

        into_result(response)
    }

    /// Shows a chat action ("typing") while an answer is being prepared.
    pub async fn send_chat_action(&self, chat_id: i64, action: &str) -> Result<(), TelegramError> {
        let response: ApiResponse<bool> = self
            .client
            .post(format!("{}/sendChatAction", self.base_url))
            .json(&json!({ "chat_id": chat_id, "action": action }))
            .send()
            .await?
            .json()
            .await?;

        into_result(response).map(|_| ())
    }
}

fn into_result<T>(response: ApiResponse<T>) -> Result<T, TelegramError> {
    if !response.ok {
        return Err(TelegramError::Api(
            response
                .description
                .unwrap_or_else(|| "unknown telegram error".to_string()),
        ));
    }
    response
        .result
        .ok_or_else(|| TelegramError::Api("response missing result".to_string()))
}
