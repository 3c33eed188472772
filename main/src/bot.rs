use std::{sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{error, info, warn};

use answer_pipeline::QueryOrchestrator;
use telegram::TelegramClient;

const POLL_TIMEOUT_SECS: u64 = 60;
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

const WELCOME_MESSAGE: &str =
    "Hello! Ask me anything about the policy documents, or send /docs to see which ones I know.";
const NO_DOCUMENTS_MESSAGE: &str = "No policy documents are configured right now.";

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Start,
    ListDocuments,
    Query(&'a str),
}

impl<'a> Command<'a> {
    fn parse(text: &'a str) -> Option<Self> {
        let trimmed = text.trim();
        match trimmed {
            "" => None,
            "/start" => Some(Self::Start),
            "/docs" => Some(Self::ListDocuments),
            query => Some(Self::Query(query)),
        }
    }
}

/// Long-polls Telegram and handles each update in its own task. Requests
/// are independent; they meet only in the shared document cache.
pub async fn run(client: TelegramClient, orchestrator: Arc<QueryOrchestrator>) {
    info!("starting telegram polling loop");
    let mut offset: Option<i64> = None;

    loop {
        let updates = match client.get_updates(offset, POLL_TIMEOUT_SECS).await {
            Ok(updates) => updates,
            Err(err) => {
                warn!(error = %err, "polling failed; backing off");
                sleep(POLL_RETRY_DELAY).await;
                continue;
            }
        };

        for update in updates {
            offset = Some(update.update_id.saturating_add(1));

            let Some(message) = update.message else { continue };
            let Some(text) = message.text else { continue };
            let chat_id = message.chat.id;

            let client = client.clone();
            let orchestrator = Arc::clone(&orchestrator);
            tokio::spawn(async move {
                let Some(command) = Command::parse(&text) else {
                    return;
                };

                let reply = match command {
                    Command::Start => WELCOME_MESSAGE.to_string(),
                    Command::ListDocuments => {
                        format_document_list(&orchestrator.document_names())
                    }
                    Command::Query(query) => {
                        if let Err(err) = client.send_chat_action(chat_id, "typing").await {
                            warn!(error = %err, chat_id, "failed to send typing action");
                        }
                        orchestrator.handle_query(query).await
                    }
                };

                if let Err(err) = client.send_message(chat_id, &reply).await {
                    error!(error = %err, chat_id, "failed to deliver reply");
                }
            });
        }
    }
}

fn format_document_list(names: &[String]) -> String {
    if names.is_empty() {
        return NO_DOCUMENTS_MESSAGE.to_string();
    }
    format!("Available policy documents:\n\n{}", names.join("\n"))
}
