use std::{sync::Arc, time::Duration};

use tracing::{info, warn};

use document_pipeline::{assemble, AssemblyError, DocumentCache, DocumentList};

use crate::{generator::AnswerGenerator, state::idle};

pub const DOCUMENTS_UNAVAILABLE_MESSAGE: &str =
    "I could not read the policy documents right now. Please try again later.";
pub const GENERATION_FAILED_MESSAGE: &str =
    "I could not generate an answer right now. Please try again later.";
pub const GENERIC_FAILURE_MESSAGE: &str =
    "Something went wrong while answering your question. Please try again later.";

/// Upper bound on one question end to end, covering document fetches and
/// the generation call; sub-operations are cancelled on expiry.
const REQUEST_BUDGET: Duration = Duration::from_secs(60);

/// Sequences assembly and generation for one incoming query and maps
/// every pipeline outcome to a user-safe reply. No state survives a
/// request; concurrent queries interact only through the shared cache.
pub struct QueryOrchestrator {
    documents: DocumentList,
    cache: Arc<DocumentCache>,
    generator: AnswerGenerator,
}

impl QueryOrchestrator {
    pub fn new(documents: DocumentList, cache: Arc<DocumentCache>, generator: AnswerGenerator) -> Self {
        Self {
            documents,
            cache,
            generator,
        }
    }

    /// The configured document names, for the document-listing command.
    pub fn document_names(&self) -> Vec<String> {
        self.documents
            .iter()
            .map(|reference| reference.to_string())
            .collect()
    }

    /// Answers one query. Total; internal errors never escape, they map
    /// to fixed messages so upstream detail cannot reach the user.
    pub async fn handle_query(&self, query: &str) -> String {
        match tokio::time::timeout(REQUEST_BUDGET, self.run(query)).await {
            Ok(reply) => reply,
            Err(_) => {
                warn!("request budget exhausted; sub-operations cancelled");
                GENERIC_FAILURE_MESSAGE.to_string()
            }
        }
    }

    async fn run(&self, query: &str) -> String {
        let machine = idle();
        let Ok(machine) = machine.receive() else {
            return GENERIC_FAILURE_MESSAGE.to_string();
        };

        let context = match assemble(&self.documents, &self.cache).await {
            Ok(context) => context,
            Err(AssemblyError::NoDocumentsAvailable) => {
                info!("no documents available; answering without generation");
                let _ = machine.respond();
                return DOCUMENTS_UNAVAILABLE_MESSAGE.to_string();
            }
        };

        let Ok(machine) = machine.generate() else {
            return GENERIC_FAILURE_MESSAGE.to_string();
        };

        let reply = match self.generator.generate(query, &context).await {
            Ok(answer) => answer,
            Err(err) => {
                warn!(error = %err, "generation failed after retries");
                GENERATION_FAILED_MESSAGE.to_string()
            }
        };

        let _ = machine.respond();
        reply
    }
}
