use async_trait::async_trait;
use bytes::Bytes;
use lopdf::Document;
use thiserror::Error;
use tokio::task::JoinError;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("document is not a parseable PDF: {0}")]
    Malformed(String),
    #[error("extraction task failed: {0}")]
    Join(#[from] JoinError),
}

/// Seam between the cache and the PDF parser, so tests can substitute a
/// stub extractor.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, bytes: Bytes) -> Result<String, ExtractError>;
}

/// Extracts the text layer of a PDF held in memory, page by page. Pages
/// without extractable text are skipped; a document where every page is
/// empty yields an empty string, which downstream treats as unavailable.
#[derive(Debug, Default, Clone)]
pub struct PdfExtractor;

#[async_trait]
impl TextExtractor for PdfExtractor {
    async fn extract(&self, bytes: Bytes) -> Result<String, ExtractError> {
        // Parsing is CPU-bound with no suspension point, so it runs off
        // the async executor.
        tokio::task::spawn_blocking(move || extract_text_sync(&bytes)).await?
    }
}

fn extract_text_sync(bytes: &[u8]) -> Result<String, ExtractError> {
    let document =
        Document::load_mem(bytes).map_err(|err| ExtractError::Malformed(err.to_string()))?;

    let mut page_numbers: Vec<u32> = document.get_pages().keys().copied().collect();
    page_numbers.sort_unstable();

    let mut pages = Vec::with_capacity(page_numbers.len());
    for page in page_numbers {
        match document.extract_text(&[page]) {
            Ok(text) => {
                let text = text.trim();
                if text.is_empty() {
                    debug!(page, "page has no extractable text");
                } else {
                    pages.push(text.to_string());
                }
            }
            Err(err) => {
                debug!(page, error = %err, "skipping page without a text layer");
            }
        }
    }

    Ok(pages.join("\n"))
}
