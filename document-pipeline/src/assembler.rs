use thiserror::Error;
use tracing::debug;

use crate::{cache::DocumentCache, reference::DocumentReference};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AssemblyError {
    #[error("none of the configured documents are available")]
    NoDocumentsAvailable,
}

/// Builds the generation context from the configured documents, in list
/// order. Each available document contributes a labelled block:
///
/// ```text
/// === <name> ===
/// <text>
/// ```
///
/// Blocks are joined with a blank line. Unavailable documents (failed
/// fetch, failed extraction, or no extractable text) are omitted without
/// error; only an entirely empty result is a failure.
pub async fn assemble(
    list: &[DocumentReference],
    cache: &DocumentCache,
) -> Result<String, AssemblyError> {
    let mut sections = Vec::with_capacity(list.len());

    for reference in list {
        match cache.get_or_fetch(reference).await {
            Some(text) if !text.is_empty() => {
                sections.push(format!("=== {reference} ===\n{text}"));
            }
            Some(_) => {
                debug!(reference = %reference, "document has no text; omitted from context");
            }
            None => {
                debug!(reference = %reference, "document unavailable; omitted from context");
            }
        }
    }

    if sections.is_empty() {
        return Err(AssemblyError::NoDocumentsAvailable);
    }

    Ok(sections.join("\n\n"))
}
