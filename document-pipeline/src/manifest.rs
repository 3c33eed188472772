use reqwest::Client;
use tracing::{info, warn};
use url::Url;

use common::error::AppError;

use crate::reference::{DocumentList, DocumentReference};

/// Loads the document list from the remote manifest (one filename per
/// line). Any failure falls back to the configured static list; an
/// unreachable manifest is never fatal.
pub async fn load_document_list(
    client: &Client,
    base_url: &Url,
    manifest_file: &str,
    fallback: &[String],
) -> DocumentList {
    match fetch_manifest(client, base_url, manifest_file).await {
        Ok(list) if !list.is_empty() => {
            info!(documents = list.len(), "loaded document manifest");
            list
        }
        Ok(_) => {
            warn!("document manifest was empty; using configured document list");
            static_list(fallback)
        }
        Err(err) => {
            warn!(error = %err, "failed to load document manifest; using configured document list");
            static_list(fallback)
        }
    }
}

async fn fetch_manifest(
    client: &Client,
    base_url: &Url,
    manifest_file: &str,
) -> Result<DocumentList, AppError> {
    let url = base_url
        .join(manifest_file)
        .map_err(|err| AppError::Validation(format!("invalid manifest location: {err}")))?;

    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(AppError::InternalError(format!(
            "manifest request returned {status}"
        )));
    }

    let body = response.text().await?;
    Ok(parse_manifest(&body))
}

fn parse_manifest(body: &str) -> DocumentList {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(DocumentReference::new)
        .collect()
}

fn static_list(names: &[String]) -> DocumentList {
    names
        .iter()
        .map(|name| DocumentReference::new(name.as_str()))
        .collect()
}
