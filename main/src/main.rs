mod bot;
mod server;

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use url::Url;

use answer_pipeline::{AnswerGenerator, QueryOrchestrator};
use common::utils::config::get_config;
use document_pipeline::{load_document_list, DocumentCache, DocumentFetcher, PdfExtractor};
use telegram::TelegramClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set up tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    // Get config; missing required values abort here with a clear message
    let config = get_config()?;

    let base_url = Url::parse(&config.docs_base_url)
        .map_err(|err| format!("docs_base_url is not a valid URL: {err}"))?;

    // Document pipeline: fetcher + extractor behind the shared cache
    let fetcher = DocumentFetcher::new(base_url.clone())?;
    let cache = Arc::new(DocumentCache::new(
        Arc::new(fetcher),
        Arc::new(PdfExtractor),
    ));

    let openai_client = Arc::new(async_openai::Client::with_config(
        async_openai::config::OpenAIConfig::new()
            .with_api_key(&config.openai_api_key)
            .with_api_base(&config.openai_base_url),
    ));
    let generator = AnswerGenerator::new(
        openai_client,
        config.query_model.clone(),
        config.max_output_tokens,
        config.temperature,
    );

    let documents = load_document_list(
        &reqwest::Client::new(),
        &base_url,
        &config.manifest_file,
        &config.documents,
    )
    .await;
    let document_count = documents.len();
    if document_count == 0 {
        warn!("no documents configured; queries will be answered as unavailable");
    } else {
        info!(documents = document_count, "document list ready");
    }

    let orchestrator = Arc::new(QueryOrchestrator::new(documents, cache, generator));

    // Health probes run on their own task and share no core state
    let app = server::health_routes(document_count);
    let serve_address = format!("0.0.0.0:{}", config.http_port);
    info!("starting health endpoint on {serve_address}");
    let listener = tokio::net::TcpListener::bind(serve_address).await?;
    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            error!("health server error: {err}");
        }
    });

    let telegram_client = TelegramClient::new(&config.telegram_token)?;
    bot::run(telegram_client, orchestrator).await;

    Ok(())
}
