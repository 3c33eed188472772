use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{header::CONTENT_TYPE, Client, StatusCode};
use thiserror::Error;
use tokio_retry::{strategy::ExponentialBackoff, RetryIf};
use tracing::{debug, warn};
use url::Url;

use common::error::AppError;

use crate::reference::DocumentReference;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_BACKOFF: Duration = Duration::from_secs(30);
const DEFAULT_MAX_ATTEMPTS: usize = 5;
const DEFAULT_DELAY_FACTOR_MS: u64 = 500;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("unexpected content type: {0}")]
    InvalidContentType(String),
    #[error("upstream returned status {0}")]
    HttpStatus(StatusCode),
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    #[error("invalid document reference: {0}")]
    InvalidReference(#[from] url::ParseError),
}

impl FetchError {
    /// Transient failures are worth another attempt; everything else is
    /// final for this reference.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout | Self::ConnectionFailed(_) => true,
            Self::HttpStatus(status) => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            Self::InvalidContentType(_) | Self::InvalidReference(_) => false,
        }
    }
}

/// Seam between the cache and the network, so tests can substitute a stub
/// source.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn fetch(&self, reference: &DocumentReference) -> Result<Bytes, FetchError>;
}

/// Fetches raw document bytes over HTTP. Bytes stay in memory and are
/// handed to the caller; nothing is written to disk.
pub struct DocumentFetcher {
    client: Client,
    base_url: Url,
    max_attempts: usize,
    delay_factor_ms: u64,
}

impl DocumentFetcher {
    pub fn new(base_url: Url) -> Result<Self, AppError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(READ_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay_factor_ms: DEFAULT_DELAY_FACTOR_MS,
        })
    }

    /// Overrides the retry policy. `delay_factor_ms` scales the doubling
    /// backoff: a factor of 500 yields 1s, 2s, 4s, ... between attempts.
    pub fn with_retry_policy(mut self, max_attempts: usize, delay_factor_ms: u64) -> Self {
        self.max_attempts = max_attempts;
        self.delay_factor_ms = delay_factor_ms;
        self
    }

    async fn fetch_once(&self, url: &Url) -> Result<Bytes, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status));
        }

        if let Some(content_type) = response.headers().get(CONTENT_TYPE) {
            let declared = content_type.to_str().unwrap_or_default().to_ascii_lowercase();
            if !declared.contains("pdf") && !declared.contains("octet-stream") {
                return Err(FetchError::InvalidContentType(declared));
            }
        }

        response.bytes().await.map_err(map_request_error)
    }
}

#[async_trait]
impl DocumentSource for DocumentFetcher {
    async fn fetch(&self, reference: &DocumentReference) -> Result<Bytes, FetchError> {
        let url = self.base_url.join(reference.as_str())?;

        // from_millis sets the exponent base; factor scales it into the
        // real delay, so base 2 with factor 500 doubles from one second.
        let strategy = ExponentialBackoff::from_millis(2)
            .factor(self.delay_factor_ms)
            .max_delay(MAX_BACKOFF)
            .take(self.max_attempts.saturating_sub(1));

        let bytes = RetryIf::spawn(
            strategy,
            || self.fetch_once(&url),
            |err: &FetchError| {
                let transient = err.is_transient();
                if transient {
                    warn!(reference = %reference, error = %err, "transient fetch failure; retrying");
                }
                transient
            },
        )
        .await?;

        debug!(reference = %reference, bytes = bytes.len(), "fetched document");
        Ok(bytes)
    }
}

fn map_request_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::ConnectionFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::{
        net::SocketAddr,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
    };

    use axum::{http::header, routing::get, Router};

    use super::*;

    async fn serve(router: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind listener");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("serve");
        });
        addr
    }

    fn fetcher_for(addr: SocketAddr) -> DocumentFetcher {
        let base = Url::parse(&format!("http://{addr}/docs/")).expect("base url");
        DocumentFetcher::new(base)
            .expect("build fetcher")
            .with_retry_policy(5, 1)
    }

    #[tokio::test]
    async fn fetches_pdf_bytes() {
        let router = Router::new().route(
            "/docs/policy.pdf",
            get(|| async { ([(header::CONTENT_TYPE, "application/pdf")], b"%PDF-1.4 body".to_vec()) }),
        );
        let addr = serve(router).await;

        let bytes = fetcher_for(addr)
            .fetch(&DocumentReference::new("policy.pdf"))
            .await
            .expect("fetch succeeds");
        assert_eq!(bytes.as_ref(), b"%PDF-1.4 body");
    }

    #[tokio::test]
    async fn persistent_503_is_retried_to_the_attempt_cap() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let router = Router::new().route(
            "/docs/policy.pdf",
            get(move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    axum::http::StatusCode::SERVICE_UNAVAILABLE
                }
            }),
        );
        let addr = serve(router).await;

        let err = fetcher_for(addr)
            .fetch(&DocumentReference::new("policy.pdf"))
            .await
            .expect_err("fetch must fail");
        assert!(matches!(err, FetchError::HttpStatus(status) if status.as_u16() == 503));
        assert_eq!(hits.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn missing_document_is_not_retried() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let router = Router::new().route(
            "/docs/missing.pdf",
            get(move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    axum::http::StatusCode::NOT_FOUND
                }
            }),
        );
        let addr = serve(router).await;

        let err = fetcher_for(addr)
            .fetch(&DocumentReference::new("missing.pdf"))
            .await
            .expect_err("fetch must fail");
        assert!(matches!(err, FetchError::HttpStatus(status) if status.as_u16() == 404));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn mismatched_content_type_is_rejected_without_retry() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let router = Router::new().route(
            "/docs/policy.pdf",
            get(move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    ([(header::CONTENT_TYPE, "text/html")], "<html></html>")
                }
            }),
        );
        let addr = serve(router).await;

        let err = fetcher_for(addr)
            .fetch(&DocumentReference::new("policy.pdf"))
            .await
            .expect_err("fetch must fail");
        assert!(matches!(err, FetchError::InvalidContentType(declared) if declared == "text/html"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn transient_classification() {
        assert!(FetchError::Timeout.is_transient());
        assert!(FetchError::ConnectionFailed("reset".into()).is_transient());
        assert!(FetchError::HttpStatus(StatusCode::TOO_MANY_REQUESTS).is_transient());
        assert!(FetchError::HttpStatus(StatusCode::BAD_GATEWAY).is_transient());
        assert!(!FetchError::HttpStatus(StatusCode::NOT_FOUND).is_transient());
        assert!(!FetchError::InvalidContentType("text/html".into()).is_transient());
    }
}
