use std::{collections::HashMap, sync::Arc};

use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, warn};

use crate::{
    extractor::TextExtractor,
    fetcher::DocumentSource,
    reference::DocumentReference,
};

/// Process-lifetime cache of extracted document text.
///
/// Each reference maps to a write-once cell: `Some(text)` after a
/// successful fetch+extract, `None` after a failed attempt. A reference
/// that failed once is not retried until the process restarts, which
/// keeps the at-most-one-fetch-per-key property unconditional. Concurrent
/// first accesses to the same reference coalesce into a single in-flight
/// fetch.
pub struct DocumentCache {
    source: Arc<dyn DocumentSource>,
    extractor: Arc<dyn TextExtractor>,
    entries: Mutex<HashMap<DocumentReference, Arc<OnceCell<Option<String>>>>>,
}

impl DocumentCache {
    pub fn new(source: Arc<dyn DocumentSource>, extractor: Arc<dyn TextExtractor>) -> Self {
        Self {
            source,
            extractor,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the extracted text for `reference`, fetching and extracting
    /// it on first access. `None` means the document is unavailable.
    pub async fn get_or_fetch(&self, reference: &DocumentReference) -> Option<String> {
        let cell = {
            // The lock is held only long enough to obtain the per-key
            // cell; the fetch itself runs outside it.
            let mut entries = self.entries.lock().await;
            Arc::clone(
                entries
                    .entry(reference.clone())
                    .or_insert_with(|| Arc::new(OnceCell::new())),
            )
        };

        cell.get_or_init(|| self.load(reference)).await.clone()
    }

    /// Fetch + extract, degrading any failure to "no text for this
    /// reference". A single bad document never aborts a request.
    async fn load(&self, reference: &DocumentReference) -> Option<String> {
        let bytes = match self.source.fetch(reference).await {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(reference = %reference, error = %err, "document fetch failed");
                return None;
            }
        };

        match self.extractor.extract(bytes).await {
            Ok(text) => {
                debug!(reference = %reference, chars = text.len(), "cached extracted text");
                Some(text)
            }
            Err(err) => {
                warn!(reference = %reference, error = %err, "text extraction failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use bytes::Bytes;

    use crate::{extractor::ExtractError, fetcher::FetchError};

    use super::*;

    struct StubSource {
        fetches: AtomicUsize,
        fail: bool,
    }

    impl StubSource {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                fetches: AtomicUsize::new(0),
                fail,
            })
        }
    }

    #[async_trait]
    impl DocumentSource for StubSource {
        async fn fetch(&self, reference: &DocumentReference) -> Result<Bytes, FetchError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(FetchError::HttpStatus(reqwest::StatusCode::NOT_FOUND))
            } else {
                Ok(Bytes::from(format!("text of {reference}")))
            }
        }
    }

    /// Passes the fetched bytes through as UTF-8 text.
    struct PassthroughExtractor;

    #[async_trait]
    impl TextExtractor for PassthroughExtractor {
        async fn extract(&self, bytes: Bytes) -> Result<String, ExtractError> {
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
    }

    struct FailingExtractor;

    #[async_trait]
    impl TextExtractor for FailingExtractor {
        async fn extract(&self, _bytes: Bytes) -> Result<String, ExtractError> {
            Err(ExtractError::Malformed("garbage".into()))
        }
    }

    #[tokio::test]
    async fn repeated_lookups_fetch_once() {
        let source = StubSource::new(false);
        let cache = DocumentCache::new(
            Arc::clone(&source) as Arc<dyn DocumentSource>,
            Arc::new(PassthroughExtractor),
        );
        let reference = DocumentReference::new("policy-a.pdf");

        let first = cache.get_or_fetch(&reference).await;
        let second = cache.get_or_fetch(&reference).await;

        assert_eq!(first.as_deref(), Some("text of policy-a.pdf"));
        assert_eq!(first, second);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_lookups_coalesce_into_one_fetch() {
        let source = StubSource::new(false);
        let cache = Arc::new(DocumentCache::new(
            Arc::clone(&source) as Arc<dyn DocumentSource>,
            Arc::new(PassthroughExtractor),
        ));
        let reference = DocumentReference::new("policy-a.pdf");

        let lookups = (0..16).map(|_| {
            let cache = Arc::clone(&cache);
            let reference = reference.clone();
            async move { cache.get_or_fetch(&reference).await }
        });
        let results = futures::future::join_all(lookups).await;

        assert!(results
            .iter()
            .all(|r| r.as_deref() == Some("text of policy-a.pdf")));
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_fetch_is_cached_as_absent() {
        let source = StubSource::new(true);
        let cache = DocumentCache::new(
            Arc::clone(&source) as Arc<dyn DocumentSource>,
            Arc::new(PassthroughExtractor),
        );
        let reference = DocumentReference::new("missing.pdf");

        assert_eq!(cache.get_or_fetch(&reference).await, None);
        // The failure sentinel is not retried within the process lifetime.
        assert_eq!(cache.get_or_fetch(&reference).await, None);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn extraction_failure_degrades_to_absent() {
        let source = StubSource::new(false);
        let cache = DocumentCache::new(
            Arc::clone(&source) as Arc<dyn DocumentSource>,
            Arc::new(FailingExtractor),
        );
        let reference = DocumentReference::new("scan.pdf");

        assert_eq!(cache.get_or_fetch(&reference).await, None);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn distinct_references_are_fetched_separately() {
        let source = StubSource::new(false);
        let cache = DocumentCache::new(
            Arc::clone(&source) as Arc<dyn DocumentSource>,
            Arc::new(PassthroughExtractor),
        );

        let a = cache.get_or_fetch(&DocumentReference::new("a.pdf")).await;
        let b = cache.get_or_fetch(&DocumentReference::new("b.pdf")).await;

        assert_eq!(a.as_deref(), Some("text of a.pdf"));
        assert_eq!(b.as_deref(), Some("text of b.pdf"));
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    }
}
