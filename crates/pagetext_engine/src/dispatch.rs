use std::sync::Arc;
use std::time::Duration;

use engine_logging::{engine_error, engine_info, engine_warn, sanitize_for_log};
use futures_util::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::extract::{Document, Extractor};
use crate::fetch::{Fetcher, ProgressSink};
use crate::retry::{fetch_with_retry, RetryPolicy};
use crate::validate::UrlPolicy;
use crate::{
    EngineEvent, FailureKind, FetchError, ItemProgress, ScrapeItem, ScrapeOutcome, Stage,
    WorkItem,
};

pub const DEFAULT_MAX_WORKERS: usize = 5;

/// Fans a URL list out over a bounded number of concurrent pipelines.
pub struct Dispatcher {
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn Extractor>,
    retry: RetryPolicy,
    url_policy: UrlPolicy,
    request_timeout: Duration,
    max_workers: usize,
}

impl Dispatcher {
    pub fn new(fetcher: Arc<dyn Fetcher>, extractor: Arc<dyn Extractor>) -> Self {
        Self {
            fetcher,
            extractor,
            retry: RetryPolicy::default(),
            url_policy: UrlPolicy::default(),
            request_timeout: Duration::from_secs(10),
            max_workers: DEFAULT_MAX_WORKERS,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_url_policy(mut self, url_policy: UrlPolicy) -> Self {
        self.url_policy = url_policy;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Scrape every URL, returning one entry per input in input order.
    ///
    /// Invalid URLs are reported as `Skipped` and never fetched. A failing URL
    /// does not affect the others.
    pub async fn scrape_all(
        &self,
        urls: &[String],
        cancel: &CancellationToken,
        sink: &dyn ProgressSink,
    ) -> Vec<ScrapeItem> {
        let mut results: Vec<Option<ScrapeItem>> = vec![None; urls.len()];
        let mut work = Vec::new();

        for (pos, url) in urls.iter().enumerate() {
            let index = pos + 1;
            match self.url_policy.check(url) {
                Ok(_) => {
                    sink.emit(EngineEvent::ItemQueued {
                        index,
                        url: url.clone(),
                    });
                    work.push(WorkItem {
                        index,
                        url: url.trim().to_string(),
                    });
                }
                Err(reason) => {
                    engine_warn!(
                        "Skipping invalid url #{} {}: {}",
                        index,
                        sanitize_for_log(url),
                        reason
                    );
                    sink.emit(EngineEvent::ItemSkipped {
                        index,
                        url: url.clone(),
                        reason: reason.clone(),
                    });
                    results[pos] = Some(ScrapeItem {
                        index,
                        url: url.clone(),
                        outcome: ScrapeOutcome::Skipped(reason),
                    });
                }
            }
        }

        engine_info!(
            "Dispatching {} of {} urls with {} workers",
            work.len(),
            urls.len(),
            self.max_workers
        );

        let finished: Vec<(WorkItem, ScrapeOutcome)> = stream::iter(work)
            .map(|item| async move {
                let outcome = self.scrape_one(&item, cancel, sink).await;
                (item, outcome)
            })
            .buffer_unordered(self.max_workers)
            .collect()
            .await;

        for (item, outcome) in finished {
            let pos = item.index - 1;
            results[pos] = Some(ScrapeItem {
                index: item.index,
                url: urls[pos].clone(),
                outcome,
            });
        }

        results
            .into_iter()
            .enumerate()
            .map(|(pos, slot)| {
                slot.unwrap_or_else(|| ScrapeItem {
                    index: pos + 1,
                    url: urls[pos].clone(),
                    outcome: ScrapeOutcome::Failed(FetchError::new(
                        FailureKind::Unexpected,
                        "item was never processed",
                    )),
                })
            })
            .collect()
    }

    /// Fetch, retry and extract one item.
    pub async fn scrape_one(
        &self,
        item: &WorkItem,
        cancel: &CancellationToken,
        sink: &dyn ProgressSink,
    ) -> ScrapeOutcome {
        let result = self.fetch_document(item, cancel, sink).await;
        let finished = match &result {
            Ok(doc) => Ok(doc.segments.len()),
            Err(err) => Err(err.kind.clone()),
        };
        sink.emit(EngineEvent::ItemFinished {
            index: item.index,
            result: finished,
        });
        match result {
            Ok(doc) => ScrapeOutcome::Scraped(doc),
            Err(err) => {
                engine_error!(
                    "Failed to retrieve content from {}: {}",
                    sanitize_for_log(&item.url),
                    err
                );
                ScrapeOutcome::Failed(err)
            }
        }
    }

    async fn fetch_document(
        &self,
        item: &WorkItem,
        cancel: &CancellationToken,
        sink: &dyn ProgressSink,
    ) -> Result<Document, FetchError> {
        if cancel.is_cancelled() {
            return Err(FetchError::new(FailureKind::Cancelled, "batch cancelled"));
        }
        let output = fetch_with_retry(
            self.fetcher.as_ref(),
            item.index,
            &item.url,
            self.retry,
            self.request_timeout,
            cancel,
            sink,
        )
        .await?;

        if output.body.trim().is_empty() {
            return Err(FetchError::new(FailureKind::EmptyResponse, "empty body"));
        }

        sink.emit(EngineEvent::Progress(ItemProgress {
            index: item.index,
            stage: Stage::Extracting,
            attempt: None,
            bytes: Some(output.metadata.byte_len),
        }));
        let extractor = Arc::clone(&self.extractor);
        let body = output.body;
        // Parsing a large page is CPU-bound; keep it off the task polling the
        // other in-flight items.
        tokio::task::spawn_blocking(move || extractor.extract(&body))
            .await
            .map_err(|err| FetchError::new(FailureKind::Unexpected, format!("extraction failed: {err}")))
    }
}
