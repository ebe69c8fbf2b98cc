use std::sync::Arc;

use engine_logging::{engine_info, engine_warn};
use tokio_util::sync::CancellationToken;

use crate::config::EngineConfig;
use crate::dispatch::Dispatcher;
use crate::extract::{Document, Extractor, TextExtractor};
use crate::fetch::{Fetcher, NullProgressSink, ProgressSink, ProxyFetcher};
use crate::filename::output_filename;
use crate::persist::save_data_to_file;
use crate::report::{write_batch_report, SaveStatus};
use crate::{
    BatchSummary, EngineEvent, FailureKind, FetchError, ItemProgress, ScrapeItem, ScrapeOutcome,
    Stage, WorkItem,
};

/// Caller-facing entry point: scrape one URL, many URLs, or a full batch
/// including saving to disk.
pub struct Scraper {
    config: EngineConfig,
    dispatcher: Dispatcher,
}

impl Scraper {
    pub fn new(config: EngineConfig) -> Result<Self, FetchError> {
        let fetcher = Arc::new(ProxyFetcher::new(config.fetch.clone())?);
        Ok(Self::with_parts(config, fetcher, Arc::new(TextExtractor)))
    }

    /// Build with a custom fetcher/extractor, e.g. test stubs.
    pub fn with_parts(
        config: EngineConfig,
        fetcher: Arc<dyn Fetcher>,
        extractor: Arc<dyn Extractor>,
    ) -> Self {
        if config.api_key_missing() {
            engine_warn!("No scraper API key configured; proxy requests will be rejected");
        }
        let dispatcher = Dispatcher::new(fetcher, extractor)
            .with_retry(config.retry)
            .with_url_policy(config.url_policy)
            .with_request_timeout(config.fetch.request_timeout)
            .with_max_workers(config.max_workers);
        Self { config, dispatcher }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub async fn scrape_text_data(&self, url: &str) -> Result<Document, FetchError> {
        if let Err(reason) = self.config.url_policy.check(url) {
            return Err(FetchError::new(FailureKind::InvalidUrl, reason.to_string()));
        }
        let item = WorkItem {
            index: 1,
            url: url.trim().to_string(),
        };
        match self
            .dispatcher
            .scrape_one(&item, &CancellationToken::new(), &NullProgressSink)
            .await
        {
            ScrapeOutcome::Scraped(doc) => Ok(doc),
            ScrapeOutcome::Failed(err) => Err(err),
            ScrapeOutcome::Skipped(reason) => {
                Err(FetchError::new(FailureKind::InvalidUrl, reason.to_string()))
            }
        }
    }

    pub async fn scrape_multiple_urls(
        &self,
        urls: &[String],
        cancel: &CancellationToken,
        sink: &dyn ProgressSink,
    ) -> Vec<ScrapeItem> {
        self.dispatcher.scrape_all(urls, cancel, sink).await
    }

    /// Scrape, then save each document as `<sanitized-url>_<index>.<ext>` in
    /// the configured output directory, then write the batch report.
    pub async fn run_batch(
        &self,
        urls: &[String],
        cancel: &CancellationToken,
        sink: &dyn ProgressSink,
    ) -> BatchSummary {
        let items = self.scrape_multiple_urls(urls, cancel, sink).await;
        let mut summary = BatchSummary::default();
        let mut saved_items = Vec::with_capacity(items.len());

        for item in items {
            let status = match &item.outcome {
                ScrapeOutcome::Scraped(doc) => {
                    summary.scraped += 1;
                    self.save_item(&item, doc, sink)
                }
                ScrapeOutcome::Failed(_) => {
                    summary.failed += 1;
                    SaveStatus::NotSaved
                }
                ScrapeOutcome::Skipped(_) => {
                    summary.skipped += 1;
                    SaveStatus::NotSaved
                }
            };
            if matches!(status, SaveStatus::Saved(_)) {
                summary.saved += 1;
            }
            saved_items.push((item, status));
        }

        if self.config.write_report {
            match write_batch_report(&self.config.output_dir, &saved_items) {
                Ok(path) => summary.report_path = Some(path),
                Err(err) => engine_warn!("Failed to write batch report: {}", err),
            }
        }

        engine_info!(
            "Batch finished: scraped={} failed={} skipped={} saved={}",
            summary.scraped,
            summary.failed,
            summary.skipped,
            summary.saved
        );
        sink.emit(EngineEvent::BatchFinished(summary.clone()));
        summary
    }

    fn save_item(&self, item: &ScrapeItem, doc: &Document, sink: &dyn ProgressSink) -> SaveStatus {
        sink.emit(EngineEvent::Progress(ItemProgress {
            index: item.index,
            stage: Stage::Writing,
            attempt: None,
            bytes: None,
        }));
        let path = self
            .config
            .output_dir
            .join(output_filename(&item.url, item.index, self.config.format));
        match save_data_to_file(doc, &path, self.config.format) {
            Ok(path) => {
                sink.emit(EngineEvent::ItemSaved {
                    index: item.index,
                    path: path.clone(),
                });
                SaveStatus::Saved(path)
            }
            Err(err) => {
                sink.emit(EngineEvent::ItemSaveFailed {
                    index: item.index,
                    message: err.to_string(),
                });
                SaveStatus::Failed(err.to_string())
            }
        }
    }
}
