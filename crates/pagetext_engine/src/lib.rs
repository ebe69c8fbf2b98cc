//! Pagetext engine: fetch, retry, extract, dispatch and save pipeline.
mod config;
mod decode;
mod dispatch;
mod engine;
mod extract;
mod fetch;
mod filename;
mod persist;
mod pipeline;
mod report;
mod retry;
mod types;
mod validate;

pub use config::{ConfigError, EngineConfig};
pub use decode::{decode_html, DecodeError, DecodedHtml};
pub use dispatch::{Dispatcher, DEFAULT_MAX_WORKERS};
pub use engine::{EngineDisconnected, EngineHandle};
pub use extract::{Document, Extractor, Segment, TextExtractor, NO_TITLE};
pub use fetch::{
    random_user_agent, ChannelProgressSink, FetchSettings, Fetcher, NullProgressSink,
    ProgressSink, ProxyFetcher, DEFAULT_ENDPOINT, USER_AGENTS,
};
pub use filename::{normalize_extension, output_filename, sanitize_url, OutputFormat, UnknownFormat};
pub use persist::{ensure_output_dir, save_data_to_file, AtomicFileWriter, PersistError};
pub use pipeline::Scraper;
pub use report::{build_report, write_batch_report, SaveStatus, REPORT_FILENAME};
pub use retry::{fetch_with_retry, RetryPolicy};
pub use types::{
    BatchSummary, EngineEvent, FailureKind, FetchError, FetchMetadata, FetchOutput, ItemIndex,
    ItemProgress, ScrapeItem, ScrapeOutcome, Stage, WorkItem,
};
pub use validate::{validate_url, UrlPolicy, UrlRejection};

/// Re-exported so callers can cancel batches without depending on tokio-util.
pub use tokio_util::sync::CancellationToken;
