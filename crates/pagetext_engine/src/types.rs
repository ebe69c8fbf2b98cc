use std::fmt;
use std::path::PathBuf;

use crate::extract::Document;
use crate::validate::UrlRejection;

/// 1-based position of a URL in the caller's input list.
pub type ItemIndex = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Queued,
    Downloading,
    Retrying,
    Extracting,
    Writing,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemProgress {
    pub index: ItemIndex,
    pub stage: Stage,
    pub attempt: Option<u32>,
    pub bytes: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    ItemQueued {
        index: ItemIndex,
        url: String,
    },
    ItemSkipped {
        index: ItemIndex,
        url: String,
        reason: UrlRejection,
    },
    Progress(ItemProgress),
    /// Emitted in completion order, not input order.
    ItemFinished {
        index: ItemIndex,
        result: Result<usize, FailureKind>,
    },
    ItemSaved {
        index: ItemIndex,
        path: PathBuf,
    },
    ItemSaveFailed {
        index: ItemIndex,
        message: String,
    },
    BatchFinished(BatchSummary),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub scraped: usize,
    pub failed: usize,
    pub skipped: usize,
    pub saved: usize,
    pub report_path: Option<PathBuf>,
}

/// A URL paired with its input position, owned by one dispatcher run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub index: ItemIndex,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeItem {
    pub index: ItemIndex,
    pub url: String,
    pub outcome: ScrapeOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrapeOutcome {
    Scraped(Document),
    /// Rejected before dispatch; never fetched.
    Skipped(UrlRejection),
    Failed(FetchError),
}

impl ScrapeOutcome {
    pub fn document(&self) -> Option<&Document> {
        match self {
            ScrapeOutcome::Scraped(doc) => Some(doc),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutput {
    pub body: String,
    pub metadata: FetchMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchMetadata {
    pub target_url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub byte_len: u64,
    pub encoding: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for FetchError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    /// Non-2xx answer from the proxy; counted as a network-class failure.
    HttpStatus(u16),
    Network,
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    EmptyResponse,
    Unexpected,
    RetriesExhausted { attempts: u32, last: Box<FailureKind> },
    Cancelled,
}

impl FailureKind {
    /// The failure that actually happened on the wire, looking through
    /// retry exhaustion.
    pub fn root(&self) -> &FailureKind {
        match self {
            FailureKind::RetriesExhausted { last, .. } => last.root(),
            other => other,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::EmptyResponse => write!(f, "empty response"),
            FailureKind::Unexpected => write!(f, "unexpected error"),
            FailureKind::RetriesExhausted { attempts, last } => {
                write!(f, "retries exhausted after {attempts} attempts ({last})")
            }
            FailureKind::Cancelled => write!(f, "cancelled"),
        }
    }
}
