#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pagetext_engine::{
    EngineEvent, FailureKind, FetchError, FetchMetadata, FetchOutput, Fetcher, ItemIndex,
    ProgressSink,
};

pub fn page(body: &str) -> FetchOutput {
    FetchOutput {
        body: body.to_string(),
        metadata: FetchMetadata {
            target_url: String::new(),
            status: 200,
            content_type: Some("text/html".into()),
            byte_len: body.len() as u64,
            encoding: "UTF-8".into(),
        },
    }
}

/// Replays a script of results, then keeps returning the fallback.
pub struct ScriptedFetcher {
    script: Mutex<VecDeque<Result<FetchOutput, FetchError>>>,
    fallback: Result<FetchOutput, FetchError>,
    pub calls: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new(
        script: Vec<Result<FetchOutput, FetchError>>,
        fallback: Result<FetchOutput, FetchError>,
    ) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn always_failing(kind: FailureKind) -> Self {
        Self::new(Vec::new(), Err(FetchError::new(kind, "stub failure")))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(
        &self,
        _index: ItemIndex,
        _url: &str,
        _timeout: Duration,
        _sink: &dyn ProgressSink,
    ) -> Result<FetchOutput, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }
}

/// Serves a page per URL after a delay and records the concurrency peak.
pub struct GaugeFetcher {
    delay: Duration,
    in_flight: AtomicUsize,
    pub peak: AtomicUsize,
    pub fetched: Mutex<Vec<String>>,
    failing: Vec<String>,
}

impl GaugeFetcher {
    pub fn new(delay: Duration) -> Self {
        Self::failing_on(delay, Vec::new())
    }

    pub fn failing_on(delay: Duration, failing: Vec<String>) -> Self {
        Self {
            delay,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            fetched: Mutex::new(Vec::new()),
            failing,
        }
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Fetcher for GaugeFetcher {
    async fn fetch(
        &self,
        _index: ItemIndex,
        url: &str,
        _timeout: Duration,
        _sink: &dyn ProgressSink,
    ) -> Result<FetchOutput, FetchError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.fetched.lock().unwrap().push(url.to_string());
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if self.failing.iter().any(|f| f == url) {
            return Err(FetchError::new(FailureKind::HttpStatus(503), "stub 503"));
        }
        Ok(page(&format!("<title>{url}</title><p>body of {url}</p>")))
    }
}

#[derive(Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<EngineEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl ProgressSink for RecordingSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}
