use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use engine_logging::{engine_error, engine_info};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::config::EngineConfig;
use crate::fetch::ChannelProgressSink;
use crate::pipeline::Scraper;
use crate::EngineEvent;

enum EngineCommand {
    RunBatch {
        urls: Vec<String>,
        cancel: CancellationToken,
    },
}

/// The engine thread has exited; no more events will arrive.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("engine thread is no longer running")]
pub struct EngineDisconnected;

/// Runs batches on a background runtime and reports through an event channel.
///
/// Worker tasks only ever send events; whoever owns the handle drains them.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: Arc<Mutex<mpsc::Receiver<EngineEvent>>>,
    /// Token of the most recently queued batch.
    current: Arc<Mutex<Option<CancellationToken>>>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Result<Self, crate::FetchError> {
        let scraper = Scraper::new(config)?;
        Ok(Self::with_scraper(scraper))
    }

    pub fn with_scraper(scraper: Scraper) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let scraper = Arc::new(scraper);

        thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    engine_error!("Failed to start engine runtime: {}", err);
                    return;
                }
            };
            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::RunBatch { urls, cancel } => {
                        let sink = ChannelProgressSink::new(event_tx.clone());
                        engine_info!("Starting batch of {} urls", urls.len());
                        runtime.block_on(scraper.run_batch(&urls, &cancel, &sink));
                    }
                }
            }
        });

        Self {
            cmd_tx,
            event_rx: Arc::new(Mutex::new(event_rx)),
            current: Arc::new(Mutex::new(None)),
        }
    }

    /// Queue a batch. Batches run one after another, each with its own
    /// cancellation token.
    pub fn run_batch(&self, urls: Vec<String>) -> Result<(), EngineDisconnected> {
        let cancel = CancellationToken::new();
        if let Ok(mut guard) = self.current.lock() {
            *guard = Some(cancel.clone());
        }
        self.cmd_tx
            .send(EngineCommand::RunBatch { urls, cancel })
            .map_err(|_| {
                engine_error!("Engine thread is gone; batch not queued");
                EngineDisconnected
            })
    }

    /// Abandon the most recently queued batch, whether it is running or still
    /// waiting: unstarted items are not fetched, in-flight ones stop at their
    /// next await point and report `Cancelled`.
    pub fn cancel(&self) {
        if let Ok(guard) = self.current.lock() {
            if let Some(token) = guard.as_ref() {
                token.cancel();
            }
        }
    }

    /// `Ok(None)` when nothing is pending right now.
    pub fn try_recv(&self) -> Result<Option<EngineEvent>, EngineDisconnected> {
        let rx = self.event_rx.lock().map_err(|_| EngineDisconnected)?;
        match rx.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::TryRecvError::Empty) => Ok(None),
            Err(mpsc::TryRecvError::Disconnected) => Err(EngineDisconnected),
        }
    }

    /// `Ok(None)` when the timeout elapsed without an event.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<EngineEvent>, EngineDisconnected> {
        let rx = self.event_rx.lock().map_err(|_| EngineDisconnected)?;
        match rx.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::RecvTimeoutError::Timeout) => Ok(None),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(EngineDisconnected),
        }
    }
}
