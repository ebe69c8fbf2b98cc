use std::time::Duration;

use engine_logging::{engine_info, engine_warn};
use pagetext_core::{Effect, ItemResultKind, Msg, Stage};
use pagetext_engine::{EngineDisconnected, EngineEvent, EngineHandle};

/// Carries core effects out on the engine and turns engine events into
/// core messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle) -> Self {
        Self { engine }
    }

    pub fn run(&self, effects: Vec<Effect>) -> Result<(), EngineDisconnected> {
        for effect in effects {
            match effect {
                Effect::StartBatch { urls } => {
                    engine_info!("StartBatch url_count={}", urls.len());
                    self.engine.run_batch(urls)?;
                }
                Effect::CancelBatch => {
                    engine_warn!("CancelBatch requested");
                    self.engine.cancel();
                }
            }
        }
        Ok(())
    }

    pub fn recv_timeout(
        &self,
        timeout: Duration,
    ) -> Result<Option<EngineEvent>, EngineDisconnected> {
        self.engine.recv_timeout(timeout)
    }
}

pub fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::ItemQueued { index, url } => Msg::ItemQueued { index, url },
        EngineEvent::ItemSkipped { index, url, reason } => Msg::ItemSkipped {
            index,
            url,
            reason: reason.to_string(),
        },
        EngineEvent::Progress(progress) => Msg::ItemProgress {
            index: progress.index,
            stage: map_stage(progress.stage),
            attempt: progress.attempt,
            bytes: progress.bytes,
        },
        EngineEvent::ItemFinished { index, result } => Msg::ItemFinished {
            index,
            result: match result {
                Ok(_) => ItemResultKind::Success,
                Err(kind) => ItemResultKind::Failed {
                    reason: kind.to_string(),
                },
            },
        },
        EngineEvent::ItemSaved { index, path } => Msg::ItemSaved {
            index,
            path: path.display().to_string(),
        },
        EngineEvent::ItemSaveFailed { index, message } => Msg::ItemSaveFailed { index, message },
        EngineEvent::BatchFinished(_) => Msg::BatchFinished,
    }
}

fn map_stage(stage: pagetext_engine::Stage) -> Stage {
    match stage {
        pagetext_engine::Stage::Queued => Stage::Queued,
        pagetext_engine::Stage::Downloading => Stage::Downloading,
        pagetext_engine::Stage::Retrying => Stage::Retrying,
        pagetext_engine::Stage::Extracting => Stage::Extracting,
        pagetext_engine::Stage::Writing => Stage::Writing,
        pagetext_engine::Stage::Done => Stage::Done,
    }
}
