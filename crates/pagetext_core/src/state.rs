use std::collections::BTreeMap;
use std::time::Duration;

use crate::view_model::{AppViewModel, BatchStats, ItemRowView};

pub type ItemIndex = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Running,
    Cancelling,
    Finished,
}

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
pub enum ItemResultKind {
    Success,
    Failed { reason: String },
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ItemRow {
    pub(crate) url: String,
    pub(crate) stage: Stage,
    pub(crate) attempt: Option<u32>,
    pub(crate) bytes: Option<u64>,
    pub(crate) outcome: Option<ItemResultKind>,
    pub(crate) saved_to: Option<String>,
    pub(crate) save_error: Option<String>,
}

impl ItemRow {
    fn new(url: String) -> Self {
        Self {
            url,
            stage: Stage::Queued,
            attempt: None,
            bytes: None,
            outcome: None,
            saved_to: None,
            save_error: None,
        }
    }

    fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    session: SessionState,
    input: String,
    items: BTreeMap<ItemIndex, ItemRow>,
    elapsed: Duration,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> SessionState {
        self.session
    }

    /// Returns whether anything changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            session: self.session,
            items: self
                .items
                .iter()
                .map(|(index, row)| ItemRowView {
                    index: *index,
                    url: row.url.clone(),
                    stage: row.stage,
                    attempt: row.attempt,
                    bytes: row.bytes,
                    outcome: row.outcome.clone(),
                    saved_to: row.saved_to.clone(),
                    save_error: row.save_error.clone(),
                })
                .collect(),
            stats: self.stats(),
            dirty: self.dirty,
        }
    }

    /// Completion counts only fetched items; skipped URLs are never in
    /// flight and are reported separately.
    pub fn stats(&self) -> BatchStats {
        let mut stats = BatchStats::default();
        for row in self.items.values() {
            match &row.outcome {
                Some(ItemResultKind::Skipped { .. }) => stats.skipped += 1,
                Some(ItemResultKind::Success) => {
                    stats.total += 1;
                    stats.succeeded += 1;
                }
                Some(ItemResultKind::Failed { .. }) => {
                    stats.total += 1;
                    stats.failed += 1;
                }
                None => stats.total += 1,
            }
        }
        let completed = stats.succeeded + stats.failed;
        stats.percent = if stats.total == 0 {
            0
        } else {
            (completed * 100 / stats.total) as u8
        };

        let elapsed_secs = self.elapsed.as_secs_f64().max(1.0);
        stats.urls_per_minute = completed as f64 / elapsed_secs * 60.0;
        stats.eta = if completed == 0 {
            None
        } else {
            let remaining = (stats.total - completed) as f64;
            Some(Duration::from_secs_f64(
                remaining * elapsed_secs / completed as f64,
            ))
        };
        stats
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_input(&mut self, input: String) {
        self.input = input;
    }

    pub(crate) fn input(&self) -> &str {
        &self.input
    }

    pub(crate) fn start_batch(&mut self) {
        self.session = SessionState::Running;
        self.items.clear();
        self.elapsed = Duration::ZERO;
        self.input.clear();
        self.mark_dirty();
    }

    pub(crate) fn cancel(&mut self) {
        self.session = SessionState::Cancelling;
        self.mark_dirty();
    }

    pub(crate) fn finish(&mut self) {
        self.session = SessionState::Finished;
        self.mark_dirty();
    }

    pub(crate) fn set_elapsed(&mut self, elapsed: Duration) {
        if self.session == SessionState::Running || self.session == SessionState::Cancelling {
            self.elapsed = elapsed;
            self.mark_dirty();
        }
    }

    pub(crate) fn queue_item(&mut self, index: ItemIndex, url: String) {
        self.items.insert(index, ItemRow::new(url));
        self.mark_dirty();
    }

    pub(crate) fn skip_item(&mut self, index: ItemIndex, url: String, reason: String) {
        let mut row = ItemRow::new(url);
        row.outcome = Some(ItemResultKind::Skipped { reason });
        self.items.insert(index, row);
        self.mark_dirty();
    }

    pub(crate) fn apply_progress(
        &mut self,
        index: ItemIndex,
        stage: Stage,
        attempt: Option<u32>,
        bytes: Option<u64>,
    ) {
        // Unknown items are ignored.
        if let Some(row) = self.items.get_mut(&index) {
            // Writing happens after the fetch finished; it must not reopen the row.
            if row.is_finished() && stage != Stage::Writing {
                return;
            }
            row.stage = stage;
            if attempt.is_some() {
                row.attempt = attempt;
            }
            if bytes.is_some() {
                row.bytes = bytes;
            }
            self.mark_dirty();
        }
    }

    pub(crate) fn apply_finished(&mut self, index: ItemIndex, result: ItemResultKind) {
        if let Some(row) = self.items.get_mut(&index) {
            if row.is_finished() {
                return;
            }
            row.stage = Stage::Done;
            row.outcome = Some(result);
            self.mark_dirty();
        }
    }

    pub(crate) fn apply_saved(&mut self, index: ItemIndex, path: Option<String>, error: Option<String>) {
        if let Some(row) = self.items.get_mut(&index) {
            row.stage = Stage::Done;
            row.saved_to = path;
            row.save_error = error;
            self.mark_dirty();
        }
    }
}
