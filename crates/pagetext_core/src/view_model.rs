use std::time::Duration;

use crate::{ItemIndex, ItemResultKind, SessionState, Stage};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchStats {
    /// Items that were (or are being) fetched.
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Share of `total` that has finished, by count.
    pub percent: u8,
    pub urls_per_minute: f64,
    pub eta: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub session: SessionState,
    pub items: Vec<ItemRowView>,
    pub stats: BatchStats,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRowView {
    pub index: ItemIndex,
    pub url: String,
    pub stage: Stage,
    pub attempt: Option<u32>,
    pub bytes: Option<u64>,
    pub outcome: Option<ItemResultKind>,
    pub saved_to: Option<String>,
    pub save_error: Option<String>,
}
