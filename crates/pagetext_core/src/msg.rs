use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User edited the URL input (comma or newline separated).
    InputChanged(String),
    /// User submitted the current input as a batch.
    UrlsSubmitted,
    /// User asked to abandon the running batch.
    CancelClicked,
    /// Time since the batch started; drives throughput and ETA.
    Tick { elapsed: Duration },
    /// Engine accepted a URL for fetching.
    ItemQueued { index: crate::ItemIndex, url: String },
    /// Engine rejected a URL before fetching.
    ItemSkipped {
        index: crate::ItemIndex,
        url: String,
        reason: String,
    },
    /// Engine progress for one URL.
    ItemProgress {
        index: crate::ItemIndex,
        stage: crate::Stage,
        attempt: Option<u32>,
        bytes: Option<u64>,
    },
    /// Fetch and extraction finished for one URL.
    ItemFinished {
        index: crate::ItemIndex,
        result: crate::ItemResultKind,
    },
    ItemSaved { index: crate::ItemIndex, path: String },
    ItemSaveFailed { index: crate::ItemIndex, message: String },
    BatchFinished,
    /// Fallback for placeholder wiring.
    NoOp,
}
