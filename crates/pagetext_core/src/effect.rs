#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    StartBatch { urls: Vec<String> },
    CancelBatch,
}
