//! Pagetext core: pure batch/progress state machine and view-model helpers.
mod effect;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use state::{AppState, ItemIndex, ItemResultKind, SessionState, Stage};
pub use update::{parse_urls, update};
pub use view_model::{AppViewModel, BatchStats, ItemRowView};
