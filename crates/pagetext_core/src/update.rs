use crate::{AppState, Effect, Msg, SessionState};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::InputChanged(raw) => {
            state.set_input(raw);
            Vec::new()
        }
        Msg::UrlsSubmitted => {
            // One batch at a time; a new one may start once the last finished.
            if matches!(
                state.session(),
                SessionState::Running | SessionState::Cancelling
            ) {
                return (state, Vec::new());
            }
            let urls = parse_urls(state.input());
            if urls.is_empty() {
                return (state, Vec::new());
            }
            state.start_batch();
            vec![Effect::StartBatch { urls }]
        }
        Msg::CancelClicked => {
            if state.session() == SessionState::Running {
                state.cancel();
                vec![Effect::CancelBatch]
            } else {
                Vec::new()
            }
        }
        Msg::Tick { elapsed } => {
            state.set_elapsed(elapsed);
            Vec::new()
        }
        Msg::ItemQueued { index, url } => {
            state.queue_item(index, url);
            Vec::new()
        }
        Msg::ItemSkipped { index, url, reason } => {
            state.skip_item(index, url, reason);
            Vec::new()
        }
        Msg::ItemProgress {
            index,
            stage,
            attempt,
            bytes,
        } => {
            state.apply_progress(index, stage, attempt, bytes);
            Vec::new()
        }
        Msg::ItemFinished { index, result } => {
            state.apply_finished(index, result);
            Vec::new()
        }
        Msg::ItemSaved { index, path } => {
            state.apply_saved(index, Some(path), None);
            Vec::new()
        }
        Msg::ItemSaveFailed { index, message } => {
            state.apply_saved(index, None, Some(message));
            Vec::new()
        }
        Msg::BatchFinished => {
            state.finish();
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

/// Split pasted text on commas and newlines, trimming and dropping blanks.
pub fn parse_urls(raw: &str) -> Vec<String> {
    raw.split([',', '\n', '\r'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}
