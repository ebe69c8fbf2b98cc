use std::sync::Once;
use std::time::Duration;

use pagetext_core::{update, AppState, ItemResultKind, Msg, Stage};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

fn running_with(count: usize) -> AppState {
    let urls: Vec<String> = (1..=count)
        .map(|i| format!("https://{i}.example.com"))
        .collect();
    let (state, _) = update(AppState::new(), Msg::InputChanged(urls.join(",")));
    let (mut state, _) = update(state, Msg::UrlsSubmitted);
    for (i, url) in urls.into_iter().enumerate() {
        state = update(state, Msg::ItemQueued { index: i + 1, url }).0;
    }
    state
}

fn finish(state: AppState, index: usize, result: ItemResultKind) -> AppState {
    update(state, Msg::ItemFinished { index, result }).0
}

#[test]
fn progress_updates_stage_attempt_and_bytes() {
    init_logging();
    let state = running_with(1);
    let (state, _) = update(
        state,
        Msg::ItemProgress {
            index: 1,
            stage: Stage::Retrying,
            attempt: Some(2),
            bytes: None,
        },
    );
    let (state, _) = update(
        state,
        Msg::ItemProgress {
            index: 1,
            stage: Stage::Downloading,
            attempt: None,
            bytes: Some(512),
        },
    );

    let row = &state.view().items[0];
    assert_eq!(row.stage, Stage::Downloading);
    assert_eq!(row.attempt, Some(2));
    assert_eq!(row.bytes, Some(512));
}

#[test]
fn unknown_index_is_ignored() {
    init_logging();
    let mut state = running_with(1);
    state.consume_dirty();
    let (mut state, _) = update(
        state,
        Msg::ItemProgress {
            index: 42,
            stage: Stage::Downloading,
            attempt: None,
            bytes: None,
        },
    );
    assert!(!state.consume_dirty());
}

#[test]
fn finished_item_is_not_reopened_by_late_progress() {
    init_logging();
    let state = finish(running_with(1), 1, ItemResultKind::Success);
    let (state, _) = update(
        state,
        Msg::ItemProgress {
            index: 1,
            stage: Stage::Downloading,
            attempt: None,
            bytes: None,
        },
    );
    assert_eq!(state.view().items[0].stage, Stage::Done);
}

#[test]
fn save_outcomes_are_recorded() {
    init_logging();
    let state = running_with(2);
    let state = finish(state, 1, ItemResultKind::Success);
    let state = finish(state, 2, ItemResultKind::Success);
    let (state, _) = update(
        state,
        Msg::ItemSaved {
            index: 1,
            path: "out/example_com_1.txt".into(),
        },
    );
    let (state, _) = update(
        state,
        Msg::ItemSaveFailed {
            index: 2,
            message: "permission denied".into(),
        },
    );

    let view = state.view();
    assert_eq!(view.items[0].saved_to.as_deref(), Some("out/example_com_1.txt"));
    assert_eq!(view.items[1].save_error.as_deref(), Some("permission denied"));
}

#[test]
fn stats_count_completed_items_and_exclude_skipped() {
    init_logging();
    let state = running_with(4);
    let (state, _) = update(
        state,
        Msg::ItemSkipped {
            index: 5,
            url: "nope".into(),
            reason: "malformed url".into(),
        },
    );
    let state = finish(state, 1, ItemResultKind::Success);
    let state = finish(
        state,
        2,
        ItemResultKind::Failed {
            reason: "http status 500".into(),
        },
    );
    let (state, _) = update(
        state,
        Msg::Tick {
            elapsed: Duration::from_secs(30),
        },
    );

    let stats = state.stats();
    assert_eq!(stats.total, 4);
    assert_eq!(stats.succeeded, 1);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.percent, 50);
    assert!((stats.urls_per_minute - 4.0).abs() < 1e-9);
    assert_eq!(stats.eta, Some(Duration::from_secs(30)));
}

#[test]
fn stats_have_no_eta_before_first_completion() {
    init_logging();
    let (state, _) = update(
        running_with(3),
        Msg::Tick {
            elapsed: Duration::from_secs(5),
        },
    );
    let stats = state.stats();
    assert_eq!(stats.percent, 0);
    assert_eq!(stats.eta, None);
    assert_eq!(stats.urls_per_minute, 0.0);
}

#[test]
fn dirty_flag_is_consumed_once() {
    init_logging();
    let mut state = running_with(1);
    assert!(state.consume_dirty());
    assert!(!state.consume_dirty());
}
