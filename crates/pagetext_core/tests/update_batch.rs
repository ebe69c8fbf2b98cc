use std::sync::Once;

use pagetext_core::{
    parse_urls, update, AppState, Effect, Msg, SessionState,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

fn submit_urls(state: AppState, input: &str) -> (AppState, Vec<Effect>) {
    let (state, _) = update(state, Msg::InputChanged(input.to_string()));
    update(state, Msg::UrlsSubmitted)
}

fn running_with(urls: &[&str]) -> AppState {
    let (mut state, _) = submit_urls(AppState::new(), &urls.join("\n"));
    for (i, url) in urls.iter().enumerate() {
        state = update(
            state,
            Msg::ItemQueued {
                index: i + 1,
                url: url.to_string(),
            },
        )
        .0;
    }
    state
}

#[test]
fn parse_urls_splits_on_commas_and_newlines() {
    let parsed = parse_urls(" https://a.example.com, https://b.example.com\r\n\n ,https://c.example.com ");
    assert_eq!(
        parsed,
        vec![
            "https://a.example.com",
            "https://b.example.com",
            "https://c.example.com",
        ]
    );
}

#[test]
fn submit_starts_batch_with_parsed_urls() {
    init_logging();
    let (next, effects) = submit_urls(AppState::new(), "https://a.example.com \n\n https://b.example.com\n");

    assert_eq!(next.session(), SessionState::Running);
    assert_eq!(
        effects,
        vec![Effect::StartBatch {
            urls: vec![
                "https://a.example.com".to_string(),
                "https://b.example.com".to_string(),
            ]
        }]
    );
}

#[test]
fn blank_input_does_nothing() {
    init_logging();
    let (next, effects) = submit_urls(AppState::new(), "  \n , \n");
    assert_eq!(next.session(), SessionState::Idle);
    assert!(effects.is_empty());
}

#[test]
fn second_submit_while_running_is_ignored() {
    init_logging();
    let state = running_with(&["https://a.example.com"]);
    let (next, effects) = submit_urls(state, "https://other.example.com");
    assert!(effects.is_empty());
    assert_eq!(next.view().items.len(), 1);
}

#[test]
fn cancel_only_applies_to_running_batch() {
    init_logging();
    let (idle, effects) = update(AppState::new(), Msg::CancelClicked);
    assert!(effects.is_empty());
    assert_eq!(idle.session(), SessionState::Idle);

    let state = running_with(&["https://a.example.com"]);
    let (cancelling, effects) = update(state, Msg::CancelClicked);
    assert_eq!(effects, vec![Effect::CancelBatch]);
    assert_eq!(cancelling.session(), SessionState::Cancelling);

    let (again, effects) = update(cancelling, Msg::CancelClicked);
    assert!(effects.is_empty());
    let (finished, _) = update(again, Msg::BatchFinished);
    assert_eq!(finished.session(), SessionState::Finished);
}

#[test]
fn finished_batch_accepts_new_submission() {
    init_logging();
    let state = running_with(&["https://a.example.com"]);
    let (state, _) = update(state, Msg::BatchFinished);
    let (next, effects) = submit_urls(state, "https://b.example.com");
    assert_eq!(next.session(), SessionState::Running);
    assert_eq!(effects.len(), 1);
    assert!(next.view().items.is_empty());
}
