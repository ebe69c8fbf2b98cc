use std::fs;
use std::io::Write;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use engine_logging::{engine_info, engine_warn};
use pagetext_core::{update, AppState, Msg, SessionState};
use pagetext_engine::{EngineEvent, EngineHandle};

use super::config::{build_engine_config, env_lookup, load_dotenv};
use super::effects::{map_event, EffectRunner};
use super::logging::{self, LogSettings};
use super::presets::{presets_dir, save_preset};
use super::render;
use crate::Cli;

const PUMP_INTERVAL: Duration = Duration::from_millis(100);
const RENDER_INTERVAL: Duration = Duration::from_millis(250);

pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    let env_file = load_dotenv();
    if let Some(path) = logging::initialize(&LogSettings::from_lookup(env_lookup)) {
        engine_info!("Logging to {:?}", path);
    }
    if let Some(path) = env_file {
        engine_info!("Loaded environment from {:?}", path);
    }

    let config = build_engine_config(&cli, env_lookup)?;

    if let Some(name) = &cli.save_preset {
        let path = save_preset(&presets_dir(&config.output_dir), name, &config)?;
        println!("Saved preset to {}", path.display());
    }

    let input = gather_input(&cli)?;
    let (state, _) = update(AppState::new(), Msg::InputChanged(input));
    let (state, effects) = update(state, Msg::UrlsSubmitted);
    if effects.is_empty() {
        if cli.save_preset.is_some() {
            return Ok(ExitCode::SUCCESS);
        }
        bail!("no URLs given; pass them as arguments or with --input");
    }

    let runner = EffectRunner::new(EngineHandle::new(config)?);
    runner.run(effects)?;

    let started = Instant::now();
    let deadline = cli.max_duration.map(Duration::from_secs);
    let mut state = state;
    let mut last_render: Option<Instant> = None;

    let summary = loop {
        let next = runner
            .recv_timeout(PUMP_INTERVAL)
            .context("engine stopped before the batch finished")?;
        if let Some(event) = next {
            if let EngineEvent::BatchFinished(summary) = event {
                state = dispatch(state, &runner, Msg::BatchFinished)?;
                break summary;
            }
            state = dispatch(state, &runner, map_event(event))?;
        }

        let elapsed = started.elapsed();
        state = dispatch(state, &runner, Msg::Tick { elapsed })?;
        if state.session() == SessionState::Running && deadline.is_some_and(|d| elapsed >= d) {
            engine_warn!("Batch ran past {:?}; cancelling", elapsed);
            state = dispatch(state, &runner, Msg::CancelClicked)?;
        }

        if last_render.map_or(true, |at| at.elapsed() >= RENDER_INTERVAL) && state.consume_dirty() {
            eprint!("\r{}", render::progress_line(&state.view()));
            let _ = std::io::stderr().flush();
            last_render = Some(Instant::now());
        }
    };

    let view = state.view();
    eprintln!("\r{}", render::progress_line(&view));
    for line in render::item_lines(&view) {
        println!("{line}");
    }
    println!("{}", render::summary_line(&summary));

    Ok(if summary.failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn dispatch(state: AppState, runner: &EffectRunner, msg: Msg) -> anyhow::Result<AppState> {
    let (state, effects) = update(state, msg);
    runner.run(effects)?;
    Ok(state)
}

/// Positional URLs first, then the contents of `--input`.
fn gather_input(cli: &Cli) -> anyhow::Result<String> {
    let mut input = cli.urls.join("\n");
    if let Some(path) = &cli.input {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read URL list {}", path.display()))?;
        input.push('\n');
        input.push_str(&text);
    }
    Ok(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagetext_core::parse_urls;

    #[test]
    fn input_combines_arguments_and_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let list = temp.path().join("urls.txt");
        fs::write(&list, "https://b.example.com\n\nhttps://c.example.com, https://d.example.com\n")
            .unwrap();
        let cli = Cli {
            urls: vec!["https://a.example.com".into()],
            input: Some(list),
            ..Cli::default()
        };

        let input = gather_input(&cli).unwrap();
        assert_eq!(
            parse_urls(&input),
            vec![
                "https://a.example.com",
                "https://b.example.com",
                "https://c.example.com",
                "https://d.example.com",
            ]
        );
    }

    #[test]
    fn missing_input_file_is_an_error() {
        let cli = Cli {
            input: Some("/definitely/not/here.txt".into()),
            ..Cli::default()
        };
        assert!(gather_input(&cli).is_err());
    }
}
