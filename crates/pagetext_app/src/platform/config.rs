//! Settings resolution: `.env`, then process environment, then an optional
//! preset, then command-line flags.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use pagetext_engine::{EngineConfig, OutputFormat, RetryPolicy, UrlPolicy};

use super::presets::{load_preset, presets_dir};
use crate::Cli;

/// Load `.env` from the working directory or its parents if present.
pub fn load_dotenv() -> Option<PathBuf> {
    match dotenvy::dotenv() {
        Ok(path) => Some(path),
        Err(err) if err.not_found() => None,
        Err(err) => {
            eprintln!("Warning: ignoring unreadable .env file: {err}");
            None
        }
    }
}

pub fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

pub fn build_engine_config<F>(cli: &Cli, lookup: F) -> anyhow::Result<EngineConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = EngineConfig::from_lookup(lookup).context("invalid environment settings")?;

    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(name) = &cli.preset {
        let preset = load_preset(&presets_dir(&config.output_dir), name)?;
        preset.apply(&mut config)?;
    }
    apply_overrides(cli, &mut config)?;

    config.validate().context("invalid settings")?;
    Ok(config)
}

fn apply_overrides(cli: &Cli, config: &mut EngineConfig) -> anyhow::Result<()> {
    if let Some(format) = &cli.format {
        config.format = format.parse::<OutputFormat>()?;
    }
    if let Some(workers) = cli.workers {
        config.max_workers = workers;
    }
    if let Some(retries) = cli.retries {
        config.retry = RetryPolicy::new(retries, config.retry.base_delay);
    }
    if let Some(secs) = cli.retry_delay {
        let delay = Duration::try_from_secs_f64(secs)
            .with_context(|| format!("{secs} is not a valid retry delay"))?;
        config.retry = RetryPolicy::new(config.retry.retries, delay);
    }
    if let Some(secs) = cli.timeout {
        config.fetch.request_timeout = Duration::from_secs(secs);
    }
    if cli.strict_urls {
        config.url_policy = UrlPolicy::strict();
    }
    if cli.no_report {
        config.write_report = false;
    }
    Ok(())
}
