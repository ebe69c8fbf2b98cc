//! Command-line front end for the pagetext pipeline.
mod platform;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

/// Fetch web pages through a scraping proxy and save their visible text.
#[derive(Parser, Debug, Default)]
#[command(name = "pagetext")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// URLs to fetch. Commas and newlines also separate entries.
    pub urls: Vec<String>,

    /// Read additional URLs from a file, one per line.
    #[arg(long, short)]
    pub input: Option<PathBuf>,

    /// Output format: txt or md.
    #[arg(long, short)]
    pub format: Option<String>,

    /// Directory the extracted text is written to.
    #[arg(long, short)]
    pub output_dir: Option<PathBuf>,

    /// Number of concurrent fetches (1-10).
    #[arg(long, short)]
    pub workers: Option<usize>,

    /// Attempts per URL, including the first (1-10).
    #[arg(long)]
    pub retries: Option<u32>,

    /// Per-attempt timeout in seconds (1-60).
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Base backoff delay in seconds; doubles after each failed attempt.
    #[arg(long)]
    pub retry_delay: Option<f64>,

    /// Refuse local and private hosts and non-standard ports.
    #[arg(long)]
    pub strict_urls: bool,

    /// Skip writing batch_report.json.
    #[arg(long)]
    pub no_report: bool,

    /// Load settings from a saved preset before applying flags.
    #[arg(long)]
    pub preset: Option<String>,

    /// Save the effective settings as a named preset.
    #[arg(long)]
    pub save_preset: Option<String>,

    /// Cancel the batch after this many seconds.
    #[arg(long)]
    pub max_duration: Option<u64>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match platform::run_app(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
