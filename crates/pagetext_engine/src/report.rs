use std::path::{Path, PathBuf};

use serde_json::{json, Value};

use crate::persist::{AtomicFileWriter, PersistError};
use crate::{ScrapeItem, ScrapeOutcome};

pub const REPORT_FILENAME: &str = "batch_report.json";

/// Where one item's text ended up, if anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatus {
    Saved(PathBuf),
    Failed(String),
    NotSaved,
}

/// Write `batch_report.json` listing every input URL with its outcome.
pub fn write_batch_report(
    output_dir: &Path,
    items: &[(ScrapeItem, SaveStatus)],
) -> Result<PathBuf, PersistError> {
    let report = build_report(items);
    let writer = AtomicFileWriter::new(output_dir.to_path_buf());
    let pretty = serde_json::to_string_pretty(&report).unwrap_or_else(|_| report.to_string());
    writer.write(REPORT_FILENAME, &pretty)
}

pub fn build_report(items: &[(ScrapeItem, SaveStatus)]) -> Value {
    let entries: Vec<Value> = items.iter().map(|(item, saved)| entry(item, saved)).collect();
    let count = |pred: fn(&ScrapeOutcome) -> bool| items.iter().filter(|(i, _)| pred(&i.outcome)).count();
    json!({
        "total": items.len(),
        "scraped": count(|o| matches!(o, ScrapeOutcome::Scraped(_))),
        "failed": count(|o| matches!(o, ScrapeOutcome::Failed(_))),
        "skipped": count(|o| matches!(o, ScrapeOutcome::Skipped(_))),
        "items": entries,
    })
}

fn entry(item: &ScrapeItem, saved: &SaveStatus) -> Value {
    let (status, reason) = match &item.outcome {
        ScrapeOutcome::Scraped(_) => ("scraped", None),
        ScrapeOutcome::Skipped(rejection) => ("skipped", Some(rejection.to_string())),
        ScrapeOutcome::Failed(err) => ("failed", Some(err.to_string())),
    };
    let (file, save_error) = match saved {
        SaveStatus::Saved(path) => (Some(path.display().to_string()), None),
        SaveStatus::Failed(message) => (None, Some(message.clone())),
        SaveStatus::NotSaved => (None, None),
    };
    json!({
        "index": item.index,
        "url": item.url,
        "status": status,
        "reason": reason,
        "file": file,
        "save_error": save_error,
    })
}
