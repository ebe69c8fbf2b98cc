//! Console rendering of the view model.

use std::time::Duration;

use pagetext_core::{AppViewModel, ItemResultKind, ItemRowView, Stage};
use pagetext_engine::BatchSummary;

pub fn progress_line(view: &AppViewModel) -> String {
    let stats = &view.stats;
    let done = stats.succeeded + stats.failed;
    let eta = match stats.eta {
        Some(eta) => format_duration(eta),
        None => "--".to_string(),
    };
    format!(
        "[{:>3}%] {}/{} done, {} failed, {} skipped | {:.1} urls/min | eta {}",
        stats.percent, done, stats.total, stats.failed, stats.skipped, stats.urls_per_minute, eta
    )
}

pub fn item_lines(view: &AppViewModel) -> Vec<String> {
    view.items.iter().map(item_line).collect()
}

fn item_line(row: &ItemRowView) -> String {
    match &row.outcome {
        Some(ItemResultKind::Success) => match (&row.saved_to, &row.save_error) {
            (Some(path), _) => format!("{:>4} ok      {} -> {}", row.index, row.url, path),
            (None, Some(err)) => format!("{:>4} unsaved {}: {}", row.index, row.url, err),
            (None, None) => format!("{:>4} ok      {}", row.index, row.url),
        },
        Some(ItemResultKind::Failed { reason }) => {
            format!("{:>4} failed  {}: {}", row.index, row.url, reason)
        }
        Some(ItemResultKind::Skipped { reason }) => {
            format!("{:>4} skipped {}: {}", row.index, row.url, reason)
        }
        None => format!("{:>4} {:<7} {}", row.index, stage_label(row.stage), row.url),
    }
}

fn stage_label(stage: Stage) -> &'static str {
    match stage {
        Stage::Queued => "queued",
        Stage::Downloading => "fetch",
        Stage::Retrying => "retry",
        Stage::Extracting => "extract",
        Stage::Writing => "write",
        Stage::Done => "done",
    }
}

pub fn summary_line(summary: &BatchSummary) -> String {
    let mut line = format!(
        "{} scraped, {} failed, {} skipped, {} saved",
        summary.scraped, summary.failed, summary.skipped, summary.saved
    );
    if let Some(path) = &summary.report_path {
        line.push_str(&format!("; report at {}", path.display()));
    }
    line
}

fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 60 {
        format!("{}m{:02}s", secs / 60, secs % 60)
    } else {
        format!("{secs}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagetext_core::{BatchStats, SessionState};
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn row(index: usize, outcome: Option<ItemResultKind>) -> ItemRowView {
        ItemRowView {
            index,
            url: format!("https://{index}.example.com"),
            stage: Stage::Downloading,
            attempt: None,
            bytes: None,
            outcome,
            saved_to: None,
            save_error: None,
        }
    }

    #[test]
    fn progress_line_shows_rate_and_eta() {
        let view = AppViewModel {
            session: SessionState::Running,
            items: Vec::new(),
            stats: BatchStats {
                total: 4,
                succeeded: 1,
                failed: 1,
                skipped: 1,
                percent: 50,
                urls_per_minute: 4.0,
                eta: Some(Duration::from_secs(95)),
            },
            dirty: true,
        };
        assert_eq!(
            progress_line(&view),
            "[ 50%] 2/4 done, 1 failed, 1 skipped | 4.0 urls/min | eta 1m35s"
        );
    }

    #[test]
    fn item_lines_reflect_outcomes() {
        let mut saved = row(1, Some(ItemResultKind::Success));
        saved.saved_to = Some("out/example_com_1.txt".into());
        let view = AppViewModel {
            items: vec![
                saved,
                row(
                    2,
                    Some(ItemResultKind::Failed {
                        reason: "timeout".into(),
                    }),
                ),
                row(3, None),
            ],
            ..AppViewModel::default()
        };
        assert_eq!(
            item_lines(&view),
            vec![
                "   1 ok      https://1.example.com -> out/example_com_1.txt",
                "   2 failed  https://2.example.com: timeout",
                "   3 fetch   https://3.example.com",
            ]
        );
    }

    #[test]
    fn summary_mentions_report() {
        let summary = BatchSummary {
            scraped: 2,
            failed: 1,
            skipped: 0,
            saved: 2,
            report_path: Some(PathBuf::from("out/batch_report.json")),
        };
        assert_eq!(
            summary_line(&summary),
            "2 scraped, 1 failed, 0 skipped, 2 saved; report at out/batch_report.json"
        );
    }
}
