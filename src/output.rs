//! CLI status output helpers.

use crate::common::format::format_size;
use crate::engine::progress::{FileStatus, TransferProgress};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn finish_spinner_success(spinner: &ProgressBar, msg: &str) {
    spinner.finish_with_message(format!("{} {}", style("✓").green().bold(), msg));
}

pub fn finish_spinner_error(spinner: &ProgressBar, msg: &str) {
    spinner.finish_with_message(format!("{} {}", style("✗").red().bold(), msg));
}

/// Closing summary of an upload batch: counts first, then one line per
/// settled file with its locally measured size and, on failure, the error.
pub fn transfer_summary(progress: &TransferProgress) -> String {
    let succeeded = progress
        .files
        .iter()
        .filter(|f| f.status == FileStatus::Done)
        .count();
    let mut out = format!(
        "Upload finished: {succeeded}/{} succeeded",
        progress.total
    );

    for file in &progress.files {
        match &file.status {
            FileStatus::Done => out.push_str(&format!(
                "\n  {} {} ({})",
                style("✓").green(),
                file.name,
                format_size(file.size)
            )),
            FileStatus::Failed(err) => out.push_str(&format!(
                "\n  {} {} ({}): {err}",
                style("✗").red(),
                file.name,
                format_size(file.size)
            )),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::progress::FileProgress;

    fn finished_batch() -> TransferProgress {
        TransferProgress {
            files: vec![
                FileProgress {
                    name: "a.txt".to_string(),
                    size: 1536,
                    status: FileStatus::Done,
                },
                FileProgress {
                    name: "b.txt".to_string(),
                    size: 100,
                    status: FileStatus::Failed("quota exceeded".to_string()),
                },
            ],
            completed: 2,
            total: 2,
        }
    }

    #[test]
    fn summary_shows_each_file_with_its_size() {
        let summary = transfer_summary(&finished_batch());
        assert!(summary.starts_with("Upload finished: 1/2 succeeded"));
        assert!(summary.contains("a.txt (1.5 KB)"));
        assert!(summary.contains("b.txt (100.0 B): quota exceeded"));
    }

    #[test]
    fn summary_skips_files_that_never_settled() {
        let mut progress = finished_batch();
        progress.files.push(FileProgress {
            name: "c.txt".to_string(),
            size: 1,
            status: FileStatus::Pending,
        });
        progress.total = 3;

        let summary = transfer_summary(&progress);
        assert!(!summary.contains("c.txt"));
    }
}
