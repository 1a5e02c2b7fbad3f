//! Selection-based aggregation: one remote call for a user-curated subset
//! of the current listing, producing a combined link artifact.

use crate::remote::{AggregateResult, RemoteDrive, SelectionItem};
use anyhow::{ensure, Result};

/// Issue exactly one aggregate call for the whole selection.
///
/// Empty selections and empty target paths are rejected here, before
/// anything goes over the wire. Per-item retries and partial-failure
/// handling are the service's job; the returned result is rendered as-is.
pub async fn aggregate_selection(
    remote: &dyn RemoteDrive,
    selection: &[SelectionItem],
    target_path: &str,
) -> Result<AggregateResult> {
    ensure!(!selection.is_empty(), "No items selected");
    ensure!(
        !target_path.trim().is_empty(),
        "Target path must not be empty"
    );

    tracing::debug!(
        "aggregating {} item(s) under '{target_path}'",
        selection.len()
    );
    Ok(remote.aggregate_links(selection, target_path).await?)
}

/// Plain-text summary of an aggregate outcome: counts, the failed item names
/// exactly as the service reported them, and the combined artifact for
/// copy-out.
pub fn render_summary(result: &AggregateResult) -> String {
    let mut out = format!(
        "Generated {}/{} links",
        result.success_count, result.total_files
    );

    if !result.failed_files.is_empty() {
        out.push_str("\nFailed items:");
        for name in &result.failed_files {
            out.push_str("\n  - ");
            out.push_str(name);
        }
    }

    if !result.combined_artifact.is_empty() {
        out.push_str("\n\n");
        out.push_str(&result.combined_artifact);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partial_result() -> AggregateResult {
        AggregateResult {
            total_files: 3,
            success_count: 1,
            failed_files: vec!["b.mkv".to_string(), "c sub/d.mkv".to_string()],
            combined_artifact: "https://cdn.example.com/a.mkv".to_string(),
        }
    }

    #[test]
    fn summary_lists_exactly_the_reported_failures() {
        let result = partial_result();
        let summary = render_summary(&result);

        let failed_lines: Vec<&str> = summary
            .lines()
            .filter_map(|l| l.strip_prefix("  - "))
            .collect();
        assert_eq!(
            failed_lines.len(),
            (result.total_files - result.success_count) as usize
        );
        assert_eq!(failed_lines, vec!["b.mkv", "c sub/d.mkv"]);
    }

    #[test]
    fn summary_carries_the_artifact_verbatim() {
        let summary = render_summary(&partial_result());
        assert!(summary.ends_with("https://cdn.example.com/a.mkv"));
    }
}
