/// Plain-text rendering of outcomes, stats and folder reports.
///
/// Everything here is pure string building so it can be tested without a
/// terminal.
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;
use tidydrop_core::analysis::FolderSummary;
use tidydrop_core::model::{
    file_name_of, format_count, format_size, ClassificationResult, RelocationOutcome,
};
use tidydrop_core::stats::Stats;

/// One line per handled file.
pub fn format_outcome(outcome: &RelocationOutcome) -> String {
    match (outcome.destination(), outcome.skip_reason()) {
        (Some(dest), _) => format!(
            "moved    {} -> {}/{}",
            outcome.original_name,
            outcome.category,
            file_name_of(dest)
        ),
        (None, Some(reason)) => format!(
            "skipped  {} [{}] {reason}",
            outcome.original_name,
            reason.tag()
        ),
        (None, None) => format!("?        {}", outcome.original_name),
    }
}

/// Summary of one scan: every outcome, then totals per skip reason.
pub fn format_scan_summary(outcomes: &[RelocationOutcome]) -> String {
    let mut out = String::new();
    if outcomes.is_empty() {
        out.push_str("Nothing to organize.\n");
        return out;
    }
    for outcome in outcomes {
        let _ = writeln!(out, "{}", format_outcome(outcome));
    }

    let moved = outcomes.iter().filter(|o| o.is_moved()).count();
    let mut skipped: BTreeMap<&str, usize> = BTreeMap::new();
    for reason in outcomes.iter().filter_map(RelocationOutcome::skip_reason) {
        *skipped.entry(reason.tag()).or_default() += 1;
    }

    let _ = write!(out, "\n{moved} moved, {} left in place", outcomes.len() - moved);
    if !skipped.is_empty() {
        let parts: Vec<String> = skipped.iter().map(|(tag, n)| format!("{n} {tag}")).collect();
        let _ = write!(out, " ({})", parts.join(", "));
    }
    out.push('\n');
    out
}

/// Recap of the files a watch session left where they were, so they can be
/// dealt with by hand. Empty when everything was moved.
pub fn format_left_in_place<'a>(
    outcomes: impl IntoIterator<Item = &'a RelocationOutcome>,
) -> String {
    let mut out = String::new();
    for outcome in outcomes {
        if let Some(reason) = outcome.skip_reason() {
            if out.is_empty() {
                out.push_str("Left in place:\n");
            }
            let _ = writeln!(out, "  {} [{}] {reason}", outcome.original_name, reason.tag());
        }
    }
    out
}

/// Persisted statistics, largest categories first.
pub fn format_stats(stats: &Stats) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Total organized: {}",
        format_count(stats.total_organized)
    );
    let _ = writeln!(out, "Today:           {}", format_count(stats.today()));
    let _ = writeln!(
        out,
        "Counting since:  {}",
        stats.start_date.format("%Y-%m-%d %H:%M")
    );

    let top = stats.top_categories();
    if !top.is_empty() {
        out.push_str("\nBy category:\n");
        let width = top.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
        for (label, count) in top {
            let _ = writeln!(out, "  {label:<width$}  {}", format_count(count));
        }
    }
    out
}

/// One-line form for the periodic report while watching.
pub fn format_stats_line(stats: &Stats) -> String {
    format!(
        "[stats] total {} | today {}",
        format_count(stats.total_organized),
        format_count(stats.today())
    )
}

/// Table of category folders with file count and size.
pub fn format_folder_report(report: &[FolderSummary]) -> String {
    if report.is_empty() {
        return "No category folders yet.\n".to_owned();
    }
    let width = report.iter().map(|s| s.category.len()).max().unwrap_or(0);
    let mut out = String::from("Folders:\n");
    for summary in report {
        let _ = writeln!(
            out,
            "  {:<width$}  {:>8} files  {:>10}",
            summary.category,
            format_count(summary.file_count),
            format_size(summary.total_bytes),
        );
    }
    out
}

/// Dry-run verdict for one path.
pub fn format_verdict(path: &Path, result: &ClassificationResult) -> String {
    match &result.sensitive {
        Some(reason) => format!("{}: sensitive ({reason}), would stay", path.display()),
        None if result.category.is_other() => {
            format!("{}: no category, would stay", path.display())
        }
        None => format!("{}: {}", path.display(), result.category),
    }
}
