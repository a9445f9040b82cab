/// Folder report — file count and total size under each category directory.
///
/// Each category directory is walked recursively with `jwalk`; categories are
/// summarised in parallel on a small rayon pool sized to the machine.
use rayon::prelude::*;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderSummary {
    pub category: String,
    pub file_count: u64,
    pub total_bytes: u64,
}

/// Summarise every `<root>/<label>` directory that exists, sorted by label.
///
/// Unreadable entries inside a category directory are skipped; they never
/// fail the report.
pub fn folder_report(root: &Path, labels: &[String]) -> Vec<FolderSummary> {
    let existing: Vec<&String> = labels.iter().filter(|l| root.join(l).is_dir()).collect();
    if existing.is_empty() {
        return Vec::new();
    }

    let summarise = || -> Vec<FolderSummary> {
        existing
            .par_iter()
            .map(|label| summarise_dir(root, label))
            .collect()
    };

    let threads = num_cpus::get().min(existing.len()).max(1);
    let mut report = match rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("tidydrop-report-{i}"))
        .build()
    {
        Ok(pool) => pool.install(summarise),
        Err(err) => {
            debug!("Report pool unavailable, using the global pool: {err}");
            summarise()
        }
    };
    report.sort_by(|a, b| a.category.cmp(&b.category));
    report
}

fn summarise_dir(root: &Path, label: &str) -> FolderSummary {
    let dir = root.join(label);
    let mut file_count = 0u64;
    let mut total_bytes = 0u64;

    let walker = jwalk::WalkDir::new(&dir)
        .skip_hidden(false)
        .follow_links(false)
        .parallelism(jwalk::Parallelism::Serial);

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                warn!("Skipping unreadable entry under {}: {err}", dir.display());
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        file_count += 1;
        total_bytes += entry.metadata().map(|m| m.len()).unwrap_or(0);
    }

    FolderSummary {
        category: label.to_owned(),
        file_count,
        total_bytes,
    }
}
