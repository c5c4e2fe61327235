//! Re-import of JSON batch files written by an earlier `--to-file` run.

use anyhow::Result;
use file_index_common::RunSummary;
use file_index_storage::{list_batch_files, read_batch_file, BatchSink, Checkpoint};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tracing::{error, info};

use crate::batch::deliver;

/// Run directories end in `_%Y-%m-%d_%H-%M-%S`
static RUN_STAMP_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_\d{4}-\d{2}-\d{2}_\d{2}-\d{2}-\d{2}$").expect("valid regex"));

/// Index name for a run directory: its lowercased name without the trailing run stamp
pub fn index_name_from_run_dir(dir: &Path) -> Option<String> {
    let name = dir.file_name()?.to_string_lossy().to_lowercase();
    let stripped = RUN_STAMP_SUFFIX.replace(&name, "").to_string();
    if stripped.is_empty() {
        None
    } else {
        Some(stripped)
    }
}

/// Push every batch file of `dir` into `sink`, one flush per file.
/// Unreadable files are logged and counted as failed. Returns the number of documents read.
pub async fn import_directory(dir: &Path, sink: &mut dyn BatchSink, summary: &mut RunSummary) -> Result<usize> {
    let files = list_batch_files(dir).await?;
    let mut imported = 0usize;

    for path in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        info!("Processing file '{}'.", name);

        let batch = match read_batch_file(&path).await {
            Ok(batch) => batch,
            Err(e) => {
                error!("Error when processing file '{}': {:#}", name, e);
                summary.files_failed += 1;
                continue;
            }
        };

        imported += batch.len();
        deliver(sink, batch, Checkpoint::new(Some(name), imported), summary).await;
        summary.files_processed += 1;
    }

    summary.records += imported;
    info!("Imported {} documents from {}.", imported, dir.display());
    Ok(imported)
}
