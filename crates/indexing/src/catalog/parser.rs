use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use file_index_common::{IndexError, RunSummary, SystemConfig};
use file_index_storage::{BatchSink, Checkpoint};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info, warn};

use super::rows::{RowAssembler, RowEvent};
use super::schema::HeadingSchema;
use crate::batch::{deliver, BatchAccumulator};
use crate::normalizer::{normalize, NormalizeOptions};

/// Turns catalog export files into documents
pub struct CatalogParser {
    config: SystemConfig,
    options: NormalizeOptions,
    indexed: DateTime<Utc>,
}

impl CatalogParser {
    /// `indexed` is stamped on every document of the run
    pub fn new(config: &SystemConfig, indexed: DateTime<Utc>) -> Self {
        Self {
            config: config.clone(),
            options: NormalizeOptions {
                folder_labels: config.catalog.folder_labels.clone(),
            },
            indexed,
        }
    }

    /// Export files in `dir` with the configured extension, sorted by name
    pub async fn list_export_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let extension = &self.config.catalog.file_extension;
        let mut entries = tokio::fs::read_dir(dir)
            .await
            .with_context(|| format!("Failed to read catalog directory {}", dir.display()))?;

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let matches = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case(extension))
                .unwrap_or(false);
            if matches && tokio::fs::metadata(&path).await.map(|m| m.is_file()).unwrap_or(false) {
                files.push(path);
            }
        }

        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }

    /// Parse every export file of `dir`. A failing file is logged and the next one is processed.
    pub async fn process_directory(&self, dir: &Path, sink: &mut dyn BatchSink) -> Result<RunSummary> {
        let files = self.list_export_files(dir).await?;

        info!("Found the following files:");
        for file in &files {
            info!("{}", file.display());
        }

        let mut summary = RunSummary::default();
        for path in files {
            let name = export_file_name(&path);
            info!("Processing file '{}'.", name);
            let started = Instant::now();

            let mut file_summary = RunSummary::default();
            let result = self.parse_file(&path, sink, &mut file_summary).await;
            match &result {
                Ok(_) => info!("Processed file in {:.2} seconds.", started.elapsed().as_secs_f64()),
                Err(e) => {
                    error!("Error when processing file '{}'.", name);
                    error!("{:#}", e);
                }
            }
            summary.merge(&settle_file(&result, file_summary));
        }

        if summary.faulty_rows > 0 {
            warn!(
                "Encountered {} unfixable faulty rows, please check the input files.",
                summary.faulty_rows
            );
        }

        Ok(summary)
    }

    /// Parse one export file, flushing batches into `sink`. Returns the number of rows emitted.
    pub async fn parse_file(&self, path: &Path, sink: &mut dyn BatchSink, summary: &mut RunSummary) -> Result<usize> {
        let export_file = export_file_name(path);
        let file = tokio::fs::File::open(path)
            .await
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let mut reader = BufReader::new(file);

        let mut header = Vec::new();
        reader.read_until(b'\n', &mut header).await?;
        let schema = HeadingSchema::resolve(&String::from_utf8_lossy(&header), &self.config)?;
        debug!("Resolved headings of {}: {:?}", export_file, schema.labels());

        let mut rows = RowAssembler::new(reader, &schema);
        let mut batch = BatchAccumulator::new(self.config.indexing.catalog_batch_size);
        let mut row_index = 0usize;

        while let Some(event) = rows.next_event().await? {
            match event {
                RowEvent::Row { cells, recovered } => {
                    if recovered {
                        summary.recovered_rows += 1;
                        debug!("Recombined row ending at line {}", rows.line_number());
                    }

                    let normalized = normalize(&schema.record(&cells), &self.options);
                    if normalized.missing_dates {
                        summary.rows_without_date += 1;
                    }

                    let mut document = normalized.document;
                    // Paths can exceed the 512 byte id limit of the index
                    document.id = format!("{}-{}", export_file, row_index);
                    document.indexed = Some(self.indexed);
                    if let Some(provenance) = document.catalog.as_mut() {
                        provenance.catalog_export_file = Some(export_file.clone());
                    }
                    row_index += 1;

                    if let Some(full) = batch.push(document) {
                        let checkpoint = Checkpoint::new(Some(export_file.clone()), row_index);
                        deliver(sink, full, checkpoint, summary).await;
                    }
                }
                RowEvent::Rejected { raw } => {
                    error!("Failed to fix row, ended up with more data columns than headings:");
                    error!("'{}'", raw);
                    summary.faulty_rows += 1;
                }
                RowEvent::UnexpectedEof { partial } => {
                    let err = IndexError::UnexpectedEof {
                        file: export_file.clone(),
                        line: rows.line_number(),
                    };
                    error!("{}, last line was:", err);
                    error!("{}", partial);
                    break;
                }
            }
        }

        if let Some(rest) = batch.finish() {
            let checkpoint = Checkpoint::new(Some(export_file.clone()), row_index);
            deliver(sink, rest, checkpoint, summary).await;
        }

        summary.records += row_index;
        info!("Finished processing '{}', processed {} rows.", path.display(), row_index);
        Ok(row_index)
    }
}

/// Counters one export file contributes to the run. A failed file keeps only its failure and
/// the flushes already sent; its row counters are dropped together with its unsent rows.
fn settle_file(result: &Result<usize>, file_summary: RunSummary) -> RunSummary {
    match result {
        Ok(_) => RunSummary {
            files_processed: file_summary.files_processed + 1,
            ..file_summary
        },
        Err(_) => RunSummary {
            files_failed: 1,
            flushes: file_summary.flushes,
            push_failures: file_summary.push_failures,
            ..RunSummary::default()
        },
    }
}

fn export_file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
