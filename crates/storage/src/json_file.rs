//! Batches written as JSON array files for later indexing.

use crate::sink::{BatchSink, Checkpoint, FlushReport};
use anyhow::{Context, Result};
use async_trait::async_trait;
use file_index_common::Document;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

/// Writes one `.json` file per flushed batch into a run directory
pub struct JsonFileSink {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl JsonFileSink {
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if fs::metadata(&dir).await.is_ok() {
            info!("Output directory {} already exists.", dir.display());
        } else {
            fs::create_dir_all(&dir)
                .await
                .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
        }
        Ok(Self {
            dir,
            written: Vec::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// `{count}_files.json` for directory walks, `{export}_{count}.json` for catalog files
    pub fn file_name(checkpoint: &Checkpoint) -> String {
        match &checkpoint.source {
            Some(source) => format!("{}_{}.json", source, checkpoint.records_so_far),
            None => format!("{}_files.json", checkpoint.records_so_far),
        }
    }
}

#[async_trait]
impl BatchSink for JsonFileSink {
    async fn flush(&mut self, batch: Vec<Document>, checkpoint: Checkpoint) -> Result<FlushReport> {
        let path = self.dir.join(Self::file_name(&checkpoint));
        let bytes = serde_json::to_vec(&batch).context("Failed to serialize batch")?;

        fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write batch file {}", path.display()))?;

        info!("Exported {} documents to {}", batch.len(), path.display());
        self.written.push(path);
        Ok(FlushReport::complete(batch.len()))
    }
}

pub async fn read_batch_file(path: &Path) -> Result<Vec<Document>> {
    let bytes = fs::read(path)
        .await
        .with_context(|| format!("Failed to read batch file {}", path.display()))?;
    serde_json::from_slice(&bytes)
        .with_context(|| format!("Failed to parse batch file {}", path.display()))
}

/// `.json` files directly inside `dir`, sorted by name
pub async fn list_batch_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)
        .await
        .with_context(|| format!("Failed to list {}", dir.display()))?;

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_json = path.extension().and_then(|e| e.to_str()) == Some("json");
        if is_json && entry.file_type().await?.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
