//! Recursive file-system walk producing one document per entry.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use file_index_common::{Document, EntryType, IndexingConfig, RunSummary};
use file_index_storage::{BatchSink, Checkpoint};
use sha2::{Digest, Sha256};
use std::collections::VecDeque;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;
use tracing::{debug, error, info, warn};

use crate::batch::{deliver, BatchAccumulator};
use crate::mime;

/// Why an entry produced no document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    BrokenSymlink,
    /// Removed between listing and stat
    Vanished,
    Unreadable(ErrorKind),
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntryOutcome {
    Document(Document),
    /// A real directory: recorded and queued for descent
    Descend(Document),
    Skip(SkipReason),
}

pub struct DirectoryWalker {
    root: PathBuf,
    batch_size: usize,
    sniff_content: bool,
    hash_contents: bool,
    indexed: DateTime<Utc>,
}

impl DirectoryWalker {
    pub fn new(root: impl Into<PathBuf>, config: &IndexingConfig, indexed: DateTime<Utc>) -> Self {
        Self {
            root: root.into(),
            batch_size: config.directory_batch_size,
            sniff_content: config.sniff_content,
            hash_contents: config.hash_contents,
            indexed,
        }
    }

    pub fn with_hashing(mut self, enabled: bool) -> Self {
        self.hash_contents = enabled;
        self
    }

    /// `/`-separated path relative to the walk root
    pub fn relative_path(&self, path: &Path) -> String {
        match path.strip_prefix(&self.root) {
            Ok(relative) => relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/"),
            Err(_) => path.to_string_lossy().replace('\\', "/"),
        }
    }

    /// Walk `directory` (the root or a directory below it) and flush documents into `sink`.
    ///
    /// Per-entry and per-directory faults are logged and skipped; any other listing error
    /// aborts the walk. Returns the number of documents produced.
    pub async fn walk(&self, directory: &Path, sink: &mut dyn BatchSink, summary: &mut RunSummary) -> Result<usize> {
        let mut batch = BatchAccumulator::new(self.batch_size);
        let mut pending = VecDeque::from([directory.to_path_buf()]);

        while let Some(dir) = pending.pop_front() {
            let Some(entries) = self.list(&dir, summary).await? else {
                continue;
            };

            let mut subdirs = Vec::new();
            for path in entries {
                let document = match self.inspect(&path).await {
                    EntryOutcome::Document(document) => document,
                    EntryOutcome::Descend(document) => {
                        subdirs.push(path);
                        document
                    }
                    EntryOutcome::Skip(reason) => {
                        debug!("Skipped {}: {:?}", path.display(), reason);
                        summary.skipped_entries += 1;
                        continue;
                    }
                };

                if let Some(full) = batch.push(document) {
                    let checkpoint = Checkpoint::new(None, batch.produced());
                    deliver(sink, full, checkpoint, summary).await;
                }
            }

            // Depth first: this directory's children go ahead of its siblings, in order
            for subdir in subdirs.into_iter().rev() {
                pending.push_front(subdir);
            }
        }

        if let Some(rest) = batch.finish() {
            let checkpoint = Checkpoint::new(None, batch.produced());
            deliver(sink, rest, checkpoint, summary).await;
        }

        let produced = batch.produced();
        summary.records += produced;
        info!("Finished walking {}, {} entries.", directory.display(), produced);
        Ok(produced)
    }

    /// Sorted entries of one directory, or `None` when it must be skipped
    async fn list(&self, dir: &Path, summary: &mut RunSummary) -> Result<Option<Vec<PathBuf>>> {
        let mut reader = match tokio::fs::read_dir(dir).await {
            Ok(reader) => reader,
            Err(e) if is_directory_fault(&e) => {
                error!("Unable to list directory {}: {}, skipping.", dir.display(), e);
                summary.skipped_directories += 1;
                return Ok(None);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to list directory {}", dir.display()));
            }
        };

        let mut entries = Vec::new();
        loop {
            match reader.next_entry().await {
                Ok(Some(entry)) => entries.push(entry.path()),
                Ok(None) => break,
                Err(e) if is_directory_fault(&e) => {
                    error!("Listing of {} interrupted: {}", dir.display(), e);
                    summary.skipped_directories += 1;
                    break;
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to list directory {}", dir.display()));
                }
            }
        }

        entries.sort();
        Ok(Some(entries))
    }

    /// Stat one entry (following symlinks) and build its document
    pub async fn inspect(&self, path: &Path) -> EntryOutcome {
        let metadata = match tokio::fs::metadata(path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                if is_symlink(path).await {
                    warn!("Found broken symlink {}", path.display());
                    return EntryOutcome::Skip(SkipReason::BrokenSymlink);
                }
                error!("{} vanished during the walk", path.display());
                return EntryOutcome::Skip(SkipReason::Vanished);
            }
            Err(e) => {
                error!("Unable to stat {}: {}", path.display(), e);
                return EntryOutcome::Skip(SkipReason::Unreadable(e.kind()));
            }
        };

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let relative = self.relative_path(path);

        let entry_type = if metadata.is_dir() {
            EntryType::Directory
        } else if metadata.is_file() {
            EntryType::File
        } else {
            EntryType::Unknown
        };

        let mut document = Document::new(relative.clone(), name.clone(), relative, entry_type);
        document.modified = metadata.modified().ok().map(DateTime::<Utc>::from);
        // Birth time is missing on some platforms and file systems
        document.created = metadata
            .created()
            .ok()
            .map(DateTime::<Utc>::from)
            .or(document.modified);
        document.indexed = Some(self.indexed);

        match entry_type {
            EntryType::Directory => {
                if is_symlink(path).await {
                    debug!("Not following symlinked directory {}", path.display());
                    return EntryOutcome::Document(document);
                }
                EntryOutcome::Descend(document)
            }
            EntryType::File => {
                document.size_bytes = Some(metadata.len());
                document.mime_type = mime::detect(&name, path, self.sniff_content).await;
                if self.hash_contents {
                    document.sha256 = hash_file(path).await;
                }
                EntryOutcome::Document(document)
            }
            EntryType::Unknown => EntryOutcome::Document(document),
        }
    }
}

fn is_directory_fault(e: &std::io::Error) -> bool {
    matches!(e.kind(), ErrorKind::PermissionDenied | ErrorKind::NotFound)
}

async fn is_symlink(path: &Path) -> bool {
    tokio::fs::symlink_metadata(path)
        .await
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false)
}

/// Hex SHA-256 of the file content; read errors leave the hash absent
pub async fn hash_file(path: &Path) -> Option<String> {
    let mut file = match tokio::fs::File::open(path).await {
        Ok(file) => file,
        Err(e) => {
            warn!("Unable to hash {}: {}", path.display(), e);
            return None;
        }
    };

    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        match file.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => hasher.update(&buf[..n]),
            Err(e) => {
                warn!("Unable to hash {}: {}", path.display(), e);
                return None;
            }
        }
    }

    Some(format!("{:x}", hasher.finalize()))
}
