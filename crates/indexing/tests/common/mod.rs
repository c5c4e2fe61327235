#![allow(dead_code)]

use anyhow::{bail, Result};
use async_trait::async_trait;
use file_index_common::Document;
use file_index_storage::{BatchSink, Checkpoint, FlushReport};
use std::fs;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tracing_subscriber::fmt::MakeWriter;

/// Keeps every flushed batch in memory
#[derive(Default)]
pub struct MemorySink {
    pub flushes: Vec<(Vec<Document>, Checkpoint)>,
}

impl MemorySink {
    pub fn documents(&self) -> Vec<Document> {
        self.flushes.iter().flat_map(|(batch, _)| batch.clone()).collect()
    }

    pub fn ids(&self) -> Vec<String> {
        self.documents().into_iter().map(|d| d.id).collect()
    }
}

#[async_trait]
impl BatchSink for MemorySink {
    async fn flush(&mut self, batch: Vec<Document>, checkpoint: Checkpoint) -> Result<FlushReport> {
        let report = FlushReport::complete(batch.len());
        self.flushes.push((batch, checkpoint));
        Ok(report)
    }
}

/// Rejects every batch
pub struct FailingSink {
    pub attempts: usize,
}

#[async_trait]
impl BatchSink for FailingSink {
    async fn flush(&mut self, _batch: Vec<Document>, _checkpoint: Checkpoint) -> Result<FlushReport> {
        self.attempts += 1;
        bail!("index unavailable")
    }
}

/// Stores all but the last document of every batch
#[derive(Default)]
pub struct PartialSink {
    pub stored: Vec<Document>,
    pub attempts: usize,
}

#[async_trait]
impl BatchSink for PartialSink {
    async fn flush(&mut self, mut batch: Vec<Document>, _checkpoint: Checkpoint) -> Result<FlushReport> {
        self.attempts += 1;
        let submitted = batch.len();
        let rejected = batch.pop().map(|doc| format!("{}: mapper_parsing_exception", doc.id));
        let succeeded = batch.len();
        self.stored.extend(batch);
        Ok(FlushReport {
            submitted,
            succeeded,
            errors: rejected.into_iter().collect(),
        })
    }
}

/// Captures formatted log output for assertions
#[derive(Clone, Default)]
pub struct LogCapture {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock().unwrap()).to_string()
    }

    pub fn count_level(&self, level: &str) -> usize {
        self.contents().lines().filter(|line| line.contains(level)).count()
    }
}

pub struct CaptureWriter {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl io::Write for CaptureWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.lock().unwrap().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = CaptureWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CaptureWriter {
            buf: self.buf.clone(),
        }
    }
}

/// Install a capturing subscriber for the current thread
pub fn capture_logs() -> (LogCapture, tracing::subscriber::DefaultGuard) {
    let capture = LogCapture::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(capture.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (capture, guard)
}

/// A small tree:
///
/// ```text
/// a.txt
/// b/
///   c.pdf
///   d/
///     e.jpg
/// f/
///   g.md
/// ```
pub fn create_test_tree() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    fs::write(root.join("a.txt"), "alpha").unwrap();
    fs::create_dir_all(root.join("b/d")).unwrap();
    fs::write(root.join("b/c.pdf"), "%PDF-1.4").unwrap();
    fs::write(root.join("b/d/e.jpg"), [0xFF, 0xD8, 0xFF]).unwrap();
    fs::create_dir(root.join("f")).unwrap();
    fs::write(root.join("f/g.md"), "# g").unwrap();

    temp
}

pub const GERMAN_HEADER: &str =
    "Name\tPfad\tGröße\tErstelldatum\tÄnderungsdatum\tArt\tName des Volumes\tKatalog\tBeschreibung:\tMedia-Info";

/// Write a catalog export with the German header and the given body lines
pub fn write_export(dir: &Path, name: &str, body: &[&str]) {
    let mut content = String::from(GERMAN_HEADER);
    content.push('\n');
    for line in body {
        content.push_str(line);
        content.push('\n');
    }
    fs::write(dir.join(name), content).unwrap();
}
