use file_index_common::{Document, RunSummary};
use file_index_storage::{BatchSink, Checkpoint};
use tracing::{error, info};

/// In-memory batch owned by the producing loop.
///
/// `push` hands back a full batch once it reaches `threshold` documents and starts a new one.
#[derive(Debug)]
pub struct BatchAccumulator {
    threshold: usize,
    batch: Vec<Document>,
    produced: usize,
}

impl BatchAccumulator {
    pub fn new(threshold: usize) -> Self {
        let threshold = threshold.max(1);
        Self {
            threshold,
            batch: Vec::new(),
            produced: 0,
        }
    }

    pub fn push(&mut self, document: Document) -> Option<Vec<Document>> {
        self.batch.push(document);
        self.produced += 1;
        if self.batch.len() >= self.threshold {
            Some(std::mem::take(&mut self.batch))
        } else {
            None
        }
    }

    /// Remaining documents at end of input, if any
    pub fn finish(&mut self) -> Option<Vec<Document>> {
        if self.batch.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.batch))
        }
    }

    /// Documents pushed so far, flushed or not
    pub fn produced(&self) -> usize {
        self.produced
    }

    pub fn buffered(&self) -> usize {
        self.batch.len()
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }
}

/// Hand one batch to the sink. Sink failures are logged and counted, never propagated.
pub async fn deliver(
    sink: &mut dyn BatchSink,
    batch: Vec<Document>,
    checkpoint: Checkpoint,
    summary: &mut RunSummary,
) {
    let submitted = batch.len();
    summary.flushes += 1;

    match sink.flush(batch, checkpoint.clone()).await {
        Ok(report) => {
            if report.is_partial_failure() {
                summary.push_failures += 1;
            }
            info!(" ...processed {} records.", checkpoint.records_so_far);
        }
        Err(e) => {
            summary.push_failures += 1;
            error!("Failed to flush batch of {} documents: {:#}", submitted, e);
        }
    }
}
