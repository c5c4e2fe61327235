use crate::opensearch::OpenSearchClient;
use anyhow::Result;
use async_trait::async_trait;
use file_index_common::Document;
use tracing::{error, info, warn};

/// Where a flushed batch came from, used for naming and log lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    /// Export file the batch was parsed from; `None` for directory walks
    pub source: Option<String>,
    /// Records produced so far, including this batch
    pub records_so_far: usize,
}

impl Checkpoint {
    pub fn new(source: Option<String>, records_so_far: usize) -> Self {
        Self {
            source,
            records_so_far,
        }
    }
}

/// Result of handing one batch to a sink
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub submitted: usize,
    pub succeeded: usize,
    pub errors: Vec<String>,
}

impl FlushReport {
    pub fn complete(submitted: usize) -> Self {
        Self {
            submitted,
            succeeded: submitted,
            errors: Vec::new(),
        }
    }

    pub fn is_partial_failure(&self) -> bool {
        self.succeeded != self.submitted
    }
}

/// Receives bounded batches of documents from a walk or a catalog parse
#[async_trait]
pub trait BatchSink: Send {
    async fn flush(&mut self, batch: Vec<Document>, checkpoint: Checkpoint) -> Result<FlushReport>;
}

/// Pushes every batch to one OpenSearch index
#[derive(Debug)]
pub struct IndexSink {
    client: OpenSearchClient,
    index: String,
}

impl IndexSink {
    pub fn new(client: OpenSearchClient, index: impl Into<String>) -> Self {
        Self {
            client,
            index: index.into(),
        }
    }
}

#[async_trait]
impl BatchSink for IndexSink {
    async fn flush(&mut self, batch: Vec<Document>, checkpoint: Checkpoint) -> Result<FlushReport> {
        let submitted = batch.len();
        info!(
            "Pushing {} documents to index {} ({} processed)",
            submitted, self.index, checkpoint.records_so_far
        );

        let (succeeded, errors) = self.client.push_batch(&batch, &self.index).await?;

        let report = FlushReport {
            submitted,
            succeeded,
            errors: errors
                .iter()
                .map(|e| match &e.id {
                    Some(id) => format!("{} ({}): {}", id, e.status, e.reason),
                    None => format!("({}): {}", e.status, e.reason),
                })
                .collect(),
        };

        if report.is_partial_failure() {
            warn!(
                "Partial bulk failure: {} of {} documents indexed into {}",
                report.succeeded, report.submitted, self.index
            );
            for message in &report.errors {
                error!("  {}", message);
            }
        }

        Ok(report)
    }
}
