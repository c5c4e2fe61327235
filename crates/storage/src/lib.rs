pub mod json_file;
pub mod opensearch;
pub mod sink;

pub use json_file::{list_batch_files, read_batch_file, JsonFileSink};
pub use opensearch::{BulkItemError, OpenSearchClient};
pub use sink::{BatchSink, Checkpoint, FlushReport, IndexSink};
