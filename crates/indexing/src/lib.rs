pub mod batch;
pub mod catalog;
pub mod import;
pub mod mime;
pub mod normalizer;
pub mod walker;

pub use batch::{deliver, BatchAccumulator};
pub use catalog::{CatalogParser, HeadingSchema, RowAssembler, RowEvent};
pub use import::{import_directory, index_name_from_run_dir};
pub use normalizer::{normalize, NormalizeOptions, Normalized, ParsedDate, RawRecord};
pub use walker::{DirectoryWalker, EntryOutcome, SkipReason};
