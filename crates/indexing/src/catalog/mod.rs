//! Catalog export parsing: header resolution, row reassembly and per-file processing.

mod parser;
mod rows;
mod schema;

pub use parser::CatalogParser;
pub use rows::{RowAssembler, RowEvent};
pub use schema::HeadingSchema;
