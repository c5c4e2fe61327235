use file_index_common::{CatalogField, IndexError, Result, SystemConfig};
use strum::IntoEnumIterator;
use tracing::error;

use crate::normalizer::RawRecord;

/// Column layout of one catalog export, resolved from its header line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingSchema {
    labels: Vec<String>,
    columns: Vec<Option<CatalogField>>,
    free_text: Vec<usize>,
}

impl HeadingSchema {
    /// Map every label of the header line to a canonical field.
    ///
    /// Fails with [`IndexError::Schema`] when a required field has no column.
    pub fn resolve(header_line: &str, config: &SystemConfig) -> Result<Self> {
        let header = header_line
            .trim_start_matches('\u{feff}')
            .trim_end_matches(['\n', '\r']);

        let known: Vec<(CatalogField, Vec<String>)> = CatalogField::iter()
            .map(|field| (field, config.labels_for(field)))
            .collect();

        let mut labels = Vec::new();
        let mut columns: Vec<Option<CatalogField>> = Vec::new();
        let mut free_text = Vec::new();

        for (index, raw) in header.split('\t').enumerate() {
            let label = raw.trim();
            let field = known
                .iter()
                .find(|(_, variants)| variants.iter().any(|v| v == label))
                .map(|(field, _)| *field)
                // First column wins when two map to the same field
                .filter(|field| !columns.contains(&Some(*field)));

            if config.catalog.free_text_labels.iter().any(|l| l == label) {
                free_text.push(index);
            }
            labels.push(label.to_string());
            columns.push(field);
        }

        let missing: Vec<String> = CatalogField::iter()
            .filter(|field| field.is_required() && !columns.contains(&Some(*field)))
            .map(|field| field.to_string())
            .collect();

        if !missing.is_empty() {
            error!(" The following column headings were expected but could not be mapped:");
            error!("{:?}", missing);
            return Err(IndexError::Schema { missing });
        }

        Ok(Self {
            labels,
            columns,
            free_text,
        })
    }

    /// Number of columns a well-formed row has
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn field_at(&self, column: usize) -> Option<CatalogField> {
        self.columns.get(column).copied().flatten()
    }

    pub fn free_text_columns(&self) -> &[usize] {
        &self.free_text
    }

    /// Zip a well-formed row with the schema, dropping unrecognized columns
    pub fn record(&self, cells: &[String]) -> RawRecord {
        self.columns
            .iter()
            .zip(cells)
            .filter_map(|(field, cell)| field.map(|f| (f, cell.clone())))
            .collect()
    }
}
