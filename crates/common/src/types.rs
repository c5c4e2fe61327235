use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::{Display, EnumIter, EnumString};

/// Classification of an indexed entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EntryType {
    File,
    Directory,
    Unknown,
}

/// Canonical catalog columns. Every export column resolves to one of these or is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum CatalogField {
    Name,
    Path,
    SizeBytes,
    Created,
    Modified,
    Type,
    Volume,
    Catalog,
    Description,
    MediaInfo,
}

impl CatalogField {
    /// Optional fields may be missing from an export without rejecting the file.
    pub fn is_required(&self) -> bool {
        !matches!(self, CatalogField::Description | CatalogField::MediaInfo)
    }

    /// Column labels the cataloging tool uses for this field (German export, English export).
    pub fn default_labels(&self) -> &'static [&'static str] {
        match self {
            CatalogField::Name => &["Name"],
            CatalogField::Path => &["Pfad", "Path"],
            CatalogField::SizeBytes => &["Größe", "Size"],
            CatalogField::Created => &["Erstelldatum", "Date Created"],
            CatalogField::Modified => &["Änderungsdatum", "Date Modified"],
            CatalogField::Type => &["Art", "Kind"],
            CatalogField::Volume => &["Name des Volumes", "Volume Name"],
            CatalogField::Catalog => &["Katalog", "Catalog"],
            CatalogField::Description => &["Beschreibung:", "Beschreibung", "Comments"],
            CatalogField::MediaInfo => &["Media-Info", "Media Info"],
        }
    }
}

/// Verbatim catalog values kept next to the normalized ones
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogProvenance {
    pub catalog_size: String,
    pub catalog_created: String,
    pub catalog_modified: String,
    pub catalog_type: String,
    pub catalog_path: String,
    pub catalog_volume: String,
    pub catalog_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_export_file: Option<String>,
}

/// One normalized metadata record, the unit handed to sinks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexed: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_info: Option<String>,
    #[serde(flatten)]
    pub catalog: Option<CatalogProvenance>,
}

impl Document {
    pub fn new(id: impl Into<String>, name: impl Into<String>, path: impl Into<String>, entry_type: EntryType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            path: path.into(),
            entry_type,
            size_bytes: None,
            mime_type: None,
            created: None,
            modified: None,
            indexed: None,
            sha256: None,
            description: None,
            media_info: None,
            catalog: None,
        }
    }

    pub fn has_dates(&self) -> bool {
        self.created.is_some() || self.modified.is_some()
    }
}

/// Counters accumulated over one run and reported at the end
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub records: usize,
    pub recovered_rows: usize,
    pub faulty_rows: usize,
    pub rows_without_date: usize,
    pub skipped_entries: usize,
    pub skipped_directories: usize,
    pub files_processed: usize,
    pub files_failed: usize,
    pub flushes: usize,
    pub push_failures: usize,
}

impl RunSummary {
    pub fn merge(&mut self, other: &RunSummary) {
        self.records += other.records;
        self.recovered_rows += other.recovered_rows;
        self.faulty_rows += other.faulty_rows;
        self.rows_without_date += other.rows_without_date;
        self.skipped_entries += other.skipped_entries;
        self.skipped_directories += other.skipped_directories;
        self.files_processed += other.files_processed;
        self.files_failed += other.files_failed;
        self.flushes += other.flushes;
        self.push_failures += other.push_failures;
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} records, {} recovered rows, {} faulty rows, {} without date, {} skipped entries, {} skipped directories",
            self.records,
            self.recovered_rows,
            self.faulty_rows,
            self.rows_without_date,
            self.skipped_entries,
            self.skipped_directories
        )
    }
}
