//! Field normalization for catalog rows: size, dates, path, type and MIME.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use file_index_common::{CatalogField, CatalogProvenance, Document, EntryType};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::mime;

/// Value the cataloging tool writes for "no value"
pub const PLACEHOLDER: &str = "-";

static SIZE_PLAIN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").expect("valid regex"));
/// e.g. "481,6 KB (481.631 Bytes)"
static SIZE_WITH_BYTES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^.+\(([\d.,' ]+) Bytes\)$").expect("valid regex"));

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%A, %d. %B %Y um %H:%M",
    "%d. %B %Y um %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%A, %d. %B %Y", "%d. %B %Y"];

const GERMAN_NAMES: &[(&str, &str)] = &[
    ("Montag", "Monday"),
    ("Dienstag", "Tuesday"),
    ("Mittwoch", "Wednesday"),
    ("Donnerstag", "Thursday"),
    ("Freitag", "Friday"),
    ("Samstag", "Saturday"),
    ("Sonnabend", "Saturday"),
    ("Sonntag", "Sunday"),
    ("Januar", "January"),
    ("Jänner", "January"),
    ("Februar", "February"),
    ("März", "March"),
    ("Maerz", "March"),
    ("Mai", "May"),
    ("Juni", "June"),
    ("Juli", "July"),
    ("Oktober", "October"),
    ("Dezember", "December"),
];

/// One catalog row keyed by canonical field. Unrecognized columns never get in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    values: BTreeMap<CatalogField, String>,
}

impl RawRecord {
    pub fn insert(&mut self, field: CatalogField, value: impl Into<String>) {
        self.values.insert(field, value.into());
    }

    /// Empty string for a missing column
    pub fn get(&self, field: CatalogField) -> &str {
        self.values.get(&field).map(String::as_str).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(CatalogField, String)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (CatalogField, String)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    pub folder_labels: Vec<String>,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            folder_labels: vec!["Ordner".to_string(), "Folder".to_string()],
        }
    }
}

/// Normalizer output. `id` is left empty for the caller to assign.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub document: Document,
    /// Neither `created` nor `modified` could be determined
    pub missing_dates: bool,
}

/// Outcome of parsing one raw date cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedDate {
    /// Placeholder or empty cell
    Absent,
    Parsed(DateTime<Utc>),
    Invalid,
}

impl ParsedDate {
    pub fn value(&self) -> Option<DateTime<Utc>> {
        match self {
            ParsedDate::Parsed(at) => Some(*at),
            _ => None,
        }
    }
}

fn is_placeholder(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value == PLACEHOLDER
}

/// Canonical byte count from the tool's size column
pub fn parse_size(raw: &str) -> Option<u64> {
    let value = raw.trim();

    if SIZE_PLAIN.is_match(value) {
        return value.parse().ok();
    }

    if let Some(captures) = SIZE_WITH_BYTES.captures(value) {
        let digits: String = captures[1].chars().filter(char::is_ascii_digit).collect();
        return digits.parse().ok();
    }

    warn!("Unable to match size value '{}'.", raw);
    None
}

fn translate_german(raw: &str) -> String {
    raw.split_whitespace()
        .map(|token| {
            let core = token.trim_end_matches([',', '.']);
            let suffix = &token[core.len()..];
            match GERMAN_NAMES.iter().find(|(de, _)| *de == core) {
                Some((_, en)) => format!("{}{}", en, suffix),
                None => token.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Try each accepted format in order; German month and weekday names are understood.
pub fn parse_date(raw: &str) -> ParsedDate {
    let value = raw.trim();
    if is_placeholder(value) {
        return ParsedDate::Absent;
    }

    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return ParsedDate::Parsed(at.with_timezone(&Utc));
    }

    let translated = translate_german(value);

    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&translated, format) {
            return ParsedDate::Parsed(naive.and_utc());
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&translated, format) {
            if let Some(naive) = date.and_hms_opt(0, 0, 0) {
                return ParsedDate::Parsed(naive.and_utc());
            }
        }
    }

    ParsedDate::Invalid
}

/// Drop the leading `{catalog}:` and turn the tool's `:` separators into `/`
pub fn normalize_path(raw: &str, catalog: &str) -> String {
    let stripped = if catalog.is_empty() {
        raw
    } else {
        raw.strip_prefix(catalog)
            .and_then(|rest| rest.strip_prefix(':'))
            .unwrap_or(raw)
    };
    stripped.replace(':', "/")
}

pub fn classify_type(raw: &str, folder_labels: &[String]) -> EntryType {
    let label = raw.trim();
    if is_placeholder(label) {
        EntryType::Unknown
    } else if folder_labels.iter().any(|folder| folder == label) {
        EntryType::Directory
    } else {
        EntryType::File
    }
}

fn optional_text(raw: &str) -> Option<String> {
    if is_placeholder(raw) {
        None
    } else {
        Some(raw.trim().to_string())
    }
}

/// Turn one raw catalog record into a document. Pure apart from log lines.
pub fn normalize(raw: &RawRecord, options: &NormalizeOptions) -> Normalized {
    let name = raw.get(CatalogField::Name).trim().to_string();
    let raw_path = raw.get(CatalogField::Path);
    let catalog_name = raw.get(CatalogField::Catalog);
    let path = normalize_path(raw_path, catalog_name);

    let raw_modified = raw.get(CatalogField::Modified);
    let modified = match parse_date(raw_modified) {
        ParsedDate::Invalid => {
            info!("Unable to parse modification date for '{}': '{}'", raw_path, raw_modified);
            None
        }
        parsed => parsed.value(),
    };

    let raw_created = raw.get(CatalogField::Created);
    let created = match parse_date(raw_created) {
        ParsedDate::Parsed(at) => Some(at),
        // Older exports leave the creation date empty
        ParsedDate::Absent => modified,
        ParsedDate::Invalid => {
            info!("Unable to parse creation date for '{}': '{}'", raw_path, raw_created);
            None
        }
    };

    let missing_dates = created.is_none() && modified.is_none();
    if missing_dates {
        debug!("Neither creation nor modification date found for '{}'.", raw_path);
    }

    let raw_type = raw.get(CatalogField::Type);
    let entry_type = classify_type(raw_type, &options.folder_labels);

    let raw_size = raw.get(CatalogField::SizeBytes);
    let size_bytes = match entry_type {
        EntryType::Directory => None,
        _ => parse_size(raw_size),
    };

    let mime_type = match entry_type {
        EntryType::Directory => None,
        _ => mime::from_extension(&name),
    };

    let mut document = Document::new(String::new(), name, path, entry_type);
    document.size_bytes = size_bytes;
    document.mime_type = mime_type;
    document.created = created;
    document.modified = modified;
    document.description = optional_text(raw.get(CatalogField::Description));
    document.media_info = optional_text(raw.get(CatalogField::MediaInfo));
    document.catalog = Some(CatalogProvenance {
        catalog_size: raw_size.to_string(),
        catalog_created: raw_created.to_string(),
        catalog_modified: raw_modified.to_string(),
        catalog_type: raw_type.to_string(),
        catalog_path: raw_path.to_string(),
        catalog_volume: raw.get(CatalogField::Volume).to_string(),
        catalog_name: catalog_name.to_string(),
        catalog_export_file: None,
    });

    Normalized {
        document,
        missing_dates,
    }
}
