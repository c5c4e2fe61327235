mod common;

use common::capture_logs;
use file_index_common::{CatalogField, EntryType};
use file_index_indexing::{normalize, NormalizeOptions, RawRecord};

fn row(size: &str, kind: &str) -> RawRecord {
    [
        (CatalogField::Name, "notes.txt"),
        (CatalogField::Path, "Archive:notes.txt"),
        (CatalogField::SizeBytes, size),
        (CatalogField::Modified, "2020-03-14 08:00:00"),
        (CatalogField::Type, kind),
        (CatalogField::Catalog, "Archive"),
    ]
    .into_iter()
    .map(|(field, value)| (field, value.to_string()))
    .collect()
}

#[test]
fn test_placeholder_size_on_file_row_warns() {
    let (logs, _guard) = capture_logs();

    let doc = normalize(&row("-", "Textdokument"), &NormalizeOptions::default()).document;

    assert_eq!(doc.entry_type, EntryType::File);
    assert_eq!(doc.size_bytes, None);
    assert_eq!(logs.count_level(" WARN "), 1);
    assert!(logs.contents().contains("Unable to match size value '-'."));
}

#[test]
fn test_empty_size_on_file_row_warns() {
    let (logs, _guard) = capture_logs();

    let doc = normalize(&row("", "Textdokument"), &NormalizeOptions::default()).document;

    assert_eq!(doc.size_bytes, None);
    assert_eq!(logs.count_level(" WARN "), 1);
}

#[test]
fn test_directory_row_size_is_not_parsed() {
    let (logs, _guard) = capture_logs();

    let doc = normalize(&row("-", "Ordner"), &NormalizeOptions::default()).document;

    assert_eq!(doc.entry_type, EntryType::Directory);
    assert_eq!(doc.size_bytes, None);
    assert_eq!(logs.count_level(" WARN "), 0);
}
