use chrono::{TimeZone, Utc};
use file_index_common::types::*;
use std::str::FromStr;
use strum::IntoEnumIterator;

#[test]
fn test_entry_type_serializes_lowercase() {
    assert_eq!(serde_json::to_string(&EntryType::Directory).unwrap(), "\"directory\"");
    assert_eq!(EntryType::Unknown.to_string(), "unknown");
    assert_eq!(EntryType::from_str("file").unwrap(), EntryType::File);
}

#[test]
fn test_catalog_field_names() {
    assert_eq!(CatalogField::SizeBytes.to_string(), "size_bytes");
    assert_eq!(CatalogField::MediaInfo.to_string(), "media_info");
    assert_eq!(CatalogField::from_str("volume").unwrap(), CatalogField::Volume);
}

#[test]
fn test_required_catalog_fields() {
    let required: Vec<CatalogField> = CatalogField::iter().filter(|f| f.is_required()).collect();

    assert_eq!(required.len(), 8);
    assert!(!CatalogField::Description.is_required());
    assert!(!CatalogField::MediaInfo.is_required());
}

#[test]
fn test_document_json_uses_index_field_names() {
    let mut doc = Document::new("photos/a.jpg", "a.jpg", "photos/a.jpg", EntryType::File);
    doc.size_bytes = Some(42);
    doc.mime_type = Some("image/jpeg".to_string());
    doc.modified = Some(Utc.with_ymd_and_hms(2021, 5, 4, 12, 0, 0).unwrap());

    let value = serde_json::to_value(&doc).unwrap();

    assert_eq!(value["_id"], "photos/a.jpg");
    assert_eq!(value["type"], "file");
    assert_eq!(value["size_bytes"], 42);
    assert_eq!(value["modified"], "2021-05-04T12:00:00Z");
    assert!(value.get("created").is_none());
    assert!(value.get("catalog_path").is_none());
}

#[test]
fn test_document_roundtrip_with_catalog_provenance() {
    let mut doc = Document::new("export.txt-0", "doc.txt", "Users/me/doc.txt", EntryType::File);
    doc.created = Some(Utc.with_ymd_and_hms(2020, 3, 12, 10, 15, 0).unwrap());
    doc.catalog = Some(CatalogProvenance {
        catalog_size: "481,6 KB (481.631 Bytes)".to_string(),
        catalog_created: "12.03.2020".to_string(),
        catalog_modified: "-".to_string(),
        catalog_type: "Textdokument".to_string(),
        catalog_path: "MyCatalog:Users:me:doc.txt".to_string(),
        catalog_volume: "Backup".to_string(),
        catalog_name: "MyCatalog".to_string(),
        catalog_export_file: Some("export.txt".to_string()),
    });

    let json = serde_json::to_string(&doc).unwrap();
    assert!(json.contains("\"catalog_path\":\"MyCatalog:Users:me:doc.txt\""));

    let back: Document = serde_json::from_str(&json).unwrap();
    assert_eq!(back, doc);
}

#[test]
fn test_run_summary_merge() {
    let mut total = RunSummary::default();
    let file = RunSummary {
        records: 10,
        recovered_rows: 2,
        faulty_rows: 1,
        rows_without_date: 3,
        files_processed: 1,
        ..Default::default()
    };

    total.merge(&file);
    total.merge(&file);

    assert_eq!(total.records, 20);
    assert_eq!(total.recovered_rows, 4);
    assert_eq!(total.faulty_rows, 2);
    assert_eq!(total.rows_without_date, 6);
    assert_eq!(total.files_processed, 2);
}
