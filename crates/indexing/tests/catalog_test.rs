mod common;

use chrono::{TimeZone, Utc};
use common::{write_export, MemorySink};
use file_index_common::{EntryType, IndexError, RunSummary, SystemConfig};
use file_index_indexing::CatalogParser;
use tempfile::TempDir;

const ROW_A: &str = "a.txt\tArchiv:Texte:a.txt\t12\t-\t03.04.2005\tText\tDisk 1\tArchiv\t-\t-";
const ROW_B: &str = "Bilder\tArchiv:Bilder\t1,2 MB (1.234.567 Bytes)\t01.01.2004\t02.01.2004\tOrdner\tDisk 1\tArchiv\tUrlaub\t-";
const ROW_C: &str = "c.mp4\tArchiv:Bilder:c.mp4\t481,6 KB (481.631 Bytes)\t-\t-\tVideo\tDisk 1\tArchiv\t-\tH.264";

fn parser() -> CatalogParser {
    CatalogParser::new(&SystemConfig::default(), Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
}

fn parser_with_batch_size(size: usize) -> CatalogParser {
    let mut config = SystemConfig::default();
    config.indexing.catalog_batch_size = size;
    CatalogParser::new(&config, Utc::now())
}

#[tokio::test]
async fn test_parse_file_emits_normalized_documents() {
    let temp = TempDir::new().unwrap();
    write_export(temp.path(), "disk1.txt", &[ROW_A, ROW_B, ROW_C]);
    let mut sink = MemorySink::default();
    let mut summary = RunSummary::default();

    let rows = parser()
        .parse_file(&temp.path().join("disk1.txt"), &mut sink, &mut summary)
        .await
        .unwrap();

    assert_eq!(rows, 3);
    assert_eq!(summary.records, 3);
    assert_eq!(summary.rows_without_date, 1);
    assert_eq!(sink.flushes.len(), 1);
    assert_eq!(sink.flushes[0].1.source.as_deref(), Some("disk1.txt"));

    let docs = sink.documents();
    assert_eq!(sink.ids(), vec!["disk1.txt-0", "disk1.txt-1", "disk1.txt-2"]);

    assert_eq!(docs[0].path, "Texte/a.txt");
    assert_eq!(docs[0].size_bytes, Some(12));
    assert_eq!(docs[0].created, docs[0].modified);
    assert_eq!(docs[0].indexed, Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));

    assert_eq!(docs[1].entry_type, EntryType::Directory);
    assert_eq!(docs[1].description.as_deref(), Some("Urlaub"));

    assert_eq!(docs[2].size_bytes, Some(481631));
    assert_eq!(docs[2].mime_type.as_deref(), Some("video/mp4"));
    assert_eq!(docs[2].media_info.as_deref(), Some("H.264"));
    assert!(!docs[2].has_dates());

    let provenance = docs[2].catalog.as_ref().unwrap();
    assert_eq!(provenance.catalog_export_file.as_deref(), Some("disk1.txt"));
    assert_eq!(provenance.catalog_path, "Archiv:Bilder:c.mp4");
}

#[tokio::test]
async fn test_recovered_row_counts_once() {
    let temp = TempDir::new().unwrap();
    write_export(
        temp.path(),
        "disk1.txt",
        &[ROW_A, "broken\tArchiv:Texte:bro", "ken.txt\t5\t-\t-\tText\tDisk 1\tArchiv\t-\t-"],
    );
    let mut sink = MemorySink::default();
    let mut summary = RunSummary::default();

    parser()
        .parse_file(&temp.path().join("disk1.txt"), &mut sink, &mut summary)
        .await
        .unwrap();

    let docs = sink.documents();
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[1].name, "broken");
    assert_eq!(docs[1].path, "Texte/broken.txt");
    assert_eq!(summary.recovered_rows, 1);
    assert_eq!(summary.faulty_rows, 0);
}

#[tokio::test]
async fn test_overflowing_row_is_dropped_and_counted() {
    let temp = TempDir::new().unwrap();
    write_export(
        temp.path(),
        "disk1.txt",
        &[ROW_A, "x.txt\tArchiv:x.txt\t1", "a\tb\tc\td\te\tf\tg\th\ti", ROW_C],
    );
    let mut sink = MemorySink::default();
    let mut summary = RunSummary::default();

    let rows = parser()
        .parse_file(&temp.path().join("disk1.txt"), &mut sink, &mut summary)
        .await
        .unwrap();

    assert_eq!(rows, 2);
    assert_eq!(summary.faulty_rows, 1);
    assert_eq!(summary.recovered_rows, 0);
    assert_eq!(sink.ids(), vec!["disk1.txt-0", "disk1.txt-1"]);
}

#[tokio::test]
async fn test_unexpected_eof_keeps_earlier_rows() {
    let temp = TempDir::new().unwrap();
    write_export(temp.path(), "disk1.txt", &[ROW_A, "dangling\tArchiv:dangling"]);
    let mut sink = MemorySink::default();
    let mut summary = RunSummary::default();

    let rows = parser()
        .parse_file(&temp.path().join("disk1.txt"), &mut sink, &mut summary)
        .await
        .unwrap();

    assert_eq!(rows, 1);
    assert_eq!(sink.documents().len(), 1);
}

#[tokio::test]
async fn test_schema_error_names_missing_fields() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("bad.txt"), "Name\tPfad\nx\ty\n").unwrap();
    let mut sink = MemorySink::default();
    let mut summary = RunSummary::default();

    let err = parser()
        .parse_file(&temp.path().join("bad.txt"), &mut sink, &mut summary)
        .await
        .unwrap_err();

    match err.downcast_ref::<IndexError>() {
        Some(IndexError::Schema { missing }) => assert!(missing.contains(&"size_bytes".to_string())),
        other => panic!("unexpected error {other:?}"),
    }
    assert!(sink.flushes.is_empty());
}

#[tokio::test]
async fn test_batches_are_named_per_export_file() {
    let temp = TempDir::new().unwrap();
    write_export(temp.path(), "disk1.txt", &[ROW_A, ROW_B, ROW_C]);
    let mut sink = MemorySink::default();
    let mut summary = RunSummary::default();

    parser_with_batch_size(2)
        .parse_file(&temp.path().join("disk1.txt"), &mut sink, &mut summary)
        .await
        .unwrap();

    let checkpoints: Vec<usize> = sink.flushes.iter().map(|(_, c)| c.records_so_far).collect();
    assert_eq!(checkpoints, vec![2, 3]);
    assert_eq!(summary.flushes, 2);
}

#[tokio::test]
async fn test_directory_isolates_failing_files() {
    let temp = TempDir::new().unwrap();
    write_export(temp.path(), "b.txt", &[ROW_A]);
    std::fs::write(temp.path().join("a.txt"), "Unbekannt\n").unwrap();
    write_export(temp.path(), "c.TXT", &[ROW_B, ROW_C]);
    std::fs::write(temp.path().join("ignored.csv"), "whatever").unwrap();
    let mut sink = MemorySink::default();

    let summary = parser().process_directory(temp.path(), &mut sink).await.unwrap();

    assert_eq!(summary.files_failed, 1);
    assert_eq!(summary.files_processed, 2);
    assert_eq!(summary.records, 3);
    assert_eq!(sink.ids(), vec!["b.txt-0", "c.TXT-0", "c.TXT-1"]);
}

#[tokio::test]
async fn test_parse_is_deterministic() {
    let temp = TempDir::new().unwrap();
    write_export(temp.path(), "disk1.txt", &[ROW_A, ROW_B, ROW_C]);
    let parser = parser();

    let mut first = MemorySink::default();
    let mut second = MemorySink::default();
    parser
        .parse_file(&temp.path().join("disk1.txt"), &mut first, &mut RunSummary::default())
        .await
        .unwrap();
    parser
        .parse_file(&temp.path().join("disk1.txt"), &mut second, &mut RunSummary::default())
        .await
        .unwrap();

    assert_eq!(first.documents(), second.documents());
}
