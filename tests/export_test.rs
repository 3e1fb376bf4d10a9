//! 読み込みから出力までの統合テスト
//!
//! CSV/文字コード → 差し込み → SVGファイル出力、ファイル名生成、ひな形出力を検証

use ink_merge::document::Document;
use ink_merge::export::columns::write_skeleton;
use ink_merge::export::{ExportFormat, ExportSettings, FileSink, InkscapeExporter};
use ink_merge::orchestrator::{MergeOptions, Merger, Template};
use ink_merge::source::{filter_rows_by_range, read_table, EncodingDetector};
use ink_merge_common::{classify_headers, partition_records};
use std::fs;
use tempfile::tempdir;

const TEMPLATE: &str = r#"<svg xmlns:inkscape="http://www.inkscape.org/namespaces/inkscape"><text inkscape:label="Name">名前</text><rect id="Card" style="fill:#ffffff;stroke:#000000"/></svg>"#;

fn svg_exporter(overwrite: bool) -> InkscapeExporter {
    InkscapeExporter::new(
        "inkscape",
        ExportSettings {
            format: ExportFormat::Svg,
            dpi: 96,
            overwrite,
        },
    )
}

/// Shift_JIS のCSVから1行1ファイルのSVGを作る
#[test]
fn test_shift_jis_csv_to_svg_files() {
    let dir = tempdir().expect("Failed to create temp dir");
    let csv = "Name,Card##fill,社員番号\n山田,red,A-1\n佐藤,blue,B-2\n鈴木,green,C-3\n";
    let (bytes, _, _) = encoding_rs::SHIFT_JIS.encode(csv);
    let data = dir.path().join("list.csv");
    fs::write(&data, &bytes).unwrap();

    let detector = EncodingDetector::default();
    let table = read_table(&data, Some("auto"), &detector).expect("CSV読み込み失敗");
    assert_eq!(table.headers, vec!["Name", "Card##fill", "社員番号"]);

    let template = Template::parse(TEMPLATE).unwrap();
    let classification = classify_headers(&table.headers, Some(template.index()));
    assert_eq!(classification.missing_elements, vec!["社員番号"]);

    let records = filter_rows_by_range(&table.records, "1,3");
    let (active, removed) = partition_records(&records, &classification.missing_elements);

    let out_dir = dir.path().join("out");
    let exporter = svg_exporter(true);
    let options = MergeOptions::default();
    let merger = Merger::new(&template, &classification, &options);
    let mut sink = FileSink::new(
        &exporter,
        &out_dir,
        ExportFormat::Svg,
        &active,
        &removed,
        Some("社員番号".to_string()),
    )
    .hidden();
    let report = merger.process_batch(&active, &mut sink).unwrap();
    sink.finish();

    assert_eq!(report.generated, 2);
    assert_eq!(sink.written().len(), 2);

    // ファイル名は取り除いた列の控えから作られる
    let first = fs::read_to_string(out_dir.join("A-1.svg")).expect("A-1.svg がない");
    let third = fs::read_to_string(out_dir.join("C-3.svg")).expect("C-3.svg がない");
    assert!(!out_dir.join("B-2.svg").exists());

    let doc = Document::parse(&first).unwrap();
    let name = doc.select_label_or_id("Name").unwrap()[0];
    assert_eq!(doc.text_content(name), "山田");
    assert!(first.contains("fill:#ff0000;stroke:#000000"));
    assert!(third.contains("鈴木"));
}

/// 名前の列がなければ連番
#[test]
fn test_sequential_names_and_no_overwrite() {
    let dir = tempdir().expect("Failed to create temp dir");
    let data = dir.path().join("list.csv");
    fs::write(&data, "Name\nA\nB\n").unwrap();

    let detector = EncodingDetector::default();
    let table = read_table(&data, None, &detector).unwrap();
    let template = Template::parse(TEMPLATE).unwrap();
    let classification = classify_headers(&table.headers, Some(template.index()));
    let (active, removed) = partition_records(&table.records, &classification.missing_elements);

    let out_dir = dir.path().join("out");
    fs::create_dir_all(&out_dir).unwrap();
    fs::write(out_dir.join("output_2.svg"), "既存").unwrap();

    let exporter = svg_exporter(false);
    let options = MergeOptions::default();
    let merger = Merger::new(&template, &classification, &options);
    let mut sink = FileSink::new(&exporter, &out_dir, ExportFormat::Svg, &active, &removed, None).hidden();
    let report = merger.process_batch(&active, &mut sink).unwrap();

    assert_eq!(report.generated, 1);
    assert_eq!(report.skipped, 1);
    assert!(fs::read_to_string(out_dir.join("output_1.svg")).unwrap().contains(">A<"));
    assert_eq!(fs::read_to_string(out_dir.join("output_2.svg")).unwrap(), "既存");
}

/// 名前の列の値が重なっても上書きせず別名で全件出す
#[test]
fn test_duplicate_name_column_values() {
    let dir = tempdir().expect("Failed to create temp dir");
    let template = Template::parse(TEMPLATE).unwrap();
    let table = ink_merge::source::parse_table("Name\nsame\nSame\nother\n").unwrap();
    let classification = classify_headers(&table.headers, Some(template.index()));

    let out_dir = dir.path().join("out");
    let exporter = svg_exporter(true);
    let options = MergeOptions::default();
    let merger = Merger::new(&template, &classification, &options);
    let mut sink = FileSink::new(
        &exporter,
        &out_dir,
        ExportFormat::Svg,
        &table.records,
        &[],
        Some("Name".to_string()),
    )
    .hidden();
    let report = merger.process_batch(&table.records, &mut sink).unwrap();

    assert_eq!(report.generated, 3);
    let files = fs::read_dir(&out_dir).unwrap().count();
    assert_eq!(files, report.generated, "出力件数とファイル数が一致しない");
    assert!(fs::read_to_string(out_dir.join("same.svg")).unwrap().contains(">same<"));
    assert!(fs::read_to_string(out_dir.join("Same_2.svg")).unwrap().contains(">Same<"));
    assert!(out_dir.join("other.svg").exists());
}

/// 出力に失敗したレコードがあってもバッチは続く
#[test]
fn test_exporter_failure_is_counted() {
    let dir = tempdir().expect("Failed to create temp dir");
    let template = Template::parse(TEMPLATE).unwrap();
    let classification = classify_headers(&["Name"], Some(template.index()));
    let table = ink_merge::source::parse_table("Name\nA\nB\n").unwrap();

    let exporter = InkscapeExporter::new("/nonexistent/inkscape", ExportSettings::default());
    let options = MergeOptions::default();
    let merger = Merger::new(&template, &classification, &options);
    let mut sink =
        FileSink::new(&exporter, dir.path(), ExportFormat::Png, &table.records, &[], None).hidden();
    let report = merger.process_batch(&table.records, &mut sink).unwrap();

    assert_eq!(report.requested, 2);
    assert_eq!(report.generated, 0);
    assert_eq!(report.failed, 2);
    assert_eq!(report.failures.len(), 2);
}

/// ひな形CSVを書き出して読み戻す
#[test]
fn test_skeleton_round_trip() {
    let dir = tempdir().expect("Failed to create temp dir");
    let doc = Document::parse(TEMPLATE).unwrap();
    let path = dir.path().join("skeleton.csv");

    let count = write_skeleton(&doc, &path).unwrap();
    assert_eq!(count, 3);

    let table = read_table(&path, None, &EncodingDetector::default()).unwrap();
    assert_eq!(table.headers, vec!["Name", "Card##fill", "Card##stroke"]);
    assert_eq!(table.records[0].get("Name"), Some("名前"));
    assert_eq!(table.records[0].get("Card##fill"), Some("#ffffff"));
}
